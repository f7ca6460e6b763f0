//! The set of currently selected instances

use indexmap::IndexSet;

use super::instance::{InstanceId, InstanceKind};

/// Selected instance ids in selection order, each at most once
#[derive(Clone, Debug)]
pub struct Selection {
    items: IndexSet<InstanceId>,
    /// Tool mode: moving nodes also moves their segments, so segments are not
    /// individually selectable
    pub affects_segments: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self {
            items: IndexSet::new(),
            affects_segments: true,
        }
    }

    /// Returns false if `id` was already selected
    pub fn insert(&mut self, id: InstanceId) -> bool {
        self.items.insert(id)
    }

    pub fn remove(&mut self, id: InstanceId) -> bool {
        self.items.shift_remove(&id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.items.contains(&id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.items.iter().copied()
    }

    /// Drop every member of `kind`, returns how many were removed
    pub fn remove_kind(&mut self, kind: InstanceKind) -> usize {
        let before = self.items.len();
        self.items.retain(|id| id.kind != kind);
        before - self.items.len()
    }

    pub fn is_segment_selected(&self, segment: u32) -> bool {
        if self.affects_segments {
            return false;
        }
        self.contains(InstanceId::segment(segment))
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<InstanceId> for Selection {
    fn from_iter<T: IntoIterator<Item = InstanceId>>(iter: T) -> Self {
        let mut selection = Selection::new();
        for id in iter {
            selection.insert(id);
        }
        selection
    }
}
