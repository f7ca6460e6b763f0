//! Line-delimited JSON-RPC server over stdio
//!
//! Usage: `move_server [config.json]`. Responses go to stdout, logs to stderr
//! (`RUST_LOG` controls the level).

use moveit_core::bridge::{error_codes, handle_line, BridgeState, Response};
use moveit_core::edit::EngineConfig;
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path)?,
        None => EngineConfig::default(),
    };
    log::info!(
        "[Bridge] Starting move server (max virtual selection {}, undo depth {})",
        config.max_virtual_selection_size,
        config.max_undo_depth
    );

    let mut state = BridgeState::new(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("[Bridge] Error reading stdin: {}", e);
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&mut state, &line);
        let response_json = serde_json::to_string(&response).unwrap_or_else(|e| {
            let fallback = Response::error(response.id.clone(), error_codes::INTERNAL_ERROR, e.to_string());
            serde_json::to_string(&fallback).unwrap_or_default()
        });

        writeln!(stdout, "{}", response_json)?;
        stdout.flush()?;
    }

    log::info!("[Bridge] Shutting down...");
    Ok(())
}
