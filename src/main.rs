//! quick-actions-daemon: hotkey-triggered action launcher
//!
//! The daemon installs a global keyboard hook, tracks held keys, and
//! matches pressed combinations against user-defined mappings. A match
//! executes either an in-process code action or an external script action;
//! failures surface as notifications and successes may play a completion
//! sound. An IPC socket exposes status plus pause/resume control so other
//! surfaces (for example a key-combination editor) can suspend dispatch
//! without tearing down the hook.

mod actions;
mod audio;
mod config;
mod events;
mod hook;
mod ipc;
mod keys;
mod lifecycle;
mod listener;
mod mappings;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::audio::SoundPlayer;
use crate::config::{Config, SettingsStore};
use crate::events::DispatchEvent;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::listener::Listener;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "quick-actions-daemon starting"
    );

    // Load configuration and the user's mappings and script actions
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.settings_path, "configuration loaded");

    let store = Arc::new(SettingsStore::open(&config.settings_path)?);

    // Channel for dispatch events (failures, successes, pause transitions)
    let (event_tx, _event_rx) = broadcast::channel::<DispatchEvent>(64);

    // Create the keyboard listener over the materialized settings
    let keyboard = Arc::new(Listener::new(
        store.mapping_table(),
        store.action_registry(),
        event_tx.clone(),
        Arc::new(SoundPlayer::new()),
    ));

    // Start the keyboard listener (hook runs on a dedicated thread)
    match keyboard.start() {
        Ok(()) => {
            info!("keyboard listener started");
        }
        Err(e) => {
            error!(?e, "failed to start keyboard listener");
            warn!("continuing without hotkey support - check input permissions");
        }
    }

    // Shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // IPC server for status queries and pause/resume control
    let server = Server::new(&config.socket_path, Arc::clone(&keyboard), Arc::clone(&store))?;

    // Notification surface: failed actions are user-visible
    let mut notify_rx = event_tx.subscribe();

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Accept IPC client connections
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Surface dispatch failures
        _ = async {
            loop {
                match notify_rx.recv().await {
                    Ok(DispatchEvent::ActionFailed { result }) => {
                        warn!(
                            action = result.action_name(),
                            error = result.error(),
                            "action failed"
                        );
                    }
                    Ok(event) => {
                        info!(%event, "dispatch event");
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "notification receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("notification handler exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    keyboard.stop().await;
    server.shutdown().await;

    info!("quick-actions-daemon stopped");

    Ok(())
}
