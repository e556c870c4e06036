//! Unix domain socket server for IPC
//!
//! Provides request-response communication for status queries, the
//! pause/resume control signals, and settings management, plus push
//! notifications of dispatch events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::SettingsStore;
use crate::listener::Listener;

use super::protocol::{ActionInfo, DaemonStatus, Notification, Request, Response};

const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// IPC server handling client connections.
pub struct Server {
    socket_path: PathBuf,
    socket: UnixListener,
    context: Arc<ServerContext>,
    shutdown_tx: broadcast::Sender<()>,
}

/// State shared with every client handler.
struct ServerContext {
    start_time: Instant,
    keyboard: Arc<Listener>,
    store: Arc<SettingsStore>,
}

impl Server {
    /// Binds the server socket, replacing any stale socket file.
    pub fn new(
        socket_path: &Path,
        keyboard: Arc<Listener>,
        store: Arc<SettingsStore>,
    ) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let socket = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Socket is a control surface for this user only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            socket,
            context: Arc::new(ServerContext {
                start_time: Instant::now(),
                keyboard,
                store,
            }),
            shutdown_tx,
        })
    }

    /// Runs the server, accepting connections.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.socket.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let context = Arc::clone(&self.context);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = handle_client(stream, context) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Gracefully shuts down the server and removes the socket file.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Handles a single client connection.
async fn handle_client(mut stream: UnixStream, context: Arc<ServerContext>) -> Result<()> {
    let mut len_buf = [0u8; 4];

    loop {
        // Read message length (4-byte little-endian).
        match stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("client disconnected");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_BYTES {
            warn!(len, "message too large, disconnecting");
            return Ok(());
        }

        let mut msg_buf = vec![0u8; len];
        stream.read_exact(&mut msg_buf).await?;

        let request: Request = match serde_json::from_slice(&msg_buf) {
            Ok(request) => request,
            Err(e) => {
                warn!(?e, "failed to parse request");
                let response = Response::Error {
                    message: format!("malformed request: {e}"),
                };
                send_message(&mut stream, &response).await?;
                continue;
            }
        };

        debug!(?request, "received request");

        let subscribe = request == Request::Subscribe;
        let response = process_request(request, &context).await;
        send_message(&mut stream, &response).await?;

        if subscribe {
            // The connection is push-only from here on.
            return forward_notifications(stream, context).await;
        }
    }
}

/// Streams dispatch events to a subscribed client until it disconnects.
async fn forward_notifications(
    mut stream: UnixStream,
    context: Arc<ServerContext>,
) -> Result<()> {
    let mut dispatch_rx = context.keyboard.subscribe();

    loop {
        match dispatch_rx.recv().await {
            Ok(event) => {
                let notification = Notification::Dispatch { event };
                if send_message(&mut stream, &notification).await.is_err() {
                    debug!("subscribed client disconnected");
                    return Ok(());
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "subscribed client lagged, notifications dropped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                return Ok(());
            }
        }
    }
}

/// Sends a length-prefixed JSON message.
async fn send_message<T: serde::Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    stream.write_all(&msg_len).await?;
    stream.write_all(&msg_bytes).await?;

    Ok(())
}

/// Processes a request and returns the response.
async fn process_request(request: Request, context: &ServerContext) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::GetStatus => Response::Status(DaemonStatus {
            listener_state: context.keyboard.state().to_string(),
            paused: context.keyboard.is_paused(),
            uptime_secs: context.start_time.elapsed().as_secs(),
            mapping_count: context.keyboard.mapping_count().await,
            action_count: context.keyboard.action_count().await,
        }),

        Request::PauseListener => {
            info!("listener paused via IPC");
            context.keyboard.pause();
            Response::Ack
        }

        Request::ResumeListener => {
            info!("listener resumed via IPC");
            context.keyboard.resume();
            Response::Ack
        }

        Request::ListActions => {
            let registry = context.store.action_registry();
            let registry = registry.read().await;
            let actions = registry
                .actions()
                .map(|action| ActionInfo {
                    id: action.id(),
                    name: action.name().to_string(),
                })
                .collect();
            Response::Actions { actions }
        }

        Request::ListScriptActions => Response::ScriptActions {
            actions: context.store.script_actions().await,
        },

        Request::ListMappings => Response::Mappings {
            mappings: context.store.mappings().await,
        },

        Request::AddMapping { mapping } => match context.store.add_mapping(mapping).await {
            Ok(()) => Response::Ack,
            Err(e) => Response::Error {
                message: format!("{e:#}"),
            },
        },

        Request::DeleteMapping { id } => match context.store.delete_mapping(id).await {
            Ok(()) => Response::Ack,
            Err(e) => Response::Error {
                message: format!("{e:#}"),
            },
        },

        Request::AddScriptAction { action } => match context.store.add_script(action).await {
            Ok(()) => Response::Ack,
            Err(e) => Response::Error {
                message: format!("{e:#}"),
            },
        },

        Request::DeleteScriptAction { id } => match context.store.delete_script(id).await {
            Ok(()) => Response::Ack,
            Err(e) => Response::Error {
                message: format!("{e:#}"),
            },
        },

        Request::Subscribe => Response::Subscribed,
    }
}
