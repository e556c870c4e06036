//! IPC module for external control of the daemon
//!
//! Carries the pause/resume control signals, status queries, and dispatch
//! notifications over a Unix domain socket.

mod protocol;
mod server;

pub use protocol::{ActionInfo, DaemonStatus, Notification, Request, Response};
pub use server::Server;
