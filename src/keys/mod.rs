//! Key identifiers and held-key tracking
//!
//! Provides the virtual-key domain used by mappings and the state tracker
//! that feeds mapping resolution.

mod state;
mod virtual_key;

pub use state::{KeyDirection, KeyEvent, KeyState};
pub use virtual_key::VirtualKey;
