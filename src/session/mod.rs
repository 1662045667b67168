//! Session management
//!
//! Tracks the connection lifecycle and guards which operations are legal
//! in which state.

mod lifecycle;
mod state;

pub use lifecycle::Session;
pub use state::SessionState;
