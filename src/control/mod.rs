//! Control connection
//!
//! Owns the command connection to the server and pairs every command with
//! its reply.

mod channel;

pub use channel::ControlChannel;
