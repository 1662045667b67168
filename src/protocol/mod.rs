//! FTP Protocol implementation
//!
//! Handles command formatting and reply parsing for the control channel.

pub mod commands;
pub mod parser;
pub mod responses;

pub use commands::{Command, TypeCode};
pub use parser::{ReplyParser, parse_code};
pub use responses::{Reply, ReplyClass};
