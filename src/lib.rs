//! RAX FTP client
//!
//! An async FTP client (RFC 959) over tokio: session state machine,
//! command/reply pipeline on the control connection, and passive or active
//! data transfers in text or binary representation.

pub mod client;
pub mod config;
pub mod control;
pub mod error;
pub mod navigate;
pub mod protocol;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use client::FtpClient;
pub use config::ClientConfig;
pub use error::FtpError;
pub use protocol::Reply;
pub use session::SessionState;
pub use transfer::{DataMode, TransferRequest, TransferResult, TransferType};
