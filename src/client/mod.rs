//! Client facade
//!
//! Public API composing the session, control channel and transfer engine.

mod ftp;

pub use ftp::FtpClient;
