//! Transfer result types
//!
//! Defines the request consumed by the transfer engine and the result it
//! returns.

use std::path::PathBuf;

use crate::protocol::Reply;
use crate::transfer::{Direction, TransferType};

/// A file transfer to perform
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub direction: Direction,
    pub remote_path: String,
    pub local_path: PathBuf,
    pub transfer_type: TransferType,
}

impl TransferRequest {
    pub fn get(remote: impl Into<String>, local: impl Into<PathBuf>, ty: TransferType) -> Self {
        Self {
            direction: Direction::Get,
            remote_path: remote.into(),
            local_path: local.into(),
            transfer_type: ty,
        }
    }

    pub fn put(local: impl Into<PathBuf>, remote: impl Into<String>, ty: TransferType) -> Self {
        Self {
            direction: Direction::Put,
            remote_path: remote.into(),
            local_path: local.into(),
            transfer_type: ty,
        }
    }
}

/// Outcome of a completed transfer
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub direction: Direction,
    pub remote_path: String,
    /// Bytes moved over the data connection, before any line ending
    /// translation on the local side
    pub bytes: u64,
    /// Completion reply (2xx)
    pub reply: Reply,
}
