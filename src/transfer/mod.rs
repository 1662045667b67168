//! Transfer module for the FTP client
//!
//! Handles data channel negotiation, file transfers and directory
//! listings, in text or binary representation.

pub mod data_channel;
pub mod file_ops;
pub mod modes;
pub mod operations;
pub mod results;
pub mod translate;

// Re-export key types and functions
pub use data_channel::{DataConnection, PendingDataChannel, parse_pasv_reply};
pub use modes::{DataMode, Direction, TransferType};
pub use operations::{execute, list, name_list, retrieve, retrieve_to, store, store_from};
pub use results::{TransferRequest, TransferResult};
