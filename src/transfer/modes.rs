//! FTP Transfer modes
//!
//! Data connection modes, representation types and transfer directions.

use std::fmt;

use serde::Deserialize;

use crate::protocol::TypeCode;

/// How the data connection is established
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// Client listens, server connects back (PORT)
    Active,
    /// Server listens, client connects (PASV)
    #[default]
    Passive,
}

/// Representation type of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    /// ASCII, with line ending translation
    Text,
    /// Image, bytes passed through unchanged
    Binary,
}

impl TransferType {
    pub fn type_code(self) -> TypeCode {
        match self {
            TransferType::Text => TypeCode::Ascii,
            TransferType::Binary => TypeCode::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Get,
    Put,
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataMode::Active => f.write_str("active"),
            DataMode::Passive => f.write_str("passive"),
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Text => f.write_str("text"),
            TransferType::Binary => f.write_str("binary"),
        }
    }
}
