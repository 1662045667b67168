//! FTP Reply handling
//!
//! Defines reply codes, reply classes and the parsed [`Reply`] record.

use std::fmt;

/// Standard FTP reply codes
pub const SERVICE_READY_IN: u16 = 120;
pub const DATA_CONNECTION_OPEN: u16 = 125;
pub const FILE_STATUS_OK: u16 = 150;
pub const OK: u16 = 200;
pub const FILE_STATUS: u16 = 213;
pub const READY: u16 = 220;
pub const CLOSING: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const PASSIVE_MODE: u16 = 227;
pub const LOGIN_SUCCESS: u16 = 230;
pub const FILE_ACTION_OK: u16 = 250;
pub const PATH_CREATED: u16 = 257;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const ACCOUNT_REQUIRED: u16 = 332;
pub const PENDING_FURTHER_INFO: u16 = 350;
pub const SERVICE_NOT_AVAILABLE: u16 = 421;
pub const FILE_NOT_FOUND: u16 = 550;

/// Classification of a reply by its first digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// 1xx, another reply follows
    Preliminary,
    /// 2xx
    Completion,
    /// 3xx, the server waits for more input
    Intermediate,
    /// 4xx
    TransientFailure,
    /// 5xx
    PermanentFailure,
}

impl ReplyClass {
    pub fn from_code(code: u16) -> Option<Self> {
        match code / 100 {
            1 => Some(ReplyClass::Preliminary),
            2 => Some(ReplyClass::Completion),
            3 => Some(ReplyClass::Intermediate),
            4 => Some(ReplyClass::TransientFailure),
            5 => Some(ReplyClass::PermanentFailure),
            _ => None,
        }
    }
}

/// A complete server reply, single or multi-line.
///
/// `lines` holds the message text with the code prefix removed from the
/// first and last line; intermediate lines of a multi-line reply are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    multiline: bool,
    lines: Vec<String>,
}

impl Reply {
    pub fn new(code: u16, multiline: bool, lines: Vec<String>) -> Self {
        Self {
            code,
            multiline,
            lines,
        }
    }

    pub fn single(code: u16, message: impl Into<String>) -> Self {
        Self::new(code, false, vec![message.into()])
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn class(&self) -> ReplyClass {
        // the parser only builds replies with codes in 100..=599
        ReplyClass::from_code(self.code).unwrap_or(ReplyClass::PermanentFailure)
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// First message line, which carries the payload of single-line replies
    pub fn text(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or("")
    }

    /// All message lines joined with `\n`
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_preliminary(&self) -> bool {
        self.class() == ReplyClass::Preliminary
    }

    pub fn is_completion(&self) -> bool {
        self.class() == ReplyClass::Completion
    }

    pub fn is_intermediate(&self) -> bool {
        self.class() == ReplyClass::Intermediate
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lines.last() {
            Some(line) => write!(f, "{} {}", self.code, line.trim()),
            None => write!(f, "{}", self.code),
        }
    }
}
