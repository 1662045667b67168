//! Error types
//!
//! Defines the error taxonomy of the FTP client, one enum per concern,
//! aggregated by [`FtpError`].

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::Reply;
use crate::session::SessionState;

/// Control connection or greeting failures
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("unable to connect to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("timed out connecting to {0}")]
    TimedOut(String),
    #[error("server greeting rejected: {code} {message}")]
    Greeting { code: u16, message: String },
    #[error("unable to open data connection to {addr}: {source}")]
    DataConnect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("unable to set up active data listener: {0}")]
    DataListen(#[source] io::Error),
}

/// Login failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login rejected for user {user}: {code} {message}")]
    Rejected {
        user: String,
        code: u16,
        message: String,
    },
    #[error("server requires an account for user {0}")]
    AccountRequired(String),
}

/// Operations attempted in a state that does not allow them.
///
/// These are raised before any network I/O takes place.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("{operation} requires a logged in session (state: {state})")]
    NotLoggedIn {
        operation: &'static str,
        state: SessionState,
    },
    #[error("{operation} requires a connected session (state: {state})")]
    NotConnected {
        operation: &'static str,
        state: SessionState,
    },
    #[error("already connected to {0}")]
    AlreadyConnected(String),
    #[error("already logged in as {0}")]
    AlreadyLoggedIn(String),
}

/// Malformed replies or reply codes that do not fit the command sent
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed by server")]
    ConnectionClosed,
    #[error("reply line longer than {0} bytes")]
    LineTooLong(usize),
    #[error("malformed reply line: {0:?}")]
    InvalidLineFormat(String),
    #[error("invalid reply code in line: {0:?}")]
    InvalidReplyCode(String),
    #[error("multi-line reply {expected} terminated by code {found}")]
    TerminatorMismatch { expected: u16, found: u16 },
    #[error("multi-line reply exceeds {0} lines")]
    TooManyLines(usize),
    #[error("unexpected reply to {command}: {code} {message}")]
    UnexpectedReply {
        command: String,
        code: u16,
        message: String,
    },
    #[error("{command} failed after {bytes} bytes: {code} {message}")]
    TransferIncomplete {
        command: String,
        code: u16,
        message: String,
        bytes: u64,
    },
    #[error("malformed passive mode reply: {0:?}")]
    InvalidPassiveReply(String),
    #[error("malformed directory reply: {0:?}")]
    InvalidPathReply(String),
    #[error("malformed size reply: {0:?}")]
    InvalidSizeReply(String),
    #[error("{0} argument contains a line break")]
    LineBreakInArgument(&'static str),
}

impl ProtocolError {
    /// A reply whose code does not fit the command that produced it
    pub fn unexpected(command: &str, reply: &Reply) -> Self {
        ProtocolError::UnexpectedReply {
            command: command.to_string(),
            code: reply.code(),
            message: reply.message(),
        }
    }
}

/// Bounded waits that ran out
#[derive(Debug, Error)]
pub enum TimeoutError {
    #[error("timed out waiting for reply ({0})")]
    Reply(&'static str),
    #[error("no data connection accepted within {0:?}")]
    DataAccept(Duration),
    #[error("timed out opening data connection to {0}")]
    DataConnect(SocketAddr),
    #[error("data connection idle for more than {0:?}")]
    DataIdle(Duration),
}

/// General FTP client error that encompasses all error types
#[derive(Debug, Error)]
pub enum FtpError {
    #[error("connect error: {0}")]
    Connect(#[from] ConnectError),
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("timeout: {0}")]
    Timeout(#[from] TimeoutError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl FtpError {
    /// Whether this error leaves the control channel unusable.
    ///
    /// A broken socket, a premature close, a reply that never arrived or one
    /// the parser gave up on midway all mean the command/reply pairing can no
    /// longer be trusted.
    pub fn is_fatal_to_control(&self) -> bool {
        matches!(
            self,
            FtpError::Io(_)
                | FtpError::Protocol(ProtocolError::ConnectionClosed)
                | FtpError::Protocol(ProtocolError::LineTooLong(_))
                | FtpError::Protocol(ProtocolError::TooManyLines(_))
                | FtpError::Protocol(ProtocolError::TerminatorMismatch { .. })
                | FtpError::Protocol(ProtocolError::InvalidReplyCode(_))
                | FtpError::Protocol(ProtocolError::InvalidLineFormat(_))
                | FtpError::Timeout(TimeoutError::Reply(_))
        )
    }

    /// Reply code carried by the error, if the server produced one
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            FtpError::Connect(ConnectError::Greeting { code, .. }) => Some(*code),
            FtpError::Auth(AuthError::Rejected { code, .. }) => Some(*code),
            FtpError::Protocol(ProtocolError::UnexpectedReply { code, .. }) => Some(*code),
            FtpError::Protocol(ProtocolError::TransferIncomplete { code, .. }) => Some(*code),
            _ => None,
        }
    }
}
