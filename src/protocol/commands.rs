//! Module `commands`
//!
//! Defines the FTP commands the client sends on the control channel and
//! their wire representation.

use std::fmt;

/// Represents an FTP command sent to the server.
///
/// Commands that take arguments store them as `String` variants. The wire
/// form is produced by the `Display` impl, without the trailing CRLF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User(String),
    Pass(String),
    Quit,
    Noop,
    Type(TypeCode),
    Pasv,
    Port(String),
    Retr(String),
    Stor(String),
    List(Option<String>),
    Nlst(Option<String>),
    Cwd(String),
    Cdup,
    Pwd,
    Mkd(String),
    Rmd(String),
    Dele(String),
    Rnfr(String),
    Rnto(String),
    Size(String),
    Site(String),
}

/// Representation type argument of the TYPE command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCode {
    /// `A`, ASCII text
    Ascii,
    /// `I`, image (binary)
    Image,
}

impl Command {
    /// The command verb, used for error reporting and logging
    pub fn verb(&self) -> &'static str {
        match self {
            Command::User(_) => "USER",
            Command::Pass(_) => "PASS",
            Command::Quit => "QUIT",
            Command::Noop => "NOOP",
            Command::Type(_) => "TYPE",
            Command::Pasv => "PASV",
            Command::Port(_) => "PORT",
            Command::Retr(_) => "RETR",
            Command::Stor(_) => "STOR",
            Command::List(_) => "LIST",
            Command::Nlst(_) => "NLST",
            Command::Cwd(_) => "CWD",
            Command::Cdup => "CDUP",
            Command::Pwd => "PWD",
            Command::Mkd(_) => "MKD",
            Command::Rmd(_) => "RMD",
            Command::Dele(_) => "DELE",
            Command::Rnfr(_) => "RNFR",
            Command::Rnto(_) => "RNTO",
            Command::Size(_) => "SIZE",
            Command::Site(_) => "SITE",
        }
    }

    fn argument(&self) -> Option<&str> {
        match self {
            Command::User(arg)
            | Command::Pass(arg)
            | Command::Port(arg)
            | Command::Retr(arg)
            | Command::Stor(arg)
            | Command::Cwd(arg)
            | Command::Mkd(arg)
            | Command::Rmd(arg)
            | Command::Dele(arg)
            | Command::Rnfr(arg)
            | Command::Rnto(arg)
            | Command::Size(arg)
            | Command::Site(arg) => Some(arg),
            Command::List(arg) | Command::Nlst(arg) => arg.as_deref(),
            Command::Type(TypeCode::Ascii) => Some("A"),
            Command::Type(TypeCode::Image) => Some("I"),
            Command::Quit | Command::Noop | Command::Pasv | Command::Cdup | Command::Pwd => None,
        }
    }

    /// Wire form with the password masked, for logs
    pub fn loggable(&self) -> String {
        match self {
            Command::Pass(_) => "PASS ****".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the argument would break the CRLF framing of the control channel
    pub fn has_line_break(&self) -> bool {
        self.argument()
            .is_some_and(|arg| arg.contains(['\r', '\n']))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument() {
            Some(arg) => write!(f, "{} {}", self.verb(), arg),
            None => write!(f, "{}", self.verb()),
        }
    }
}
