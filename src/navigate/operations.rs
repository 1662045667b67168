//! Navigation operations implementation

use log::debug;

use crate::error::{FtpError, ProtocolError};
use crate::protocol::responses::{FILE_ACTION_OK, PATH_CREATED};
use crate::protocol::{Command, Reply};
use crate::session::Session;

/// Changes the remote working directory and returns the new one.
pub async fn change_directory(session: &mut Session, path: &str) -> Result<String, FtpError> {
    session.require_logged_in("chdir")?;

    let reply = session.command(Command::Cwd(path.to_string())).await?;
    if !reply.is_completion() {
        return Err(ProtocolError::unexpected("CWD", &reply).into());
    }
    print_working_directory(session).await
}

/// Moves to the parent directory and returns the new working directory.
pub async fn change_to_parent(session: &mut Session) -> Result<String, FtpError> {
    session.require_logged_in("cdup")?;

    let reply = session.command(Command::Cdup).await?;
    if !reply.is_completion() {
        return Err(ProtocolError::unexpected("CDUP", &reply).into());
    }
    print_working_directory(session).await
}

pub async fn print_working_directory(session: &mut Session) -> Result<String, FtpError> {
    session.require_logged_in("pwd")?;

    let reply = session.command(Command::Pwd).await?;
    if reply.code() != PATH_CREATED {
        return Err(ProtocolError::unexpected("PWD", &reply).into());
    }

    let path = parse_pwd_reply(&reply)?;
    debug!("Remote working directory is {path}");
    Ok(path)
}

/// Creates a remote directory and returns the path reported by the server.
pub async fn make_directory(session: &mut Session, path: &str) -> Result<String, FtpError> {
    session.require_logged_in("mkdir")?;

    let reply = session.command(Command::Mkd(path.to_string())).await?;
    if reply.code() != PATH_CREATED {
        return Err(ProtocolError::unexpected("MKD", &reply).into());
    }
    // not every server quotes the created path
    Ok(parse_pwd_reply(&reply).unwrap_or_else(|_| path.to_string()))
}

pub async fn remove_directory(session: &mut Session, path: &str) -> Result<(), FtpError> {
    session.require_logged_in("rmdir")?;

    let reply = session.command(Command::Rmd(path.to_string())).await?;
    if reply.code() != FILE_ACTION_OK {
        return Err(ProtocolError::unexpected("RMD", &reply).into());
    }
    Ok(())
}

/// Extracts the quoted path of a 257 reply; `""` inside the quotes
/// stands for a literal `"`.
pub fn parse_pwd_reply(reply: &Reply) -> Result<String, ProtocolError> {
    let text = reply.text();
    let invalid = || ProtocolError::InvalidPathReply(text.to_string());

    let start = text.find('"').ok_or_else(invalid)?;
    let mut path = String::new();
    let mut chars = text[start + 1..].chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                path.push('"');
            } else {
                return Ok(path);
            }
        } else {
            path.push(c);
        }
    }

    Err(invalid())
}
