//! Storage operations
//!
//! Remote file management commands that need no data connection.

use log::info;

use crate::error::{FtpError, ProtocolError};
use crate::protocol::responses::{FILE_ACTION_OK, FILE_NOT_FOUND, FILE_STATUS, PENDING_FURTHER_INFO};
use crate::protocol::{Command, Reply};
use crate::session::Session;

/// Deletes a remote file
pub async fn delete_file(session: &mut Session, path: &str) -> Result<(), FtpError> {
    session.require_logged_in("delete")?;

    let reply = session.command(Command::Dele(path.to_string())).await?;
    if reply.code() != FILE_ACTION_OK {
        return Err(ProtocolError::unexpected("DELE", &reply).into());
    }
    info!("Deleted {path}");
    Ok(())
}

/// Renames a remote file with RNFR followed by RNTO
pub async fn rename_file(session: &mut Session, from: &str, to: &str) -> Result<(), FtpError> {
    session.require_logged_in("rename")?;

    let reply = session.command(Command::Rnfr(from.to_string())).await?;
    if reply.code() != PENDING_FURTHER_INFO {
        return Err(ProtocolError::unexpected("RNFR", &reply).into());
    }

    let reply = session.command(Command::Rnto(to.to_string())).await?;
    if reply.code() != FILE_ACTION_OK {
        return Err(ProtocolError::unexpected("RNTO", &reply).into());
    }
    info!("Renamed {from} to {to}");
    Ok(())
}

/// Size of a remote file in bytes, `None` if the server reports it missing.
///
/// The size is that of the current representation type.
pub async fn file_size(session: &mut Session, path: &str) -> Result<Option<u64>, FtpError> {
    session.require_logged_in("size")?;

    let reply = session.command(Command::Size(path.to_string())).await?;
    match reply.code() {
        FILE_STATUS => {
            let text = reply.text().trim();
            let size = text
                .parse::<u64>()
                .map_err(|_| ProtocolError::InvalidSizeReply(text.to_string()))?;
            Ok(Some(size))
        }
        FILE_NOT_FOUND => Ok(None),
        _ => Err(ProtocolError::unexpected("SIZE", &reply).into()),
    }
}

/// Sends a server specific SITE command
pub async fn site_command(session: &mut Session, args: &str) -> Result<Reply, FtpError> {
    session.require_logged_in("site")?;

    let reply = session.command(Command::Site(args.to_string())).await?;
    if !reply.is_completion() {
        return Err(ProtocolError::unexpected("SITE", &reply).into());
    }
    Ok(reply)
}
