//! Transfer operations
//!
//! Sequences a transfer on the control channel: TYPE, data channel
//! negotiation, the transfer command, streaming and the completion reply.
//! A transfer abandoned mid-stream has its completion reply drained so
//! that the next command is paired with the right reply.

use std::path::Path;

use log::{info, warn};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite, BufReader, BufWriter};

use crate::error::{FtpError, ProtocolError};
use crate::protocol::responses::OK;
use crate::protocol::{Command, Reply};
use crate::session::Session;
use crate::transfer::data_channel::prepare_data_channel;
use crate::transfer::file_ops;
use crate::transfer::results::{TransferRequest, TransferResult};
use crate::transfer::{Direction, TransferType};

/// Downloads `remote` into the local file at `local`.
///
/// The local file is created before any command is sent. On failure a
/// partially written file is left in place.
pub async fn retrieve(
    session: &mut Session,
    remote: &str,
    local: &Path,
    transfer_type: TransferType,
) -> Result<TransferResult, FtpError> {
    session.require_logged_in("get")?;

    let file = File::create(local).await?;
    let mut writer = BufWriter::new(file);
    retrieve_to(session, remote, &mut writer, transfer_type).await
}

/// Downloads `remote` into any writer.
pub async fn retrieve_to<W>(
    session: &mut Session,
    remote: &str,
    writer: &mut W,
    transfer_type: TransferType,
) -> Result<TransferResult, FtpError>
where
    W: AsyncWrite + Unpin,
{
    session.require_logged_in("get")?;

    let (bytes, reply) =
        download(session, Command::Retr(remote.to_string()), writer, transfer_type).await?;
    info!("Retrieved {remote} ({bytes} bytes, {transfer_type})");
    Ok(TransferResult {
        direction: Direction::Get,
        remote_path: remote.to_string(),
        bytes,
        reply,
    })
}

/// Uploads the local file at `local` to `remote`.
pub async fn store(
    session: &mut Session,
    local: &Path,
    remote: &str,
    transfer_type: TransferType,
) -> Result<TransferResult, FtpError> {
    session.require_logged_in("put")?;

    let file = File::open(local).await?;
    let mut reader = BufReader::new(file);
    store_from(session, &mut reader, remote, transfer_type).await
}

/// Uploads everything `reader` yields to `remote`.
pub async fn store_from<R>(
    session: &mut Session,
    reader: &mut R,
    remote: &str,
    transfer_type: TransferType,
) -> Result<TransferResult, FtpError>
where
    R: AsyncRead + Unpin,
{
    session.require_logged_in("put")?;

    let (bytes, reply) =
        upload(session, Command::Stor(remote.to_string()), reader, transfer_type).await?;
    info!("Stored {remote} ({bytes} bytes, {transfer_type})");
    Ok(TransferResult {
        direction: Direction::Put,
        remote_path: remote.to_string(),
        bytes,
        reply,
    })
}

/// Runs a transfer described by a request.
pub async fn execute(
    session: &mut Session,
    request: &TransferRequest,
) -> Result<TransferResult, FtpError> {
    match request.direction {
        Direction::Get => {
            retrieve(
                session,
                &request.remote_path,
                &request.local_path,
                request.transfer_type,
            )
            .await
        }
        Direction::Put => {
            store(
                session,
                &request.local_path,
                &request.remote_path,
                request.transfer_type,
            )
            .await
        }
    }
}

/// LIST, one entry per line in the server's format.
pub async fn list(session: &mut Session, path: Option<&str>) -> Result<Vec<String>, FtpError> {
    session.require_logged_in("dir")?;
    listing(session, Command::List(path.map(str::to_string))).await
}

/// NLST, bare names.
pub async fn name_list(session: &mut Session, path: Option<&str>) -> Result<Vec<String>, FtpError> {
    session.require_logged_in("nlst")?;
    listing(session, Command::Nlst(path.map(str::to_string))).await
}

async fn listing(session: &mut Session, command: Command) -> Result<Vec<String>, FtpError> {
    let mut buf = Vec::new();
    download(session, command, &mut buf, TransferType::Text).await?;

    Ok(String::from_utf8_lossy(&buf)
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

async fn set_type(session: &mut Session, transfer_type: TransferType) -> Result<(), FtpError> {
    let reply = session
        .command(Command::Type(transfer_type.type_code()))
        .await?;
    if reply.code() != OK {
        return Err(ProtocolError::unexpected("TYPE", &reply).into());
    }
    Ok(())
}

async fn download<W>(
    session: &mut Session,
    command: Command,
    writer: &mut W,
    transfer_type: TransferType,
) -> Result<(u64, Reply), FtpError>
where
    W: AsyncWrite + Unpin,
{
    let verb = command.verb();
    set_type(session, transfer_type).await?;
    let pending = prepare_data_channel(session).await?;

    let reply = session.command(command).await?;
    if !reply.is_preliminary() {
        return Err(ProtocolError::unexpected(verb, &reply).into());
    }

    let data_timeout = session.config().data_timeout();
    let buffer_size = session.config().buffer_size;

    let conn = match pending.establish(data_timeout).await {
        Ok(conn) => conn,
        Err(e) => return Err(abort(session, verb, e).await),
    };
    let mut stream = conn.into_stream();

    let received =
        file_ops::receive(&mut stream, writer, transfer_type, buffer_size, data_timeout).await;
    drop(stream);
    let bytes = match received {
        Ok(bytes) => bytes,
        Err(e) => return Err(abort(session, verb, e).await),
    };

    let reply = session.read_reply(verb).await?;
    complete(verb, bytes, reply)
}

async fn upload<R>(
    session: &mut Session,
    command: Command,
    reader: &mut R,
    transfer_type: TransferType,
) -> Result<(u64, Reply), FtpError>
where
    R: AsyncRead + Unpin,
{
    let verb = command.verb();
    set_type(session, transfer_type).await?;
    let pending = prepare_data_channel(session).await?;

    let reply = session.command(command).await?;
    if !reply.is_preliminary() {
        return Err(ProtocolError::unexpected(verb, &reply).into());
    }

    let data_timeout = session.config().data_timeout();
    let buffer_size = session.config().buffer_size;

    let conn = match pending.establish(data_timeout).await {
        Ok(conn) => conn,
        Err(e) => return Err(abort(session, verb, e).await),
    };
    let mut stream = conn.into_stream();

    let sent = file_ops::send(reader, &mut stream, transfer_type, buffer_size, data_timeout).await;
    drop(stream);
    let bytes = match sent {
        Ok(bytes) => bytes,
        Err(e) => return Err(abort(session, verb, e).await),
    };

    let reply = session.read_reply(verb).await?;
    complete(verb, bytes, reply)
}

fn complete(verb: &str, bytes: u64, reply: Reply) -> Result<(u64, Reply), FtpError> {
    if reply.is_completion() {
        Ok((bytes, reply))
    } else {
        Err(ProtocolError::TransferIncomplete {
            command: verb.to_string(),
            code: reply.code(),
            message: reply.message(),
            bytes,
        }
        .into())
    }
}

/// Drains the completion reply of an abandoned transfer and hands back the
/// error that caused the abort. The data connection is already closed.
async fn abort(session: &mut Session, verb: &str, error: FtpError) -> FtpError {
    warn!("{verb} aborted: {error}");
    session.drain_pending_reply().await;
    error
}
