//! Module `file_ops`
//!
//! Byte pumps between a data connection and a local reader or writer,
//! with ASCII translation for text transfers.

use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{FtpError, TimeoutError};
use crate::transfer::TransferType;
use crate::transfer::translate::{AsciiDecoder, AsciiEncoder, LineEnding};

/// Copies the data connection into `writer` until EOF.
///
/// Each read on the data connection is bounded by `idle`. Returns the
/// number of bytes read from the data connection.
pub async fn receive<D, W>(
    data: &mut D,
    writer: &mut W,
    transfer_type: TransferType,
    buffer_size: usize,
    idle: Duration,
) -> Result<u64, FtpError>
where
    D: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; buffer_size];
    let mut translated = Vec::new();
    let mut decoder = AsciiDecoder::new(LineEnding::native());
    let mut total = 0u64;

    loop {
        let n = match tokio::time::timeout(idle, data.read(&mut buffer)).await {
            Ok(r) => r?,
            Err(_) => return Err(TimeoutError::DataIdle(idle).into()),
        };
        if n == 0 {
            break;
        }
        total += n as u64;

        match transfer_type {
            TransferType::Binary => writer.write_all(&buffer[..n]).await?,
            TransferType::Text => {
                translated.clear();
                decoder.decode(&buffer[..n], &mut translated);
                writer.write_all(&translated).await?;
            }
        }
    }

    if transfer_type == TransferType::Text {
        translated.clear();
        decoder.finish(&mut translated);
        writer.write_all(&translated).await?;
    }
    writer.flush().await?;

    debug!("Received {total} bytes on data connection");
    Ok(total)
}

/// Copies `reader` onto the data connection, then shuts it down to signal
/// EOF. Returns the number of bytes written to the data connection.
pub async fn send<R, D>(
    reader: &mut R,
    data: &mut D,
    transfer_type: TransferType,
    buffer_size: usize,
    idle: Duration,
) -> Result<u64, FtpError>
where
    R: AsyncRead + Unpin,
    D: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; buffer_size];
    let mut translated = Vec::new();
    let mut encoder = AsciiEncoder::new();
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }

        let payload = match transfer_type {
            TransferType::Binary => &buffer[..n],
            TransferType::Text => {
                translated.clear();
                encoder.encode(&buffer[..n], &mut translated);
                &translated[..]
            }
        };

        match tokio::time::timeout(idle, data.write_all(payload)).await {
            Ok(r) => r?,
            Err(_) => return Err(TimeoutError::DataIdle(idle).into()),
        }
        total += payload.len() as u64;
    }

    match tokio::time::timeout(idle, data.shutdown()).await {
        Ok(r) => r?,
        Err(_) => return Err(TimeoutError::DataIdle(idle).into()),
    }

    debug!("Sent {total} bytes on data connection");
    Ok(total)
}
