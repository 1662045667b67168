//! FTP Reply parsing
//!
//! Decodes numeric-coded, possibly multi-line server replies from the
//! control stream (RFC 959 §4.2).

use std::borrow::Cow;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::config::ClientConfig;
use crate::error::{FtpError, ProtocolError};
use crate::protocol::Reply;

/// Reads one logical reply per call from a buffered byte source.
#[derive(Debug, Clone, Copy)]
pub struct ReplyParser {
    max_line_length: usize,
    max_reply_lines: usize,
}

impl ReplyParser {
    pub fn new(max_line_length: usize, max_reply_lines: usize) -> Self {
        Self {
            max_line_length,
            max_reply_lines,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_line_length, config.max_reply_lines)
    }

    /// Reads a line into `buf` with the line terminator removed.
    async fn read_line<R>(&self, reader: &mut R, buf: &mut Vec<u8>) -> Result<(), FtpError>
    where
        R: AsyncBufRead + Unpin,
    {
        buf.clear();

        let mut limited = (&mut *reader).take(self.max_line_length as u64);
        let n = limited.read_until(b'\n', buf).await?;
        if n == 0 {
            return Err(ProtocolError::ConnectionClosed.into());
        }

        if buf.last() != Some(&b'\n') {
            return if n >= self.max_line_length {
                Err(ProtocolError::LineTooLong(self.max_line_length).into())
            } else {
                // EOF in the middle of a line
                Err(ProtocolError::ConnectionClosed.into())
            };
        }

        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        log::trace!("<<< {}", String::from_utf8_lossy(buf));
        Ok(())
    }

    /// Reads a complete reply.
    ///
    /// Multi-line replies look like:
    /// ```text
    /// 150-Here comes the directory listing.
    /// 150 done
    /// ```
    pub async fn read_reply<R>(&self, reader: &mut R) -> Result<Reply, FtpError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::with_capacity(128);
        self.read_line(reader, &mut buf).await?;

        let code = parse_code(&buf)?;
        match buf.get(3).copied() {
            None | Some(b' ') => Ok(Reply::new(code, false, vec![text_after_code(&buf)])),
            Some(b'-') => {
                let prefix = [buf[0], buf[1], buf[2]];
                let mut lines = vec![text_after_code(&buf)];

                loop {
                    if lines.len() >= self.max_reply_lines {
                        return Err(ProtocolError::TooManyLines(self.max_reply_lines).into());
                    }

                    self.read_line(reader, &mut buf).await?;
                    if buf.starts_with(&prefix) && matches!(buf.get(3), None | Some(b' ')) {
                        lines.push(text_after_code(&buf));
                        return Ok(Reply::new(code, true, lines));
                    }

                    if buf.get(3) == Some(&b' ') && has_code_prefix(&buf) {
                        return Err(ProtocolError::TerminatorMismatch {
                            expected: code,
                            found: digits_value(&buf),
                        }
                        .into());
                    }

                    // do not trim whitespace at beginning
                    lines.push(lossy(&buf).trim_end().to_string());
                }
            }
            Some(_) => Err(ProtocolError::InvalidLineFormat(lossy(&buf).into_owned()).into()),
        }
    }
}

fn lossy(buf: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(buf)
}

fn has_code_prefix(line: &[u8]) -> bool {
    line.len() >= 3 && line[..3].iter().all(u8::is_ascii_digit)
}

fn digits_value(line: &[u8]) -> u16 {
    line[..3]
        .iter()
        .fold(0u16, |acc, d| acc * 10 + (d - b'0') as u16)
}

/// Parses the 3-digit reply code from the start of a line.
pub fn parse_code(line: &[u8]) -> Result<u16, ProtocolError> {
    if !has_code_prefix(line) {
        return Err(ProtocolError::InvalidReplyCode(lossy(line).into_owned()));
    }

    let code = digits_value(line);
    if !(100..600).contains(&code) {
        return Err(ProtocolError::InvalidReplyCode(lossy(line).into_owned()));
    }
    Ok(code)
}

fn text_after_code(line: &[u8]) -> String {
    match line.get(4..) {
        Some(text) => lossy(text).trim_end().to_string(),
        None => String::new(),
    }
}
