use std::time::Duration;

use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use crate::config::ClientConfig;
use crate::error::{ConnectError, FtpError, ProtocolError, TimeoutError};
use crate::protocol::responses::{CLOSING, READY, SERVICE_READY_IN};
use crate::protocol::{Command, Reply, ReplyParser};

/// Command/reply channel over any byte stream.
///
/// Every operation takes `&mut self`, so at most one command is ever
/// outstanding.
pub struct ControlChannel<S>
where
    S: AsyncRead + AsyncWrite,
{
    stream: BufStream<S>,
    parser: ReplyParser,
    command_timeout: Duration,
    greeting_timeout: Duration,
    last_reply: Option<Reply>,
}

impl ControlChannel<TcpStream> {
    /// Opens the TCP control connection, bounded by the connect timeout.
    pub async fn connect(host: &str, port: u16, config: &ClientConfig) -> Result<Self, FtpError> {
        let addr = format!("{host}:{port}");
        debug!("Connecting to {addr}");

        let stream = match tokio::time::timeout(
            config.connect_timeout(),
            TcpStream::connect((host, port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ConnectError::Io { addr, source }.into()),
            Err(_) => return Err(ConnectError::TimedOut(addr).into()),
        };

        Ok(Self::new(stream, config))
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.stream.get_ref().local_addr()
    }

    pub fn peer_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.stream.get_ref().peer_addr()
    }
}

impl<S> ControlChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: &ClientConfig) -> Self {
        Self {
            stream: BufStream::new(stream),
            parser: ReplyParser::from_config(config),
            command_timeout: config.command_timeout(),
            greeting_timeout: config.connect_timeout(),
            last_reply: None,
        }
    }

    /// Reply most recently read from the server
    pub fn last_reply(&self) -> Option<&Reply> {
        self.last_reply.as_ref()
    }

    /// Writes `command CRLF` and flushes.
    pub async fn send(&mut self, command: &Command) -> Result<(), FtpError> {
        if command.has_line_break() {
            return Err(ProtocolError::LineBreakInArgument(command.verb()).into());
        }

        trace!(">>> {}", command.loggable());
        let line = format!("{command}\r\n");
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Reads one reply within the command timeout.
    pub async fn read_reply(&mut self, stage: &'static str) -> Result<Reply, FtpError> {
        self.read_reply_within(stage, self.command_timeout).await
    }

    pub async fn read_reply_within(
        &mut self,
        stage: &'static str,
        limit: Duration,
    ) -> Result<Reply, FtpError> {
        let parser = self.parser;
        let reply = match tokio::time::timeout(limit, parser.read_reply(&mut self.stream)).await {
            Ok(r) => r?,
            Err(_) => return Err(TimeoutError::Reply(stage).into()),
        };

        self.last_reply = Some(reply.clone());
        Ok(reply)
    }

    /// Sends a command and reads the reply it produces.
    pub async fn send_command(&mut self, command: Command) -> Result<Reply, FtpError> {
        self.send(&command).await?;
        self.read_reply(command.verb()).await
    }

    /// Waits for the 220 greeting, skipping any 120 "ready in n minutes".
    ///
    /// The whole exchange is bounded by the connect timeout.
    pub async fn wait_greeting(&mut self) -> Result<Reply, FtpError> {
        match tokio::time::timeout(self.greeting_timeout, self.read_greeting()).await {
            Ok(r) => r,
            Err(_) => Err(TimeoutError::Reply("greeting").into()),
        }
    }

    async fn read_greeting(&mut self) -> Result<Reply, FtpError> {
        loop {
            let reply = self.read_reply("greeting").await?;
            match reply.code() {
                SERVICE_READY_IN => {
                    debug!("Server not ready yet: {reply}");
                    continue;
                }
                READY => return Ok(reply),
                code => {
                    return Err(ConnectError::Greeting {
                        code,
                        message: reply.message(),
                    }
                    .into());
                }
            }
        }
    }

    /// Sends QUIT, waits for 221 and shuts the connection down.
    ///
    /// Failures are only logged; the stream is dropped on every path.
    pub async fn quit(mut self) {
        match self.send_command(Command::Quit).await {
            Ok(reply) if reply.code() == CLOSING => debug!("Server closed session: {reply}"),
            Ok(reply) => warn!("Unexpected reply to QUIT: {reply}"),
            Err(e) => warn!("QUIT failed: {e}"),
        }

        if let Err(e) = self.stream.shutdown().await {
            debug!("Control shutdown failed: {e}");
        }
    }
}
