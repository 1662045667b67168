//! Module `data_channel`
//!
//! Negotiates the per-transfer data connection, either passive (PASV, the
//! client connects to the server) or active (PORT, the server connects back
//! to a listener opened by the client).

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{ConnectError, FtpError, ProtocolError, TimeoutError};
use crate::protocol::responses::{OK, PASSIVE_MODE};
use crate::protocol::{Command, Reply};
use crate::session::Session;
use crate::transfer::DataMode;
use crate::utils::network::format_port_argument;

/// An established data connection. Used for exactly one transfer.
#[derive(Debug)]
pub struct DataConnection {
    mode: DataMode,
    local: SocketAddr,
    remote: SocketAddr,
    stream: TcpStream,
}

impl DataConnection {
    fn new(mode: DataMode, stream: TcpStream) -> Result<Self, FtpError> {
        Ok(Self {
            mode,
            local: stream.local_addr()?,
            remote: stream.peer_addr()?,
            stream,
        })
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}

/// Data channel negotiated on the control connection but not yet usable.
///
/// Passive connections are opened during negotiation; active ones are
/// accepted once the server has accepted the transfer command.
#[derive(Debug)]
pub enum PendingDataChannel {
    Passive(DataConnection),
    Active(TcpListener),
}

impl PendingDataChannel {
    /// Completes the connection, bounded by `limit` in active mode.
    pub async fn establish(self, limit: Duration) -> Result<DataConnection, FtpError> {
        match self {
            PendingDataChannel::Passive(conn) => Ok(conn),
            PendingDataChannel::Active(listener) => {
                let (stream, peer) = match tokio::time::timeout(limit, listener.accept()).await {
                    Ok(Ok(accepted)) => accepted,
                    Ok(Err(e)) => return Err(ConnectError::DataListen(e).into()),
                    Err(_) => return Err(TimeoutError::DataAccept(limit).into()),
                };
                debug!("Accepted data connection from {peer}");
                DataConnection::new(DataMode::Active, stream)
            }
        }
    }
}

/// Negotiates a data channel in the configured mode.
pub async fn prepare_data_channel(session: &mut Session) -> Result<PendingDataChannel, FtpError> {
    match session.config().data_mode {
        DataMode::Passive => passive(session).await.map(PendingDataChannel::Passive),
        DataMode::Active => active(session).await.map(PendingDataChannel::Active),
    }
}

/// PASV, then connect to the announced endpoint.
pub async fn passive(session: &mut Session) -> Result<DataConnection, FtpError> {
    let reply = session.command(Command::Pasv).await?;
    if reply.code() != PASSIVE_MODE {
        return Err(ProtocolError::unexpected("PASV", &reply).into());
    }

    let addr = parse_pasv_reply(&reply)?;
    debug!("Passive data endpoint {addr}");

    let limit = session.config().data_timeout();
    let stream = match tokio::time::timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => return Err(ConnectError::DataConnect { addr, source }.into()),
        Err(_) => return Err(TimeoutError::DataConnect(addr).into()),
    };

    DataConnection::new(DataMode::Passive, stream)
}

/// Opens a listener and announces it with PORT.
pub async fn active(session: &mut Session) -> Result<TcpListener, FtpError> {
    let ip = match session.config().active_bind_address {
        Some(ip) => ip,
        None => session.control_local_addr()?.ip(),
    };
    let IpAddr::V4(ipv4) = ip else {
        return Err(ConnectError::DataListen(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("PORT cannot announce non-IPv4 address {ip}"),
        ))
        .into());
    };

    let listener = TcpListener::bind(SocketAddr::new(ip, 0))
        .await
        .map_err(ConnectError::DataListen)?;
    let port = listener.local_addr().map_err(ConnectError::DataListen)?.port();
    info!("Listening for active data connection on {ipv4}:{port}");

    let argument = format_port_argument(SocketAddrV4::new(ipv4, port));
    let reply = session.command(Command::Port(argument)).await?;
    if reply.code() != OK {
        return Err(ProtocolError::unexpected("PORT", &reply).into());
    }

    Ok(listener)
}

/// Extracts `h1,h2,h3,h4,p1,p2` from a 227 reply.
///
/// The parenthesised form is standard, but some servers omit the
/// parentheses, so the first run of digits is used as fallback.
pub fn parse_pasv_reply(reply: &Reply) -> Result<SocketAddr, ProtocolError> {
    let line = reply.text();
    let invalid = || ProtocolError::InvalidPassiveReply(line.to_string());

    let numbers = match memchr::memchr(b'(', line.as_bytes()) {
        Some(p_start) => {
            let p_end = memchr::memchr(b')', &line.as_bytes()[p_start..]).ok_or_else(invalid)?;
            &line[p_start + 1..p_start + p_end]
        }
        None => {
            let start = line.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
            line[start..].trim_end_matches(|c: char| !c.is_ascii_digit())
        }
    };

    let mut values = [0u8; 6];
    let mut parts = numbers.split(',');
    for value in values.iter_mut() {
        let part = parts.next().ok_or_else(invalid)?;
        *value = u8::from_str(part.trim()).map_err(|_| invalid())?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }

    let [h1, h2, h3, h4, p1, p2] = values;
    let ip = Ipv4Addr::new(h1, h2, h3, h4);
    let port = ((p1 as u16) << 8) + (p2 as u16);
    Ok(SocketAddr::new(IpAddr::V4(ip), port))
}
