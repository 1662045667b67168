//! Scripted in-process FTP server for integration tests.
//!
//! Users: `user`/`pass`, and `anonymous` with any password. `trusted` is
//! logged in by USER alone, `relay` gets a 333 to USER and then accepts
//! `pass`, `account` is asked for ACCT after PASS.
//! Special remote names:
//! - `__vanish__`: data is sent, then the control connection is dropped
//!   without a completion reply
//! - `__no_connect__`: 150 is sent but no data connection is made; a 425
//!   follows after a delay
//! - `__fail_226__`: data is sent, then a 451 instead of the 226
//! - `SITE MISMATCH`: a multi-line reply whose last line carries another code

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rax_ftp_client::{ClientConfig, DataMode, FtpClient};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
struct Shared {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    commands: Mutex<Vec<String>>,
    dead_passive: AtomicBool,
}

pub struct MockServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::with_greeting("220 rax mock ready").await
    }

    /// A server answering every connection with `greeting`; anything other
    /// than a 220 closes the connection afterwards.
    pub async fn with_greeting(greeting: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Shared::default());

        let greeting = greeting.to_string();
        let server_shared = shared.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let shared = server_shared.clone();
                let greeting = greeting.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, shared, greeting).await;
                });
            }
        });

        MockServer { addr, shared }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            port: self.addr.port(),
            connect_timeout_ms: 2_000,
            command_timeout_ms: 5_000,
            data_timeout_ms: 2_000,
            drain_timeout_ms: 2_000,
            ..Default::default()
        }
    }

    pub fn active_config(&self) -> ClientConfig {
        ClientConfig {
            data_mode: DataMode::Active,
            ..self.config()
        }
    }

    pub fn client(&self) -> FtpClient {
        FtpClient::with_config("127.0.0.1", "user", "pass", self.config())
    }

    pub fn client_with(&self, user: &str, password: &str, config: ClientConfig) -> FtpClient {
        FtpClient::with_config("127.0.0.1", user, password, config)
    }

    pub fn put_file(&self, name: &str, contents: &[u8]) {
        self.shared
            .files
            .lock()
            .unwrap()
            .insert(name.to_string(), contents.to_vec());
    }

    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.shared.files.lock().unwrap().get(name).cloned()
    }

    /// Every command line received so far, across connections
    pub fn commands(&self) -> Vec<String> {
        self.shared.commands.lock().unwrap().clone()
    }

    /// When set, PASV announces a port nobody listens on.
    pub fn set_dead_passive(&self, dead: bool) {
        self.shared.dead_passive.store(dead, Ordering::SeqCst);
    }

    pub fn verbs(&self) -> Vec<String> {
        self.commands()
            .iter()
            .map(|line| line.split(' ').next().unwrap_or("").to_string())
            .collect()
    }
}

#[derive(Default)]
struct Connection {
    user: Option<String>,
    passive: Option<TcpListener>,
    active: Option<SocketAddr>,
    cwd: String,
    rename_from: Option<String>,
}

async fn reply(w: &mut OwnedWriteHalf, line: &str) -> io::Result<()> {
    w.write_all(format!("{line}\r\n").as_bytes()).await
}

async fn open_data(conn: &mut Connection) -> io::Result<TcpStream> {
    if let Some(listener) = conn.passive.take() {
        let (stream, _) = listener.accept().await?;
        Ok(stream)
    } else if let Some(addr) = conn.active.take() {
        TcpStream::connect(addr).await
    } else {
        Err(io::Error::other("no data connection prepared"))
    }
}

fn parse_port(arg: &str) -> Option<SocketAddr> {
    let v: Vec<u8> = arg
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    if v.len() != 6 {
        return None;
    }
    let port = (v[4] as u16) << 8 | v[5] as u16;
    Some(SocketAddr::from(([v[0], v[1], v[2], v[3]], port)))
}

async fn serve(stream: TcpStream, shared: Arc<Shared>, greeting: String) -> io::Result<()> {
    let (r, mut w) = stream.into_split();
    let mut lines = BufReader::new(r).lines();

    reply(&mut w, &greeting).await?;
    if !greeting.starts_with("220") {
        return Ok(());
    }

    let mut conn = Connection {
        cwd: "/".to_string(),
        ..Default::default()
    };

    while let Some(line) = lines.next_line().await? {
        shared.commands.lock().unwrap().push(line.clone());
        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb.to_ascii_uppercase(), arg.to_string()),
            None => (line.to_ascii_uppercase(), String::new()),
        };

        match verb.as_str() {
            "USER" => {
                conn.user = Some(arg.clone());
                match arg.as_str() {
                    "user" | "anonymous" | "account" => {
                        reply(&mut w, "331 Password required").await?
                    }
                    "trusted" => reply(&mut w, "230 Trusted user logged in").await?,
                    "relay" => reply(&mut w, "333 Send password").await?,
                    _ => reply(&mut w, "530 Invalid username").await?,
                }
            }
            "PASS" => match conn.user.as_deref() {
                Some("user" | "relay") if arg == "pass" => {
                    reply(&mut w, "230 Login successful").await?
                }
                Some("anonymous") => reply(&mut w, "230 Guest login ok").await?,
                Some("account") => reply(&mut w, "332 Need account for login").await?,
                _ => reply(&mut w, "530 Login incorrect").await?,
            },
            "TYPE" => match arg.as_str() {
                "A" | "I" => reply(&mut w, &format!("200 Type set to {arg}")).await?,
                _ => reply(&mut w, "504 Type not supported").await?,
            },
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let port = listener.local_addr()?.port();
                if shared.dead_passive.load(Ordering::SeqCst) {
                    drop(listener);
                } else {
                    conn.passive = Some(listener);
                }
                let text = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{}).",
                    port >> 8,
                    port & 0xff
                );
                reply(&mut w, &text).await?;
            }
            "PORT" => match parse_port(&arg) {
                Some(addr) => {
                    conn.active = Some(addr);
                    reply(&mut w, "200 PORT command successful").await?;
                }
                None => reply(&mut w, "501 Illegal PORT command").await?,
            },
            "RETR" => {
                if arg == "__no_connect__" {
                    reply(&mut w, "150 Opening data connection").await?;
                    tokio::time::sleep(Duration::from_millis(600)).await;
                    reply(&mut w, "425 Can't open data connection").await?;
                    continue;
                }

                let contents = shared.files.lock().unwrap().get(&arg).cloned();
                let Some(contents) = contents else {
                    conn.passive = None;
                    reply(&mut w, "550 File not found").await?;
                    continue;
                };

                reply(&mut w, "150 Opening data connection").await?;
                let mut data = open_data(&mut conn).await?;
                let sent = data.write_all(&contents).await;
                let _ = data.shutdown().await;
                drop(data);

                if arg == "__vanish__" {
                    return Ok(());
                }
                if arg == "__fail_226__" {
                    reply(&mut w, "451 Local error in processing").await?;
                    continue;
                }
                match sent {
                    Ok(()) => reply(&mut w, "226 Transfer complete").await?,
                    Err(_) => reply(&mut w, "426 Connection closed; transfer aborted").await?,
                }
            }
            "STOR" => {
                reply(&mut w, "150 Ok to send data").await?;
                let mut data = open_data(&mut conn).await?;
                let mut contents = Vec::new();
                let received = data.read_to_end(&mut contents).await;
                drop(data);
                match received {
                    Ok(_) => {
                        shared.files.lock().unwrap().insert(arg, contents);
                        reply(&mut w, "226 Transfer complete").await?;
                    }
                    Err(_) => reply(&mut w, "426 Connection closed; transfer aborted").await?,
                }
            }
            "LIST" | "NLST" => {
                let listing: String = shared
                    .files
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|(name, contents)| {
                        if verb == "LIST" {
                            format!(
                                "-rw-r--r--    1 ftp      ftp      {:>8} Jan 01 00:00 {name}\r\n",
                                contents.len()
                            )
                        } else {
                            format!("{name}\r\n")
                        }
                    })
                    .collect();

                reply(&mut w, "150 Here comes the directory listing").await?;
                let mut data = open_data(&mut conn).await?;
                data.write_all(listing.as_bytes()).await?;
                data.shutdown().await?;
                drop(data);
                reply(&mut w, "226 Directory send OK").await?;
            }
            "CWD" => {
                if arg == "missing" {
                    reply(&mut w, "550 Failed to change directory").await?;
                } else {
                    conn.cwd = if arg.starts_with('/') {
                        arg
                    } else if conn.cwd == "/" {
                        format!("/{arg}")
                    } else {
                        format!("{}/{arg}", conn.cwd)
                    };
                    reply(&mut w, "250 Directory successfully changed").await?;
                }
            }
            "CDUP" => {
                conn.cwd = match conn.cwd.rfind('/') {
                    Some(0) | None => "/".to_string(),
                    Some(i) => conn.cwd[..i].to_string(),
                };
                reply(&mut w, "250 Directory successfully changed").await?;
            }
            "PWD" => {
                let quoted = conn.cwd.replace('"', "\"\"");
                reply(&mut w, &format!("257 \"{quoted}\" is the current directory")).await?;
            }
            "MKD" => reply(&mut w, &format!("257 \"{arg}\" created")).await?,
            "RMD" => reply(&mut w, "250 Remove directory operation successful").await?,
            "DELE" => {
                let removed = shared.files.lock().unwrap().remove(&arg).is_some();
                if removed {
                    reply(&mut w, "250 Delete operation successful").await?;
                } else {
                    reply(&mut w, "550 Delete operation failed").await?;
                }
            }
            "RNFR" => {
                let exists = shared.files.lock().unwrap().contains_key(&arg);
                if exists {
                    conn.rename_from = Some(arg);
                    reply(&mut w, "350 Ready for RNTO").await?;
                } else {
                    reply(&mut w, "550 RNFR command failed").await?;
                }
            }
            "RNTO" => match conn.rename_from.take() {
                Some(from) => {
                    {
                        let mut files = shared.files.lock().unwrap();
                        if let Some(contents) = files.remove(&from) {
                            files.insert(arg, contents);
                        }
                    }
                    reply(&mut w, "250 Rename successful").await?;
                }
                None => reply(&mut w, "503 RNFR required first").await?,
            },
            "SIZE" => {
                let size = shared.files.lock().unwrap().get(&arg).map(Vec::len);
                match size {
                    Some(size) => reply(&mut w, &format!("213 {size}")).await?,
                    None => reply(&mut w, "550 Could not get file size").await?,
                }
            }
            "SITE" if arg == "MISMATCH" => {
                w.write_all(b"200-start\r\n500 oops\r\n200 end\r\n").await?;
            }
            "SITE" => reply(&mut w, &format!("200 SITE {arg} ok")).await?,
            "NOOP" => reply(&mut w, "200 NOOP ok").await?,
            "QUIT" => {
                reply(&mut w, "221 Goodbye").await?;
                return Ok(());
            }
            _ => reply(&mut w, "502 Command not implemented").await?,
        }
    }

    Ok(())
}
