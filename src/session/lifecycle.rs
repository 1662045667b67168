use std::fmt;
use std::net::SocketAddr;

use log::{debug, error, info, warn};
use tokio::net::TcpStream;

use crate::config::ClientConfig;
use crate::control::ControlChannel;
use crate::error::{AuthError, FtpError, StateError};
use crate::protocol::responses::{ACCOUNT_REQUIRED, LOGIN_SUCCESS};
use crate::protocol::{Command, Reply};
use crate::session::SessionState;

/// One FTP session: credentials, state and the control channel it owns.
pub struct Session {
    hostname: String,
    user: String,
    password: String,
    state: SessionState,
    control: Option<ControlChannel<TcpStream>>,
    config: ClientConfig,
}

impl Session {
    pub fn new(
        hostname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        config: ClientConfig,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            user: user.into(),
            password: password.into(),
            state: SessionState::ToInit,
            control: None,
            config,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Reply most recently received on the control channel
    pub fn last_reply(&self) -> Option<&Reply> {
        self.control.as_ref().and_then(ControlChannel::last_reply)
    }

    pub fn control_local_addr(&self) -> Result<SocketAddr, FtpError> {
        match &self.control {
            Some(control) => Ok(control.local_addr()?),
            None => Err(StateError::NotConnected {
                operation: "local address",
                state: self.state,
            }
            .into()),
        }
    }

    // --------------------
    // Lifecycle
    // --------------------

    /// Connects the control channel and waits for the greeting.
    ///
    /// Leaves the session `Closed` if either step fails. An invalid
    /// configuration is rejected before any connection is attempted.
    pub async fn open(&mut self) -> Result<Reply, FtpError> {
        if self.state.is_connected() {
            return Err(StateError::AlreadyConnected(self.hostname.clone()).into());
        }
        self.config.validate()?;
        self.state = SessionState::Closed;

        let mut control =
            ControlChannel::connect(&self.hostname, self.config.port, &self.config).await?;
        // dropping `control` on error releases the socket
        let greeting = control.wait_greeting().await?;

        info!(
            "Connected to {}:{} ({})",
            self.hostname,
            self.config.port,
            greeting.text()
        );
        self.control = Some(control);
        self.state = SessionState::Connected;
        Ok(greeting)
    }

    /// Logs in with the stored credentials.
    pub async fn login(&mut self) -> Result<(), FtpError> {
        match self.state {
            SessionState::LoggedIn => {
                return Err(StateError::AlreadyLoggedIn(self.user.clone()).into());
            }
            SessionState::ToInit | SessionState::Closed => {
                return Err(StateError::NotConnected {
                    operation: "login",
                    state: self.state,
                }
                .into());
            }
            SessionState::Connected => {}
        }

        let reply = self.command(Command::User(self.user.clone())).await?;
        let reply = match reply.code() {
            LOGIN_SUCCESS => reply,
            ACCOUNT_REQUIRED => return Err(self.auth_failure(&reply)),
            // 331 normally, but any 3xx asks for the password
            _ if reply.is_intermediate() => {
                self.command(Command::Pass(self.password.clone())).await?
            }
            _ => return Err(self.auth_failure(&reply)),
        };

        if !reply.is_completion() {
            return Err(self.auth_failure(&reply));
        }

        info!("Logged in as {}", self.user);
        self.state = SessionState::LoggedIn;
        Ok(())
    }

    /// Replaces the stored credentials, then logs in.
    pub async fn login_with(
        &mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<(), FtpError> {
        if self.state.is_logged_in() {
            return Err(StateError::AlreadyLoggedIn(self.user.clone()).into());
        }
        self.user = user.into();
        self.password = password.into();
        self.login().await
    }

    fn auth_failure(&self, reply: &Reply) -> FtpError {
        warn!("Login failed for {}: {reply}", self.user);
        if reply.code() == ACCOUNT_REQUIRED {
            AuthError::AccountRequired(self.user.clone()).into()
        } else {
            AuthError::Rejected {
                user: self.user.clone(),
                code: reply.code(),
                message: reply.message(),
            }
            .into()
        }
    }

    /// Best-effort QUIT, then `Closed`. Safe to call in any state.
    pub async fn close(&mut self) {
        if let Some(control) = self.control.take() {
            control.quit().await;
            info!("Disconnected from {}", self.hostname);
        }
        self.state = SessionState::Closed;
    }

    /// Fails unless logged in. Performs no I/O.
    pub fn require_logged_in(&self, operation: &'static str) -> Result<(), StateError> {
        if self.state.is_logged_in() {
            Ok(())
        } else {
            Err(StateError::NotLoggedIn {
                operation,
                state: self.state,
            })
        }
    }

    // --------------------
    // Control channel access
    // --------------------

    fn control_mut(
        &mut self,
        operation: &'static str,
    ) -> Result<&mut ControlChannel<TcpStream>, FtpError> {
        let state = self.state;
        self.control
            .as_mut()
            .ok_or_else(|| StateError::NotConnected { operation, state }.into())
    }

    /// Sends a command and reads its reply.
    pub async fn command(&mut self, command: Command) -> Result<Reply, FtpError> {
        let result = self.control_mut(command.verb())?.send_command(command).await;
        self.check_fatal(result)
    }

    /// Sends a command without reading the reply.
    pub async fn send(&mut self, command: &Command) -> Result<(), FtpError> {
        let result = self.control_mut(command.verb())?.send(command).await;
        self.check_fatal(result)
    }

    /// Reads the next reply, e.g. a completion reply after a transfer.
    pub async fn read_reply(&mut self, stage: &'static str) -> Result<Reply, FtpError> {
        let result = self.control_mut(stage)?.read_reply(stage).await;
        self.check_fatal(result)
    }

    /// Reads and discards the reply left pending by an abandoned transfer.
    ///
    /// If nothing usable arrives within the drain timeout the command/reply
    /// pairing is lost and the session is closed.
    pub async fn drain_pending_reply(&mut self) {
        let limit = self.config.drain_timeout();
        let Some(control) = self.control.as_mut() else {
            return;
        };

        let result = control.read_reply_within("drain", limit).await;
        match result {
            Ok(reply) => debug!("Drained pending reply: {reply}"),
            Err(e) => {
                warn!("Unable to drain pending reply ({e}), closing session");
                self.reset();
            }
        }
    }

    fn check_fatal<T>(&mut self, result: Result<T, FtpError>) -> Result<T, FtpError> {
        if let Err(e) = &result {
            if e.is_fatal_to_control() {
                error!("Control connection to {} lost: {e}", self.hostname);
                self.reset();
            }
        }
        result
    }

    fn reset(&mut self) {
        self.control = None;
        self.state = SessionState::Closed;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("hostname", &self.hostname)
            .field("user", &self.user)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
