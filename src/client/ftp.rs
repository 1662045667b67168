use std::fmt;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ClientConfig;
use crate::error::{FtpError, ProtocolError};
use crate::navigate;
use crate::protocol::responses::OK;
use crate::protocol::{Command, Reply};
use crate::session::{Session, SessionState};
use crate::storage;
use crate::transfer::{self, TransferRequest, TransferResult, TransferType};

/// An FTP client.
///
/// ```no_run
/// use rax_ftp_client::FtpClient;
///
/// # async fn demo() -> Result<(), rax_ftp_client::FtpError> {
/// let mut ftp = FtpClient::new("ftp.example.com", "user", "secret");
/// ftp.open().await?;
/// ftp.login().await?;
/// ftp.get_binary_file("pub/archive.tar.gz", "archive.tar.gz").await?;
/// ftp.close().await;
/// # Ok(())
/// # }
/// ```
pub struct FtpClient {
    session: Session,
}

impl FtpClient {
    pub fn new(
        hostname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::with_config(hostname, user, password, ClientConfig::default())
    }

    /// Client logging in as `anonymous` with an empty password
    pub fn anonymous(hostname: impl Into<String>) -> Self {
        Self::new(hostname, "anonymous", "")
    }

    pub fn with_config(
        hostname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        config: ClientConfig,
    ) -> Self {
        Self {
            session: Session::new(hostname, user, password, config),
        }
    }

    /// Runs `f` on a freshly opened and logged in client, closing it on
    /// every exit path.
    pub async fn open_scoped<T, F>(
        hostname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        f: F,
    ) -> Result<T, FtpError>
    where
        F: AsyncFnOnce(&mut FtpClient) -> Result<T, FtpError>,
    {
        Self::new(hostname, user, password).run(f).await
    }

    /// Opens and logs in, runs `f`, then closes regardless of the outcome.
    pub async fn run<T, F>(mut self, f: F) -> Result<T, FtpError>
    where
        F: AsyncFnOnce(&mut FtpClient) -> Result<T, FtpError>,
    {
        let result = match self.open_and_login().await {
            Ok(()) => f(&mut self).await,
            Err(e) => Err(e),
        };
        self.close().await;
        result
    }

    async fn open_and_login(&mut self) -> Result<(), FtpError> {
        self.open().await?;
        self.login().await
    }

    // --------------------
    // Session lifecycle
    // --------------------

    pub fn hostname(&self) -> &str {
        self.session.hostname()
    }

    pub fn user(&self) -> &str {
        self.session.user()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// True only in the `Closed` state; a client that was never opened is
    /// in `ToInit` and reports false.
    pub fn is_closed(&self) -> bool {
        self.session.state() == SessionState::Closed
    }

    pub fn config(&self) -> &ClientConfig {
        self.session.config()
    }

    /// Connects and reads the greeting
    pub async fn open(&mut self) -> Result<Reply, FtpError> {
        self.session.open().await
    }

    pub async fn connect(&mut self) -> Result<Reply, FtpError> {
        self.open().await
    }

    pub async fn login(&mut self) -> Result<(), FtpError> {
        self.session.login().await
    }

    pub async fn login_with(
        &mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<(), FtpError> {
        self.session.login_with(user, password).await
    }

    pub async fn close(&mut self) {
        self.session.close().await
    }

    pub async fn quit(&mut self) {
        self.close().await
    }

    /// Message of the last reply received, if connected
    pub fn last_message(&self) -> Option<String> {
        self.session.last_reply().map(Reply::message)
    }

    // --------------------
    // Transfers
    // --------------------

    pub async fn get(
        &mut self,
        remote: &str,
        local: impl AsRef<Path>,
        transfer_type: TransferType,
    ) -> Result<TransferResult, FtpError> {
        transfer::retrieve(&mut self.session, remote, local.as_ref(), transfer_type).await
    }

    pub async fn put(
        &mut self,
        local: impl AsRef<Path>,
        remote: &str,
        transfer_type: TransferType,
    ) -> Result<TransferResult, FtpError> {
        transfer::store(&mut self.session, local.as_ref(), remote, transfer_type).await
    }

    pub async fn get_binary_file(
        &mut self,
        remote: &str,
        local: impl AsRef<Path>,
    ) -> Result<TransferResult, FtpError> {
        self.get(remote, local, TransferType::Binary).await
    }

    pub async fn get_text_file(
        &mut self,
        remote: &str,
        local: impl AsRef<Path>,
    ) -> Result<TransferResult, FtpError> {
        self.get(remote, local, TransferType::Text).await
    }

    pub async fn put_binary_file(
        &mut self,
        local: impl AsRef<Path>,
        remote: &str,
    ) -> Result<TransferResult, FtpError> {
        self.put(local, remote, TransferType::Binary).await
    }

    pub async fn put_text_file(
        &mut self,
        local: impl AsRef<Path>,
        remote: &str,
    ) -> Result<TransferResult, FtpError> {
        self.put(local, remote, TransferType::Text).await
    }

    /// Downloads into any writer instead of a local file
    pub async fn retrieve_to<W>(
        &mut self,
        remote: &str,
        writer: &mut W,
        transfer_type: TransferType,
    ) -> Result<TransferResult, FtpError>
    where
        W: AsyncWrite + Unpin,
    {
        transfer::retrieve_to(&mut self.session, remote, writer, transfer_type).await
    }

    /// Uploads from any reader instead of a local file
    pub async fn store_from<R>(
        &mut self,
        reader: &mut R,
        remote: &str,
        transfer_type: TransferType,
    ) -> Result<TransferResult, FtpError>
    where
        R: AsyncRead + Unpin,
    {
        transfer::store_from(&mut self.session, reader, remote, transfer_type).await
    }

    pub async fn transfer(&mut self, request: &TransferRequest) -> Result<TransferResult, FtpError> {
        transfer::execute(&mut self.session, request).await
    }

    // --------------------
    // Listings and navigation
    // --------------------

    /// Long listing (LIST) of `path`, or of the working directory
    pub async fn dir(&mut self, path: Option<&str>) -> Result<Vec<String>, FtpError> {
        transfer::list(&mut self.session, path).await
    }

    pub async fn list(&mut self, path: Option<&str>) -> Result<Vec<String>, FtpError> {
        self.dir(path).await
    }

    /// Name listing (NLST) of `path`, or of the working directory
    pub async fn nlst(&mut self, path: Option<&str>) -> Result<Vec<String>, FtpError> {
        transfer::name_list(&mut self.session, path).await
    }

    pub async fn ls(&mut self, path: Option<&str>) -> Result<Vec<String>, FtpError> {
        self.nlst(path).await
    }

    /// Changes directory and returns the new working directory
    pub async fn chdir(&mut self, path: &str) -> Result<String, FtpError> {
        navigate::change_directory(&mut self.session, path).await
    }

    pub async fn cd(&mut self, path: &str) -> Result<String, FtpError> {
        self.chdir(path).await
    }

    pub async fn cdup(&mut self) -> Result<String, FtpError> {
        navigate::change_to_parent(&mut self.session).await
    }

    pub async fn pwd(&mut self) -> Result<String, FtpError> {
        navigate::print_working_directory(&mut self.session).await
    }

    pub async fn mkdir(&mut self, path: &str) -> Result<String, FtpError> {
        navigate::make_directory(&mut self.session, path).await
    }

    pub async fn rmdir(&mut self, path: &str) -> Result<(), FtpError> {
        navigate::remove_directory(&mut self.session, path).await
    }

    // --------------------
    // File management
    // --------------------

    pub async fn delete(&mut self, path: &str) -> Result<(), FtpError> {
        storage::delete_file(&mut self.session, path).await
    }

    pub async fn rename(&mut self, from: &str, to: &str) -> Result<(), FtpError> {
        storage::rename_file(&mut self.session, from, to).await
    }

    pub async fn size(&mut self, path: &str) -> Result<Option<u64>, FtpError> {
        storage::file_size(&mut self.session, path).await
    }

    pub async fn site(&mut self, args: &str) -> Result<Reply, FtpError> {
        storage::site_command(&mut self.session, args).await
    }

    pub async fn noop(&mut self) -> Result<(), FtpError> {
        self.session.require_logged_in("noop")?;

        let reply = self.session.command(Command::Noop).await?;
        if reply.code() != OK {
            return Err(ProtocolError::unexpected("NOOP", &reply).into());
        }
        Ok(())
    }
}

impl fmt::Debug for FtpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpClient")
            .field("user", &self.session.user())
            .field("hostname", &self.session.hostname())
            .field("state", &self.session.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;

    #[test]
    fn test_fresh_client() {
        let ftp = FtpClient::anonymous("ftp.example.com");
        assert_eq!(ftp.state(), SessionState::ToInit);
        assert!(!ftp.is_closed());
        assert_eq!(ftp.user(), "anonymous");
        assert!(ftp.last_message().is_none());
    }

    #[tokio::test]
    async fn test_operations_need_login() {
        let mut ftp = FtpClient::new("ftp.example.com", "user", "secret");

        let err = ftp.nlst(None).await.unwrap_err();
        assert!(matches!(
            err,
            FtpError::State(StateError::NotLoggedIn {
                operation: "nlst",
                state: SessionState::ToInit
            })
        ));
        assert!(matches!(
            ftp.get_binary_file("a", "/nonexistent/dir/a").await,
            Err(FtpError::State(StateError::NotLoggedIn { .. }))
        ));
        assert!(matches!(
            ftp.cd("/").await,
            Err(FtpError::State(StateError::NotLoggedIn { .. }))
        ));

        ftp.close().await;
        assert!(ftp.is_closed());
        assert!(matches!(
            ftp.noop().await,
            Err(FtpError::State(StateError::NotLoggedIn {
                state: SessionState::Closed,
                ..
            }))
        ));
    }

    #[test]
    fn test_debug_format() {
        let ftp = FtpClient::new("ftp.example.com", "bob", "hunter2");
        let out = format!("{ftp:?}");
        assert_eq!(
            out,
            "FtpClient { user: \"bob\", hostname: \"ftp.example.com\", state: ToInit, .. }"
        );
    }
}
