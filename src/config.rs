//! Configuration management for the RAX FTP client
//!
//! Values come from built-in defaults, an optional TOML file and
//! `RAX_FTP_*` environment overrides, in that order.

use std::net::IpAddr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::transfer::DataMode;

/// Client configuration shared by the control and data channels
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    /// Control port of the server
    /// Environment: RAX_FTP_PORT
    pub port: u16,

    /// Data connection mode, `passive` or `active`
    /// Environment: RAX_FTP_DATA_MODE
    pub data_mode: DataMode,

    /// Address the active mode listener binds to; defaults to the local
    /// address of the control connection
    pub active_bind_address: Option<IpAddr>,

    pub connect_timeout_ms: u64,
    pub command_timeout_ms: u64,

    /// Bound on accepting/connecting the data channel and on each data read
    pub data_timeout_ms: u64,

    /// Bound on reading the completion reply of an abandoned transfer
    pub drain_timeout_ms: u64,

    /// Buffer size for file transfers
    pub buffer_size: usize,

    /// Reply parser limits
    pub max_line_length: usize,
    pub max_reply_lines: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: 21,
            data_mode: DataMode::Passive,
            active_bind_address: None,
            connect_timeout_ms: 10_000,
            command_timeout_ms: 30_000,
            data_timeout_ms: 30_000,
            drain_timeout_ms: 5_000,
            buffer_size: 8192,
            max_line_length: 2048,
            max_reply_lines: 1024,
        }
    }
}

impl ClientConfig {
    /// Load configuration from an optional file with environment overrides
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("RAX_FTP").try_parsing(true))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        let timeouts = [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("command_timeout_ms", self.command_timeout_ms),
            ("data_timeout_ms", self.data_timeout_ms),
            ("drain_timeout_ms", self.drain_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(config::ConfigError::Message(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        // "nnn \n" is the shortest valid reply line
        if self.max_line_length < 5 {
            return Err(config::ConfigError::Message(
                "max_line_length must be at least 5".into(),
            ));
        }

        if self.max_reply_lines == 0 {
            return Err(config::ConfigError::Message(
                "max_reply_lines must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_millis(self.data_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
