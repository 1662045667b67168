//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::Env;

/// Setup logging for the client
///
/// Honours `RUST_LOG`, defaulting to `info`. Calling it again after a
/// logger is installed does nothing.
pub fn setup_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}
