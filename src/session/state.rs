//! Session states
//!
//! States are totally ordered: `ToInit < Closed < Connected < LoggedIn`.

use std::fmt;

/// Lifecycle state of an FTP session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// Freshly created, no connection attempt made yet
    ToInit,
    /// No control connection; initialised, closed, or reset after a failure
    Closed,
    /// Control connection open and greeted, not authenticated
    Connected,
    LoggedIn,
}

impl SessionState {
    pub fn is_connected(self) -> bool {
        self >= SessionState::Connected
    }

    pub fn is_logged_in(self) -> bool {
        self == SessionState::LoggedIn
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::ToInit => "to_init",
            SessionState::Closed => "closed",
            SessionState::Connected => "connected",
            SessionState::LoggedIn => "logged_in",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_ordering() {
        assert!(SessionState::ToInit < SessionState::Closed);
        assert!(SessionState::Closed < SessionState::Connected);
        assert!(SessionState::Connected < SessionState::LoggedIn);

        assert!(!SessionState::Closed.is_connected());
        assert!(SessionState::LoggedIn.is_connected());
        assert!(!SessionState::Connected.is_logged_in());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::ToInit.to_string(), "to_init");
        assert_eq!(SessionState::LoggedIn.to_string(), "logged_in");
    }
}
