//! Utility functions
//!
//! Provides logging and network helpers.

pub mod logging;
pub mod network;
