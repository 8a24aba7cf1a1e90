//! Display formatting for terminal output
//!
//! Provides utilities for formatting the configuration and integrity results
//! for terminal display.

pub mod status;

pub use status::{format_integrity, format_status};
