//! User interface module - human-readable output on stderr.

pub mod formatter;

pub use formatter::{display_error, display_status, display_success, display_summary};
