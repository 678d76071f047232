pub mod analyzer;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod github;
pub mod hooks;
pub mod output;
pub mod release;
pub mod ui;
pub mod validation;

pub use error::{ReleaseError, Result};
