//! Release hooks
//!
//! User-supplied shell commands run at two workflow points:
//! - prerelease: after the next version is known, before anything is tagged
//! - postrelease: after the GitHub release exists

pub mod executor;
pub mod lifecycle;

pub use executor::{HookExecutor, HookOutcome, ABORT_EXIT_CODE};
pub use lifecycle::{HookContext, HookType};
