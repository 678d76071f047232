//! Release workflow
//!
//! Resolves the next version and drives the gated sequence of side effects:
//! hooks, module validation, tag, push, notes, GitHub release.

pub mod runner;

pub use runner::{ReleaseRunner, RELEASE_NOTES_FILE, RELEASE_TARGET_FILE};
