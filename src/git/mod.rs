//! Version-control operations used by the release workflow
//!
//! The workflow depends on the [Repository] trait rather than a concrete backend.
//! Implementations:
//!
//! - [system::SystemGit]: shells out to the `git` binary (default)
//! - [repository::Git2Repository]: uses the `git2` crate
//! - [mock::MockRepository]: in-memory history that records tag and push calls

pub mod mock;
pub mod repository;
pub mod system;

pub use mock::MockRepository;
pub use repository::Git2Repository;
pub use system::SystemGit;

use crate::error::Result;
use std::ops::ControlFlow;

/// Callback invoked once per commit with the tag names decorating it.
///
/// Returning [ControlFlow::Break] stops the walk; the backend treats that as a
/// clean termination, not an error.
pub type TagVisitor<'a> = dyn FnMut(&[String]) -> ControlFlow<()> + 'a;

/// Common git operation trait for abstraction
///
/// All implementors must be `Send + Sync`. Failed subprocesses surface as
/// [crate::error::ReleaseError::Command] carrying the captured stderr.
pub trait Repository: Send + Sync {
    /// Whether the checkout is a shallow clone
    fn is_shallow(&self) -> Result<bool>;

    /// Resolve a revision to the full SHA of the commit it names
    fn rev_parse(&self, rev: &str) -> Result<String>;

    /// Walk history reachable from `head`, most recent commit first
    ///
    /// `visit` receives the tag names on each commit, in decoration order. Commits
    /// without tags may be skipped by the backend.
    fn walk_tags(&self, head: &str, visit: &mut TagVisitor<'_>) -> Result<()>;

    /// Create a lightweight tag `name` pointing at `target` (any revision)
    fn create_tag(&self, name: &str, target: &str) -> Result<()>;

    /// Push tag `name` to `remote`
    fn push_tag(&self, remote: &str, name: &str) -> Result<()>;
}
