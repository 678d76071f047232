//! Domain logic - pure release rules independent of git and GitHub I/O

pub mod change_level;
pub mod pull;
pub mod result;
pub mod tag;
pub mod version;

pub use change_level::ChangeLevel;
pub use pull::{dedupe_by_number, PullRequest};
pub use result::{ReleaseResult, StopReason};
pub use tag::{resolve_previous, resolve_previous_ref, PrevTagQuery, ResolvedPrevious};
pub use version::{bump, parse_strict};
