//! GitHub API facade
//!
//! The release workflow talks to GitHub only through [GithubClient]. Every
//! paginated listing is drained before it is returned, and rate limiting is
//! handled inside the client, so callers never see partial pages or 429s.

pub mod client;
pub mod mock;
pub mod pagination;

pub use client::RestClient;
pub use mock::MockGithub;
pub use pagination::{drain_pages, next_link, Page};

use crate::domain::PullRequest;
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Repository identifier in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoId {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(RepoId::new(owner, name))
            }
            _ => Err(ReleaseError::config(format!(
                "Invalid repository '{}' - expected owner/name",
                s
            ))),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Release object to publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    /// `"true"`, `"false"` or `"legacy"` (latest by creation date and semver)
    pub make_latest: String,
}

impl NewRelease {
    /// Release named after its tag, using legacy "latest" semantics
    pub fn for_tag(tag: impl Into<String>, body: impl Into<String>) -> Self {
        let tag = tag.into();
        NewRelease {
            name: tag.clone(),
            tag_name: tag,
            body: body.into(),
            make_latest: "legacy".to_string(),
        }
    }
}

/// Operations the release workflow needs from the hosting API.
///
/// Implementors are scoped to one repository and must be `Send + Sync` so
/// per-commit lookups can run in parallel.
pub trait GithubClient: Send + Sync {
    /// Merged pull requests associated with a commit; unmerged ones are excluded
    fn merged_pulls_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>>;

    /// Commits reachable from `head` but not from `base`, oldest first
    fn commits_between(&self, base: &str, head: &str) -> Result<Vec<String>>;

    /// Release notes generated by GitHub for `tag`, compared against `previous_tag`
    fn generate_release_notes(&self, tag: &str, previous_tag: &str) -> Result<String>;

    /// Publish a release
    fn create_release(&self, release: &NewRelease) -> Result<()>;
}
