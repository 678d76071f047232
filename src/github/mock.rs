use super::{GithubClient, NewRelease};
use crate::domain::PullRequest;
use crate::error::{ReleaseError, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory GitHub for testing the release workflow
#[derive(Default)]
pub struct MockGithub {
    commits: Vec<String>,
    pulls: HashMap<String, Vec<PullRequest>>,
    notes: String,
    fail_release: bool,
    notes_requests: Mutex<Vec<(String, String)>>,
    releases: Mutex<Vec<NewRelease>>,
}

impl MockGithub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit to the compared range, with the merged pulls linked to it
    pub fn with_commit(mut self, sha: impl Into<String>, pulls: Vec<PullRequest>) -> Self {
        let sha = sha.into();
        self.commits.push(sha.clone());
        self.pulls.entry(sha).or_default().extend(pulls);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Make release creation fail
    pub fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Generated-notes requests so far as `(tag, previous_tag)` pairs
    pub fn notes_requests(&self) -> Vec<(String, String)> {
        self.notes_requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Releases created so far
    pub fn releases(&self) -> Vec<NewRelease> {
        self.releases.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl GithubClient for MockGithub {
    fn merged_pulls_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>> {
        Ok(self.pulls.get(sha).cloned().unwrap_or_default())
    }

    fn commits_between(&self, _base: &str, _head: &str) -> Result<Vec<String>> {
        Ok(self.commits.clone())
    }

    fn generate_release_notes(&self, tag: &str, previous_tag: &str) -> Result<String> {
        self.notes_requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((tag.to_string(), previous_tag.to_string()));
        Ok(self.notes.clone())
    }

    fn create_release(&self, release: &NewRelease) -> Result<()> {
        if self.fail_release {
            return Err(ReleaseError::GithubApi {
                url: "mock://releases".to_string(),
                status: 422,
                body: "Validation Failed".to_string(),
            });
        }
        self.releases
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(release.clone());
        Ok(())
    }
}
