use crate::error::{ReleaseError, Result};
use crate::git::{Repository, TagVisitor};
use std::sync::Mutex;

/// Mock repository for testing without actual git operations
///
/// History is a list of commits, newest first, each carrying its tag names.
/// Tag creation and pushes are recorded instead of performed.
#[derive(Default)]
pub struct MockRepository {
    history: Vec<Vec<String>>,
    shallow: bool,
    fail_push: bool,
    visited: Mutex<usize>,
    created: Mutex<Vec<(String, String)>>,
    pushed: Mutex<Vec<(String, String)>>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an older commit carrying the given tags
    pub fn with_commit<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.history.push(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Mark the checkout as a shallow clone
    pub fn shallow(mut self) -> Self {
        self.shallow = true;
        self
    }

    /// Make every push fail
    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    /// Number of commits handed to the visitor so far
    pub fn visited(&self) -> usize {
        *self.visited.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Tags created so far as `(name, target)` pairs
    pub fn created_tags(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Pushes so far as `(remote, tag)` pairs
    pub fn pushed_tags(&self) -> Vec<(String, String)> {
        self.pushed.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Repository for MockRepository {
    fn is_shallow(&self) -> Result<bool> {
        Ok(self.shallow)
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        Ok(rev.to_string())
    }

    fn walk_tags(&self, _head: &str, visit: &mut TagVisitor<'_>) -> Result<()> {
        for tags in &self.history {
            *self.visited.lock().unwrap_or_else(|p| p.into_inner()) += 1;
            if tags.is_empty() {
                continue;
            }
            if visit(tags).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn create_tag(&self, name: &str, target: &str) -> Result<()> {
        self.created
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((name.to_string(), target.to_string()));
        Ok(())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        if self.fail_push {
            return Err(ReleaseError::command(
                format!("git push {} refs/tags/{}", remote, name),
                Some(1),
                b"remote: permission denied",
            ));
        }
        self.pushed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((remote.to_string(), name.to_string()));
        Ok(())
    }
}
