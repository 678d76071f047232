//! Previous release resolution from tag history

use crate::error::Result;
use crate::git::Repository;
use semver::{Version, VersionReq};
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// What to look for when resolving the previous release tag
#[derive(Debug, Clone)]
pub struct PrevTagQuery {
    /// Revision to start walking history from
    pub head: String,
    /// Acceptable tag prefixes; earlier entries win version ties
    pub prefixes: Vec<String>,
    /// Reported as the previous reference when no tag qualifies
    pub fallback: String,
    /// Versions must match this requirement when set
    pub constraint: Option<VersionReq>,
    /// Reject versions carrying prerelease or build metadata
    pub stable_only: bool,
}

impl PrevTagQuery {
    pub fn new(head: impl Into<String>) -> Self {
        PrevTagQuery {
            head: head.into(),
            prefixes: Vec::new(),
            fallback: String::new(),
            constraint: None,
            stable_only: false,
        }
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn with_constraint(mut self, constraint: VersionReq) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn stable_only(mut self) -> Self {
        self.stable_only = true;
        self
    }

    fn effective_prefixes(&self) -> Vec<&str> {
        if self.prefixes.is_empty() {
            vec![""]
        } else {
            self.prefixes.iter().map(String::as_str).collect()
        }
    }

    /// Whether a parsed version may serve as the previous release
    pub fn accepts(&self, version: &Version) -> bool {
        if self.stable_only && (!version.pre.is_empty() || !version.build.is_empty()) {
            return false;
        }
        self.constraint
            .as_ref()
            .map_or(true, |req| req.matches(version))
    }

    /// All qualifying candidates among the tags of a single commit
    pub fn candidates(&self, tags: &[String]) -> Vec<Candidate> {
        let prefixes = self.effective_prefixes();
        let mut found = Vec::new();
        for tag in tags {
            for (prefix_index, prefix) in prefixes.iter().enumerate() {
                let Some(rest) = tag.strip_prefix(prefix) else {
                    continue;
                };
                let version = match Version::parse(rest) {
                    Ok(version) => version,
                    Err(e) => {
                        trace!(tag = %tag, prefix = %prefix, error = %e, "skipping non-semver tag");
                        continue;
                    }
                };
                if !self.accepts(&version) {
                    trace!(tag = %tag, "skipping tag outside constraint");
                    continue;
                }
                found.push(Candidate {
                    tag: tag.clone(),
                    prefix_index,
                    version,
                });
            }
        }
        found
    }
}

/// A tag that parsed under one of the configured prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub tag: String,
    pub prefix_index: usize,
    pub version: Version,
}

/// The previous release found in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrevious {
    /// Full tag name, prefix included
    pub tag: String,
    pub prefix: String,
    pub version: Version,
}

/// Highest version wins; on equal versions the earlier prefix wins.
pub fn select_best(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().max_by(|a, b| {
        a.version
            .cmp(&b.version)
            .then_with(|| b.prefix_index.cmp(&a.prefix_index))
    })
}

/// Find the previous release tag reachable from `query.head`.
///
/// The walk stops at the first commit carrying any qualifying tag, and the winner
/// is chosen among that commit's tags only. Older commits are never consulted,
/// even when one of them carries a tag under a higher-priority prefix.
pub fn resolve_previous<R>(repo: &R, query: &PrevTagQuery) -> Result<Option<ResolvedPrevious>>
where
    R: Repository + ?Sized,
{
    let mut found = Vec::new();
    repo.walk_tags(&query.head, &mut |tags| {
        found = query.candidates(tags);
        if found.is_empty() {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    })?;

    let prefixes = query.effective_prefixes();
    let resolved = select_best(found).map(|winner| ResolvedPrevious {
        prefix: prefixes[winner.prefix_index].to_string(),
        tag: winner.tag,
        version: winner.version,
    });
    match &resolved {
        Some(previous) => debug!(tag = %previous.tag, "resolved previous release"),
        None => debug!(head = %query.head, "no previous release tag in history"),
    }
    Ok(resolved)
}

/// Like [resolve_previous], but yields the tag name or the configured fallback
pub fn resolve_previous_ref<R>(repo: &R, query: &PrevTagQuery) -> Result<String>
where
    R: Repository + ?Sized,
{
    Ok(resolve_previous(repo, query)?
        .map(|previous| previous.tag)
        .unwrap_or_else(|| query.fallback.clone()))
}
