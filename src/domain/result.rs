use super::ChangeLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a run ended before creating everything it was asked to create.
///
/// These are normal outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No next version could be computed
    NoNextVersion,
    /// Neither tag nor release creation was requested
    TagNotRequested,
    /// Not a first release and no merged pull request warrants a bump
    NoChanges,
    /// The prerelease hook exited with the abort code
    PrereleaseHookAborted,
    /// Tag pushed; release creation was not requested
    ReleaseNotRequested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NoNextVersion => write!(f, "no next version available"),
            StopReason::TagNotRequested => write!(f, "tag creation not requested"),
            StopReason::NoChanges => {
                write!(f, "no releasable changes since the previous release")
            }
            StopReason::PrereleaseHookAborted => {
                write!(f, "prerelease hook aborted the release")
            }
            StopReason::ReleaseNotRequested => {
                write!(f, "tag created; release creation not requested")
            }
        }
    }
}

fn is_false(value: &bool) -> bool {
    !value
}

/// Externally observable outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseResult {
    pub previous_ref: String,
    pub previous_version: String,
    pub first_release: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_tag: String,
    pub change_level: ChangeLevel,
    #[serde(default, skip_serializing_if = "is_false")]
    pub created_tag: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub created_release: bool,
    #[serde(default)]
    pub prerelease_hook_output: String,
    #[serde(skip)]
    pub stop_reason: Option<StopReason>,
}

impl ReleaseResult {
    /// Record a soft stop and hand the result back
    pub fn stopped(mut self, reason: StopReason) -> Self {
        self.stop_reason = Some(reason);
        self
    }
}
