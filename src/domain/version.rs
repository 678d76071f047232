use super::ChangeLevel;
use crate::error::{ReleaseError, Result};
use semver::{BuildMetadata, Prerelease, Version};

/// Parse a version string strictly: no `v` prefix, exactly `X.Y.Z` with optional
/// prerelease and build metadata.
pub fn parse_strict(text: &str) -> Result<Version> {
    Version::parse(text)
        .map_err(|e| ReleaseError::version(format!("Invalid version '{}': {}", text, e)))
}

/// Compute the version that follows `previous` for the given change level.
///
/// Returns `None` when the change level does not warrant a release. Any bump
/// drops prerelease and build metadata from the previous version.
pub fn bump(previous: &Version, level: ChangeLevel) -> Option<Version> {
    let (major, minor, patch) = match level {
        ChangeLevel::None => return None,
        ChangeLevel::Major => (previous.major + 1, 0, 0),
        ChangeLevel::Minor => (previous.major, previous.minor + 1, 0),
        ChangeLevel::Patch => (previous.major, previous.minor, previous.patch + 1),
    };
    Some(Version {
        major,
        minor,
        patch,
        pre: Prerelease::EMPTY,
        build: BuildMetadata::EMPTY,
    })
}
