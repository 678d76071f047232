use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Impact of a set of merged pull requests.
///
/// The derived ordering is the aggregation order: `None < Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChangeLevel {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl ChangeLevel {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeLevel::None => "none",
            ChangeLevel::Patch => "patch",
            ChangeLevel::Minor => "minor",
            ChangeLevel::Major => "major",
        }
    }
}

impl fmt::Display for ChangeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChangeLevel {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ChangeLevel::None),
            "patch" => Ok(ChangeLevel::Patch),
            "minor" => Ok(ChangeLevel::Minor),
            "major" => Ok(ChangeLevel::Major),
            other => Err(ReleaseError::config(format!(
                "Unknown change level '{}' - expected none, patch, minor or major",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(ChangeLevel::None < ChangeLevel::Patch);
        assert!(ChangeLevel::Patch < ChangeLevel::Minor);
        assert!(ChangeLevel::Minor < ChangeLevel::Major);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("MAJOR".parse::<ChangeLevel>().unwrap(), ChangeLevel::Major);
        assert_eq!(" patch ".parse::<ChangeLevel>().unwrap(), ChangeLevel::Patch);
        assert!("breaking".parse::<ChangeLevel>().is_err());
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&ChangeLevel::Minor).unwrap();
        assert_eq!(json, "\"minor\"");
    }
}
