use super::ChangeLevel;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A merged pull request linked to a commit in the release range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub change_level: ChangeLevel,
}

impl PullRequest {
    /// Create a pull request with an unclassified change level
    pub fn new<I, S>(number: u64, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PullRequest {
            number,
            labels: labels.into_iter().map(Into::into).collect(),
            change_level: ChangeLevel::None,
        }
    }
}

/// Deduplicate pull requests by number.
///
/// One pull request can be linked to several commits in a range. When the same
/// number shows up more than once the label sets are merged, so the outcome does
/// not depend on which commit's lookup came back first. Output is sorted by number.
pub fn dedupe_by_number<I>(pulls: I) -> Vec<PullRequest>
where
    I: IntoIterator<Item = PullRequest>,
{
    let mut by_number: BTreeMap<u64, PullRequest> = BTreeMap::new();
    for pull in pulls {
        by_number
            .entry(pull.number)
            .and_modify(|existing| {
                existing.labels.extend(pull.labels.iter().cloned());
                existing.change_level = existing.change_level.max(pull.change_level);
            })
            .or_insert(pull);
    }
    by_number.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_merges_duplicates() {
        let pulls = vec![
            PullRequest::new(7, ["semver:patch"]),
            PullRequest::new(3, Vec::<String>::new()),
            PullRequest::new(7, ["semver:patch"]),
        ];
        let deduped = dedupe_by_number(pulls);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].number, 3);
        assert_eq!(deduped[1].number, 7);
    }

    #[test]
    fn test_dedupe_is_order_independent() {
        let a = vec![PullRequest::new(1, ["a"]), PullRequest::new(1, ["b"])];
        let b = vec![PullRequest::new(1, ["b"]), PullRequest::new(1, ["a"])];
        assert_eq!(dedupe_by_number(a), dedupe_by_number(b));
    }

    #[test]
    fn test_labels_are_a_set() {
        let pull = PullRequest::new(1, ["bug", "bug", "docs"]);
        assert_eq!(pull.labels.len(), 2);
    }
}
