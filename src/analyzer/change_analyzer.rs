use crate::domain::{dedupe_by_number, ChangeLevel, PullRequest};
use crate::error::Result;
use crate::github::GithubClient;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Result of analyzing the commits between two revisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeAnalysis {
    /// Commits in the range, as returned by the compare API
    pub commits: Vec<String>,
    /// Merged pull requests linked to those commits, deduplicated and classified
    pub pulls: Vec<PullRequest>,
    /// Highest change level across all pulls
    pub change_level: ChangeLevel,
}

/// Classifies pull requests by their labels
///
/// Label matching is case-insensitive. A pull carrying several mapped labels
/// takes the highest of their levels; unmapped labels are ignored.
#[derive(Debug, Clone)]
pub struct ChangeAnalyzer {
    labels: HashMap<String, ChangeLevel>,
}

impl ChangeAnalyzer {
    /// Create an analyzer from a label to change level mapping
    pub fn new<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a ChangeLevel)>,
    {
        ChangeAnalyzer {
            labels: labels
                .into_iter()
                .map(|(label, level)| (label.to_lowercase(), *level))
                .collect(),
        }
    }

    /// Analyzer using the built-in label set
    pub fn with_default_labels() -> Self {
        Self::new(&default_labels())
    }

    /// Change level implied by a single pull request's labels
    pub fn classify(&self, pull: &PullRequest) -> ChangeLevel {
        pull.labels
            .iter()
            .filter_map(|label| self.labels.get(&label.to_lowercase()))
            .copied()
            .max()
            .unwrap_or_default()
    }

    /// Highest change level across a set of pulls; `None` for an empty set
    pub fn aggregate(&self, pulls: &[PullRequest]) -> ChangeLevel {
        pulls
            .iter()
            .map(|pull| self.classify(pull))
            .max()
            .unwrap_or_default()
    }

    /// Look up the merged pulls for every commit in `base...head` and classify them
    ///
    /// Per-commit lookups run in parallel. The first failed lookup fails the
    /// whole analysis.
    pub fn analyze_range<G>(&self, github: &G, base: &str, head: &str) -> Result<RangeAnalysis>
    where
        G: GithubClient + ?Sized,
    {
        let commits = github.commits_between(base, head)?;
        debug!(base = %base, head = %head, commits = commits.len(), "comparing range");

        let linked: Vec<Vec<PullRequest>> = commits
            .par_iter()
            .map(|sha| github.merged_pulls_for_commit(sha))
            .collect::<Result<_>>()?;

        let mut pulls = dedupe_by_number(linked.into_iter().flatten());
        for pull in &mut pulls {
            pull.change_level = self.classify(pull);
        }
        let change_level = self.aggregate(&pulls);
        debug!(pulls = pulls.len(), level = %change_level, "classified range");

        Ok(RangeAnalysis {
            commits,
            pulls,
            change_level,
        })
    }
}

impl Default for ChangeAnalyzer {
    fn default() -> Self {
        Self::with_default_labels()
    }
}

/// Built-in label mapping
pub fn default_labels() -> BTreeMap<String, ChangeLevel> {
    [
        ("semver:major", ChangeLevel::Major),
        ("semver:breaking", ChangeLevel::Major),
        ("breaking", ChangeLevel::Major),
        ("semver:minor", ChangeLevel::Minor),
        ("enhancement", ChangeLevel::Minor),
        ("semver:patch", ChangeLevel::Patch),
        ("bug", ChangeLevel::Patch),
        ("semver:none", ChangeLevel::None),
    ]
    .into_iter()
    .map(|(label, level)| (label.to_string(), level))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockGithub;

    fn pull(number: u64, labels: &[&str]) -> PullRequest {
        PullRequest::new(number, labels.iter().copied())
    }

    #[test]
    fn test_classify_single_label() {
        let analyzer = ChangeAnalyzer::default();
        assert_eq!(analyzer.classify(&pull(1, &["semver:minor"])), ChangeLevel::Minor);
        assert_eq!(analyzer.classify(&pull(2, &["bug"])), ChangeLevel::Patch);
        assert_eq!(analyzer.classify(&pull(3, &["breaking"])), ChangeLevel::Major);
    }

    #[test]
    fn test_classify_unlabeled_is_none() {
        let analyzer = ChangeAnalyzer::default();
        assert_eq!(analyzer.classify(&pull(1, &[])), ChangeLevel::None);
        assert_eq!(analyzer.classify(&pull(2, &["documentation"])), ChangeLevel::None);
    }

    #[test]
    fn test_classify_takes_highest_label() {
        let analyzer = ChangeAnalyzer::default();
        let p = pull(1, &["semver:patch", "semver:major", "semver:none"]);
        assert_eq!(analyzer.classify(&p), ChangeLevel::Major);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let analyzer = ChangeAnalyzer::default();
        assert_eq!(analyzer.classify(&pull(1, &["SemVer:Minor"])), ChangeLevel::Minor);
    }

    #[test]
    fn test_custom_labels() {
        let mut labels = BTreeMap::new();
        labels.insert("Feature".to_string(), ChangeLevel::Minor);
        let analyzer = ChangeAnalyzer::new(&labels);
        assert_eq!(analyzer.classify(&pull(1, &["feature"])), ChangeLevel::Minor);
        assert_eq!(analyzer.classify(&pull(2, &["semver:major"])), ChangeLevel::None);
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert_eq!(ChangeAnalyzer::default().aggregate(&[]), ChangeLevel::None);
    }

    #[test]
    fn test_aggregate_is_max() {
        let analyzer = ChangeAnalyzer::default();
        let pulls = vec![pull(1, &["bug"]), pull(2, &["semver:minor"]), pull(3, &[])];
        assert_eq!(analyzer.aggregate(&pulls), ChangeLevel::Minor);
    }

    #[test]
    fn test_aggregate_order_independent() {
        let analyzer = ChangeAnalyzer::default();
        let mut pulls = vec![pull(1, &["bug"]), pull(2, &["breaking"]), pull(3, &["semver:none"])];
        let forward = analyzer.aggregate(&pulls);
        pulls.reverse();
        assert_eq!(analyzer.aggregate(&pulls), forward);
    }

    #[test]
    fn test_aggregate_ignores_duplicates() {
        let analyzer = ChangeAnalyzer::default();
        let once = vec![pull(1, &["semver:minor"]), pull(2, &["bug"])];
        let twice = vec![
            pull(1, &["semver:minor"]),
            pull(2, &["bug"]),
            pull(1, &["semver:minor"]),
        ];
        assert_eq!(analyzer.aggregate(&once), analyzer.aggregate(&twice));
    }

    #[test]
    fn test_analyze_range_dedupes_across_commits() {
        let github = MockGithub::new()
            .with_commit("aaa", vec![pull(5, &["semver:patch"])])
            .with_commit("bbb", vec![pull(5, &["semver:patch"]), pull(6, &["semver:minor"])])
            .with_commit("ccc", vec![]);

        let analysis = ChangeAnalyzer::default()
            .analyze_range(&github, "v1.0.0", "HEAD")
            .unwrap();

        assert_eq!(analysis.commits.len(), 3);
        let numbers: Vec<u64> = analysis.pulls.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![5, 6]);
        assert_eq!(analysis.pulls[0].change_level, ChangeLevel::Patch);
        assert_eq!(analysis.change_level, ChangeLevel::Minor);
    }

    #[test]
    fn test_analyze_range_level_agrees_with_aggregate() {
        // Pull 7 only reaches major once its labels from both commits are merged.
        let github = MockGithub::new()
            .with_commit("aaa", vec![pull(7, &["bug"])])
            .with_commit("bbb", vec![pull(7, &["breaking"]), pull(8, &["semver:minor"])]);
        let analyzer = ChangeAnalyzer::default();

        let analysis = analyzer.analyze_range(&github, "v1.0.0", "HEAD").unwrap();

        assert_eq!(analysis.change_level, ChangeLevel::Major);
        assert_eq!(analysis.change_level, analyzer.aggregate(&analysis.pulls));
    }

    #[test]
    fn test_analyze_empty_range() {
        let analysis = ChangeAnalyzer::default()
            .analyze_range(&MockGithub::new(), "v1.0.0", "HEAD")
            .unwrap();
        assert!(analysis.commits.is_empty());
        assert_eq!(analysis.change_level, ChangeLevel::None);
    }
}
