use crate::analyzer::ChangeAnalyzer;
use crate::config::Config;
use crate::domain::{bump, resolve_previous, ChangeLevel, PrevTagQuery, ReleaseResult, StopReason};
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::github::{GithubClient, NewRelease};
use crate::hooks::{HookContext, HookExecutor, HookOutcome, HookType};
use crate::validation::validate_module_file;
use semver::VersionReq;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Override file a prerelease hook may write to replace generated notes
pub const RELEASE_NOTES_FILE: &str = "release-notes";
/// Override file a prerelease hook may write to tag a revision other than the head
pub const RELEASE_TARGET_FILE: &str = "release-target";

/// Drives one release run against a repository and the GitHub API
pub struct ReleaseRunner<'a> {
    config: &'a Config,
    repo: &'a dyn Repository,
    github: &'a dyn GithubClient,
    analyzer: ChangeAnalyzer,
    scratch_dir: PathBuf,
}

impl<'a> ReleaseRunner<'a> {
    pub fn new(
        config: &'a Config,
        repo: &'a dyn Repository,
        github: &'a dyn GithubClient,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        ReleaseRunner {
            config,
            repo,
            github,
            analyzer: ChangeAnalyzer::new(&config.labels),
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn release_notes_file(&self) -> PathBuf {
        self.scratch_dir.join(RELEASE_NOTES_FILE)
    }

    pub fn release_target_file(&self) -> PathBuf {
        self.scratch_dir.join(RELEASE_TARGET_FILE)
    }

    /// Work out the previous release and the version that should follow it
    ///
    /// Only stable versions under the configured prefix count as previous
    /// releases. Without one, the configured initial tag is the first release.
    pub fn next(&self) -> Result<ReleaseResult> {
        let query = PrevTagQuery::new(self.config.git_ref.clone())
            .with_prefixes([self.config.tag_prefix.clone()])
            .with_constraint(VersionReq::STAR)
            .stable_only();

        let Some(previous) = resolve_previous(self.repo, &query)? else {
            let version = self
                .config
                .initial_tag
                .strip_prefix(&self.config.tag_prefix)
                .unwrap_or(&self.config.initial_tag);
            info!(tag = %self.config.initial_tag, "no previous release, using initial tag");
            return Ok(ReleaseResult {
                first_release: true,
                release_tag: self.config.initial_tag.clone(),
                release_version: version.to_string(),
                change_level: ChangeLevel::None,
                ..Default::default()
            });
        };

        let head = self.repo.rev_parse(&self.config.git_ref)?;
        let analysis = self.analyzer.analyze_range(self.github, &previous.tag, &head)?;

        let mut result = ReleaseResult {
            previous_ref: previous.tag.clone(),
            previous_version: previous.version.to_string(),
            change_level: analysis.change_level,
            ..Default::default()
        };
        if let Some(next) = bump(&previous.version, analysis.change_level) {
            result.release_version = next.to_string();
            result.release_tag = format!("{}{}", self.config.tag_prefix, next);
        }
        info!(
            previous = %previous.tag,
            level = %result.change_level,
            pulls = analysis.pulls.len(),
            next = %result.release_tag,
            "computed next version"
        );
        Ok(result)
    }

    /// Run the full workflow
    ///
    /// Each step either completes, ends the run early with a [StopReason]
    /// recorded on the result, or fails the run with an error.
    pub fn run(&self) -> Result<ReleaseResult> {
        if self.repo.is_shallow()? {
            return Err(ReleaseError::ShallowClone);
        }

        let mut result = self.next()?;

        if result.release_version.is_empty() {
            let reason = if !result.first_release && result.change_level == ChangeLevel::None {
                StopReason::NoChanges
            } else {
                StopReason::NoNextVersion
            };
            return Ok(self.stop(result, reason));
        }
        if !self.config.wants_tag() {
            return Ok(self.stop(result, StopReason::TagNotRequested));
        }
        if !result.first_release && result.change_level == ChangeLevel::None {
            return Ok(self.stop(result, StopReason::NoChanges));
        }

        let context = self.hook_context(&result);
        if let Some(hook) = hook_command(&self.config.prerelease_hook) {
            let outcome = HookExecutor::execute(
                HookType::Prerelease,
                hook,
                &self.config.checkout_dir,
                &context,
            )?
            .into_result(HookType::Prerelease)?;
            result.prerelease_hook_output = outcome.stdout().to_string();
            if matches!(outcome, HookOutcome::Aborted(_)) {
                return Ok(self.stop(result, StopReason::PrereleaseHookAborted));
            }
        }

        // The initial tag is taken as configured; only bumped versions are checked.
        if !result.first_release {
            let version = crate::domain::parse_strict(&result.release_version)?;
            for module_file in &self.config.go_mod_files {
                validate_module_file(&self.config.checkout_dir, module_file, &version)?;
            }
        }

        let target = self.release_target()?;
        info!(tag = %result.release_tag, target = %target, "creating tag");
        self.repo.create_tag(&result.release_tag, &target)?;
        self.repo
            .push_tag(&self.config.push_remote, &result.release_tag)?;
        result.created_tag = true;

        if !self.config.create_release {
            return Ok(self.stop(result, StopReason::ReleaseNotRequested));
        }

        let notes = self.release_notes(&result)?;
        info!(tag = %result.release_tag, "creating GitHub release");
        self.github
            .create_release(&NewRelease::for_tag(&result.release_tag, notes))?;
        result.created_release = true;

        if let Some(hook) = hook_command(&self.config.postrelease_hook) {
            HookExecutor::execute(
                HookType::Postrelease,
                hook,
                &self.config.checkout_dir,
                &context,
            )?
            .into_result(HookType::Postrelease)?;
        }

        Ok(result)
    }

    fn stop(&self, result: ReleaseResult, reason: StopReason) -> ReleaseResult {
        info!(reason = %reason, "release stopped");
        result.stopped(reason)
    }

    fn hook_context(&self, result: &ReleaseResult) -> HookContext {
        HookContext {
            release_version: result.release_version.clone(),
            release_tag: result.release_tag.clone(),
            previous_version: result.previous_version.clone(),
            first_release: result.first_release,
            github_token: self.config.github.token.clone().unwrap_or_default(),
            release_notes_file: self.release_notes_file(),
            release_target_file: self.release_target_file(),
        }
    }

    /// Revision to tag: the override file's trimmed contents, or the head ref
    fn release_target(&self) -> Result<String> {
        match read_override(&self.release_target_file())? {
            Some(target) => Ok(target.trim().to_string()),
            None => Ok(self.config.git_ref.clone()),
        }
    }

    /// Notes for the release: override file, empty for a first release, or generated
    fn release_notes(&self, result: &ReleaseResult) -> Result<String> {
        if let Some(notes) = read_override(&self.release_notes_file())? {
            return Ok(notes);
        }
        if result.first_release {
            return Ok(String::new());
        }
        self.github
            .generate_release_notes(&result.release_tag, &result.previous_ref)
    }
}

fn hook_command(hook: &Option<String>) -> Option<&str> {
    hook.as_deref().filter(|h| !h.trim().is_empty())
}

/// Contents of an override file; missing, directory or blank counts as absent
fn read_override(path: &Path) -> Result<Option<String>> {
    if path.is_dir() {
        return Ok(None);
    }
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => {
            debug!(path = %path.display(), "using override file");
            Ok(Some(content))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
