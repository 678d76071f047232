use std::collections::BTreeMap;
use std::path::PathBuf;

/// Points in the release workflow where a hook can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    Prerelease,
    Postrelease,
}

impl HookType {
    /// Get the hook name as a string
    pub fn name(&self) -> &'static str {
        match self {
            HookType::Prerelease => "prerelease",
            HookType::Postrelease => "postrelease",
        }
    }

    /// Whether this hook may veto the release with the abort exit code
    pub fn can_abort(&self) -> bool {
        matches!(self, HookType::Prerelease)
    }
}

/// Context information passed to a hook
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// Version being released, without prefix
    pub release_version: String,
    /// Tag being created
    pub release_tag: String,
    /// Previous release version, empty on a first release
    pub previous_version: String,
    pub first_release: bool,
    pub github_token: String,
    /// Where the hook may write release notes to use instead of generated ones
    pub release_notes_file: PathBuf,
    /// Where the hook may write a revision to tag instead of the head ref
    pub release_target_file: PathBuf,
}

impl HookContext {
    /// Convert context to environment variables for the hook command
    pub fn to_env_vars(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("RELEASE_VERSION".to_string(), self.release_version.clone());
        env.insert("RELEASE_TAG".to_string(), self.release_tag.clone());
        env.insert(
            "PREVIOUS_VERSION".to_string(),
            self.previous_version.clone(),
        );
        env.insert("FIRST_RELEASE".to_string(), self.first_release.to_string());
        env.insert("GITHUB_TOKEN".to_string(), self.github_token.clone());
        env.insert(
            "RELEASE_NOTES_FILE".to_string(),
            self.release_notes_file.display().to_string(),
        );
        env.insert(
            "RELEASE_TARGET".to_string(),
            self.release_target_file.display().to_string(),
        );
        env
    }
}
