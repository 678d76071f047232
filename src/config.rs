use crate::domain::ChangeLevel;
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the checkout and the user config directory
pub const CONFIG_FILE_NAME: &str = "release-gate.toml";

/// Represents the complete configuration for release-gate.
///
/// Every field has a default, so an empty file is a valid configuration.
/// Command-line flags are applied on top by the binary.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub checkout_dir: PathBuf,
    /// Revision to release
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// GitHub repository as `owner/name`.
    ///
    /// Required for releases and for any run that finds a previous tag; a first
    /// release that only tags never queries the API.
    pub repo: Option<String>,
    pub tag_prefix: String,
    /// Tag used when no previous release exists
    pub initial_tag: String,
    pub create_tag: bool,
    pub create_release: bool,
    pub prerelease_hook: Option<String>,
    pub postrelease_hook: Option<String>,
    /// `go.mod`-style files, relative to the checkout, whose module path must
    /// carry the major version suffix
    pub go_mod_files: Vec<PathBuf>,
    pub push_remote: String,
    /// Directory holding the `release-notes` and `release-target` override files
    pub scratch_dir: Option<PathBuf>,
    pub backend: Backend,
    pub github: GithubConfig,
    pub labels: BTreeMap<String, ChangeLevel>,
}

/// Which git implementation to use
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The `git` executable
    #[default]
    Git,
    /// The bundled libgit2 library
    Libgit2,
}

/// Configuration for the GitHub REST API.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    pub user_agent: String,
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_url: crate::github::client::DEFAULT_API_URL.to_string(),
            user_agent: format!("release-gate/{}", env!("CARGO_PKG_VERSION")),
            token: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            checkout_dir: PathBuf::from("."),
            git_ref: "HEAD".to_string(),
            repo: None,
            tag_prefix: "v".to_string(),
            initial_tag: "v0.1.0".to_string(),
            create_tag: false,
            create_release: false,
            prerelease_hook: None,
            postrelease_hook: None,
            go_mod_files: Vec::new(),
            push_remote: "origin".to_string(),
            scratch_dir: None,
            backend: Backend::default(),
            github: GithubConfig::default(),
            labels: crate::analyzer::change_analyzer::default_labels(),
        }
    }
}

impl Config {
    /// Tag creation is implied by release creation
    pub fn wants_tag(&self) -> bool {
        self.create_tag || self.create_release
    }

    /// Check the settings the workflow cannot run without
    pub fn validate(&self) -> Result<()> {
        let initial = self
            .initial_tag
            .strip_prefix(&self.tag_prefix)
            .ok_or_else(|| {
                ReleaseError::config(format!(
                    "initial tag {:?} does not start with tag prefix {:?}",
                    self.initial_tag, self.tag_prefix
                ))
            })?;
        crate::domain::parse_strict(initial).map_err(|e| {
            ReleaseError::config(format!("initial tag {:?}: {}", self.initial_tag, e))
        })?;

        // Without a release the API is only needed once a previous tag exists;
        // the client reports a missing repo at that point.
        match self.repo.as_deref() {
            Some(repo) => {
                repo.parse::<crate::github::RepoId>()?;
            }
            None if self.create_release => {
                return Err(ReleaseError::config(
                    "repo must be set as owner/name to create a release",
                ))
            }
            None => {}
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-gate.toml` in the checkout directory
/// 3. `release-gate.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, checkout_dir: &Path) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover(checkout_dir),
    };

    let Some(path) = path else {
        debug!("no config file found, using defaults");
        return Ok(Config::default());
    };

    debug!(path = %path.display(), "loading config");
    let config_str = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&config_str)
        .map_err(|e| ReleaseError::config(format!("cannot parse {}: {}", path.display(), e)))
}

fn discover(checkout_dir: &Path) -> Option<PathBuf> {
    let local = checkout_dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}
