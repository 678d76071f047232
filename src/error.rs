use thiserror::Error;

/// Unified error type for release-gate operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("shallow clones are not supported")]
    ShallowClone,

    #[error("Command `{command}` failed with exit code {code}: {stderr}")]
    Command {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Hook failed: {0}")]
    Hook(String),

    #[error("module {module} has version suffix {found:?}, want {want:?}")]
    ModuleSuffix {
        module: String,
        found: String,
        want: String,
    },

    #[error("Cannot parse module file {path}: {reason}")]
    ModuleFile { path: String, reason: String },

    #[error("GitHub API request to {url} failed with status {status}: {body}")]
    GithubApi {
        url: String,
        status: u16,
        body: String,
    },

    #[error("GitHub API rate limit still exceeded after {attempts} waits: {url}")]
    RateLimited { url: String, attempts: u32 },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-gate
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    /// Create a hook error with context
    pub fn hook(msg: impl Into<String>) -> Self {
        ReleaseError::Hook(msg.into())
    }

    /// Create a command failure, keeping the captured stderr next to the exit code
    pub fn command(command: impl Into<String>, code: Option<i32>, stderr: &[u8]) -> Self {
        ReleaseError::Command {
            command: command.into(),
            code: code.unwrap_or(-1),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}
