use crate::error::{ReleaseError, Result};
use crate::hooks::{HookContext, HookType};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Exit status a prerelease hook uses to veto the release
pub const ABORT_EXIT_CODE: i32 = 10;

/// How a hook run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Exit 0, with captured stdout
    Completed(String),
    /// The prerelease hook asked to stop the release
    Aborted(String),
    /// Any other non-zero exit
    Failed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl HookOutcome {
    /// Captured stdout, whatever the outcome
    pub fn stdout(&self) -> &str {
        match self {
            HookOutcome::Completed(out) | HookOutcome::Aborted(out) => out,
            HookOutcome::Failed { stdout, .. } => stdout,
        }
    }

    /// Turn a failure into a [ReleaseError::Hook] carrying its stderr
    pub fn into_result(self, hook_type: HookType) -> Result<HookOutcome> {
        match self {
            HookOutcome::Failed { code, stderr, .. } => Err(ReleaseError::hook(format!(
                "{} hook failed with exit code {}: {}",
                hook_type.name(),
                code.map_or_else(|| "none".to_string(), |c| c.to_string()),
                stderr.trim()
            ))),
            outcome => Ok(outcome),
        }
    }
}

/// Executes release hook commands
pub struct HookExecutor;

impl HookExecutor {
    /// Run `command` with `sh -c` in `dir`
    ///
    /// The context's variables are merged over the inherited environment. Only a
    /// prerelease hook exiting with [ABORT_EXIT_CODE] is reported as
    /// [HookOutcome::Aborted]; the same code from any other hook is a failure.
    ///
    /// Returns `Err` only when the shell cannot be started.
    pub fn execute(
        hook_type: HookType,
        command: &str,
        dir: &Path,
        context: &HookContext,
    ) -> Result<HookOutcome> {
        debug!(hook = hook_type.name(), command = %command, "running hook");

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(dir)
            .envs(context.to_env_vars())
            .output()
            .map_err(|e| {
                ReleaseError::hook(format!(
                    "failed to start {} hook: {}",
                    hook_type.name(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let code = output.status.code();

        let outcome = match code {
            Some(0) => HookOutcome::Completed(stdout),
            Some(ABORT_EXIT_CODE) if hook_type.can_abort() => {
                info!(hook = hook_type.name(), "hook requested abort");
                HookOutcome::Aborted(stdout)
            }
            _ => HookOutcome::Failed {
                code,
                stdout,
                stderr,
            },
        };
        Ok(outcome)
    }
}
