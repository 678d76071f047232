//! System git backend
//!
//! Runs the `git` binary in the checkout directory. Credentials, `extraheader`
//! settings and hooks configured for the checkout apply exactly as they do for a
//! user running git by hand.

use crate::error::{ReleaseError, Result};
use crate::git::{Repository, TagVisitor};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Git backend using the system `git` executable
#[derive(Debug, Clone)]
pub struct SystemGit {
    repo_path: PathBuf,
}

impl SystemGit {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        SystemGit {
            repo_path: repo_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_path);
        cmd
    }

    /// Run git to completion and return its trimmed stdout
    fn run(&self, args: &[&str]) -> Result<String> {
        let command_line = format!("git {}", args.join(" "));
        debug!(command = %command_line, dir = %self.repo_path.display(), "running git");

        let output = self.git_cmd().args(args).output()?;
        if !output.status.success() {
            return Err(ReleaseError::command(
                command_line,
                output.status.code(),
                &output.stderr,
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Extract tag names from one `%D` decoration line.
///
/// `HEAD -> main, tag: v1.2.0, origin/main` yields `["v1.2.0"]`. Lines without
/// tag decorations (including the `commit <sha>` header lines emitted by
/// `rev-list --pretty`) yield an empty list.
pub fn parse_decoration(line: &str) -> Vec<String> {
    line.split(", ")
        .filter_map(|r| r.trim().strip_prefix("tag: "))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl Repository for SystemGit {
    fn is_shallow(&self) -> Result<bool> {
        Ok(self.run(&["rev-parse", "--is-shallow-repository"])? == "true")
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        let spec = format!("{}^{{commit}}", rev);
        self.run(&["rev-parse", "--verify", &spec])
    }

    fn walk_tags(&self, head: &str, visit: &mut TagVisitor<'_>) -> Result<()> {
        let command_line = format!("git rev-list --pretty=%D {}", head);
        debug!(command = %command_line, dir = %self.repo_path.display(), "streaming history");

        let mut child = self
            .git_cmd()
            .args(["rev-list", "--pretty=%D", head, "--"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReleaseError::config("git rev-list stdout was not captured"))?;
        // Drained concurrently so a chatty git cannot block on a full stderr pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut stderr = String::new();
                let _ = pipe.read_to_string(&mut stderr);
                stderr
            })
        });

        let mut stopped = false;
        let mut read_error = None;
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            };
            let tags = parse_decoration(&line);
            if tags.is_empty() {
                continue;
            }
            if visit(&tags).is_break() {
                stopped = true;
                break;
            }
        }

        if stopped || read_error.is_some() {
            // The child may already have exited; a failed kill is fine either way.
            let _ = child.kill();
            let _ = child.wait();
            collect_stderr(stderr_reader);
            if let Some(e) = read_error {
                return Err(e.into());
            }
            debug!("history walk stopped early");
            return Ok(());
        }

        let status = child.wait()?;
        let stderr = collect_stderr(stderr_reader);
        if !status.success() {
            return Err(ReleaseError::command(
                command_line,
                status.code(),
                stderr.as_bytes(),
            ));
        }
        Ok(())
    }

    fn create_tag(&self, name: &str, target: &str) -> Result<()> {
        self.run(&["tag", name, target]).map(|_| ())
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        let refspec = format!("refs/tags/{}", name);
        self.run(&["push", remote, &refspec]).map(|_| ())
    }
}

fn collect_stderr(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decoration_tags_only() {
        let tags = parse_decoration("HEAD -> main, tag: v1.2.0, origin/main, tag: other-2.0.0");
        assert_eq!(tags, vec!["v1.2.0".to_string(), "other-2.0.0".to_string()]);
    }

    #[test]
    fn test_parse_decoration_commit_header() {
        assert!(parse_decoration("commit 9fceb02d0ae598e95dc970b74767f19372d61af8").is_empty());
    }

    #[test]
    fn test_parse_decoration_empty_line() {
        assert!(parse_decoration("").is_empty());
    }

    #[test]
    fn test_parse_decoration_branch_named_like_tag() {
        // A branch called "tag" is not a tag decoration.
        assert!(parse_decoration("HEAD -> tag, origin/tag").is_empty());
    }
}
