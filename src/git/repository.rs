use crate::error::{ReleaseError, Result};
use crate::git::{Repository, TagVisitor};
use git2::{Cred, CredentialType, Oid, Repository as Git2Repo, Sort};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Mutex<Git2Repo>,
    token: Option<String>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Ok(Self::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo: Mutex::new(repo),
            token: None,
        }
    }

    /// Use a token for HTTPS pushes (sent as the `x-access-token` user)
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Git2Repo> {
        self.repo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Map every tagged commit to the names of the tags pointing at it.
    ///
    /// Annotated tags are peeled to their commit, so both kinds decorate the commit
    /// the same way `git log --decorate` shows them.
    fn tags_by_commit(repo: &Git2Repo) -> Result<HashMap<Oid, Vec<String>>> {
        let mut tags: HashMap<Oid, Vec<String>> = HashMap::new();
        for name in repo.tag_names(None)?.iter().flatten() {
            let reference = match repo.find_reference(&format!("refs/tags/{}", name)) {
                Ok(reference) => reference,
                Err(_) => continue,
            };
            // Tags on trees or blobs cannot be release references.
            if let Ok(commit) = reference.peel_to_commit() {
                tags.entry(commit.id()).or_default().push(name.to_string());
            }
        }
        Ok(tags)
    }
}

impl Repository for Git2Repository {
    fn is_shallow(&self) -> Result<bool> {
        Ok(self.lock().is_shallow())
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        let repo = self.lock();
        let commit = repo.revparse_single(rev)?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    fn walk_tags(&self, head: &str, visit: &mut TagVisitor<'_>) -> Result<()> {
        let repo = self.lock();
        let head_commit = repo.revparse_single(head)?.peel_to_commit()?;
        let tags = Self::tags_by_commit(&repo)?;
        debug!(head = %head, tagged_commits = tags.len(), "walking history with libgit2");

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(head_commit.id())?;

        for oid in revwalk {
            let oid = oid?;
            if let Some(names) = tags.get(&oid) {
                if visit(names).is_break() {
                    break;
                }
            }
        }
        Ok(())
    }

    fn create_tag(&self, name: &str, target: &str) -> Result<()> {
        let repo = self.lock();
        let commit = repo.revparse_single(target)?.peel_to_commit()?;
        repo.tag_lightweight(name, commit.as_object(), false)?;
        Ok(())
    }

    fn push_tag(&self, remote_name: &str, name: &str) -> Result<()> {
        let repo = self.lock();
        let mut remote = repo.find_remote(remote_name).map_err(|e| {
            ReleaseError::config(format!("Cannot find remote '{}': {}", remote_name, e))
        })?;

        let mut callbacks = git2::RemoteCallbacks::new();
        let token = self.token.clone();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(token) = token.as_deref() {
                    return Cred::userpass_plaintext("x-access-token", token);
                }
            }
            if allowed_types.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
            }
            Cred::default()
        });
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/tags/{}:refs/tags/{}", name, name);
        debug!(remote = %remote_name, refspec = %refspec, "pushing tag with libgit2");
        remote.push(&[refspec.as_str()], Some(&mut push_options))?;
        Ok(())
    }
}
