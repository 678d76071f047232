// Shared fixtures for integration tests
#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// A throwaway repository with a linear history
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
    commits: i64,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        TestRepo {
            dir,
            repo,
            commits: 0,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'static> {
        // Strictly increasing commit times keep time-ordered walks deterministic.
        let time = Time::new(1_700_000_000 + self.commits * 60, 0);
        Signature::new("Test User", "test@example.com", &time).unwrap()
    }

    /// Commit a file change on top of HEAD
    pub fn commit(&mut self, message: &str) -> Oid {
        let file = format!("file{}.txt", self.commits);
        std::fs::write(self.path().join(&file), message).unwrap();

        let sig = self.signature();
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(&file)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
        self.commits += 1;
        oid
    }

    pub fn tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }

    pub fn annotated_tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).unwrap();
        let sig = self.signature();
        self.repo
            .tag(name, &object, &sig, &format!("Release {}", name), false)
            .unwrap();
    }

    /// Add a bare repository as `origin` and return its handle
    pub fn add_bare_origin(&self) -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let bare = Repository::init_bare(dir.path()).unwrap();
        self.repo
            .remote("origin", dir.path().to_str().unwrap())
            .unwrap();
        (dir, bare)
    }
}

/// Whether a usable `git` binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}
