// tests/tag_scan_test.rs
mod common;

use common::{git_available, TestRepo};
use release_gate::domain::{resolve_previous, resolve_previous_ref, PrevTagQuery};
use release_gate::git::{Git2Repository, Repository, SystemGit};
use release_gate::ReleaseError;
use semver::{Version, VersionReq};
use std::ops::ControlFlow;

fn stable(prefixes: &[&str]) -> PrevTagQuery {
    PrevTagQuery::new("HEAD")
        .with_prefixes(prefixes.iter().copied())
        .with_constraint(VersionReq::STAR)
        .stable_only()
}

/// Every backend available on this machine, opened on the same checkout
fn backends(fixture: &TestRepo) -> Vec<(&'static str, Box<dyn Repository>)> {
    let mut backends: Vec<(&'static str, Box<dyn Repository>)> = vec![(
        "libgit2",
        Box::new(Git2Repository::open(fixture.path()).unwrap()),
    )];
    if git_available() {
        backends.push(("git", Box::new(SystemGit::new(fixture.path()))));
    }
    backends
}

#[test]
fn test_highest_stable_version_on_nearest_tagged_commit() {
    let mut fixture = TestRepo::new();
    let first = fixture.commit("initial");
    fixture.tag("v1.0.0", first);
    let second = fixture.commit("feature");
    fixture.tag("v1.2.0", second);
    fixture.tag("v1.1.5", second);
    fixture.tag("other-2.0.0", second);
    fixture.tag("v1.3.0-rc.1", second);
    fixture.commit("untagged head");

    for (name, repo) in backends(&fixture) {
        let previous = resolve_previous(&*repo, &stable(&["v"]))
            .unwrap()
            .unwrap_or_else(|| panic!("{}: expected a previous release", name));
        assert_eq!(previous.tag, "v1.2.0", "{}", name);
        assert_eq!(previous.prefix, "v", "{}", name);
        assert_eq!(previous.version, Version::new(1, 2, 0), "{}", name);
    }
}

#[test]
fn test_annotated_tags_are_found() {
    let mut fixture = TestRepo::new();
    let first = fixture.commit("initial");
    fixture.annotated_tag("v0.4.0", first);
    fixture.commit("head");

    for (name, repo) in backends(&fixture) {
        let tag = resolve_previous_ref(&*repo, &stable(&["v"])).unwrap();
        assert_eq!(tag, "v0.4.0", "{}", name);
    }
}

#[test]
fn test_no_qualifying_tag_yields_fallback() {
    let mut fixture = TestRepo::new();
    let first = fixture.commit("initial");
    fixture.tag("nightly", first);
    fixture.tag("v2.0.0-beta.1", first);
    fixture.commit("head");

    for (name, repo) in backends(&fixture) {
        let query = stable(&["v"]).with_fallback("none");
        assert!(resolve_previous(&*repo, &query).unwrap().is_none(), "{}", name);
        assert_eq!(resolve_previous_ref(&*repo, &query).unwrap(), "none", "{}", name);
    }
}

#[test]
fn test_only_nearest_tagged_commit_is_considered() {
    // Known boundary: the scan stops at the first commit with any candidate,
    // so an older tag under a higher-priority prefix never competes.
    let mut fixture = TestRepo::new();
    let old = fixture.commit("old");
    fixture.tag("app-v5.0.0", old);
    let recent = fixture.commit("recent");
    fixture.tag("lib-v1.0.0", recent);

    for (name, repo) in backends(&fixture) {
        let previous = resolve_previous(&*repo, &stable(&["app-v", "lib-v"]))
            .unwrap()
            .unwrap();
        assert_eq!(previous.tag, "lib-v1.0.0", "{}", name);
    }
}

#[test]
fn test_head_can_be_an_older_revision() {
    let mut fixture = TestRepo::new();
    let first = fixture.commit("initial");
    fixture.tag("v1.0.0", first);
    let second = fixture.commit("second");
    fixture.tag("v1.1.0", second);
    fixture.commit("third");

    for (name, repo) in backends(&fixture) {
        let query = PrevTagQuery::new(first.to_string())
            .with_prefixes(["v"])
            .stable_only();
        assert_eq!(resolve_previous_ref(&*repo, &query).unwrap(), "v1.0.0", "{}", name);
    }
}

#[test]
fn test_rev_parse_and_create_tag() {
    let mut fixture = TestRepo::new();
    fixture.commit("initial");
    let head = fixture.commit("head");

    for (name, repo) in backends(&fixture) {
        assert_eq!(repo.rev_parse("HEAD").unwrap(), head.to_string(), "{}", name);
        assert!(!repo.is_shallow().unwrap(), "{}", name);
    }

    let repo = Git2Repository::open(fixture.path()).unwrap();
    repo.create_tag("v3.0.0", "HEAD").unwrap();
    assert_eq!(
        resolve_previous_ref(&repo, &stable(&["v"])).unwrap(),
        "v3.0.0"
    );
}

#[test]
fn test_system_git_reports_bad_revision() {
    if !git_available() {
        return;
    }
    let mut fixture = TestRepo::new();
    fixture.commit("initial");
    let repo = SystemGit::new(fixture.path());

    let err = resolve_previous(&repo, &PrevTagQuery::new("no-such-branch")).unwrap_err();
    assert!(err.to_string().contains("rev-list"), "{}", err);
}

#[test]
fn test_system_git_walk_error_carries_stderr() {
    if !git_available() {
        return;
    }
    let mut fixture = TestRepo::new();
    fixture.commit("initial");
    let repo = SystemGit::new(fixture.path());

    let err = repo
        .walk_tags("no-such-branch", &mut |_: &[String]| ControlFlow::Continue(()))
        .unwrap_err();
    match err {
        ReleaseError::Command { stderr, .. } => {
            assert!(stderr.contains("no-such-branch"), "{}", stderr)
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_system_git_push_tag_to_bare_remote() {
    if !git_available() {
        return;
    }
    let mut fixture = TestRepo::new();
    fixture.commit("initial");
    let (_origin_dir, origin) = fixture.add_bare_origin();

    let repo = SystemGit::new(fixture.path());
    repo.create_tag("v1.0.0", "HEAD").unwrap();
    repo.push_tag("origin", "v1.0.0").unwrap();

    assert!(origin.find_reference("refs/tags/v1.0.0").is_ok());
}
