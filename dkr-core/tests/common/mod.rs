//! Git repository fixtures for integration tests.
//!
//! Builds real repositories in temp dirs by shelling out to git, the same
//! way the library itself talks to git. No container runtime is needed.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use dkr_core::inventory::{labels, ImageRecord};

pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Fresh repository on branch `master` with identity configured.
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let repo = Self { dir };
        repo.git(&["init"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/master"]);
        repo.git(&["config", "user.email", "test@test.com"]);
        repo.git(&["config", "user.name", "Test"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .output()
            .expect("run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Write `name` with `content` and commit it; returns the commit hash.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> String {
        std::fs::write(self.path().join(name), content).expect("write file");
        self.git(&["add", name]);
        self.git(&["commit", "-m", message]);
        self.git(&["rev-parse", "HEAD"])
    }

    /// Empty commit; returns the commit hash.
    pub fn commit_empty(&self, message: &str) -> String {
        self.git(&["commit", "--allow-empty", "-m", message]);
        self.git(&["rev-parse", "HEAD"])
    }

    /// Create and check out `name` starting at `from`.
    pub fn branch(&self, name: &str, from: &str) {
        self.git(&["checkout", "-b", name, from]);
    }

    /// Clone this repository into a sibling temp dir; `origin` points here.
    pub fn clone_local(&self) -> TestRepo {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output = Command::new("git")
            .arg("clone")
            .arg(self.path())
            .arg(dir.path())
            .output()
            .expect("run git clone");
        assert!(
            output.status.success(),
            "git clone failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let repo = TestRepo { dir };
        repo.git(&["config", "user.email", "test@test.com"]);
        repo.git(&["config", "user.name", "Test"]);
        repo
    }
}

/// Inventory record as a build of `repo` would have stamped it.
pub fn image_record(repo: &Path, branch: &str, branch_from: &str, commit: &str) -> ImageRecord {
    let mut labels_map = BTreeMap::new();
    labels_map.insert(labels::REPO_PATH.to_string(), repo.display().to_string());
    labels_map.insert(
        labels::REPO_NAME.to_string(),
        repo.file_name().unwrap().to_string_lossy().into_owned(),
    );
    labels_map.insert(labels::BRANCH.to_string(), branch.to_string());
    labels_map.insert(labels::BRANCH_FROM.to_string(), branch_from.to_string());
    labels_map.insert(labels::COMMIT.to_string(), commit.to_string());
    labels_map.insert(labels::CREATED_AT.to_string(), "2026-01-01T00:00:00.000000Z".to_string());
    labels_map.insert(labels::TYPE.to_string(), "base".to_string());
    ImageRecord {
        id: "sha256:0000000000000000000000000000000000000000000000000000000000000000".to_string(),
        tags: vec!["dkr:test-image".to_string()],
        labels: labels_map,
    }
}
