//! Git collaborator.
//!
//! Thin wrapper over the `git` CLI, scoped to a validated repository root.
//! Only the handful of operations dkr needs are exposed; everything returns
//! trimmed stdout or a structured error.

use crate::error::{DkrError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Handle to a local git repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Open the repository at `path`, validating that git recognizes it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Self { root: path.as_ref().to_path_buf() };
        if repo.run(&["rev-parse", "--git-dir"]).is_err() {
            return Err(DkrError::NotAGitRepo { path: repo.root });
        }
        Ok(repo)
    }

    /// Repository root this handle is scoped to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository directory name, used in image tags and labels.
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Run a git subcommand in this repository, returning trimmed stdout.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        debug!(?args, "git");
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| DkrError::CommandFailed { program: "git".to_string(), source: e })?;
        if !output.status.success() {
            return Err(DkrError::GitFailed {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Resolve a symbolic name to a full commit hash.
    pub fn rev_parse(&self, reference: &str) -> Result<String> {
        self.run(&["rev-parse", reference]).map_err(|e| match e {
            DkrError::GitFailed { stderr, .. } => DkrError::UnresolvableRef {
                reference: reference.to_string(),
                reason: stderr,
            },
            other => other,
        })
    }

    /// Whether `reference` resolves in this repository. Never fails.
    pub fn ref_exists(&self, reference: &str) -> bool {
        self.run(&["rev-parse", "--verify", "--quiet", reference]).is_ok()
    }

    /// Fetch exactly one branch from one named remote.
    pub fn fetch_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["fetch", remote, branch]).map(|_| ())
    }

    /// Names of configured remotes. An unlistable remote set reads as empty.
    pub fn remotes(&self) -> Vec<String> {
        match self.run(&["remote"]) {
            Ok(out) => out.lines().map(str::to_string).filter(|l| !l.is_empty()).collect(),
            Err(err) => {
                warn!(%err, "failed to list remotes");
                Vec::new()
            }
        }
    }

    /// Current branch name, or the commit hash when HEAD is detached.
    pub fn current_ref(&self) -> Result<String> {
        let name = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if name == "HEAD" {
            return self.run(&["rev-parse", "HEAD"]);
        }
        Ok(name)
    }

    /// Count commits reachable from `upper` but not from `lower`.
    ///
    /// Fails when either end is not an ancestor-comparable point, e.g. after
    /// a history rewrite dropped `lower`.
    pub fn rev_list_count(&self, lower: &str, upper: &str) -> Result<u64> {
        let range = format!("{lower}..{upper}");
        let out = self.run(&["rev-list", "--count", &range])?;
        out.parse().map_err(|_| DkrError::GitFailed {
            args: format!("rev-list --count {range}"),
            stderr: format!("unexpected count output: {out}"),
        })
    }

    /// Check out a named ref.
    pub fn checkout(&self, reference: &str) -> Result<()> {
        self.run(&["checkout", reference]).map(|_| ())
    }
}

/// Scoped checkout: switches the worktree to `target` and restores the
/// previous ref on drop.
///
/// Restoration runs on every exit path, including early errors and panics,
/// so a failed build cannot leave the worktree on the wrong branch.
pub struct CheckoutGuard<'a> {
    repo: &'a GitRepo,
    original: Option<String>,
}

impl<'a> CheckoutGuard<'a> {
    /// Check out `target` if it differs from the current ref.
    ///
    /// `"HEAD"` and the already-checked-out ref produce a no-op guard.
    pub fn enter(repo: &'a GitRepo, target: &str) -> Result<Self> {
        let original = repo.current_ref()?;
        if target == "HEAD" || target == original {
            return Ok(Self { repo, original: None });
        }
        repo.checkout(target)?;
        Ok(Self { repo, original: Some(original) })
    }
}

impl Drop for CheckoutGuard<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(err) = self.repo.checkout(&original) {
                warn!(%err, original = %original, "failed to restore original checkout");
            }
        }
    }
}
