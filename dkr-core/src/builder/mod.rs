//! Image build orchestration.
//!
//! Everything here is sequencing: scoped checkout of the target branch,
//! transient build files in the worktree, runtime-version lookup, then the
//! docker build itself. The synthesis logic lives in [`dockerfile`]; the
//! subprocess plumbing in [`crate::docker`].

pub mod dockerfile;
pub mod embedded;

pub use dockerfile::{
    host_addr, merge_packages, synthesize, BuildKind, BuildParams, BuildPlan, BASELINE_PACKAGES,
};

use crate::config::BuildConfig;
use crate::docker::{BuildInvocation, Docker};
use crate::error::{DkrError, Result};
use crate::git::{CheckoutGuard, GitRepo};
use crate::inventory::{build_labels, image_tag, ImageKind};
use crate::version;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Transient files written into the worktree for one build.
const DOCKERFILE_NAME: &str = ".dkr-Dockerfile";
const ENTRYPOINT_NAME: &str = ".dkr-entrypoint.sh";
const INSTALL_PACKAGES_NAME: &str = ".dkr-install-packages.sh";

/// One image build, create or update.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Branch checked out for the duration of the build.
    pub checkout_branch: String,
    /// Originating user ref, recorded in the labels. May differ from
    /// `checkout_branch` when the user gave a remote-qualified ref.
    pub branch_from: String,
    /// Fully resolved commit being built.
    pub commit: String,
    /// SSH private key forwarded to the build for the host-side clone.
    pub ssh_key: PathBuf,
    /// Prior image to layer on; `None` builds fresh from the configured base.
    pub base_image_ref: Option<String>,
}

/// Removes the transient build files on drop, success or failure, so a
/// failed build never pollutes the source tree.
struct TempFiles {
    paths: Vec<PathBuf>,
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), %err, "failed to remove transient build file");
                }
            }
        }
    }
}

/// Build an image for `repo` per `request`; returns the canonical tag.
///
/// The worktree is returned to its original ref and the transient files are
/// removed on every exit path, including mid-build failure.
#[instrument(skip_all, fields(branch = %request.checkout_branch))]
pub fn build_image(repo: &GitRepo, docker: &Docker, request: &BuildRequest) -> Result<String> {
    let _checkout = CheckoutGuard::enter(repo, &request.checkout_branch)?;

    let dockerfile_path = repo.root().join(DOCKERFILE_NAME);
    let entrypoint_path = repo.root().join(ENTRYPOINT_NAME);
    let install_path = repo.root().join(INSTALL_PACKAGES_NAME);
    let _cleanup = TempFiles {
        paths: vec![dockerfile_path.clone(), entrypoint_path.clone(), install_path.clone()],
    };

    // Config content is a function of the checked-out revision; read it
    // fresh after the checkout, never cached.
    let config = BuildConfig::load(repo.root());

    let agent_version = version::resolve_agent_version();

    let kind = match request.base_image_ref {
        Some(_) => BuildKind::Update,
        None => BuildKind::Create,
    };
    let plan = synthesize(
        &config,
        BASELINE_PACKAGES,
        kind,
        &BuildParams {
            repo_path: repo.root().display().to_string(),
            branch: request.checkout_branch.clone(),
            git_user: invoking_user(),
            host_addr: host_addr().to_string(),
            agent_version: agent_version.clone(),
            base_image_ref: request.base_image_ref.clone(),
        },
    );

    write_file(&dockerfile_path, &plan.dockerfile)?;
    write_file(&entrypoint_path, embedded::ENTRYPOINT_SH)?;
    write_file(&install_path, embedded::INSTALL_PACKAGES_SH)?;

    let tag = image_tag(repo.root(), &request.checkout_branch);
    let image_kind = match kind {
        BuildKind::Create => ImageKind::Base,
        BuildKind::Update => ImageKind::Update,
    };
    let labels = build_labels(
        repo.root(),
        &request.checkout_branch,
        &request.commit,
        image_kind,
        Some(request.branch_from.as_str()),
    );

    info!(tag = %tag, version = %agent_version, "building image");
    docker.build(&BuildInvocation {
        context_dir: repo.root().to_path_buf(),
        dockerfile: dockerfile_path.clone(),
        tag: tag.clone(),
        ssh_key: request.ssh_key.clone(),
        build_args: plan.build_args,
        labels,
    })?;

    Ok(tag)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| DkrError::Io { path: path.to_path_buf(), source: e })
}

/// Invoking user's login name, for the ssh clone URL.
fn invoking_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "root".to_string())
}
