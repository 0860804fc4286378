//! Build-spec synthesis.
//!
//! Pure functions from configuration + resolved reference to Dockerfile
//! text and a build-argument map. No I/O happens here, which keeps the
//! synthesis independently testable without a container runtime present.

use crate::config::BuildConfig;
use std::collections::BTreeMap;

/// Packages every image gets regardless of user configuration.
pub const BASELINE_PACKAGES: &[&str] = &["git", "tmux", "openssh-clients", "curl"];

/// Address containers use to reach the host over SSH.
pub fn host_addr() -> &'static str {
    if cfg!(target_os = "macos") {
        "host.docker.internal"
    } else {
        "::1"
    }
}

/// Whether the plan establishes a fresh environment or layers an
/// incremental refresh on a prior image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    Create,
    Update,
}

/// Inputs the synthesizer needs beyond the parsed config.
#[derive(Debug, Clone)]
pub struct BuildParams {
    /// Absolute path of the source repository on the host.
    pub repo_path: String,
    /// Branch checked out into the image.
    pub branch: String,
    /// Invoking user, for the ssh clone URL.
    pub git_user: String,
    /// Host-reachability address for the clone/fetch.
    pub host_addr: String,
    /// Resolved agent runtime version (or the `latest` sentinel).
    pub agent_version: String,
    /// Prior image reference to layer on; update builds only.
    pub base_image_ref: Option<String>,
}

/// A synthesized build: ordered instruction text plus the build-argument map.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub dockerfile: String,
    pub build_args: BTreeMap<String, String>,
}

/// Merge the fixed baseline with user packages.
///
/// Baseline order is preserved and baseline entries are never removed; user
/// packages follow in file order, skipping anything already present, so
/// duplicates collapse to first occurrence and the merge is idempotent.
pub fn merge_packages(baseline: &[&str], extra: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = baseline.iter().map(|p| (*p).to_string()).collect();
    for pkg in extra {
        if !merged.iter().any(|m| m == pkg) {
            merged.push(pkg.clone());
        }
    }
    merged
}

/// Synthesize the complete build plan for `kind`.
pub fn synthesize(
    config: &BuildConfig,
    baseline: &[&str],
    kind: BuildKind,
    params: &BuildParams,
) -> BuildPlan {
    let dockerfile = match kind {
        BuildKind::Create => render_create(config, baseline),
        BuildKind::Update => render_update(config),
    };

    let mut build_args = BTreeMap::new();
    build_args.insert("REPO_PATH".to_string(), params.repo_path.clone());
    build_args.insert("BRANCH".to_string(), params.branch.clone());
    build_args.insert("GIT_USER".to_string(), params.git_user.clone());
    build_args.insert("HOST_ADDR".to_string(), params.host_addr.clone());
    build_args.insert("CLAUDE_VERSION".to_string(), params.agent_version.clone());
    if kind == BuildKind::Update {
        if let Some(base) = &params.base_image_ref {
            build_args.insert("BASE_IMAGE".to_string(), base.clone());
        }
    }

    BuildPlan { dockerfile, build_args }
}

/// Fresh-environment instruction sequence: base image, merged packages,
/// agent runtime, host trust material, pre-clone splice, clone + checkout,
/// post-clone splice, entrypoint.
fn render_create(config: &BuildConfig, baseline: &[&str]) -> String {
    let packages = merge_packages(baseline, &config.packages).join(" ");

    let mut lines: Vec<String> = vec![
        "# syntax=docker/dockerfile:1".into(),
        format!("FROM {}", config.base_image),
        String::new(),
        "ENV LANG=C.UTF-8".into(),
        String::new(),
        "COPY .dkr-install-packages.sh /tmp/install-packages.sh".into(),
        "RUN chmod +x /tmp/install-packages.sh && \\".into(),
        format!("    /tmp/install-packages.sh {packages} && \\"),
        "    rm /tmp/install-packages.sh".into(),
        String::new(),
        "ARG CLAUDE_VERSION=latest".into(),
        "RUN curl -fsSL https://claude.ai/install.sh | bash".into(),
        "ENV PATH=/root/.local/bin:$PATH".into(),
        String::new(),
        "ARG REPO_PATH".into(),
        "ARG BRANCH".into(),
        "ARG GIT_USER".into(),
        "ARG HOST_ADDR=host.docker.internal".into(),
        String::new(),
        "RUN mkdir -p /root/.ssh && \\".into(),
        "    ssh-keyscan -H ${HOST_ADDR} >> /root/.ssh/known_hosts 2>/dev/null || true".into(),
        String::new(),
    ];

    if !config.pre_clone.is_empty() {
        lines.push(config.pre_clone.clone());
        lines.push(String::new());
    }

    lines.extend([
        "RUN --mount=type=ssh \\".into(),
        "    git clone ${GIT_USER}@${HOST_ADDR}:${REPO_PATH} /workspace".into(),
        String::new(),
        "RUN cd /workspace && git remote rename origin host && git checkout ${BRANCH}".into(),
        String::new(),
        "ENV DKR_BRANCH=${BRANCH}".into(),
        String::new(),
    ]);

    if !config.post_clone.is_empty() {
        lines.push(config.post_clone.clone());
        lines.push(String::new());
    }

    lines.extend([
        "COPY .dkr-entrypoint.sh /entrypoint.sh".into(),
        "RUN chmod +x /entrypoint.sh".into(),
        String::new(),
        "WORKDIR /workspace".into(),
        "ENTRYPOINT [\"/entrypoint.sh\"]".into(),
        String::new(),
    ]);

    lines.join("\n")
}

/// Incremental-refresh instruction sequence: start from the prior image,
/// re-synchronize the checkout, splice the post-clone hook. Pre-clone hooks
/// are a create-time concept; the filesystem already exists here.
fn render_update(config: &BuildConfig) -> String {
    let mut lines: Vec<String> = vec![
        "# syntax=docker/dockerfile:1".into(),
        "ARG BASE_IMAGE=scratch".into(),
        "FROM ${BASE_IMAGE}".into(),
        String::new(),
        "ARG GIT_USER".into(),
        "ARG REPO_PATH".into(),
        "ARG BRANCH".into(),
        "ARG HOST_ADDR=host.docker.internal".into(),
        String::new(),
        "RUN --mount=type=ssh \\".into(),
        "    cd /workspace && \\".into(),
        "    git fetch ${GIT_USER}@${HOST_ADDR}:${REPO_PATH} ${BRANCH} && \\".into(),
        "    git rebase FETCH_HEAD".into(),
        String::new(),
    ];

    if !config.post_clone.is_empty() {
        lines.push(config.post_clone.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}
