//! Docker collaborator.
//!
//! Assembles and runs `docker` CLI invocations. Queries absorb failures:
//! an unreachable daemon or malformed output reads as an empty store, never
//! an error, because inventory absence must not block a fresh build.
//! Mutations (build, run) propagate failures.

use crate::error::{DkrError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use tracing::{debug, warn};

/// Raw `docker inspect` entry, reduced to the fields dkr reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageInspect {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(rename = "RepoTags", default)]
    pub repo_tags: Vec<String>,

    #[serde(rename = "Config", default)]
    pub config: InspectConfig,
}

/// `Config` block of a `docker inspect` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectConfig {
    #[serde(rename = "Labels", default)]
    pub labels: Option<BTreeMap<String, String>>,
}

/// Handle to the docker CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct Docker;

impl Docker {
    /// Ids of images carrying `label`, in store order, deduplicated.
    ///
    /// Any query failure yields `None`; callers treat that as an empty store.
    pub fn image_ids_with_label(&self, label: &str) -> Option<Vec<String>> {
        let output = Command::new("docker")
            .args(["images", "--format", "{{.ID}}", "--filter"])
            .arg(format!("label={label}"))
            .output()
            .ok()?;
        if !output.status.success() {
            warn!("docker images query failed");
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut ids: Vec<String> = Vec::new();
        for id in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        Some(ids)
    }

    /// Inspect `ids`, returning parsed records; `None` on any failure.
    pub fn inspect_images(&self, ids: &[String]) -> Option<Vec<ImageInspect>> {
        if ids.is_empty() {
            return Some(Vec::new());
        }
        let output = Command::new("docker").arg("inspect").args(ids).output().ok()?;
        if !output.status.success() {
            warn!("docker inspect failed");
            return None;
        }
        match serde_json::from_slice(&output.stdout) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(%err, "malformed docker inspect output");
                None
            }
        }
    }

    /// Run `docker build` with BuildKit, streaming output to the terminal.
    pub fn build(&self, req: &BuildInvocation) -> Result<()> {
        let mut cmd = Command::new("docker");
        cmd.arg("build")
            .arg("--ssh")
            .arg(format!("default={}", req.ssh_key.display()))
            .arg("--network=host");
        for (key, value) in &req.build_args {
            cmd.arg("--build-arg").arg(format!("{key}={value}"));
        }
        cmd.arg("--tag").arg(&req.tag);
        cmd.arg("-f").arg(&req.dockerfile);
        for (key, value) in &req.labels {
            cmd.arg("--label").arg(format!("{key}={value}"));
        }
        cmd.arg(&req.context_dir);
        cmd.env("DOCKER_BUILDKIT", "1");

        debug!(?cmd, "docker build");
        let status = cmd
            .status()
            .map_err(|e| DkrError::CommandFailed { program: "docker".to_string(), source: e })?;
        if !status.success() {
            return Err(DkrError::BuildFailed {
                reason: format!("docker build exited with {status}"),
            });
        }
        Ok(())
    }

    /// Run a container, inheriting the terminal; returns the exit status.
    pub fn run(&self, req: &RunInvocation) -> Result<ExitStatus> {
        let mut cmd = Command::new("docker");
        cmd.args(["run", "--rm"]);
        if req.interactive {
            cmd.arg("-it");
        }
        cmd.arg("--network=host");
        for volume in &req.volumes {
            cmd.arg("-v").arg(volume);
        }
        for (key, value) in &req.env {
            cmd.arg("-e").arg(format!("{key}={value}"));
        }
        if let Some(hostname) = &req.hostname {
            cmd.arg("--hostname").arg(hostname);
        }
        cmd.arg(&req.image);
        cmd.args(&req.args);

        debug!(?cmd, "docker run");
        cmd.status()
            .map_err(|e| DkrError::CommandFailed { program: "docker".to_string(), source: e })
    }
}

/// Everything a `docker build` needs.
#[derive(Debug, Clone)]
pub struct BuildInvocation {
    pub context_dir: PathBuf,
    pub dockerfile: PathBuf,
    pub tag: String,
    pub ssh_key: PathBuf,
    pub build_args: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
}

/// Everything a `docker run` needs.
#[derive(Debug, Clone, Default)]
pub struct RunInvocation {
    pub image: String,
    /// Allocate a tty and keep stdin open; set when stdin is a terminal.
    pub interactive: bool,
    /// `host:container[:ro]` mount specs.
    pub volumes: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub hostname: Option<String>,
    /// Forwarded to the container entrypoint as `$@`.
    pub args: Vec<String>,
}
