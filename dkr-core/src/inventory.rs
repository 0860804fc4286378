//! Branch-addressed image inventory.
//!
//! Turns opaque docker images into a queryable inventory keyed by the
//! labels dkr stamps at build time. Images without the repo-name label are
//! not dkr's and never appear in results.

use crate::docker::{Docker, ImageInspect};
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::Path;

/// Label keys stamped on every dkr-managed image.
pub mod labels {
    pub const REPO_PATH: &str = "dkr.repo_path";
    pub const REPO_NAME: &str = "dkr.repo_name";
    pub const BRANCH: &str = "dkr.branch";
    pub const BRANCH_FROM: &str = "dkr.branch_from";
    pub const COMMIT: &str = "dkr.commit";
    pub const CREATED_AT: &str = "dkr.created_at";
    pub const TYPE: &str = "dkr.type";
}

/// How an image came to be: created fresh, or derived incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Base,
    Update,
}

impl ImageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Update => "update",
        }
    }
}

/// One dkr-managed image as reported by the store.
///
/// Read-only here: records are created by the store as a build side effect
/// and never mutated in place. An update layers a new record on top of a
/// prior one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: String,
    /// May be empty when a later build took the tag.
    pub tags: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl ImageRecord {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Branch actually checked out into the image.
    pub fn branch(&self) -> Option<&str> {
        self.label(labels::BRANCH)
    }

    /// Originating ref string; keeps remote qualification (`origin/main`).
    pub fn branch_from(&self) -> Option<&str> {
        self.label(labels::BRANCH_FROM)
    }

    /// Resolved commit the image was built from.
    pub fn commit(&self) -> Option<&str> {
        self.label(labels::COMMIT)
    }

    /// ISO-8601 UTC creation timestamp; empty for foreign records.
    pub fn created_at(&self) -> &str {
        self.label(labels::CREATED_AT).unwrap_or("")
    }

    /// Reference to address this image by: first tag, falling back to id.
    pub fn reference(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or(&self.id)
    }

    /// Human-readable tag list for messages.
    pub fn display_tags(&self) -> String {
        if self.tags.is_empty() {
            self.id.clone()
        } else {
            self.tags.join(", ")
        }
    }
}

/// Replace everything outside `[A-Za-z0-9._-]` for use in an image tag.
pub fn sanitize_tag(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
        .collect()
}

/// Canonical tag for a repo+branch pair: `dkr:<repo>-<branch>`, sanitized.
pub fn image_tag(repo_path: &Path, branch: &str) -> String {
    let repo_name = repo_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("dkr:{}-{}", sanitize_tag(&repo_name), sanitize_tag(branch))
}

/// Labels stamped on a new image at build time.
pub fn build_labels(
    repo_path: &Path,
    branch: &str,
    commit: &str,
    kind: ImageKind,
    branch_from: Option<&str>,
) -> BTreeMap<String, String> {
    let repo_name = repo_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut out = BTreeMap::new();
    out.insert(labels::REPO_PATH.to_string(), repo_path.display().to_string());
    out.insert(labels::REPO_NAME.to_string(), repo_name);
    out.insert(labels::BRANCH.to_string(), branch.to_string());
    out.insert(labels::BRANCH_FROM.to_string(), branch_from.unwrap_or(branch).to_string());
    out.insert(labels::COMMIT.to_string(), commit.to_string());
    out.insert(
        labels::CREATED_AT.to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    );
    out.insert(labels::TYPE.to_string(), kind.as_str().to_string());
    out
}

/// All dkr-managed images, newest first, optionally filtered.
///
/// `filter_repo` matches the recorded repository path exactly;
/// `filter_branch` matches either the checked-out branch or the originating
/// ref, so `main` and `origin/main` both find a build made from
/// `origin/main`. Store failures read as an empty inventory.
pub fn find_images(
    docker: &Docker,
    filter_repo: Option<&Path>,
    filter_branch: Option<&str>,
) -> Vec<ImageRecord> {
    let Some(ids) = docker.image_ids_with_label(labels::REPO_NAME) else {
        return Vec::new();
    };
    let Some(inspected) = docker.inspect_images(&ids) else {
        return Vec::new();
    };
    let records = inspected.into_iter().map(record_from_inspect).collect();
    filter_and_sort(records, filter_repo, filter_branch)
}

/// Most recent matching image, or `None`.
pub fn find_latest_image(
    docker: &Docker,
    filter_repo: Option<&Path>,
    filter_branch: Option<&str>,
) -> Option<ImageRecord> {
    find_images(docker, filter_repo, filter_branch).into_iter().next()
}

fn record_from_inspect(img: ImageInspect) -> ImageRecord {
    ImageRecord {
        id: img.id,
        tags: img.repo_tags,
        labels: img.config.labels.unwrap_or_default(),
    }
}

/// Pure filtering + ordering over materialized records.
///
/// Sort key is the creation-timestamp label, descending; lexicographic
/// comparison is safe because the format is fixed-width and zero-padded.
fn filter_and_sort(
    mut records: Vec<ImageRecord>,
    filter_repo: Option<&Path>,
    filter_branch: Option<&str>,
) -> Vec<ImageRecord> {
    let repo_filter = filter_repo.map(|p| p.display().to_string());
    records.retain(|rec| {
        if rec.label(labels::REPO_NAME).is_none() {
            return false;
        }
        if let Some(want) = &repo_filter {
            if rec.label(labels::REPO_PATH) != Some(want.as_str()) {
                return false;
            }
        }
        if let Some(branch) = filter_branch {
            if rec.branch() != Some(branch) && rec.branch_from() != Some(branch) {
                return false;
            }
        }
        true
    });
    records.sort_by(|a, b| b.created_at().cmp(a.created_at()));
    records
}
