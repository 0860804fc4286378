//! `dkr list-images`: table of dkr-managed images.

use super::common;
use anyhow::Result;
use colored::Colorize;
use dkr_core::docker::Docker;
use dkr_core::inventory::{find_images, labels, ImageRecord};
use dkr_core::refspec::parse_branch_ref;
use tabled::{Table, Tabled};

pub fn run(git_repo: Option<String>, branch_from: Option<String>) -> Result<()> {
    let repo = match git_repo.as_deref() {
        Some(path) => Some(common::open_repo(Some(path))?),
        None => None,
    };
    let branch = branch_from.as_deref().map(|raw| parse_branch_ref(raw, &[]).1);

    let images = find_images(&Docker, repo.as_ref().map(|r| r.root()), branch.as_deref());
    if images.is_empty() {
        println!("No dkr images found.");
        println!();
        println!("Create one with: {}", "dkr create-image".cyan());
        return Ok(());
    }

    #[derive(Tabled)]
    struct ImageRow {
        #[tabled(rename = "TAG")]
        tag: String,
        #[tabled(rename = "REPO")]
        repo: String,
        #[tabled(rename = "BRANCH")]
        branch: String,
        #[tabled(rename = "COMMIT")]
        commit: String,
        #[tabled(rename = "CREATED")]
        created: String,
        #[tabled(rename = "TYPE")]
        kind: String,
        #[tabled(rename = "IMAGE ID")]
        image_id: String,
    }

    let rows: Vec<ImageRow> = images
        .iter()
        .map(|img| ImageRow {
            tag: tag_cell(img),
            repo: img.label(labels::REPO_NAME).unwrap_or("").to_string(),
            branch: img.branch().unwrap_or("").to_string(),
            commit: short_commit(img.commit().unwrap_or("")),
            created: short_timestamp(img.created_at()),
            kind: img.label(labels::TYPE).unwrap_or("").to_string(),
            image_id: short_id(&img.id),
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}

fn tag_cell(img: &ImageRecord) -> String {
    if img.tags.is_empty() {
        "<none>".to_string()
    } else {
        img.tags.join(", ")
    }
}

/// First 12 characters of a commit hash.
fn short_commit(commit: &str) -> String {
    commit.chars().take(12).collect()
}

/// Image id in short form, without the digest prefix.
fn short_id(id: &str) -> String {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.chars().take(12).collect()
}

/// ISO-8601 timestamp truncated to whole seconds.
fn short_timestamp(ts: &str) -> String {
    ts.chars().take(19).collect()
}
