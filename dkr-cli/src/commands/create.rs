//! `dkr create-image`: build a fresh image with a clone of the repo.

use super::common;
use anyhow::Result;
use colored::Colorize;
use dkr_core::builder::{build_image, BuildRequest};
use dkr_core::docker::Docker;
use dkr_core::refspec;

pub fn run(git_repo: Option<String>, branch_from: Option<String>, ssh_key: &str) -> Result<()> {
    let ssh_key = common::resolve_ssh_key(ssh_key)?;
    let repo = common::open_repo(git_repo.as_deref())?;

    let raw_ref = match branch_from {
        Some(b) => b,
        None => repo.current_ref()?,
    };
    let reference = refspec::resolve_ref(&repo, &raw_ref)?;

    println!(
        "Building from {} @ {} ({})",
        repo.root().display(),
        raw_ref,
        &reference.commit[..12]
    );

    let tag = build_image(
        &repo,
        &Docker,
        &BuildRequest {
            checkout_branch: reference.branch,
            branch_from: raw_ref,
            commit: reference.commit,
            ssh_key,
            base_image_ref: None,
        },
    )?;

    println!("Image built: {}", tag.green());
    Ok(())
}
