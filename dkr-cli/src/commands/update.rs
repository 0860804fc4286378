//! `dkr update-image`: refresh an existing image with fetch + rebase.

use super::common;
use anyhow::Result;
use colored::Colorize;
use dkr_core::builder::{build_image, BuildRequest};
use dkr_core::docker::Docker;
use dkr_core::error::DkrError;
use dkr_core::inventory::find_latest_image;
use dkr_core::refspec;

pub fn run(git_repo: Option<String>, branch_from: Option<String>, ssh_key: &str) -> Result<()> {
    let ssh_key = common::resolve_ssh_key(ssh_key)?;
    let repo = common::open_repo(git_repo.as_deref())?;

    let raw_ref = match branch_from {
        Some(b) => b,
        None => repo.current_ref()?,
    };
    let (_, branch) = refspec::fetch_if_remote(&repo, &raw_ref)?;

    let docker = Docker;
    let base = find_latest_image(&docker, Some(repo.root()), Some(branch.as_str())).ok_or_else(|| {
        DkrError::MissingPriorImage { repo: repo.name(), branch: branch.clone() }
    })?;
    let base_ref = base.reference().to_string();

    let commit = repo.rev_parse(&raw_ref)?;
    println!("Updating from {} -> {} ({})", base_ref, raw_ref, &commit[..12]);

    let tag = build_image(
        &repo,
        &docker,
        &BuildRequest {
            checkout_branch: branch,
            branch_from: raw_ref,
            commit,
            ssh_key,
            base_image_ref: Some(base_ref),
        },
    )?;

    println!("Image updated: {}", tag.green());
    Ok(())
}
