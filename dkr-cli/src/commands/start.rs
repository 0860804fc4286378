//! `dkr start-image`: run a container from the latest matching image,
//! checking staleness against the live repository first.

use super::common::{self, StdinPrompt};
use anyhow::{anyhow, bail, Context, Result};
use dkr_core::config::BuildConfig;
use dkr_core::docker::{Docker, RunInvocation};
use dkr_core::inventory::{find_latest_image, labels};
use dkr_core::names::random_name;
use dkr_core::refspec::parse_branch_ref;
use dkr_core::staleness::{StalenessEvaluator, StalenessVerdict};
use dkr_core::GitRepo;
use std::collections::BTreeMap;
use std::io::IsTerminal;

pub struct StartArgs {
    pub git_repo: Option<String>,
    pub branch_from: Option<String>,
    pub name: Option<String>,
    pub agent: &'static str,
    pub anthropic_key: Option<String>,
    pub container_args: Vec<String>,
}

pub fn run(args: StartArgs) -> Result<()> {
    let repo = match args.git_repo.as_deref() {
        Some(path) => Some(common::open_repo(Some(path))?),
        None => None,
    };

    // The filter string stays as the user gave it: the inventory matches it
    // against both the checked-out branch and the originating ref, so
    // `origin/main` and `main` both work here.
    let branch = args.branch_from.as_deref().map(|raw| parse_branch_ref(raw, &[]).1);

    let docker = Docker;
    let mut image = find_latest_image(&docker, repo.as_ref().map(|r| r.root()), branch.as_deref())
        .ok_or_else(|| {
            let mut scope = String::new();
            if let Some(repo) = &repo {
                scope.push_str(&format!(" for {}", repo.name()));
            }
            if let Some(branch) = &branch {
                scope.push_str(&format!("/{branch}"));
            }
            anyhow!("no dkr image found{scope}. Run create-image first")
        })?;

    // A repo given on the command line wins; otherwise follow the image's
    // recorded source repository.
    let repo = match repo {
        Some(repo) => Some(repo),
        None => image
            .label(labels::REPO_PATH)
            .and_then(|path| GitRepo::open(path).ok()),
    };

    if let Some(repo) = &repo {
        let verdict = StalenessEvaluator::default().evaluate(&image, repo, &mut StdinPrompt);
        if let StalenessVerdict::StaleUpdateRequested { .. } = verdict {
            let repo_arg = repo.root().display().to_string();
            super::update::run(Some(repo_arg), args.branch_from.clone(), "~/.ssh/id_rsa")?;
            image = find_latest_image(&docker, Some(repo.root()), branch.as_deref())
                .context("image disappeared after update")?;
        }
    }

    let config = match &repo {
        Some(repo) => BuildConfig::load(repo.root()),
        None => BuildConfig::default(),
    };

    let work_name = args.name.unwrap_or_else(random_name);
    println!("Starting container from {}", image.display_tags());

    let mut volumes = config.volumes.clone();
    let ssh_key = common::default_ssh_key();
    if ssh_key.exists() {
        volumes.push(format!("{}:/root/.ssh/id_rsa:ro", ssh_key.display()));
    }
    if let Some(key_file) = args.anthropic_key {
        let key_path = common::expand_tilde(&key_file);
        if !key_path.exists() {
            bail!("Anthropic API key file not found: {}", key_path.display());
        }
        volumes.push(format!("{}:/run/secrets/anthropic_key:ro", key_path.display()));
    }

    let mut env = BTreeMap::new();
    env.insert("DKR_WORK_BRANCH".to_string(), work_name.clone());
    env.insert("DKR_AGENT".to_string(), args.agent.to_string());

    docker.run(&RunInvocation {
        image: image.reference().to_string(),
        interactive: std::io::stdin().is_terminal(),
        volumes,
        env,
        hostname: Some(work_name),
        args: args.container_args,
    })?;

    Ok(())
}
