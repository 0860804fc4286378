//! Shared helpers for command implementations.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dkr_core::staleness::StalenessPrompt;
use dkr_core::{GitRepo, ImageRecord};
use std::io::Write;
use std::path::PathBuf;

/// Open the repo at `arg` (default: cwd), absolute and validated.
pub fn open_repo(arg: Option<&str>) -> Result<GitRepo> {
    let path = match arg {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let path = path
        .canonicalize()
        .with_context(|| format!("cannot resolve path {}", path.display()))?;
    Ok(GitRepo::open(&path)?)
}

/// Expand a leading `~` and validate that the SSH key exists.
pub fn resolve_ssh_key(raw: &str) -> Result<PathBuf> {
    let path = expand_tilde(raw);
    if !path.exists() {
        bail!("SSH key not found: {}", path.display());
    }
    Ok(path)
}

/// Path to the user's default SSH key, expanded but not validated.
pub fn default_ssh_key() -> PathBuf {
    expand_tilde("~/.ssh/id_rsa")
}

pub fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Interactive staleness decisions over stdin.
pub struct StdinPrompt;

impl StalenessPrompt for StdinPrompt {
    fn confirm_update(&mut self, image: &ImageRecord, branch: &str, behind: u64) -> bool {
        println!(
            "{}",
            format!(
                "Warning: image {} is {} commits behind {}.",
                image.display_tags(),
                behind,
                branch
            )
            .yellow()
        );
        ask_yes_no("Do you want to update the image before starting? [y/N] ")
    }

    fn acknowledge_unverifiable(&mut self, image: &ImageRecord, branch: &str) -> bool {
        println!(
            "{}",
            format!("Warning: cannot verify image {} against {}.", image.display_tags(), branch)
                .yellow()
        );
        println!("The image commit may have been force-pushed away. Consider running create-image.");
        ask_yes_no("Start anyway? [y/N] ")
    }
}

fn ask_yes_no(prompt: &str) -> bool {
    print!("{prompt}");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_uses_home() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(expand_tilde("~/.ssh/id_rsa"), PathBuf::from("/home/tester/.ssh/id_rsa"));
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
