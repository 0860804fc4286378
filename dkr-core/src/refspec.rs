//! Branch/remote reference resolution.
//!
//! Turns an ambiguous user-supplied ref string into an unambiguous
//! (remote-or-none, branch, commit) triple against a live repository.

use crate::error::Result;
use crate::git::GitRepo;
use tracing::info;

/// A fully resolved reference to a point in history.
///
/// `commit` is always a full hash, never a symbolic name. `remote` is set
/// only when the originating ref was remote-qualified, in which case the
/// branch was fetched from that remote before the commit was resolved.
/// Constructed once per command invocation; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub remote: Option<String>,
    pub branch: String,
    pub commit: String,
}

/// Split a raw user ref into `(remote, branch)`.
///
/// `origin/main` splits only when `origin` is among `remotes`; any other
/// slash-containing string is a local branch name, so `team/feature-x`
/// round-trips intact unless a remote named `team` exists. That collision
/// is resolved in favor of the remote: a local branch named after a
/// configured remote will be misread as remote-qualified.
///
/// An empty ref or literal `HEAD` defers to whatever is currently checked
/// out; the caller turns that into a concrete branch via
/// [`GitRepo::current_ref`].
pub fn parse_branch_ref(raw: &str, remotes: &[String]) -> (Option<String>, String) {
    if raw.is_empty() || raw == "HEAD" {
        return (None, "HEAD".to_string());
    }
    if let Some((candidate, rest)) = raw.split_once('/') {
        if remotes.iter().any(|r| r == candidate) {
            return (Some(candidate.to_string()), rest.to_string());
        }
    }
    (None, raw.to_string())
}

/// Parse `raw` against the repository's configured remotes and, when it is
/// remote-qualified, fetch that single branch from that single remote.
///
/// Fetching one branch instead of the whole remote keeps refreshes cheap on
/// large repositories.
pub fn fetch_if_remote(repo: &GitRepo, raw: &str) -> Result<(Option<String>, String)> {
    let (remote, branch) = parse_branch_ref(raw, &repo.remotes());
    if let Some(remote) = &remote {
        info!(remote = %remote, branch = %branch, "fetching single branch");
        repo.fetch_branch(remote, &branch)?;
    }
    Ok((remote, branch))
}

/// Resolve a raw ref all the way to an immutable [`RepoRef`].
pub fn resolve_ref(repo: &GitRepo, raw: &str) -> Result<RepoRef> {
    let (remote, branch) = fetch_if_remote(repo, raw)?;
    let commit = repo.rev_parse(raw)?;
    Ok(RepoRef { remote, branch, commit })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remotes(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_empty_and_head_defer() {
        assert_eq!(parse_branch_ref("", &remotes(&["origin"])), (None, "HEAD".to_string()));
        assert_eq!(parse_branch_ref("HEAD", &remotes(&["origin"])), (None, "HEAD".to_string()));
    }

    #[test]
    fn test_plain_branch_passes_through() {
        assert_eq!(parse_branch_ref("main", &remotes(&["origin"])), (None, "main".to_string()));
    }

    #[test]
    fn test_remote_qualified_splits_on_first_slash() {
        assert_eq!(
            parse_branch_ref("origin/main", &remotes(&["origin"])),
            (Some("origin".to_string()), "main".to_string())
        );
        assert_eq!(
            parse_branch_ref("origin/team/feature", &remotes(&["origin"])),
            (Some("origin".to_string()), "team/feature".to_string())
        );
    }

    #[test]
    fn test_slash_branch_without_matching_remote_round_trips() {
        assert_eq!(
            parse_branch_ref("team/feature-x", &remotes(&["origin"])),
            (None, "team/feature-x".to_string())
        );
        assert_eq!(parse_branch_ref("team/feature-x", &[]), (None, "team/feature-x".to_string()));
    }

    #[test]
    fn test_remote_name_collision_reads_as_remote() {
        // Documented heuristic: the remote wins over a same-named path segment.
        assert_eq!(
            parse_branch_ref("upstream/fix", &remotes(&["origin", "upstream"])),
            (Some("upstream".to_string()), "fix".to_string())
        );
    }
}
