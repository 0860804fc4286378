//! Error types for dkr.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error
//! chains. Inventory-query and version-lookup failures are deliberately not
//! represented here: those degrade locally to an empty inventory and the
//! `latest` sentinel instead of propagating.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dkr operations.
pub type Result<T> = std::result::Result<T, DkrError>;

/// Main error type for dkr.
#[derive(Error, Debug)]
pub enum DkrError {
    #[error("{path:?} is not a git repository")]
    NotAGitRepo { path: PathBuf },

    #[error("cannot resolve ref {reference}: {reason}")]
    UnresolvableRef { reference: String, reason: String },

    #[error("no existing image found for {repo}/{branch}. Run create-image first")]
    MissingPriorImage { repo: String, branch: String },

    #[error("git {args} failed: {stderr}")]
    GitFailed { args: String, stderr: String },

    #[error("build failed: {reason}")]
    BuildFailed { reason: String },

    #[error("failed to run {program}: {source}")]
    CommandFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
