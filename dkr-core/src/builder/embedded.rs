//! Support scripts shipped inside the binary.
//!
//! The scripts are embedded at compile time and copied into the build
//! context for the duration of a build, then removed. Embedding keeps the
//! tool a single self-contained binary with no install-time assets.

/// Container entrypoint: prepares the work branch and hands off to the agent.
pub const ENTRYPOINT_SH: &str = include_str!("../../embedded/entrypoint.sh");

/// Distro-agnostic package installation helper.
pub const INSTALL_PACKAGES_SH: &str = include_str!("../../embedded/install-packages.sh");
