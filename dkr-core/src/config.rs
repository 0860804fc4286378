//! Repository-local build configuration.
//!
//! `.dkr.conf` lives at the root of the worktree at the revision being
//! built, so different branches may carry different configs. The format is
//! line-oriented: top-level `key = value` pairs plus `[pre_clone]` and
//! `[post_clone]` sections holding raw Dockerfile lines.
//!
//! Parsing is lenient by design: a missing file yields defaults, unknown
//! keys are stored but ignored, and unrecognized sections are accepted with
//! their content discarded. Callers rely on a degraded config never
//! blocking a build.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// File name looked up at the worktree root of the checked-out revision.
pub const CONF_FILE_NAME: &str = ".dkr.conf";

/// Base image used when the config does not name one.
pub const DEFAULT_BASE_IMAGE: &str = "fedora:43";

/// Normalized settings read from `.dkr.conf` at a specific revision.
///
/// Re-parsed fresh on every build; never cached across invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Base OS image for create builds.
    pub base_image: String,
    /// User packages in file order; merged over the baseline set at
    /// synthesis time.
    pub packages: Vec<String>,
    /// `host:container` mount specs passed through to `docker run`.
    pub volumes: Vec<String>,
    /// Raw Dockerfile lines spliced before the clone step (create only).
    pub pre_clone: String,
    /// Raw Dockerfile lines spliced after the checkout step.
    pub post_clone: String,
    /// Unrecognized top-level keys, kept for forward compatibility and
    /// otherwise ignored.
    pub extra: BTreeMap<String, String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            packages: Vec::new(),
            volumes: Vec::new(),
            pre_clone: String::new(),
            post_clone: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

enum Section {
    Top,
    PreClone,
    PostClone,
    Unrecognized,
}

impl BuildConfig {
    /// Read the config from `repo_root`. A missing file yields defaults.
    pub fn load(repo_root: &Path) -> Self {
        let path = repo_root.join(CONF_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
        }
    }

    /// Parse config text.
    pub fn parse(content: &str) -> Self {
        let mut conf = Self::default();
        let mut pre: Vec<&str> = Vec::new();
        let mut post: Vec<&str> = Vec::new();
        let mut section = Section::Top;

        for line in content.lines() {
            let stripped = line.trim();
            if stripped.is_empty() || stripped.starts_with('#') {
                continue;
            }
            if stripped.starts_with('[') && stripped.ends_with(']') {
                section = match &stripped[1..stripped.len() - 1] {
                    "pre_clone" => Section::PreClone,
                    "post_clone" => Section::PostClone,
                    _ => Section::Unrecognized,
                };
                continue;
            }
            match section {
                // Section content is opaque Dockerfile text; keep it untrimmed.
                Section::PreClone => pre.push(line),
                Section::PostClone => post.push(line),
                Section::Unrecognized => {}
                Section::Top => {
                    if let Some((key, value)) = stripped.split_once('=') {
                        conf.set(key.trim(), value.trim());
                    }
                }
            }
        }

        conf.pre_clone = pre.join("\n");
        conf.post_clone = post.join("\n");
        conf
    }

    fn set(&mut self, key: &str, value: &str) {
        match key {
            "base_image" => self.base_image = value.to_string(),
            "packages" => {
                self.packages = value.split_whitespace().map(str::to_string).collect();
            }
            "volumes" => {
                self.volumes = value.split_whitespace().map(str::to_string).collect();
            }
            _ => {
                self.extra.insert(key.to_string(), value.to_string());
            }
        }
    }
}
