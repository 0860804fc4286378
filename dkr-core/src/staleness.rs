//! Staleness detection for inventory images.
//!
//! Compares a recorded image against the live repository by ancestry
//! distance, not by diff: the number of commits reachable from the branch
//! tip but not from the image's recorded commit.

use crate::git::GitRepo;
use crate::inventory::ImageRecord;
use tracing::{debug, warn};

/// Default drift threshold, in commits. Exclusive: drift equal to the
/// threshold still reads as fresh.
pub const DEFAULT_STALENESS_THRESHOLD: u64 = 50;

/// Outcome of comparing an image against the live repository.
///
/// Computed fresh on every start decision; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessVerdict {
    /// No meaningful drift, or nothing to compare against; trust the image.
    Fresh,
    /// Drift exceeds the threshold; the caller chose to proceed as-is.
    StaleContinue { behind: u64 },
    /// Drift exceeds the threshold; the caller chose to refresh first.
    StaleUpdateRequested { behind: u64 },
    /// The recorded commit is no longer an ancestor-comparable point, e.g.
    /// after a history rewrite. The image stays usable; there is no hard
    /// failure path out of staleness checking.
    Unverifiable,
}

/// Caller-supplied decisions for the two interactive branches.
///
/// The evaluator never touches the terminal itself: an interactive CLI
/// implements this over stdin, tests implement it with canned answers.
pub trait StalenessPrompt {
    /// Drift of `behind` commits was measured; return `true` to request an
    /// update before use.
    fn confirm_update(&mut self, image: &ImageRecord, branch: &str, behind: u64) -> bool;

    /// The comparison failed and the image cannot be verified. The return
    /// value is advisory only; the image is used either way.
    fn acknowledge_unverifiable(&mut self, image: &ImageRecord, branch: &str) -> bool;
}

/// Commit-distance staleness evaluation with a configurable threshold.
#[derive(Debug, Clone)]
pub struct StalenessEvaluator {
    threshold: u64,
}

impl Default for StalenessEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_THRESHOLD)
    }
}

impl StalenessEvaluator {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    /// Decide whether `image` may still be used against `repo`.
    pub fn evaluate(
        &self,
        image: &ImageRecord,
        repo: &GitRepo,
        prompt: &mut dyn StalenessPrompt,
    ) -> StalenessVerdict {
        let Some(image_commit) = image.commit() else {
            return StalenessVerdict::Fresh;
        };
        // The originating ref preserves remote qualification; fall back to
        // the plain branch label for records that lack it.
        let Some(branch) = image.branch_from().or(image.branch()) else {
            return StalenessVerdict::Fresh;
        };

        if !repo.ref_exists(branch) {
            // Deleted or never-fetched branch: nothing to compare against,
            // and that is not the image's fault.
            debug!(branch = %branch, "comparison branch not resolvable, trusting image");
            return StalenessVerdict::Fresh;
        }

        let behind = match repo.rev_list_count(image_commit, branch) {
            Ok(count) => count,
            Err(err) => {
                warn!(%err, commit = %image_commit, branch = %branch, "cannot verify image");
                prompt.acknowledge_unverifiable(image, branch);
                return StalenessVerdict::Unverifiable;
            }
        };

        if behind > self.threshold {
            if prompt.confirm_update(image, branch, behind) {
                StalenessVerdict::StaleUpdateRequested { behind }
            } else {
                StalenessVerdict::StaleContinue { behind }
            }
        } else {
            StalenessVerdict::Fresh
        }
    }
}
