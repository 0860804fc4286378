//! Staleness evaluation against real repositories.

mod common;

use common::{image_record, TestRepo};
use dkr_core::staleness::{StalenessEvaluator, StalenessPrompt, StalenessVerdict};
use dkr_core::{GitRepo, ImageRecord};

/// Canned prompt answers, recording what was asked.
struct CannedPrompt {
    update_answer: bool,
    update_calls: Vec<u64>,
    unverifiable_calls: usize,
}

impl CannedPrompt {
    fn answering(update_answer: bool) -> Self {
        Self { update_answer, update_calls: Vec::new(), unverifiable_calls: 0 }
    }
}

impl StalenessPrompt for CannedPrompt {
    fn confirm_update(&mut self, _image: &ImageRecord, _branch: &str, behind: u64) -> bool {
        self.update_calls.push(behind);
        self.update_answer
    }

    fn acknowledge_unverifiable(&mut self, _image: &ImageRecord, _branch: &str) -> bool {
        self.unverifiable_calls += 1;
        false
    }
}

#[test]
fn test_up_to_date_image_is_fresh() {
    let fixture = TestRepo::init();
    let commit = fixture.commit_file("README.md", "v1", "initial");
    let repo = GitRepo::open(fixture.path()).unwrap();
    let image = image_record(fixture.path(), "master", "master", &commit);

    let mut prompt = CannedPrompt::answering(true);
    let verdict = StalenessEvaluator::default().evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::Fresh);
    assert!(prompt.update_calls.is_empty());
    assert_eq!(prompt.unverifiable_calls, 0);
}

#[test]
fn test_threshold_is_exclusive() {
    let fixture = TestRepo::init();
    let commit = fixture.commit_file("README.md", "v1", "initial");
    for i in 0..3 {
        fixture.commit_empty(&format!("commit {i}"));
    }
    let repo = GitRepo::open(fixture.path()).unwrap();
    let image = image_record(fixture.path(), "master", "master", &commit);

    // Drift equal to the threshold still reads as fresh.
    let mut prompt = CannedPrompt::answering(true);
    let verdict = StalenessEvaluator::new(3).evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::Fresh);
    assert!(prompt.update_calls.is_empty());

    // One more commit crosses it.
    fixture.commit_empty("one past the threshold");
    let mut prompt = CannedPrompt::answering(false);
    let verdict = StalenessEvaluator::new(3).evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::StaleContinue { behind: 4 });
    assert_eq!(prompt.update_calls, vec![4]);
}

#[test]
fn test_default_threshold_is_fifty() {
    assert_eq!(dkr_core::DEFAULT_STALENESS_THRESHOLD, 50);
}

#[test]
fn test_sixty_commits_reported_exactly() {
    let fixture = TestRepo::init();
    let commit = fixture.commit_file("README.md", "v1", "initial");
    for i in 0..60 {
        fixture.commit_empty(&format!("commit {i}"));
    }
    let repo = GitRepo::open(fixture.path()).unwrap();
    let image = image_record(fixture.path(), "master", "master", &commit);

    let mut prompt = CannedPrompt::answering(true);
    let verdict = StalenessEvaluator::default().evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::StaleUpdateRequested { behind: 60 });
    assert_eq!(prompt.update_calls, vec![60]);

    let mut prompt = CannedPrompt::answering(false);
    let verdict = StalenessEvaluator::default().evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::StaleContinue { behind: 60 });
}

#[test]
fn test_remote_qualified_comparison_uses_originating_ref() {
    let upstream = TestRepo::init();
    let base = upstream.commit_file("README.md", "v1", "initial");
    let clone = upstream.clone_local();
    for i in 0..4 {
        upstream.commit_empty(&format!("commit {i}"));
    }
    clone.git(&["fetch", "origin"]);

    let repo = GitRepo::open(clone.path()).unwrap();
    // Built from origin/master: the recorded branch is the plain name, the
    // originating ref keeps the remote qualification for comparison.
    let image = image_record(clone.path(), "master", "origin/master", &base);

    let mut prompt = CannedPrompt::answering(false);
    let verdict = StalenessEvaluator::new(2).evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::StaleContinue { behind: 4 });
}

#[test]
fn test_missing_labels_trust_the_image() {
    let fixture = TestRepo::init();
    fixture.commit_file("README.md", "v1", "initial");
    let repo = GitRepo::open(fixture.path()).unwrap();

    let mut image = image_record(fixture.path(), "master", "master", "unused");
    image.labels.remove("dkr.commit");

    let mut prompt = CannedPrompt::answering(true);
    let verdict = StalenessEvaluator::default().evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::Fresh);
    assert!(prompt.update_calls.is_empty());
}

#[test]
fn test_deleted_branch_trusts_the_image() {
    let fixture = TestRepo::init();
    let commit = fixture.commit_file("README.md", "v1", "initial");
    let repo = GitRepo::open(fixture.path()).unwrap();
    let image = image_record(fixture.path(), "gone", "gone", &commit);

    let mut prompt = CannedPrompt::answering(true);
    let verdict = StalenessEvaluator::default().evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::Fresh);
}

#[test]
fn test_rewritten_history_is_unverifiable_but_proceeds() {
    let fixture = TestRepo::init();
    fixture.commit_file("README.md", "v1", "initial");
    let repo = GitRepo::open(fixture.path()).unwrap();

    // A commit that no longer exists anywhere in the repository, as after a
    // force-push that rewrote history.
    let vanished = "0123456789abcdef0123456789abcdef01234567";
    let image = image_record(fixture.path(), "master", "master", vanished);

    let mut prompt = CannedPrompt::answering(false);
    let verdict = StalenessEvaluator::default().evaluate(&image, &repo, &mut prompt);
    assert_eq!(verdict, StalenessVerdict::Unverifiable);
    assert_eq!(prompt.unverifiable_calls, 1);
    assert!(prompt.update_calls.is_empty());
}
