use tracing::{info, info_span, warn, Instrument};

use super::{ReviewError, Reviewer};
use crate::pr::{HostError, PullRequest};
use crate::report::ReviewOutcome;

/// Review each pull request in order, one at a time.
///
/// A failure for one item is logged and recorded as `ReviewOutcome::Failed`;
/// the remaining items are still processed.
pub async fn review_all(reviewer: &Reviewer<'_>, prs: &[PullRequest]) -> Vec<ReviewOutcome> {
    let mut outcomes = Vec::with_capacity(prs.len());
    for pr in prs {
        let Some(id) = pr.id else {
            warn!(title = %pr.title, "skipping pull request without id");
            outcomes.push(failed(pr, ReviewError::MissingId));
            continue;
        };
        let span = info_span!("review_pr", pr = id);
        let outcome = match reviewer.review(pr).instrument(span).await {
            Ok(result) => ReviewOutcome::Reviewed(result),
            Err(e) => {
                warn!(pr = id, kind = %e.kind(), error = %e, "failed to review PR #{id}");
                failed(pr, e)
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// List the open pull requests and review all of them.
/// Only a failing listing is an error.
pub async fn review_open(reviewer: &Reviewer<'_>) -> Result<Vec<ReviewOutcome>, HostError> {
    let prs = reviewer.host().list_open_pull_requests().await?;
    if prs.is_empty() {
        info!(repo = %reviewer.host().repository(), "no open pull requests");
        return Ok(Vec::new());
    }
    info!(count = prs.len(), "reviewing open pull requests");
    Ok(review_all(reviewer, &prs).await)
}

fn failed(pr: &PullRequest, error: ReviewError) -> ReviewOutcome {
    ReviewOutcome::Failed {
        id: pr.id,
        kind: error.kind(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{successes, ErrorKind};
    use crate::review::tests::{test_pull_request, FakeChat, FakeHost};
    use crate::review::PromptSettings;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_failure_in_middle_is_isolated() {
        let prs = vec![test_pull_request(1), test_pull_request(2), test_pull_request(3)];
        let host = FakeHost::new(prs.clone());
        let mut chat = FakeChat::new();
        chat.fail_on.push("#2 ".to_string());
        let reviewer = Reviewer::new(&host, &chat, PromptSettings::default(), true);

        let outcomes = review_all(&reviewer, &prs).await;
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            outcomes[1],
            ReviewOutcome::Failed { id: Some(2), kind: ErrorKind::Protocol, .. }
        ));

        let ids: Vec<u64> = successes(outcomes).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        let commented: Vec<u64> = host.comments.lock().unwrap().iter().map(|(id, _)| *id).collect();
        assert_eq!(commented, vec![1, 3]);

        assert!(logs_contain("failed to review PR #2"));
        assert!(logs_contain("kind=protocol"));
        assert!(!logs_contain("failed to review PR #1"));
        assert!(!logs_contain("failed to review PR #3"));
    }

    #[tokio::test]
    async fn test_host_failure_is_isolated() {
        let prs = vec![test_pull_request(10), test_pull_request(11)];
        let mut host = FakeHost::new(prs.clone());
        host.failing_changes.insert(10);
        let chat = FakeChat::new();
        let reviewer = Reviewer::new(&host, &chat, PromptSettings::default(), false);

        let outcomes = review_all(&reviewer, &prs).await;
        let ids: Vec<u64> = successes(outcomes).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![11]);
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn test_record_without_id_is_skipped() {
        let no_id = PullRequest {
            id: None,
            ..test_pull_request(0)
        };
        let prs = vec![no_id, test_pull_request(4)];
        let host = FakeHost::new(prs.clone());
        let chat = FakeChat::new();
        let reviewer = Reviewer::new(&host, &chat, PromptSettings::default(), true);

        let outcomes = review_all(&reviewer, &prs).await;
        assert!(matches!(
            outcomes[0],
            ReviewOutcome::Failed { id: None, kind: ErrorKind::Validation, .. }
        ));
        assert_eq!(chat.calls(), 1);
        assert_eq!(host.calls(), vec!["changes 4", "comment 4"]);
    }

    #[tokio::test]
    async fn test_results_keep_input_order_and_ids() {
        let prs = vec![test_pull_request(9), test_pull_request(2), test_pull_request(5)];
        let host = FakeHost::new(prs.clone());
        let chat = FakeChat::new();
        let reviewer = Reviewer::new(&host, &chat, PromptSettings::default(), false);

        let results = successes(review_all(&reviewer, &prs).await);
        let ids: Vec<u64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![9, 2, 5]);
    }

    #[tokio::test]
    async fn test_empty_listing_makes_no_other_calls() {
        let host = FakeHost::new(vec![]);
        let chat = FakeChat::new();
        let reviewer = Reviewer::new(&host, &chat, PromptSettings::default(), true);

        let outcomes = review_open(&reviewer).await.unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(host.calls(), vec!["list"]);
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_review_open_lists_then_reviews() {
        let host = FakeHost::new(vec![test_pull_request(1), test_pull_request(2)]);
        let chat = FakeChat::new();
        let reviewer = Reviewer::new(&host, &chat, PromptSettings::default(), true);

        let results = successes(review_open(&reviewer).await.unwrap());
        assert_eq!(results.len(), 2);
        assert_eq!(
            host.calls(),
            vec!["list", "changes 1", "comment 1", "changes 2", "comment 2"]
        );
    }
}
