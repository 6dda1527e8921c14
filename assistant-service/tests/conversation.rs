//! Conversation manager tests against a scripted thread service.
//!
//! Run with: cargo test -p assistant-service --test conversation

use assistant_service::models::{RunState, UploadedDocument};
use assistant_service::services::assistants::mock::MockThreadService;
use assistant_service::services::assistants::{RunStatus, ThreadService};
use assistant_service::services::conversation::{ConversationError, ConversationManager};
use assistant_service::services::quota::{QuotaGate, SessionBudget, UnlimitedQuota};
use assistant_service::services::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;

fn sample_document() -> UploadedDocument {
    UploadedDocument::new(
        "contract.txt".to_string(),
        "text/plain".to_string(),
        22,
        "utf-8".to_string(),
        "lorem ipsum dolor sit".to_string(),
    )
}

fn manager_with(
    service: Arc<MockThreadService>,
    quota: Arc<dyn QuotaGate>,
    run_timeout: Duration,
) -> ConversationManager {
    ConversationManager::new(
        service,
        SessionStore::new(),
        quota,
        "asst-test".to_string(),
        Duration::from_millis(5),
        run_timeout,
    )
}

#[tokio::test]
async fn queued_then_completed_run_polls_exactly_twice() {
    let service = Arc::new(MockThreadService::new(vec![
        MockThreadService::run(RunStatus::Queued, None, None),
        MockThreadService::run(RunStatus::Completed, Some("Clause 3 is unusual."), None),
    ]));
    let manager = manager_with(service.clone(), Arc::new(UnlimitedQuota), Duration::from_secs(2));

    let session = manager
        .start_session("tester", sample_document(), None)
        .await
        .expect("Failed to start session");

    let reply = manager
        .converse(&session.session_id, "Review this contract")
        .await
        .expect("Turn should complete");

    assert_eq!(reply, "Clause 3 is unusual.");
    assert_eq!(service.run_queries(), 2);

    let session = manager.store().find(&session.session_id).unwrap();
    assert_eq!(session.turn_count, 2);
    assert_eq!(session.run_state, RunState::Idle);
}

#[tokio::test]
async fn failed_run_is_a_distinct_outcome() {
    let service = Arc::new(MockThreadService::new(vec![MockThreadService::run(
        RunStatus::Failed,
        None,
        Some("model crashed"),
    )]));
    let manager = manager_with(service, Arc::new(UnlimitedQuota), Duration::from_secs(2));

    let session = manager
        .start_session("tester", sample_document(), None)
        .await
        .unwrap();

    let err = manager
        .converse(&session.session_id, "Review this contract")
        .await
        .expect_err("Failed run must not look like success");

    match err {
        ConversationError::RunFailed { message, .. } => {
            assert!(message.contains("model crashed"));
        }
        other => panic!("Expected RunFailed, got {:?}", other),
    }

    // The session is released, not wedged.
    let session = manager.store().find(&session.session_id).unwrap();
    assert_eq!(session.run_state, RunState::Idle);
    assert_eq!(session.turn_count, 0);
}

#[tokio::test]
async fn cancelled_run_is_a_distinct_outcome() {
    let service = Arc::new(MockThreadService::new(vec![MockThreadService::run(
        RunStatus::Cancelled,
        None,
        None,
    )]));
    let manager = manager_with(service, Arc::new(UnlimitedQuota), Duration::from_secs(2));

    let session = manager
        .start_session("tester", sample_document(), None)
        .await
        .unwrap();

    let err = manager
        .converse(&session.session_id, "Review this contract")
        .await
        .expect_err("Cancelled run must surface");

    assert!(matches!(err, ConversationError::RunCancelled(_)));
}

#[tokio::test]
async fn stuck_run_times_out_instead_of_polling_forever() {
    let service = Arc::new(MockThreadService::new(vec![MockThreadService::run(
        RunStatus::InProgress,
        None,
        None,
    )]));
    let manager = manager_with(service, Arc::new(UnlimitedQuota), Duration::from_millis(50));

    let session = manager
        .start_session("tester", sample_document(), None)
        .await
        .unwrap();

    let err = manager
        .converse(&session.session_id, "Review this contract")
        .await
        .expect_err("Stuck run must time out");

    assert!(matches!(err, ConversationError::RunTimeout { .. }));
}

#[tokio::test]
async fn unrecognized_status_keeps_polling_until_terminal() {
    let service = Arc::new(MockThreadService::new(vec![
        MockThreadService::run(RunStatus::Other("requires_action".to_string()), None, None),
        MockThreadService::run(RunStatus::Completed, Some("Done."), None),
    ]));
    let manager = manager_with(service.clone(), Arc::new(UnlimitedQuota), Duration::from_secs(2));

    let session = manager
        .start_session("tester", sample_document(), None)
        .await
        .unwrap();

    let reply = manager
        .converse(&session.session_id, "Review this contract")
        .await
        .unwrap();

    assert_eq!(reply, "Done.");
    assert_eq!(service.run_queries(), 2);
}

#[tokio::test]
async fn zero_quota_denies_session_without_remote_calls() {
    let service = Arc::new(MockThreadService::with_reply("unused"));
    let manager = manager_with(
        service.clone(),
        Arc::new(SessionBudget::new(0)),
        Duration::from_secs(2),
    );

    let err = manager
        .start_session("tester", sample_document(), None)
        .await
        .expect_err("Zero quota must deny the session");

    assert!(matches!(err, ConversationError::QuotaExceeded));
    assert_eq!(service.threads_created(), 0);
    assert_eq!(service.runs_created(), 0);
}

#[tokio::test]
async fn contract_check_rides_on_the_first_run_only() {
    let service = Arc::new(MockThreadService::with_reply("Looks fine."));
    let manager = manager_with(service.clone(), Arc::new(UnlimitedQuota), Duration::from_secs(2));

    let session = manager
        .start_session("tester", sample_document(), None)
        .await
        .unwrap();

    manager
        .converse(&session.session_id, "Review this contract")
        .await
        .unwrap();
    manager
        .converse(&session.session_id, "What about clause 4?")
        .await
        .unwrap();

    assert_eq!(
        service.function_calls(),
        vec![Some("contract_check".to_string()), None]
    );
}

#[tokio::test]
async fn session_budget_depletes_per_started_session() {
    let service = Arc::new(MockThreadService::with_reply("ok"));
    let service_dyn: Arc<dyn ThreadService> = service.clone();
    let quota = Arc::new(SessionBudget::new(1));
    let manager = ConversationManager::new(
        service_dyn,
        SessionStore::new(),
        quota,
        "asst-test".to_string(),
        Duration::from_millis(5),
        Duration::from_secs(2),
    );

    manager
        .start_session("tester", sample_document(), None)
        .await
        .expect("First session fits the budget");

    let err = manager
        .start_session("tester", sample_document(), None)
        .await
        .expect_err("Budget of one admits exactly one session");

    assert!(matches!(err, ConversationError::QuotaExceeded));
    assert_eq!(service.threads_created(), 1);
}
