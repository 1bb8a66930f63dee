// tests/two_phase_delete.rs

//! Deleting is two-phase: staging is free of side effects, only an explicit
//! confirmation issues the one destructive call.

use std::error::Error;
use std::sync::Arc;

use taskhelm::actions::ActionGateway;
use taskhelm::present::TaskListPresenter;
use taskhelm_test_utils::builders::TaskBuilder;
use taskhelm_test_utils::init_tracing;
use taskhelm_test_utils::recording::{Call, RecordingScheduler};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn staging_issues_no_backend_calls() -> TestResult {
    init_tracing();

    let rpc = RecordingScheduler::new();
    rpc.inner().seed_task(TaskBuilder::new("/bin/c").id(3).build());
    let mut presenter = TaskListPresenter::new();

    presenter.stage_delete(3);
    assert_eq!(presenter.staged_delete(), Some(3));
    assert_eq!(
        rpc.count_calls(|c| matches!(c, Call::RemoveTask(_))),
        0,
        "staging alone must not touch the backend"
    );
    Ok(())
}

#[tokio::test]
async fn confirmation_issues_exactly_one_removal() -> TestResult {
    init_tracing();

    let rpc = RecordingScheduler::new();
    rpc.inner().seed_task(TaskBuilder::new("/bin/c").id(3).build());
    let gateway = ActionGateway::new(Arc::new(rpc.clone()));
    let mut presenter = TaskListPresenter::new();

    presenter.stage_delete(3);
    let removed = presenter.confirm_delete(&gateway).await?;
    assert_eq!(removed, Some(3));
    assert_eq!(rpc.calls(), vec![Call::RemoveTask(3)]);

    // The stage is spent; confirming again is a no-op.
    assert_eq!(presenter.confirm_delete(&gateway).await?, None);
    assert_eq!(rpc.count_calls(|c| matches!(c, Call::RemoveTask(_))), 1);
    Ok(())
}

#[tokio::test]
async fn cancelling_clears_the_stage_without_calls() -> TestResult {
    init_tracing();

    let rpc = RecordingScheduler::new();
    rpc.inner().seed_task(TaskBuilder::new("/bin/c").id(3).build());
    let gateway = ActionGateway::new(Arc::new(rpc.clone()));
    let mut presenter = TaskListPresenter::new();

    presenter.stage_delete(3);
    presenter.cancel_delete();
    assert_eq!(presenter.confirm_delete(&gateway).await?, None);
    assert!(rpc.calls().is_empty());
    Ok(())
}
