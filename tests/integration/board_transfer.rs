//! Integration tests for optimistic kanban transfers against the backend.
//!
//! Drives [`drop_task`] with a real [`ApiClient`] so the update request,
//! error normalization and rollback are exercised end to end.
//!
//! These tests validate:
//! - A confirmed transfer is persisted with the new status
//! - A rejected transfer restores the board and notifies the user once
//! - A same-column reorder issues no request at all

use std::sync::Arc;

use url::Url;

use pmt::api::{ApiClient, RecordingNotifier};
use pmt::board::{Board, DragDrop, DropReport, drop_task};
use pmt_proto::project::{NewProject, ProjectId};
use pmt_proto::task::{NewTask, Priority, TaskId, TaskStatus};

/// Start the backend in-process and return its base URL.
async fn start_backend() -> (Url, tokio::task::JoinHandle<()>) {
    let (addr, handle) = pmt_server::routes::start_server("127.0.0.1:0")
        .await
        .expect("failed to start backend");
    (Url::parse(&format!("http://{addr}")).unwrap(), handle)
}

/// Helper: a client with a fresh recorder.
fn client(base: Url) -> (ApiClient, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let api = ApiClient::new(base, None, notifier.clone()).unwrap();
    (api, notifier)
}

/// Helper: create a project holding one TODO task per name, and return the
/// project id with the board built from the server's answer.
async fn seed_board(api: &ApiClient, names: &[&str]) -> (ProjectId, Board) {
    let project = api
        .create_project(&NewProject {
            name: "Launch".to_string(),
            description: "Ship it".to_string(),
            end_date: None,
        })
        .await
        .unwrap();
    for name in names {
        api.create_task(&NewTask {
            name: (*name).to_string(),
            description: format!("{name} description"),
            due_date: None,
            priority: Priority::Medium,
            status: TaskStatus::Todo,
            project_id: project.id,
        })
        .await
        .unwrap();
    }
    let loaded = api.project(project.id).await.unwrap();
    (project.id, Board::from_tasks(loaded.tasks))
}

fn todo_to_in_progress(task_id: TaskId) -> DragDrop {
    DragDrop {
        from: TaskStatus::Todo,
        from_index: 0,
        to: TaskStatus::InProgress,
        to_index: 0,
        task_id,
    }
}

// =============================================================================
// Cross-column transfer accepted by the server
// =============================================================================

#[tokio::test]
async fn confirmed_transfer_is_persisted() {
    let (url, _handle) = start_backend().await;
    let (api, notifier) = client(url);
    let (project_id, mut board) = seed_board(&api, &["write docs"]).await;
    let task_id = board.column(TaskStatus::Todo)[0].id;

    let report = drop_task(&mut board, todo_to_in_progress(task_id), project_id, &api)
        .await
        .unwrap();

    assert!(matches!(report, DropReport::Confirmed(ref t) if t.status == TaskStatus::InProgress));
    assert!(board.column(TaskStatus::Todo).is_empty());
    let in_progress = board.column(TaskStatus::InProgress);
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].id, task_id);
    assert_eq!(in_progress[0].status, TaskStatus::InProgress);

    // The backend agrees with the board.
    let stored = api.task(task_id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::InProgress);
    assert_eq!(stored.project_id, Some(project_id));
    assert_eq!(notifier.count(), 0);
}

// =============================================================================
// Cross-column transfer rejected by the server
// =============================================================================

#[tokio::test]
async fn rejected_transfer_rolls_back_with_one_notice() {
    let (url, _handle) = start_backend().await;
    let (api, notifier) = client(url);
    let (project_id, mut board) = seed_board(&api, &["write docs"]).await;
    let task_id = board.column(TaskStatus::Todo)[0].id;
    let before = board.clone();

    // Someone else deletes the task; the board still shows it.
    api.delete_task(task_id).await.unwrap();

    let report = drop_task(&mut board, todo_to_in_progress(task_id), project_id, &api)
        .await
        .unwrap();

    let DropReport::RolledBack(error) = report else {
        panic!("expected a rollback, got {report:?}");
    };
    assert_eq!(error.status, Some(404));
    assert_eq!(board, before);
    assert_eq!(board.column(TaskStatus::Todo)[0].status, TaskStatus::Todo);
    assert!(board.column(TaskStatus::InProgress).is_empty());
    assert_eq!(notifier.count(), 1, "exactly one notification per failed transfer");
}

#[tokio::test]
async fn rollback_restores_the_source_position() {
    let (url, _handle) = start_backend().await;
    let (api, notifier) = client(url);
    let (project_id, mut board) = seed_board(&api, &["a", "b", "c"]).await;
    let middle = board.column(TaskStatus::Todo)[1].id;
    let before = board.clone();
    api.delete_task(middle).await.unwrap();

    let drop = DragDrop {
        from: TaskStatus::Todo,
        from_index: 1,
        to: TaskStatus::Done,
        to_index: 0,
        task_id: middle,
    };
    let report = drop_task(&mut board, drop, project_id, &api).await.unwrap();

    assert!(matches!(report, DropReport::RolledBack(_)));
    assert_eq!(board, before);
    assert_eq!(notifier.count(), 1);
}

// =============================================================================
// Same-column reorder
// =============================================================================

#[tokio::test]
async fn reorder_issues_no_request() {
    // No backend at all: any request would fail and notify.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (offline, notifier) = client(Url::parse(&format!("http://{addr}")).unwrap());

    let (url, _handle) = start_backend().await;
    let (api, _) = client(url);
    let (project_id, mut board) = seed_board(&api, &["A", "B"]).await;
    let a = board.column(TaskStatus::Todo)[0].id;
    let b = board.column(TaskStatus::Todo)[1].id;

    let drop = DragDrop {
        from: TaskStatus::Todo,
        from_index: 0,
        to: TaskStatus::Todo,
        to_index: 1,
        task_id: a,
    };
    let report = drop_task(&mut board, drop, project_id, &offline).await.unwrap();

    assert_eq!(report, DropReport::Reordered);
    let order: Vec<_> = board.column(TaskStatus::Todo).iter().map(|t| t.id).collect();
    assert_eq!(order, vec![b, a]);
    assert_eq!(notifier.count(), 0);
}
