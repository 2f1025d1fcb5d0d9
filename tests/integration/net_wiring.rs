//! Integration tests for the network coordinator.
//!
//! Tests that `net::spawn_net` turns `NetCommand`s into backend calls and
//! answers with `NetEvent`s, and that the TUI state machine settles board
//! transfers from those events.
//!
//! These tests validate:
//! - Login success and rejection
//! - Project listing for a participant
//! - A failed transfer yields one `Notice` followed by `TaskUpdateFailed`
//! - The full key-press to rollback path through `App`
//! - Shutdown closes the event channel

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use url::Url;

use pmt::app::{App, Screen};
use pmt::net::{self, NetCommand, NetConfig, NetEvent};
use pmt::session::SessionStore;
use pmt_proto::auth::{LoginRequest, SignupRequest};
use pmt_proto::project::NewProject;
use pmt_proto::task::{NewTask, Priority, Task, TaskId, TaskStatus};
use pmt_proto::user::{Role, User, UserRole, UsersProject};
use pmt_server::store::Database;

/// Start the backend in-process over `db` and return its base URL.
async fn start_backend(db: Arc<Database>) -> (Url, tokio::task::JoinHandle<()>) {
    let (addr, handle) = pmt_server::routes::start_server_with_state("127.0.0.1:0", db)
        .await
        .expect("failed to start backend");
    (Url::parse(&format!("http://{addr}")).unwrap(), handle)
}

/// Helper: a database with one account.
async fn db_with_ada() -> (Arc<Database>, User) {
    let db = Arc::new(Database::new());
    let ada = db
        .create_user(SignupRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .unwrap();
    (db, ada)
}

/// Helper: receive the next event or fail after a timeout.
async fn next_event(rx: &mut mpsc::Receiver<NetEvent>) -> NetEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for event")
        .expect("event channel closed unexpectedly")
}

fn login(password: &str) -> NetCommand {
    NetCommand::Login(LoginRequest {
        email: "ada@example.com".to_string(),
        password: password.to_string(),
    })
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn login_round_trip() {
    let (db, ada) = db_with_ada().await;
    let (url, _handle) = start_backend(db).await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(NetConfig::new(url)).unwrap();

    cmd_tx.send(login("hunter22")).await.unwrap();
    match next_event(&mut evt_rx).await {
        NetEvent::LoggedIn(user) => assert_eq!(user, ada),
        other => panic!("expected LoggedIn, got {other:?}"),
    }

    cmd_tx.send(login("nope")).await.unwrap();
    assert!(matches!(next_event(&mut evt_rx).await, NetEvent::LoginRejected));
}

// =============================================================================
// Projects
// =============================================================================

#[tokio::test]
async fn projects_are_listed_for_participants() {
    let (db, ada) = db_with_ada().await;
    let project = db
        .create_project(NewProject {
            name: "Launch".to_string(),
            description: "Ship it".to_string(),
            end_date: None,
        })
        .await
        .unwrap();
    db.add_participants(UsersProject {
        project_id: project.id,
        users: vec![UserRole {
            id: None,
            user_id: ada.id,
            role: Role::Admin,
        }],
    })
    .await
    .unwrap();
    let (url, _handle) = start_backend(db).await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(NetConfig::new(url)).unwrap();

    cmd_tx.send(NetCommand::LoadProjects(ada.id)).await.unwrap();

    match next_event(&mut evt_rx).await {
        NetEvent::Projects(projects) => {
            assert_eq!(projects.len(), 1);
            assert_eq!(projects[0].id, project.id);
        }
        other => panic!("expected Projects, got {other:?}"),
    }
}

// =============================================================================
// Board transfers
// =============================================================================

#[tokio::test]
async fn failed_update_notifies_before_reporting() {
    let (db, _ada) = db_with_ada().await;
    let (url, _handle) = start_backend(db).await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(NetConfig::new(url)).unwrap();

    let ghost = Task {
        id: TaskId(404),
        name: "ghost".to_string(),
        description: "gone".to_string(),
        due_date: None,
        end_date: None,
        priority: Priority::Low,
        status: TaskStatus::Done,
        project_id: None,
        editor_id: None,
    };
    cmd_tx
        .send(NetCommand::UpdateTask {
            ticket: 3,
            task: ghost,
        })
        .await
        .unwrap();

    match next_event(&mut evt_rx).await {
        NetEvent::Notice(message) => assert_eq!(message, "API error: task 404 not found"),
        other => panic!("expected Notice first, got {other:?}"),
    }
    match next_event(&mut evt_rx).await {
        NetEvent::TaskUpdateFailed { ticket, error } => {
            assert_eq!(ticket, 3);
            assert_eq!(error.status, Some(404));
        }
        other => panic!("expected TaskUpdateFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn app_rolls_back_a_rejected_drop() {
    let (db, ada) = db_with_ada().await;
    let project = db
        .create_project(NewProject {
            name: "Launch".to_string(),
            description: "Ship it".to_string(),
            end_date: None,
        })
        .await
        .unwrap();
    let task = db
        .create_task(NewTask {
            name: "write docs".to_string(),
            description: "all of them".to_string(),
            due_date: None,
            priority: Priority::High,
            status: TaskStatus::Todo,
            project_id: project.id,
        })
        .await
        .unwrap();
    let loaded = db.project(project.id).await.unwrap();
    let (url, _handle) = start_backend(db.clone()).await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(NetConfig::new(url)).unwrap();

    let mut session = SessionStore::in_memory();
    session.login(ada).unwrap();
    let mut app = App::new(session);
    app.projects = vec![loaded.clone()];
    let press = |app: &mut App, code: KeyCode| {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    };

    assert!(matches!(
        press(&mut app, KeyCode::Enter),
        Some(NetCommand::LoadProject(_))
    ));
    app.apply_net_event(NetEvent::ProjectLoaded(loaded));
    assert_eq!(app.screen, Screen::Board);
    let before = app.board.clone();

    // The task disappears server-side before the drop lands.
    db.delete_task(task.id).await.unwrap();

    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Char('l'));
    let cmd = press(&mut app, KeyCode::Char(' ')).expect("drop should send an update");
    assert_eq!(app.board.column(TaskStatus::InProgress).len(), 1);
    assert_eq!(app.pending_transfers(), 1);

    cmd_tx.send(cmd).await.unwrap();
    for _ in 0..2 {
        let event = next_event(&mut evt_rx).await;
        assert!(app.apply_net_event(event).is_none());
    }

    assert_eq!(app.board, before);
    assert_eq!(app.board.column(TaskStatus::Todo)[0].status, TaskStatus::Todo);
    assert_eq!(app.pending_transfers(), 0);
    assert_eq!(app.notices.len(), 1);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn shutdown_closes_the_event_channel() {
    let (db, _ada) = db_with_ada().await;
    let (url, _handle) = start_backend(db).await;
    let (cmd_tx, mut evt_rx) = net::spawn_net(NetConfig::new(url)).unwrap();

    cmd_tx.send(NetCommand::Shutdown).await.unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(5), evt_rx.recv())
        .await
        .expect("timeout waiting for channel close");
    assert!(closed.is_none());
}
