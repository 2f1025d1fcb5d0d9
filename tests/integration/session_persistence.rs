//! Integration tests for session persistence across client restarts.
//!
//! A "restart" is a new `SessionStore` over the same session file with a
//! fresh per-session storage.
//!
//! These tests validate:
//! - A login survives a restart
//! - A logout is seen by the next start
//! - Corrupt or foreign data means "logged out", never a crash
//! - Per-session storage wins over the persistent file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pmt::app::{App, Screen};
use pmt::net::NetCommand;
use pmt::session::{FileStorage, MemoryStorage, SESSION_KEY, SessionStorage, SessionStore};
use pmt_proto::user::{User, UserId};

/// Helper: a fresh session file path unique to this test.
fn session_file(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pmt-session-it-{}-{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("session.json")
}

/// Helper: what the client does on start.
fn start(path: &Path) -> SessionStore {
    SessionStore::open(
        Box::new(FileStorage::new(path)),
        Box::new(MemoryStorage::new()),
    )
}

fn user(id: i64, name: &str) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

#[test]
fn login_survives_a_restart() {
    let path = session_file("login");
    let mut first = start(&path);
    assert!(!first.is_logged_in());
    first.login(user(1, "Ada")).unwrap();
    drop(first);

    let second = start(&path);
    assert!(second.is_logged_in());
    assert_eq!(second.current_user(), Some(&user(1, "Ada")));
}

#[test]
fn logout_is_seen_by_the_next_start() {
    let path = session_file("logout");
    let mut first = start(&path);
    first.login(user(1, "Ada")).unwrap();
    first.logout().unwrap();
    assert_eq!(first.current_user(), None);

    let second = start(&path);
    assert!(!second.is_logged_in());
}

#[test]
fn corrupt_session_means_logged_out() {
    let path = session_file("corrupt");
    FileStorage::new(&path).set(SESSION_KEY, "{not a user").unwrap();

    let session = start(&path);
    assert!(!session.is_logged_in());
}

#[test]
fn garbage_file_means_logged_out() {
    let path = session_file("garbage");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "definitely not json").unwrap();

    let session = start(&path);
    assert!(!session.is_logged_in());
}

#[test]
fn per_session_copy_takes_precedence() {
    let path = session_file("precedence");
    FileStorage::new(&path)
        .set(SESSION_KEY, &serde_json::to_string(&user(1, "Ada")).unwrap())
        .unwrap();
    let per_session = Arc::new(MemoryStorage::new());
    per_session
        .set(SESSION_KEY, &serde_json::to_string(&user(2, "Grace")).unwrap())
        .unwrap();

    let session = SessionStore::open(Box::new(FileStorage::new(&path)), Box::new(per_session));

    assert_eq!(session.current_user().map(|u| u.id), Some(UserId(2)));
}

#[test]
fn restored_session_skips_the_login_screen() {
    let path = session_file("app");
    start(&path).login(user(1, "Ada")).unwrap();

    let app = App::new(start(&path));

    assert_eq!(app.screen, Screen::Dashboard);
    assert!(matches!(
        app.startup_command(),
        Some(NetCommand::LoadProjects(UserId(1)))
    ));
}
