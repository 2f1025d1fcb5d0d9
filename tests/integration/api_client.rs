//! Integration tests for API error normalization.
//!
//! Every failed call must produce one [`ApiError`] with the extracted
//! message and status, and exactly one user notification.
//!
//! These tests validate:
//! - Server errors (`{"error": ...}` bodies) from the real backend
//! - Plain-text, `{"message": ...}` and empty bodies from a stub backend
//! - Transport failures carry no status
//! - Successful calls and rejected logins notify nobody

use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::get};
use url::Url;

use pmt::api::{ApiClient, RecordingNotifier, UNKNOWN_ERROR};
use pmt_proto::auth::{LoginRequest, SignupRequest};
use pmt_proto::task::TaskId;

/// Start the backend in-process and return its base URL.
async fn start_backend() -> (Url, tokio::task::JoinHandle<()>) {
    let (addr, handle) = pmt_server::routes::start_server("127.0.0.1:0")
        .await
        .expect("failed to start backend");
    (Url::parse(&format!("http://{addr}")).unwrap(), handle)
}

/// Start a backend whose `/task/{id}` answers with canned failures:
/// 1 is plain text, 2 is a `message` object, 3 is an empty body.
async fn start_stub() -> (Url, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route(
            "/task/1",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database is down") }),
        )
        .route(
            "/task/2",
            get(|| async {
                (
                    StatusCode::CONFLICT,
                    axum::Json(serde_json::json!({ "message": "task is locked" })),
                )
            }),
        )
        .route("/task/3", get(|| async { StatusCode::BAD_GATEWAY }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (Url::parse(&format!("http://{addr}")).unwrap(), handle)
}

fn client(base: Url) -> (ApiClient, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let api = ApiClient::new(base, None, notifier.clone()).unwrap();
    (api, notifier)
}

// =============================================================================
// Errors from the real backend
// =============================================================================

#[tokio::test]
async fn missing_task_is_one_404_and_one_notice() {
    let (url, _handle) = start_backend().await;
    let (api, notifier) = client(url);

    let err = api.task(TaskId(999)).await.unwrap_err();

    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "task 999 not found");
    assert_eq!(err.details["error"], "task 999 not found");
    assert_eq!(notifier.messages(), vec!["API error: task 999 not found"]);
}

#[tokio::test]
async fn validation_failure_is_a_400() {
    let (url, _handle) = start_backend().await;
    let (api, notifier) = client(url);

    let err = api
        .signup(&SignupRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "abc".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(400));
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn successful_calls_notify_nobody() {
    let (url, _handle) = start_backend().await;
    let (api, notifier) = client(url);

    let user = api
        .signup(&SignupRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .unwrap();
    let accepted = api
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .unwrap();
    let rejected = api
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap();

    assert!(accepted.success);
    assert_eq!(accepted.user, Some(user));
    assert!(!rejected.success);
    assert_eq!(rejected.user, None);
    assert_eq!(notifier.count(), 0, "a rejected login is not an API error");
}

// =============================================================================
// Body shapes the backend does not produce itself
// =============================================================================

#[tokio::test]
async fn plain_text_body_becomes_the_message() {
    let (url, _handle) = start_stub().await;
    let (api, notifier) = client(url);

    let err = api.task(TaskId(1)).await.unwrap_err();

    assert_eq!(err.status, Some(500));
    assert_eq!(err.message, "database is down");
    assert_eq!(err.details, serde_json::json!("database is down"));
    assert_eq!(notifier.messages(), vec!["API error: database is down"]);
}

#[tokio::test]
async fn message_field_is_used() {
    let (url, _handle) = start_stub().await;
    let (api, notifier) = client(url);

    let err = api.task(TaskId(2)).await.unwrap_err();

    assert_eq!(err.status, Some(409));
    assert_eq!(err.message, "task is locked");
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn empty_body_falls_back_to_unknown_error() {
    let (url, _handle) = start_stub().await;
    let (api, notifier) = client(url);

    let err = api.task(TaskId(3)).await.unwrap_err();

    assert_eq!(err.status, Some(502));
    assert_eq!(err.message, UNKNOWN_ERROR);
    assert_eq!(err.details, serde_json::Value::Null);
    assert_eq!(notifier.count(), 1);
}

// =============================================================================
// Transport failures
// =============================================================================

#[tokio::test]
async fn refused_connection_has_no_status() {
    // Bind and release a port so nothing listens on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (api, notifier) = client(Url::parse(&format!("http://{addr}")).unwrap());
    let err = api.users().await.unwrap_err();

    assert_eq!(err.status, None);
    assert!(!err.message.is_empty());
    assert_eq!(notifier.count(), 1);
}
