//! HTTP routes of the backend.
//!
//! Every handler is a thin adapter over [`Database`]: decode the JSON body
//! or path ids, call the store, encode the result. Store errors become
//! `400` or `404` responses with an `{"error": "..."}` body.

use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use pmt_proto::auth::{LoginRequest, LoginResponse, SignupRequest};
use pmt_proto::history::HistoryEntry;
use pmt_proto::project::{NewProject, Project, ProjectId, ProjectUpdate};
use pmt_proto::task::{NewTask, Task, TaskId};
use pmt_proto::user::{Assigned, Membership, User, UserId, UsersProject};

use crate::store::{Database, StoreError};

type Db = State<Arc<Database>>;

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = if self.is_bad_request() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::NOT_FOUND
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Builds the application router over a shared database.
pub fn router(db: Arc<Database>) -> Router {
    Router::new()
        .route("/user", get(list_users).post(create_user))
        .route("/user/login", post(login))
        .route("/user/project/{project_id}", get(users_in_project))
        .route("/project", post(create_project).put(update_project))
        .route("/project/{id}", get(get_project).delete(delete_project))
        .route("/project/user", post(add_participants))
        .route(
            "/project/user/{id}",
            get(projects_for_user).delete(remove_participant),
        )
        .route("/project/user/list/{project_id}", get(participants))
        .route("/task", post(create_task).put(update_task))
        .route("/task/{id}", get(get_task).delete(delete_task))
        .route("/assign/{task_id}/{user_id}", post(assign))
        .route("/assign/{id}", get(assignments).delete(unassign))
        .route("/historique/project/{id}", get(project_history))
        .route("/historique/task/{id}", get(task_history))
        .layer(middleware::from_fn(log_request))
        .with_state(db)
}

/// Starts the server on the given address with an empty database and
/// returns the bound address and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(Database::new())).await
}

/// Starts the server over an existing [`Database`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    db: Arc<Database>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(db);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    let status = response.status().as_u16();
    if response.status().is_success() {
        tracing::info!(%method, path = %path, status, "request");
    } else {
        tracing::warn!(%method, path = %path, status, "request failed");
    }
    response
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn login(State(db): Db, Json(request): Json<LoginRequest>) -> Json<LoginResponse> {
    let user = db.login(&request).await;
    Json(LoginResponse {
        success: user.is_some(),
        user,
    })
}

async fn create_user(
    State(db): Db,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>), StoreError> {
    let user = db.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(State(db): Db) -> Json<Vec<User>> {
    Json(db.users().await)
}

async fn users_in_project(
    State(db): Db,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<User>>, StoreError> {
    Ok(Json(db.users_in_project(ProjectId(project_id)).await?))
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

async fn create_project(
    State(db): Db,
    Json(new): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), StoreError> {
    let project = db.create_project(new).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(State(db): Db, Path(id): Path<i64>) -> Result<Json<Project>, StoreError> {
    Ok(Json(db.project(ProjectId(id)).await?))
}

async fn update_project(
    State(db): Db,
    Json(update): Json<ProjectUpdate>,
) -> Result<Json<Project>, StoreError> {
    Ok(Json(db.update_project(update).await?))
}

async fn delete_project(State(db): Db, Path(id): Path<i64>) -> Result<StatusCode, StoreError> {
    db.delete_project(ProjectId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn projects_for_user(State(db): Db, Path(user_id): Path<i64>) -> Json<Vec<Project>> {
    Json(db.projects_for_user(UserId(user_id)).await)
}

async fn add_participants(
    State(db): Db,
    Json(payload): Json<UsersProject>,
) -> Result<(StatusCode, Json<Vec<Membership>>), StoreError> {
    let created = db.add_participants(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn participants(
    State(db): Db,
    Path(project_id): Path<i64>,
) -> Result<Json<UsersProject>, StoreError> {
    Ok(Json(db.participants(ProjectId(project_id)).await?))
}

async fn remove_participant(State(db): Db, Path(id): Path<i64>) -> Result<StatusCode, StoreError> {
    db.remove_participant(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

async fn get_task(State(db): Db, Path(id): Path<i64>) -> Result<Json<Task>, StoreError> {
    Ok(Json(db.task(TaskId(id)).await?))
}

async fn create_task(
    State(db): Db,
    Json(new): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), StoreError> {
    let task = db.create_task(new).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(State(db): Db, Json(task): Json<Task>) -> Result<Json<Task>, StoreError> {
    Ok(Json(db.update_task(task).await?))
}

async fn delete_task(State(db): Db, Path(id): Path<i64>) -> Result<StatusCode, StoreError> {
    db.delete_task(TaskId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Assignments and history
// ---------------------------------------------------------------------------

async fn assign(
    State(db): Db,
    Path((task_id, user_id)): Path<(i64, i64)>,
) -> Result<(StatusCode, Json<Assigned>), StoreError> {
    let assigned = db.assign(TaskId(task_id), UserId(user_id)).await?;
    Ok((StatusCode::CREATED, Json(assigned)))
}

async fn assignments(
    State(db): Db,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<Assigned>>, StoreError> {
    Ok(Json(db.assignments(TaskId(task_id)).await?))
}

async fn unassign(State(db): Db, Path(id): Path<i64>) -> Result<StatusCode, StoreError> {
    db.unassign(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn project_history(State(db): Db, Path(id): Path<i64>) -> Json<Vec<HistoryEntry>> {
    Json(db.project_history(ProjectId(id)).await)
}

async fn task_history(State(db): Db, Path(id): Path<i64>) -> Json<Vec<HistoryEntry>> {
    Json(db.task_history(TaskId(id)).await)
}

/// Starts the server in-process on an OS-assigned port for testing.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}
