//! Typed client for the backend REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use pmt_proto::auth::{LoginRequest, LoginResponse, SignupRequest};
use pmt_proto::history::HistoryEntry;
use pmt_proto::project::{NewProject, Project, ProjectId, ProjectUpdate};
use pmt_proto::task::{NewTask, Task, TaskId};
use pmt_proto::user::{Assigned, Membership, User, UserId, UsersProject};

use super::{ApiError, Notifier, TaskUpdater};

/// Default backend address.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Async client for the backend. Cheap to clone; clones share the
/// connection pool and the notifier.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `base`. Without `timeout`, requests use the
    /// transport default.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] without status if the HTTP client cannot be
    /// built.
    pub fn new(
        mut base: Url,
        timeout: Option<Duration>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ApiError::transport(&e))?;
        Ok(Self {
            http,
            base,
            notifier,
        })
    }

    /// Base URL every endpoint path is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// `POST /user/login`. Wrong credentials are `success: false`, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.fetch(Method::POST, "user/login", Some(request)).await
    }

    /// `POST /user`: creates an account.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn signup(&self, request: &SignupRequest) -> Result<User, ApiError> {
        self.fetch(Method::POST, "user", Some(request)).await
    }

    /// `GET /user`: every account.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.get("user").await
    }

    /// `GET /user/project/{id}`: participants of a project.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn users_in_project(&self, project_id: ProjectId) -> Result<Vec<User>, ApiError> {
        self.get(&format!("user/project/{project_id}")).await
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// `POST /project`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        self.fetch(Method::POST, "project", Some(project)).await
    }

    /// `GET /project/user/{id}`: projects a user participates in.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn projects_for_user(&self, user_id: UserId) -> Result<Vec<Project>, ApiError> {
        self.get(&format!("project/user/{user_id}")).await
    }

    /// `GET /project/{id}`: a project with its tasks.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn project(&self, project_id: ProjectId) -> Result<Project, ApiError> {
        self.get(&format!("project/{project_id}")).await
    }

    /// `PUT /project`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn update_project(&self, update: &ProjectUpdate) -> Result<Project, ApiError> {
        self.fetch(Method::PUT, "project", Some(update)).await
    }

    /// `DELETE /project/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn delete_project(&self, project_id: ProjectId) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &format!("project/{project_id}"))
            .await
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// `GET /task/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn task(&self, task_id: TaskId) -> Result<Task, ApiError> {
        self.get(&format!("task/{task_id}")).await
    }

    /// `POST /task`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        self.fetch(Method::POST, "task", Some(task)).await
    }

    /// `PUT /task` with the full task.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn update_task(&self, task: &Task) -> Result<Task, ApiError> {
        self.fetch(Method::PUT, "task", Some(task)).await
    }

    /// `DELETE /task/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn delete_task(&self, task_id: TaskId) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &format!("task/{task_id}"))
            .await
    }

    // -----------------------------------------------------------------------
    // Participants
    // -----------------------------------------------------------------------

    /// `POST /project/user`: adds participants, returning the new
    /// memberships.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn add_participants(
        &self,
        participants: &UsersProject,
    ) -> Result<Vec<Membership>, ApiError> {
        self.fetch(Method::POST, "project/user", Some(participants))
            .await
    }

    /// `GET /project/user/list/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn participants(&self, project_id: ProjectId) -> Result<UsersProject, ApiError> {
        self.get(&format!("project/user/list/{project_id}")).await
    }

    /// `DELETE /project/user/{membershipId}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn remove_participant(&self, membership_id: i64) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &format!("project/user/{membership_id}"))
            .await
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    /// `POST /assign/{taskId}/{userId}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn assign_task(&self, task_id: TaskId, user_id: UserId) -> Result<Assigned, ApiError> {
        let empty = serde_json::Map::new();
        self.fetch(
            Method::POST,
            &format!("assign/{task_id}/{user_id}"),
            Some(&empty),
        )
        .await
    }

    /// `GET /assign/{taskId}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn assignments(&self, task_id: TaskId) -> Result<Vec<Assigned>, ApiError> {
        self.get(&format!("assign/{task_id}")).await
    }

    /// `DELETE /assign/{assignmentId}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn unassign(&self, assignment_id: i64) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &format!("assign/{assignment_id}"))
            .await
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// `GET /historique/project/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn project_history(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<HistoryEntry>, ApiError> {
        self.get(&format!("historique/project/{project_id}")).await
    }

    /// `GET /historique/task/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] on any failure.
    pub async fn task_history(&self, task_id: TaskId) -> Result<Vec<HistoryEntry>, ApiError> {
        self.get(&format!("historique/task/{task_id}")).await
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(Method::GET, path, None::<&()>).await
    }

    /// Sends a request and decodes a JSON answer.
    async fn fetch<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let outcome = match self.exchange(method, path, body).await {
            Ok((status, text)) => {
                serde_json::from_str(&text).map_err(|e| ApiError::undecodable(status, &text, &e))
            }
            Err(e) => Err(e),
        };
        self.report(path, outcome)
    }

    /// Sends a request whose answer has no body worth decoding.
    async fn execute(&self, method: Method, path: &str) -> Result<(), ApiError> {
        let outcome = self.exchange(method, path, None::<&()>).await.map(|_| ());
        self.report(path, outcome)
    }

    async fn exchange<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(u16, String), ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.base.join(path).map_err(|e| ApiError {
            message: format!("invalid endpoint {path}: {e}"),
            status: None,
            details: serde_json::Value::Null,
        })?;
        tracing::debug!(%method, %url, "api request");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| ApiError::transport(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError {
            status: Some(status.as_u16()),
            ..ApiError::transport(&e)
        })?;

        if status.is_success() {
            Ok((status.as_u16(), text))
        } else {
            Err(ApiError::from_response(status.as_u16(), &text))
        }
    }

    /// Logs and notifies a failure exactly once, then hands the outcome back.
    fn report<T>(&self, path: &str, outcome: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &outcome {
            tracing::warn!(path, status = ?e.status, error = %e.message, "api call failed");
            self.notifier.notify(&e.notice());
        }
        outcome
    }
}

impl TaskUpdater for ApiClient {
    fn update_task(
        &self,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<Task, ApiError>> + Send {
        Self::update_task(self, task)
    }
}
