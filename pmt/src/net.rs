//! Networking coordinator wiring the TUI to the REST backend.
//!
//! The UI loop is synchronous (crossterm poll-based); every API call runs on
//! a background tokio task. The two sides exchange messages over channels:
//!
//! ```text
//! TUI (main thread)  ←── NetEvent ───  tokio background tasks
//!                     ─── NetCommand →
//! ```
//!
//! Each command is executed in its own task, so a slow request never holds
//! up an unrelated one. Failures are reported by the [`ApiClient`] through
//! a [`ChannelNotifier`], which turns them into [`NetEvent::Notice`]; the
//! only failure that also produces a dedicated event is a task update, so
//! the UI can roll its board back.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;

use pmt_proto::auth::{LoginRequest, LoginResponse, SignupRequest};
use pmt_proto::history::HistoryEntry;
use pmt_proto::project::{NewProject, Project, ProjectId, ProjectUpdate};
use pmt_proto::task::{NewTask, Task, TaskId};
use pmt_proto::user::{Assigned, User, UserId, UserRole, UsersProject};

use crate::api::{ApiClient, ApiError, Notifier};

/// Commands sent from the TUI main loop to the networking background tasks.
#[derive(Debug)]
pub enum NetCommand {
    /// Check credentials.
    Login(LoginRequest),
    /// Create an account.
    Signup(SignupRequest),
    /// Fetch every known user.
    LoadUsers,
    /// Fetch the projects a user takes part in.
    LoadProjects(UserId),
    /// Fetch one project with its tasks.
    LoadProject(ProjectId),
    /// Create a project, then register its initial participants.
    CreateProject {
        /// Project fields.
        project: NewProject,
        /// Initial participant lines.
        participants: Vec<UserRole>,
    },
    /// Save project name, description or end date.
    UpdateProject(ProjectUpdate),
    /// Delete a project and everything in it.
    DeleteProject(ProjectId),
    /// Create a task.
    CreateTask(NewTask),
    /// Persist a status change made on the board. The ticket comes back in
    /// [`NetEvent::TaskUpdated`] or [`NetEvent::TaskUpdateFailed`].
    UpdateTask {
        /// Identifies the pending board transfer.
        ticket: u64,
        /// Full task as it should be saved.
        task: Task,
    },
    /// Save edited task fields.
    EditTask(Task),
    /// Delete a task.
    DeleteTask(TaskId),
    /// Fetch a project's participants and every known user.
    LoadParticipants(ProjectId),
    /// Add participant lines to a project.
    AddParticipants(UsersProject),
    /// Remove one membership from a project.
    RemoveParticipant {
        /// Project to refresh afterwards.
        project_id: ProjectId,
        /// Membership to delete.
        membership_id: i64,
    },
    /// Fetch a task with its assignees, history and the assignable users.
    LoadTaskDetail {
        /// Task to open.
        task_id: TaskId,
        /// Project the task belongs to.
        project_id: ProjectId,
    },
    /// Assign a user to a task.
    Assign {
        /// Task.
        task_id: TaskId,
        /// Assignee.
        user_id: UserId,
    },
    /// Remove an assignment.
    Unassign {
        /// Task to refresh afterwards.
        task_id: TaskId,
        /// Assignment to delete.
        assignment_id: i64,
    },
    /// Fetch a project's change history.
    LoadProjectHistory(ProjectId),
    /// Gracefully shut down the networking tasks.
    Shutdown,
}

/// Events sent from the networking background tasks to the TUI main loop.
#[derive(Debug)]
pub enum NetEvent {
    /// Credentials accepted.
    LoggedIn(User),
    /// Credentials refused (`success: false`).
    LoginRejected,
    /// Account created.
    SignedUp(User),
    /// Every known user.
    Users(Vec<User>),
    /// Projects of the logged-in user.
    Projects(Vec<Project>),
    /// A project with its tasks.
    ProjectLoaded(Project),
    /// A project was created.
    ProjectCreated(Project),
    /// A project was saved.
    ProjectUpdated(Project),
    /// A project was deleted.
    ProjectDeleted(ProjectId),
    /// A task was created.
    TaskCreated(Task),
    /// A board transfer was confirmed.
    TaskUpdated {
        /// Ticket of the [`NetCommand::UpdateTask`].
        ticket: u64,
        /// Task as saved.
        task: Task,
    },
    /// A board transfer was rejected.
    TaskUpdateFailed {
        /// Ticket of the [`NetCommand::UpdateTask`].
        ticket: u64,
        /// Normalized failure.
        error: ApiError,
    },
    /// Edited task fields were saved.
    TaskEdited(Task),
    /// A task was deleted.
    TaskDeleted(TaskId),
    /// Participants of a project and the users that could join.
    Participants {
        /// Current memberships.
        participants: UsersProject,
        /// Every known user.
        users: Vec<User>,
    },
    /// Everything the task detail view shows.
    TaskDetail {
        /// The task.
        task: Task,
        /// Current assignees.
        assignments: Vec<Assigned>,
        /// Changes to the task.
        history: Vec<HistoryEntry>,
        /// Users that can be assigned.
        members: Vec<User>,
    },
    /// Refreshed assignees of a task.
    Assignments {
        /// Task.
        task_id: TaskId,
        /// Current assignees.
        assignments: Vec<Assigned>,
    },
    /// Change history of a project.
    ProjectHistory {
        /// Project.
        project_id: ProjectId,
        /// Entries, oldest first.
        entries: Vec<HistoryEntry>,
    },
    /// Something the user must be told about.
    Notice(String),
}

/// Configuration for the networking layer.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Backend base URL.
    pub api_url: Url,
    /// Per-request timeout; `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
}

/// Default channel capacity for commands and events.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

impl NetConfig {
    /// Creates a `NetConfig` with no timeout and the default capacity.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            request_timeout: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Forwards notifications to the UI as [`NetEvent::Notice`].
///
/// Never blocks: the notifier is called from inside request futures, so a
/// full channel drops the notice and logs it instead.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    events: mpsc::Sender<NetEvent>,
}

impl ChannelNotifier {
    /// Notifier feeding `events`.
    #[must_use]
    pub const fn new(events: mpsc::Sender<NetEvent>) -> Self {
        Self { events }
    }
}

impl Notifier for ChannelNotifier {
    /// Never blocks. When the channel is full the notice is handed to a
    /// background task that waits for room, so it is delayed, not lost.
    fn notify(&self, message: &str) {
        let event = match self.events.try_send(NetEvent::Notice(message.to_string())) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(notice = message, "tui dropped; notice discarded");
                return;
            }
            Err(mpsc::error::TrySendError::Full(event)) => event,
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(notice = message, "event channel full outside a runtime; notice dropped");
            return;
        };
        tracing::debug!(notice = message, "event channel full; notice queued");
        let events = self.events.clone();
        runtime.spawn(async move {
            if events.send(event).await.is_err() {
                tracing::debug!("tui dropped; notice discarded");
            }
        });
    }
}

/// Spawn the networking background task and return channel handles.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an [`ApiError`] if the HTTP client cannot be built.
pub fn spawn_net(
    config: NetConfig,
) -> Result<(mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>), ApiError> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<NetCommand>(config.channel_capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<NetEvent>(config.channel_capacity);

    let notifier = Arc::new(ChannelNotifier::new(evt_tx.clone()));
    let api = ApiClient::new(config.api_url, config.request_timeout, notifier)?;
    tracing::info!(api = %api.base_url(), "network coordinator started");

    tokio::spawn(async move {
        command_handler(api, cmd_rx, evt_tx).await;
    });

    Ok((cmd_tx, evt_rx))
}

/// Background task: dispatch commands from the TUI main loop.
async fn command_handler(
    api: ApiClient,
    mut cmd_rx: mpsc::Receiver<NetCommand>,
    evt_tx: mpsc::Sender<NetEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        if matches!(cmd, NetCommand::Shutdown) {
            tracing::info!("net command handler shutting down");
            break;
        }
        let api = api.clone();
        let evt_tx = evt_tx.clone();
        tokio::spawn(async move {
            if let Some(event) = execute(&api, cmd).await
                && evt_tx.send(event).await.is_err()
            {
                tracing::debug!("tui dropped; event discarded");
            }
        });
    }
}

/// Runs one command. `None` means nothing to report beyond the notice the
/// client already emitted.
#[allow(clippy::too_many_lines)]
async fn execute(api: &ApiClient, cmd: NetCommand) -> Option<NetEvent> {
    match cmd {
        NetCommand::Login(request) => match api.login(&request).await.ok()? {
            LoginResponse {
                success: true,
                user: Some(user),
            } => Some(NetEvent::LoggedIn(user)),
            _ => Some(NetEvent::LoginRejected),
        },
        NetCommand::Signup(request) => api.signup(&request).await.ok().map(NetEvent::SignedUp),
        NetCommand::LoadUsers => api.users().await.ok().map(NetEvent::Users),
        NetCommand::LoadProjects(user_id) => api
            .projects_for_user(user_id)
            .await
            .ok()
            .map(NetEvent::Projects),
        NetCommand::LoadProject(project_id) => {
            api.project(project_id).await.ok().map(NetEvent::ProjectLoaded)
        }
        NetCommand::CreateProject {
            project,
            participants,
        } => create_project(api, &project, participants).await,
        NetCommand::UpdateProject(update) => api
            .update_project(&update)
            .await
            .ok()
            .map(NetEvent::ProjectUpdated),
        NetCommand::DeleteProject(project_id) => api
            .delete_project(project_id)
            .await
            .ok()
            .map(|()| NetEvent::ProjectDeleted(project_id)),
        NetCommand::CreateTask(task) => api.create_task(&task).await.ok().map(NetEvent::TaskCreated),
        NetCommand::UpdateTask { ticket, task } => Some(match api.update_task(&task).await {
            Ok(task) => NetEvent::TaskUpdated { ticket, task },
            Err(error) => NetEvent::TaskUpdateFailed { ticket, error },
        }),
        NetCommand::EditTask(task) => api.update_task(&task).await.ok().map(NetEvent::TaskEdited),
        NetCommand::DeleteTask(task_id) => api
            .delete_task(task_id)
            .await
            .ok()
            .map(|()| NetEvent::TaskDeleted(task_id)),
        NetCommand::LoadParticipants(project_id) => load_participants(api, project_id).await,
        NetCommand::AddParticipants(lines) => {
            api.add_participants(&lines).await.ok()?;
            load_participants(api, lines.project_id).await
        }
        NetCommand::RemoveParticipant {
            project_id,
            membership_id,
        } => {
            api.remove_participant(membership_id).await.ok()?;
            load_participants(api, project_id).await
        }
        NetCommand::LoadTaskDetail {
            task_id,
            project_id,
        } => load_task_detail(api, task_id, project_id).await,
        NetCommand::Assign { task_id, user_id } => {
            api.assign_task(task_id, user_id).await.ok()?;
            load_assignments(api, task_id).await
        }
        NetCommand::Unassign {
            task_id,
            assignment_id,
        } => {
            api.unassign(assignment_id).await.ok()?;
            load_assignments(api, task_id).await
        }
        NetCommand::LoadProjectHistory(project_id) => api
            .project_history(project_id)
            .await
            .ok()
            .map(|entries| NetEvent::ProjectHistory {
                project_id,
                entries,
            }),
        NetCommand::Shutdown => None,
    }
}

async fn create_project(
    api: &ApiClient,
    project: &NewProject,
    participants: Vec<UserRole>,
) -> Option<NetEvent> {
    let created = api.create_project(project).await.ok()?;
    let lines = UsersProject {
        project_id: created.id,
        users: participants,
    };
    // The project exists even if its participants could not be saved.
    if api.add_participants(&lines).await.is_err() {
        tracing::warn!(project = %created.id, "project created without its participants");
    }
    Some(NetEvent::ProjectCreated(created))
}

async fn load_participants(api: &ApiClient, project_id: ProjectId) -> Option<NetEvent> {
    let (participants, users) = tokio::join!(api.participants(project_id), api.users());
    Some(NetEvent::Participants {
        participants: participants.ok()?,
        users: users.ok()?,
    })
}

async fn load_assignments(api: &ApiClient, task_id: TaskId) -> Option<NetEvent> {
    api.assignments(task_id)
        .await
        .ok()
        .map(|assignments| NetEvent::Assignments {
            task_id,
            assignments,
        })
}

async fn load_task_detail(
    api: &ApiClient,
    task_id: TaskId,
    project_id: ProjectId,
) -> Option<NetEvent> {
    let (task, assignments, history, members) = tokio::join!(
        api.task(task_id),
        api.assignments(task_id),
        api.task_history(task_id),
        api.users_in_project(project_id),
    );
    Some(NetEvent::TaskDetail {
        task: task.ok()?,
        assignments: assignments.ok()?,
        history: history.ok()?,
        members: members.ok()?,
    })
}
