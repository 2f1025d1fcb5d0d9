//! In-memory tables for users, projects, tasks, and their relations.
//!
//! The [`Database`] holds every table behind a single [`RwLock`]. All the
//! business rules of the backend live here (mandatory fields, unique e-mail,
//! cascade on delete, change history) so the HTTP layer only maps requests
//! and errors.

use std::collections::BTreeMap;

use chrono::Local;
use tokio::sync::RwLock;

use pmt_proto::auth::{LoginRequest, SignupRequest};
use pmt_proto::history::{HistoryEntry, HistoryField};
use pmt_proto::project::{NewProject, Project, ProjectId, ProjectUpdate};
use pmt_proto::task::{NewTask, Priority, Task, TaskId, TaskStatus};
use pmt_proto::user::{Assigned, Membership, Role, User, UserId, UserRole, UsersProject};
use pmt_proto::validate::ValidationError;

/// Errors returned by [`Database`] operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another account already uses this e-mail.
    #[error("email {0} is already registered")]
    EmailTaken(String),

    /// A change that is recorded in the history was sent without an author.
    #[error("userId is required to record this change")]
    MissingAuthor,

    /// The referenced row does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Table name (`user`, `project`, ...).
        kind: &'static str,
        /// Requested id.
        id: i64,
    },
}

impl StoreError {
    /// Whether this error is caused by the request content rather than a
    /// missing row.
    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}

/// Monotonic id generator for one table.
#[derive(Debug, Default)]
struct Sequence(i64);

impl Sequence {
    const fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Clone, Copy)]
struct Assignment {
    task_id: TaskId,
    user_id: UserId,
}

/// Row the history entries point at.
#[derive(Debug, Clone, Copy)]
enum Subject {
    Project(ProjectId),
    Task(TaskId),
}

/// One detected field change: field, old value, new value.
type Change = (HistoryField, String, String);

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, Account>,
    projects: BTreeMap<ProjectId, Project>,
    tasks: BTreeMap<TaskId, Task>,
    memberships: BTreeMap<i64, Membership>,
    assignments: BTreeMap<i64, Assignment>,
    history: Vec<HistoryEntry>,
    user_ids: Sequence,
    project_ids: Sequence,
    task_ids: Sequence,
    membership_ids: Sequence,
    assignment_ids: Sequence,
    history_ids: Sequence,
}

/// Thread-safe in-memory backend state.
#[derive(Debug, Default)]
pub struct Database {
    tables: RwLock<Tables>,
}

impl Database {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Registers an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for missing fields or a short
    /// password and [`StoreError::EmailTaken`] for a duplicate e-mail.
    pub async fn create_user(&self, request: SignupRequest) -> Result<User, StoreError> {
        request.validate()?;
        let mut tables = self.tables.write().await;
        if tables.find_account(&request.email).is_some() {
            return Err(StoreError::EmailTaken(request.email));
        }
        let id = UserId(tables.user_ids.next());
        let user = User {
            id,
            name: request.name,
            email: request.email,
        };
        tables.users.insert(
            id,
            Account {
                user: user.clone(),
                password: request.password,
            },
        );
        drop(tables);
        tracing::debug!(user = %id, "account created");
        Ok(user)
    }

    /// Checks credentials, returning the user on a match.
    pub async fn login(&self, request: &LoginRequest) -> Option<User> {
        let tables = self.tables.read().await;
        tables
            .find_account(&request.email)
            .filter(|account| account.password == request.password)
            .map(|account| account.user.clone())
    }

    /// Lists every account.
    pub async fn users(&self) -> Vec<User> {
        let tables = self.tables.read().await;
        tables.users.values().map(|a| a.user.clone()).collect()
    }

    /// Lists the participants of a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown project.
    pub async fn users_in_project(&self, project_id: ProjectId) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        tables.project_row(project_id)?;
        Ok(tables
            .memberships_of(project_id)
            .filter_map(|m| tables.users.get(&m.user_id))
            .map(|a| a.user.clone())
            .collect())
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Creates a project starting today.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a blank name or description.
    pub async fn create_project(&self, new: NewProject) -> Result<Project, StoreError> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        let id = ProjectId(tables.project_ids.next());
        let project = Project {
            id,
            name: new.name,
            description: new.description,
            start_date: Some(Local::now().date_naive()),
            end_date: new.end_date,
            tasks: Vec::new(),
        };
        tables.projects.insert(id, project.clone());
        drop(tables);
        tracing::debug!(project = %id, "project created");
        Ok(project)
    }

    /// Fetches a project with its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown project.
    pub async fn project(&self, id: ProjectId) -> Result<Project, StoreError> {
        self.tables.read().await.project_with_tasks(id)
    }

    /// Lists the projects a user participates in.
    pub async fn projects_for_user(&self, user_id: UserId) -> Vec<Project> {
        let tables = self.tables.read().await;
        tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.project_with_tasks(m.project_id).ok())
            .collect()
    }

    /// Updates name, description, and dates, recording renamed or
    /// re-described projects in the history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for blank fields and
    /// [`StoreError::NotFound`] for an unknown project or author.
    pub async fn update_project(&self, update: ProjectUpdate) -> Result<Project, StoreError> {
        let ProjectUpdate { project, user_id } = update;
        project.validate()?;
        let mut tables = self.tables.write().await;
        let current = tables.project_row(project.id)?;
        let changes = detect_changes(
            (current.name.as_str(), project.name.as_str()),
            (current.description.as_str(), project.description.as_str()),
        );
        tables.record(Some(user_id), Subject::Project(project.id), changes)?;

        if let Some(row) = tables.projects.get_mut(&project.id) {
            row.name = project.name;
            row.description = project.description;
            if project.start_date.is_some() {
                row.start_date = project.start_date;
            }
            if project.end_date.is_some() {
                row.end_date = project.end_date;
            }
        }
        tables.project_with_tasks(project.id)
    }

    /// Deletes a project together with its tasks, their assignments, the
    /// memberships, and the related history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown project.
    pub async fn delete_project(&self, id: ProjectId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.project_row(id)?;
        let task_ids: Vec<TaskId> = tables
            .tasks
            .values()
            .filter(|t| t.project_id == Some(id))
            .map(|t| t.id)
            .collect();
        for task_id in task_ids {
            tables.remove_task(task_id);
        }
        tables.memberships.retain(|_, m| m.project_id != id);
        tables.history.retain(|h| h.project_id != Some(id));
        tables.projects.remove(&id);
        drop(tables);
        tracing::debug!(project = %id, "project deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Participants
    // -----------------------------------------------------------------------

    /// Adds participants to a project, skipping users already in it.
    ///
    /// Returns the memberships created by this call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an empty list and
    /// [`StoreError::NotFound`] for an unknown project or user. Nothing is
    /// added when an error is returned.
    pub async fn add_participants(
        &self,
        payload: UsersProject,
    ) -> Result<Vec<Membership>, StoreError> {
        payload.validate()?;
        let mut tables = self.tables.write().await;
        tables.project_row(payload.project_id)?;
        for line in &payload.users {
            tables.user(line.user_id)?;
        }

        let mut created = Vec::new();
        for line in payload.users {
            let already_member = tables
                .memberships_of(payload.project_id)
                .any(|m| m.user_id == line.user_id);
            if already_member {
                tracing::debug!(user = %line.user_id, "participant already in project");
                continue;
            }
            let membership = Membership {
                id: tables.membership_ids.next(),
                project_id: payload.project_id,
                user_id: line.user_id,
                role: line.role,
            };
            tables.memberships.insert(membership.id, membership.clone());
            created.push(membership);
        }
        Ok(created)
    }

    /// Lists the participant lines of a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown project.
    pub async fn participants(&self, project_id: ProjectId) -> Result<UsersProject, StoreError> {
        let tables = self.tables.read().await;
        tables.project_row(project_id)?;
        let users = tables
            .memberships_of(project_id)
            .map(|m| UserRole {
                id: Some(m.id),
                user_id: m.user_id,
                role: m.role,
            })
            .collect();
        Ok(UsersProject { project_id, users })
    }

    /// Removes one membership.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown membership.
    pub async fn remove_participant(&self, membership_id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .memberships
            .remove(&membership_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                kind: "membership",
                id: membership_id,
            })
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Fetches one task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown task.
    pub async fn task(&self, id: TaskId) -> Result<Task, StoreError> {
        self.tables.read().await.task_row(id).cloned()
    }

    /// Creates a task in an existing project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for blank fields and
    /// [`StoreError::NotFound`] for an unknown project.
    pub async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        new.validate()?;
        let mut tables = self.tables.write().await;
        tables.project_row(new.project_id)?;
        let task = Task {
            id: TaskId(tables.task_ids.next()),
            name: new.name,
            description: new.description,
            due_date: new.due_date,
            end_date: None,
            priority: new.priority,
            status: new.status,
            project_id: Some(new.project_id),
            editor_id: None,
        };
        tables.tasks.insert(task.id, task.clone());
        drop(tables);
        tracing::debug!(task = %task.id, project = %new.project_id, "task created");
        Ok(task)
    }

    /// Replaces the editable fields of a task.
    ///
    /// A rename or description change is recorded in the history under the
    /// task's `editor_id`. Dates are only overwritten when present; a
    /// missing project id keeps the current project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for blank fields,
    /// [`StoreError::MissingAuthor`] for a recorded change without editor,
    /// and [`StoreError::NotFound`] for an unknown task, project, or editor.
    pub async fn update_task(&self, task: Task) -> Result<Task, StoreError> {
        task.validate()?;
        let mut tables = self.tables.write().await;
        let current = tables.task_row(task.id)?;
        let changes = detect_changes(
            (current.name.as_str(), task.name.as_str()),
            (current.description.as_str(), task.description.as_str()),
        );
        if let Some(project_id) = task.project_id {
            tables.project_row(project_id)?;
        }
        tables.record(task.editor_id, Subject::Task(task.id), changes)?;

        let Some(row) = tables.tasks.get_mut(&task.id) else {
            return Err(StoreError::NotFound {
                kind: "task",
                id: task.id.0,
            });
        };
        row.name = task.name;
        row.description = task.description;
        if task.due_date.is_some() {
            row.due_date = task.due_date;
        }
        if task.end_date.is_some() {
            row.end_date = task.end_date;
        }
        row.priority = task.priority;
        row.status = task.status;
        if task.project_id.is_some() {
            row.project_id = task.project_id;
        }
        let updated = row.clone();
        drop(tables);
        tracing::debug!(task = %updated.id, status = %updated.status, "task updated");
        Ok(updated)
    }

    /// Deletes a task and its assignments.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown task.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.task_row(id)?;
        tables.remove_task(id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    /// Assigns a user to a task. Assigning twice returns the existing row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown task or user.
    pub async fn assign(&self, task_id: TaskId, user_id: UserId) -> Result<Assigned, StoreError> {
        let mut tables = self.tables.write().await;
        tables.task_row(task_id)?;
        let username = tables.user(user_id)?.name.clone();

        let existing = tables
            .assignments
            .iter()
            .find(|(_, a)| a.task_id == task_id && a.user_id == user_id)
            .map(|(id, _)| *id);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = tables.assignment_ids.next();
                tables.assignments.insert(id, Assignment { task_id, user_id });
                id
            }
        };
        Ok(Assigned {
            id,
            user_id,
            task_id,
            username,
        })
    }

    /// Lists the users assigned to a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown task.
    pub async fn assignments(&self, task_id: TaskId) -> Result<Vec<Assigned>, StoreError> {
        let tables = self.tables.read().await;
        tables.task_row(task_id)?;
        Ok(tables
            .assignments
            .iter()
            .filter(|(_, a)| a.task_id == task_id)
            .map(|(id, a)| Assigned {
                id: *id,
                user_id: a.user_id,
                task_id,
                username: tables
                    .users
                    .get(&a.user_id)
                    .map(|acc| acc.user.name.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    /// Removes one assignment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown assignment.
    pub async fn unassign(&self, assignment_id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .assignments
            .remove(&assignment_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                kind: "assignment",
                id: assignment_id,
            })
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Change history of a project, oldest first.
    pub async fn project_history(&self, id: ProjectId) -> Vec<HistoryEntry> {
        let tables = self.tables.read().await;
        tables
            .history
            .iter()
            .filter(|h| h.project_id == Some(id))
            .cloned()
            .collect()
    }

    /// Change history of a task, oldest first.
    pub async fn task_history(&self, id: TaskId) -> Vec<HistoryEntry> {
        let tables = self.tables.read().await;
        tables
            .history
            .iter()
            .filter(|h| h.task_id == Some(id))
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Demo data
    // -----------------------------------------------------------------------

    /// Loads two demo accounts (password `demo1234`) sharing one project
    /// with a task in every column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmailTaken`] if the demo accounts already exist.
    pub async fn seed_demo(&self) -> Result<(), StoreError> {
        let ada = self
            .create_user(SignupRequest {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: "demo1234".to_string(),
            })
            .await?;
        let grace = self
            .create_user(SignupRequest {
                name: "Grace Hopper".to_string(),
                email: "grace@example.com".to_string(),
                password: "demo1234".to_string(),
            })
            .await?;
        let project = self
            .create_project(NewProject {
                name: "Website relaunch".to_string(),
                description: "New landing page and docs".to_string(),
                end_date: None,
            })
            .await?;
        self.add_participants(UsersProject {
            project_id: project.id,
            users: vec![
                UserRole {
                    id: None,
                    user_id: ada.id,
                    role: Role::Admin,
                },
                UserRole {
                    id: None,
                    user_id: grace.id,
                    role: Role::Member,
                },
            ],
        })
        .await?;

        let tasks = [
            ("Draft copy", "Write the hero text", Priority::High, TaskStatus::Todo),
            ("Pick palette", "Choose brand colours", Priority::Low, TaskStatus::Todo),
            ("Build header", "Responsive navigation", Priority::Medium, TaskStatus::InProgress),
            ("Set up CI", "Lint and deploy pipeline", Priority::Medium, TaskStatus::Done),
        ];
        for (name, description, priority, status) in tasks {
            self.create_task(NewTask {
                name: name.to_string(),
                description: description.to_string(),
                due_date: None,
                priority,
                status,
                project_id: project.id,
            })
            .await?;
        }
        tracing::info!(project = %project.id, "demo data loaded");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

impl Tables {
    fn find_account(&self, email: &str) -> Option<&Account> {
        self.users
            .values()
            .find(|a| a.user.email.eq_ignore_ascii_case(email))
    }

    fn user(&self, id: UserId) -> Result<&User, StoreError> {
        self.users
            .get(&id)
            .map(|a| &a.user)
            .ok_or(StoreError::NotFound {
                kind: "user",
                id: id.0,
            })
    }

    fn project_row(&self, id: ProjectId) -> Result<&Project, StoreError> {
        self.projects.get(&id).ok_or(StoreError::NotFound {
            kind: "project",
            id: id.0,
        })
    }

    fn task_row(&self, id: TaskId) -> Result<&Task, StoreError> {
        self.tasks.get(&id).ok_or(StoreError::NotFound {
            kind: "task",
            id: id.0,
        })
    }

    fn memberships_of(&self, project_id: ProjectId) -> impl Iterator<Item = &Membership> {
        self.memberships
            .values()
            .filter(move |m| m.project_id == project_id)
    }

    /// A project with its tasks embedded. Embedded tasks carry no project
    /// id, like the backend contract.
    fn project_with_tasks(&self, id: ProjectId) -> Result<Project, StoreError> {
        let mut project = self.project_row(id)?.clone();
        project.tasks = self
            .tasks
            .values()
            .filter(|t| t.project_id == Some(id))
            .map(|t| Task {
                project_id: None,
                ..t.clone()
            })
            .collect();
        Ok(project)
    }

    fn remove_task(&mut self, id: TaskId) {
        self.tasks.remove(&id);
        self.assignments.retain(|_, a| a.task_id != id);
        self.history.retain(|h| h.task_id != Some(id));
    }

    fn record(
        &mut self,
        author: Option<UserId>,
        subject: Subject,
        changes: Vec<Change>,
    ) -> Result<(), StoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let author = author.ok_or(StoreError::MissingAuthor)?;
        let user = self.user(author)?.clone();
        let changed_at = Local::now().naive_local();
        let (project_id, task_id) = match subject {
            Subject::Project(id) => (Some(id), None),
            Subject::Task(id) => (None, Some(id)),
        };
        for (field, old_value, new_value) in changes {
            let entry = HistoryEntry {
                id: self.history_ids.next(),
                user: user.clone(),
                project_id,
                task_id,
                changed_at,
                new_value,
                old_value,
                field,
            };
            self.history.push(entry);
        }
        Ok(())
    }
}

/// Compares `(old, new)` name and description pairs.
fn detect_changes(name: (&str, &str), description: (&str, &str)) -> Vec<Change> {
    let mut changes = Vec::new();
    if name.0 != name.1 {
        changes.push((HistoryField::Title, name.0.to_string(), name.1.to_string()));
    }
    if description.0 != description.1 {
        changes.push((
            HistoryField::Description,
            description.0.to_string(),
            description.1.to_string(),
        ));
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn signup(db: &Database, name: &str, email: &str) -> User {
        db.create_user(SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap()
    }

    async fn project_with_task(db: &Database) -> (Project, Task) {
        let project = db
            .create_project(NewProject {
                name: "Roadmap".to_string(),
                description: "Q3".to_string(),
                end_date: None,
            })
            .await
            .unwrap();
        let task = db
            .create_task(NewTask {
                name: "Draft".to_string(),
                description: "first pass".to_string(),
                due_date: None,
                priority: Priority::Medium,
                status: TaskStatus::Todo,
                project_id: project.id,
            })
            .await
            .unwrap();
        (project, task)
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = Database::new();
        signup(&db, "Ada", "ada@example.com").await;
        let err = db
            .create_user(SignupRequest {
                name: "Other".to_string(),
                email: "ADA@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken(_)));
        assert_eq!(db.users().await.len(), 1);
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let db = Database::new();
        let err = db
            .create_user(SignupRequest {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "abc".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::PasswordTooShort)
        ));
    }

    #[tokio::test]
    async fn login_requires_matching_password() {
        let db = Database::new();
        let ada = signup(&db, "Ada", "ada@example.com").await;
        let good = LoginRequest {
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
        };
        let bad = LoginRequest {
            password: "nope".to_string(),
            ..good.clone()
        };
        assert_eq!(db.login(&good).await, Some(ada));
        assert_eq!(db.login(&bad).await, None);
    }

    #[tokio::test]
    async fn task_rename_is_recorded_for_the_editor() {
        let db = Database::new();
        let ada = signup(&db, "Ada", "ada@example.com").await;
        let (_, task) = project_with_task(&db).await;

        let edited = Task {
            name: "Final draft".to_string(),
            editor_id: Some(ada.id),
            ..task.clone()
        };
        db.update_task(edited).await.unwrap();

        let history = db.task_history(task.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].field, HistoryField::Title);
        assert_eq!(history[0].old_value, "Draft");
        assert_eq!(history[0].new_value, "Final draft");
        assert_eq!(history[0].user, ada);
    }

    #[tokio::test]
    async fn status_change_needs_no_author() {
        let db = Database::new();
        let (_, task) = project_with_task(&db).await;
        let moved = Task {
            status: TaskStatus::Done,
            ..task.clone()
        };
        let updated = db.update_task(moved).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Done);
        assert!(db.task_history(task.id).await.is_empty());
    }

    #[tokio::test]
    async fn rename_without_author_changes_nothing() {
        let db = Database::new();
        let (_, task) = project_with_task(&db).await;
        let edited = Task {
            name: "Renamed".to_string(),
            editor_id: None,
            ..task.clone()
        };
        let err = db.update_task(edited).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingAuthor));
        assert_eq!(db.task(task.id).await.unwrap().name, "Draft");
    }

    #[tokio::test]
    async fn project_embeds_tasks_without_project_id() {
        let db = Database::new();
        let (project, task) = project_with_task(&db).await;
        let loaded = db.project(project.id).await.unwrap();
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].id, task.id);
        assert_eq!(loaded.tasks[0].project_id, None);
        assert_eq!(db.task(task.id).await.unwrap().project_id, Some(project.id));
    }

    #[tokio::test]
    async fn deleting_a_project_cascades() {
        let db = Database::new();
        let ada = signup(&db, "Ada", "ada@example.com").await;
        let (project, task) = project_with_task(&db).await;
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
        db.assign(task.id, ada.id).await.unwrap();

        db.delete_project(project.id).await.unwrap();

        assert!(matches!(
            db.task(task.id).await,
            Err(StoreError::NotFound { kind: "task", .. })
        ));
        assert!(db.projects_for_user(ada.id).await.is_empty());
        assert!(matches!(
            db.assignments(task.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn adding_participants_skips_existing_members() {
        let db = Database::new();
        let ada = signup(&db, "Ada", "ada@example.com").await;
        let grace = signup(&db, "Grace", "grace@example.com").await;
        let (project, _) = project_with_task(&db).await;
        let line = |user_id, role| UserRole {
            id: None,
            user_id,
            role,
        };

        let first = db
            .add_participants(UsersProject {
                project_id: project.id,
                users: vec![line(ada.id, Role::Admin)],
            })
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        let second = db
            .add_participants(UsersProject {
                project_id: project.id,
                users: vec![line(ada.id, Role::Member), line(grace.id, Role::Observer)],
            })
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].user_id, grace.id);

        let listed = db.participants(project.id).await.unwrap();
        assert_eq!(listed.users.len(), 2);
        assert_eq!(listed.users[0].role, Role::Admin);
    }

    #[tokio::test]
    async fn unknown_participant_adds_nothing() {
        let db = Database::new();
        let ada = signup(&db, "Ada", "ada@example.com").await;
        let (project, _) = project_with_task(&db).await;
        let err = db
            .add_participants(UsersProject {
                project_id: project.id,
                users: vec![
                    UserRole {
                        id: None,
                        user_id: ada.id,
                        role: Role::Admin,
                    },
                    UserRole {
                        id: None,
                        user_id: UserId(99),
                        role: Role::Member,
                    },
                ],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "user", id: 99 }));
        assert!(db.participants(project.id).await.unwrap().users.is_empty());
    }

    #[tokio::test]
    async fn assigning_twice_returns_the_same_row() {
        let db = Database::new();
        let ada = signup(&db, "Ada", "ada@example.com").await;
        let (_, task) = project_with_task(&db).await;
        let first = db.assign(task.id, ada.id).await.unwrap();
        let second = db.assign(task.id, ada.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.username, "Ada");

        db.unassign(first.id).await.unwrap();
        assert!(db.assignments(task.id).await.unwrap().is_empty());
        assert!(db.unassign(first.id).await.is_err());
    }

    #[tokio::test]
    async fn seed_demo_populates_every_column() {
        let db = Database::new();
        db.seed_demo().await.unwrap();
        let users = db.users().await;
        assert_eq!(users.len(), 2);
        let projects = db.projects_for_user(users[0].id).await;
        assert_eq!(projects.len(), 1);
        for status in TaskStatus::ALL {
            assert!(projects[0].tasks.iter().any(|t| t.status == status));
        }
    }
}
