//! Editable forms and their client-side validation.
//!
//! Each form keeps raw text as typed and only builds a request payload when
//! every field passes validation, so an invalid form never reaches the
//! network.

use pmt_proto::auth::{LoginRequest, SignupRequest};
use pmt_proto::project::{NewProject, Project, ProjectId, ProjectUpdate};
use pmt_proto::task::{NewTask, Priority, Task, TaskStatus};
use pmt_proto::user::{Role, User, UserId, UserRole};
use pmt_proto::validate::{ValidationError, check_password, parse_optional_date, require};

/// Text fields a form exposes to the UI, in display order.
pub trait TextForm {
    /// Field labels.
    fn labels(&self) -> &'static [&'static str];

    /// Current value of a field.
    fn field(&self, index: usize) -> Option<&str>;

    /// Mutable access to a field.
    fn field_mut(&mut self, index: usize) -> Option<&mut String>;

    /// Whether a field is masked on screen.
    fn is_secret(&self, _index: usize) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Login / signup
// ---------------------------------------------------------------------------

/// Login form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    /// E-mail as typed.
    pub email: String,
    /// Password as typed.
    pub password: String,
}

impl LoginForm {
    /// Builds the login request.
    ///
    /// # Errors
    ///
    /// Returns the first blank mandatory field.
    pub fn submit(&self) -> Result<LoginRequest, ValidationError> {
        let request = LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        request.validate()?;
        Ok(request)
    }
}

impl TextForm for LoginForm {
    fn labels(&self) -> &'static [&'static str] {
        &["Email", "Password"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.email),
            1 => Some(&self.password),
            _ => None,
        }
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.email),
            1 => Some(&mut self.password),
            _ => None,
        }
    }

    fn is_secret(&self, index: usize) -> bool {
        index == 1
    }
}

/// Account creation form.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    /// Display name.
    pub name: String,
    /// E-mail.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password typed a second time.
    pub confirm: String,
}

impl SignupForm {
    /// Builds the signup request.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: mandatory fields, password length,
    /// then confirmation.
    pub fn submit(&self) -> Result<SignupRequest, ValidationError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        check_password(&self.password)?;
        if self.password != self.confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(SignupRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

impl TextForm for SignupForm {
    fn labels(&self) -> &'static [&'static str] {
        &["Name", "Email", "Password", "Confirm password"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.name),
            1 => Some(&self.email),
            2 => Some(&self.password),
            3 => Some(&self.confirm),
            _ => None,
        }
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.name),
            1 => Some(&mut self.email),
            2 => Some(&mut self.password),
            3 => Some(&mut self.confirm),
            _ => None,
        }
    }

    fn is_secret(&self, index: usize) -> bool {
        index >= 2
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// One editable participant line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantRow {
    /// Selected user, if any yet.
    pub user_id: Option<UserId>,
    /// Role to grant.
    pub role: Role,
}

/// Dynamic list of participant lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantList {
    rows: Vec<ParticipantRow>,
}

impl ParticipantList {
    /// A list whose single line is `user` as administrator.
    #[must_use]
    pub fn with_admin(user: UserId) -> Self {
        Self {
            rows: vec![ParticipantRow {
                user_id: Some(user),
                role: Role::Admin,
            }],
        }
    }

    /// The lines.
    #[must_use]
    pub fn rows(&self) -> &[ParticipantRow] {
        &self.rows
    }

    /// Appends an empty member line and returns its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(ParticipantRow {
            user_id: None,
            role: Role::Member,
        });
        self.rows.len() - 1
    }

    /// Removes a line. Out-of-range indices are ignored.
    pub fn remove_row(&mut self, index: usize) {
        if index < self.rows.len() {
            self.rows.remove(index);
        }
    }

    /// Sets the user of a line.
    pub fn set_user(&mut self, index: usize, user: UserId) {
        if let Some(row) = self.rows.get_mut(index) {
            row.user_id = Some(user);
        }
    }

    /// Moves a line to the next candidate user, wrapping around.
    pub fn cycle_user(&mut self, index: usize, candidates: &[User]) {
        let Some(row) = self.rows.get_mut(index) else {
            return;
        };
        if candidates.is_empty() {
            return;
        }
        let next = row
            .user_id
            .and_then(|id| candidates.iter().position(|u| u.id == id))
            .map_or(0, |pos| (pos + 1) % candidates.len());
        row.user_id = Some(candidates[next].id);
    }

    /// Moves a line to the next role.
    pub fn cycle_role(&mut self, index: usize) {
        if let Some(row) = self.rows.get_mut(index) {
            row.role = row.role.cycle();
        }
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the list has no line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds the participant payload lines.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoParticipants`] for an empty list and
    /// [`ValidationError::ParticipantWithoutUser`] (1-based) for a line
    /// without a user.
    pub fn submit(&self) -> Result<Vec<UserRole>, ValidationError> {
        if self.rows.is_empty() {
            return Err(ValidationError::NoParticipants);
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                row.user_id
                    .map(|user_id| UserRole {
                        id: None,
                        user_id,
                        role: row.role,
                    })
                    .ok_or(ValidationError::ParticipantWithoutUser(index + 1))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Project creation or edition form.
#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    /// Project being edited; `None` when creating.
    pub editing: Option<Project>,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// End date as typed (`YYYY-MM-DD` or blank).
    pub end_date: String,
    /// Initial participants (creation only).
    pub participants: ParticipantList,
}

impl ProjectForm {
    /// Empty creation form with `owner` pre-filled as administrator.
    #[must_use]
    pub fn create(owner: &User) -> Self {
        Self {
            participants: ParticipantList::with_admin(owner.id),
            ..Self::default()
        }
    }

    /// Edition form pre-filled from an existing project.
    #[must_use]
    pub fn edit(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            description: project.description.clone(),
            end_date: project
                .end_date
                .map(|d| d.format(pmt_proto::validate::DATE_FORMAT).to_string())
                .unwrap_or_default(),
            editing: Some(project.clone()),
            participants: ParticipantList::default(),
        }
    }

    /// Builds the creation payload and its participant lines.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: name, description, end date, then
    /// participants.
    pub fn submit_new(&self) -> Result<(NewProject, Vec<UserRole>), ValidationError> {
        let project = NewProject {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            end_date: None,
        };
        project.validate()?;
        let end_date = parse_optional_date(&self.end_date)?;
        let participants = self.participants.submit()?;
        Ok((NewProject { end_date, ..project }, participants))
    }

    /// Builds the update payload for the project being edited, authored by
    /// `editor`. Returns `Ok(None)` when the form is a creation form.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: name, description, then end date.
    pub fn submit_update(&self, editor: UserId) -> Result<Option<ProjectUpdate>, ValidationError> {
        let Some(original) = &self.editing else {
            return Ok(None);
        };
        let project = Project {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            end_date: parse_optional_date(&self.end_date)?.or(original.end_date),
            tasks: Vec::new(),
            ..original.clone()
        };
        project.validate()?;
        Ok(Some(ProjectUpdate {
            project,
            user_id: editor,
        }))
    }
}

impl TextForm for ProjectForm {
    fn labels(&self) -> &'static [&'static str] {
        &["Name", "Description", "End date (YYYY-MM-DD)"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.name),
            1 => Some(&self.description),
            2 => Some(&self.end_date),
            _ => None,
        }
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.name),
            1 => Some(&mut self.description),
            2 => Some(&mut self.end_date),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Task creation or edition form.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    /// Task being edited; `None` when creating.
    pub editing: Option<Task>,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Due date as typed (`YYYY-MM-DD` or blank).
    pub due_date: String,
    /// Priority, `MEDIUM` unless changed.
    pub priority: Priority,
}

impl TaskForm {
    /// Edition form pre-filled from an existing task.
    #[must_use]
    pub fn edit(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            due_date: task
                .due_date
                .map(|d| d.format(pmt_proto::validate::DATE_FORMAT).to_string())
                .unwrap_or_default(),
            priority: task.priority,
            editing: Some(task.clone()),
        }
    }

    /// Builds the creation payload. New tasks always start in `TODO`.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: name, description, then due date.
    pub fn submit_new(&self, project_id: ProjectId) -> Result<NewTask, ValidationError> {
        let task = NewTask {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            due_date: None,
            priority: self.priority,
            status: TaskStatus::Todo,
            project_id,
        };
        task.validate()?;
        let due_date = parse_optional_date(&self.due_date)?;
        Ok(NewTask { due_date, ..task })
    }

    /// Builds the full task for `PUT /task`, attributed to `editor`.
    /// Returns `Ok(None)` when the form is a creation form.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: name, description, then due date.
    pub fn submit_update(
        &self,
        project_id: ProjectId,
        editor: UserId,
    ) -> Result<Option<Task>, ValidationError> {
        let Some(original) = &self.editing else {
            return Ok(None);
        };
        let task = Task {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            due_date: parse_optional_date(&self.due_date)?.or(original.due_date),
            priority: self.priority,
            project_id: Some(project_id),
            editor_id: Some(editor),
            ..original.clone()
        };
        task.validate()?;
        Ok(Some(task))
    }
}

impl TextForm for TaskForm {
    fn labels(&self) -> &'static [&'static str] {
        &["Name", "Description", "Due date (YYYY-MM-DD)"]
    }

    fn field(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.name),
            1 => Some(&self.description),
            2 => Some(&self.due_date),
            _ => None,
        }
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.name),
            1 => Some(&mut self.description),
            2 => Some(&mut self.due_date),
            _ => None,
        }
    }
}
