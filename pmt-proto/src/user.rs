//! Users, project roles, memberships, and task assignments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::project::ProjectId;
use crate::task::TaskId;
use crate::validate::ValidationError;

/// Server-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    pub id: UserId,
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Login e-mail, unique per account.
    pub email: String,
}

/// Role of a user inside one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full rights on the project.
    Admin,
    /// Can create and edit.
    #[default]
    Member,
    /// Read-only.
    Observer,
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Member, Self::Observer];

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Member => "Member",
            Self::Observer => "Observer",
        }
    }

    /// The next role, wrapping around.
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::Admin => Self::Member,
            Self::Member => Self::Observer,
            Self::Observer => Self::Admin,
        }
    }
}

/// One participant line: a user and the role they hold.
///
/// `id` is the membership id once the line has been saved server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    /// Membership id, absent for lines not yet saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Participant.
    #[serde(rename = "userId")]
    pub user_id: UserId,
    /// Role in the project.
    pub role: Role,
}

/// Participants of a project, as read from and posted to `/project/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersProject {
    /// Project the participants belong to.
    #[serde(rename = "projectId")]
    pub project_id: ProjectId,
    /// Participant lines.
    #[serde(default)]
    pub users: Vec<UserRole>,
}

impl UsersProject {
    /// Checks that the list is not empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoParticipants`] for an empty list.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.users.is_empty() {
            return Err(ValidationError::NoParticipants);
        }
        Ok(())
    }
}

/// A saved membership row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Membership id.
    pub id: i64,
    /// Project.
    #[serde(rename = "projectId")]
    pub project_id: ProjectId,
    /// Participant.
    #[serde(rename = "userId")]
    pub user_id: UserId,
    /// Role in the project.
    pub role: Role,
}

/// A user assigned to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assigned {
    /// Assignment id, used to unassign.
    pub id: i64,
    /// Assigned user.
    #[serde(rename = "userId")]
    pub user_id: UserId,
    /// Task.
    #[serde(rename = "taskId")]
    pub task_id: TaskId,
    /// Display name of the assigned user.
    pub username: String,
}
