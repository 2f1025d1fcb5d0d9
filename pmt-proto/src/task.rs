//! Task model: status, priority, and the task payloads exchanged with the
//! backend.
//!
//! Field names on the wire follow the backend contract (`nom`, `priorite`,
//! `dateEcheance`, ...); the Rust side uses English names.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::project::ProjectId;
use crate::user::UserId;
use crate::validate::{ValidationError, require};

/// Server-assigned task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workflow status of a task. Each status owns one board column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// All statuses in board column order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Wire representation (`TODO`, `IN_PROGRESS`, `DONE`).
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }

    /// Human-readable column title.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "To do",
            Self::InProgress => "In progress",
            Self::Done => "Done",
        }
    }

    /// Column position (0, 1, 2).
    #[must_use]
    pub const fn column(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }

    /// Status owning the given column position, if any.
    #[must_use]
    pub const fn from_column(column: usize) -> Option<Self> {
        match column {
            0 => Some(Self::Todo),
            1 => Some(Self::InProgress),
            2 => Some(Self::Done),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Error returned when parsing an unknown status or priority string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_wire() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal priority.
    #[default]
    Medium,
    /// Urgent.
    High,
}

impl Priority {
    /// All priorities from lowest to highest.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Wire representation (`LOW`, `MEDIUM`, `HIGH`).
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// The next priority, wrapping from `High` back to `Low`.
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_wire() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// A task as returned by the backend and sent back on update.
///
/// Tasks embedded in a project payload may omit `projectId`; callers that
/// send a task back fill it in from the enclosing project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Deadline.
    #[serde(rename = "dateEcheance", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Actual completion date.
    #[serde(rename = "dateFin", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Priority.
    #[serde(rename = "priorite", default)]
    pub priority: Priority,
    /// Workflow status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Owning project.
    #[serde(rename = "projectId", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// User performing an update, used by the backend to attribute history.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub editor_id: Option<UserId>,
}

impl Task {
    /// Checks the fields the backend requires on update.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] for a blank name or description.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("description", &self.description)
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Deadline.
    #[serde(rename = "dateEcheance", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Priority.
    #[serde(rename = "priorite", default)]
    pub priority: Priority,
    /// Initial status, `TODO` for tasks created from the client.
    #[serde(default)]
    pub status: TaskStatus,
    /// Project the task is created in.
    #[serde(rename = "projectId")]
    pub project_id: ProjectId,
}

impl NewTask {
    /// Checks mandatory fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] for a blank name or description.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("description", &self.description)
    }
}
