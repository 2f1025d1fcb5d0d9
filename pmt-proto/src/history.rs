//! Change history entries recorded by the backend when a project or task
//! is renamed or its description edited.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::project::ProjectId;
use crate::task::TaskId;
use crate::user::User;

/// Which field a history entry tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryField {
    /// The name.
    #[serde(rename = "Titre")]
    Title,
    /// The description.
    #[serde(rename = "Description")]
    Description,
}

impl HistoryField {
    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
        }
    }
}

/// One recorded change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry id.
    pub id: i64,
    /// Author of the change.
    pub user: User,
    /// Project concerned, for project changes.
    #[serde(rename = "projectId", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Task concerned, for task changes.
    #[serde(rename = "taskId", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// When the change happened.
    #[serde(rename = "dateM")]
    pub changed_at: NaiveDateTime,
    /// Value after the change.
    #[serde(rename = "newString")]
    pub new_value: String,
    /// Value before the change.
    #[serde(rename = "oldString")]
    pub old_value: String,
    /// Field that changed.
    #[serde(rename = "typeM")]
    pub field: HistoryField,
}
