//! Project model.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::user::UserId;
use crate::validate::{ValidationError, require};

/// Server-assigned project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A project with its embedded task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Server-assigned identifier.
    pub id: ProjectId,
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Start date.
    #[serde(rename = "dateDebut", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Planned end date.
    #[serde(rename = "dateFin", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Tasks of the project, in server order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    /// Checks the fields the backend requires.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] for a blank name or description.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("description", &self.description)
    }
}

/// Payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    /// Display name.
    #[serde(rename = "nom")]
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Planned end date.
    #[serde(rename = "dateFin", default)]
    pub end_date: Option<NaiveDate>,
}

impl NewProject {
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

/// Payload for `PUT /project`: the edited project and the editing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// Project with its new field values.
    pub project: Project,
    /// Author recorded in the change history.
    #[serde(rename = "userId")]
    pub user_id: UserId,
}
