//! HTTP access to the PMT backend.
//!
//! Every failed call goes through one normalization path: the response body
//! is turned into an [`ApiError`], the error is logged, the user is notified
//! once through a [`Notifier`], and the error is returned to the caller.

pub mod client;
pub mod notify;

use std::future::Future;

use pmt_proto::task::Task;
use serde_json::Value;

pub use client::ApiClient;
pub use notify::{LogNotifier, RecordingNotifier};

/// Message used when a failure carries no usable text.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// A normalized API failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable message extracted from the response.
    pub message: String,
    /// HTTP status code; `None` when no response was received.
    pub status: Option<u16>,
    /// Raw response body: a JSON string for plain text, `Null` when empty.
    pub details: Value,
}

impl ApiError {
    /// Builds an error from a non-success response.
    ///
    /// The message is taken from, in order: a plain string body, the
    /// `error` field, the `message` field, then [`UNKNOWN_ERROR`].
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let details = parse_body(body);
        Self {
            message: extract_message(&details),
            status: Some(status),
            details,
        }
    }

    /// Builds an error for a request that got no usable response.
    #[must_use]
    pub fn transport(error: &reqwest::Error) -> Self {
        Self {
            message: error.to_string(),
            status: error.status().map(|s| s.as_u16()),
            details: Value::Null,
        }
    }

    /// Builds an error for a success response whose body did not decode.
    #[must_use]
    pub fn undecodable(status: u16, body: &str, error: &serde_json::Error) -> Self {
        Self {
            message: format!("unexpected response body: {error}"),
            status: Some(status),
            details: parse_body(body),
        }
    }

    /// Text shown to the user for this error.
    #[must_use]
    pub fn notice(&self) -> String {
        format!("API error: {}", self.message)
    }
}

/// Parses a response body into JSON, keeping non-JSON text as a string.
#[must_use]
pub fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Picks the user-facing message out of a parsed error body.
#[must_use]
pub fn extract_message(details: &Value) -> String {
    let non_blank = |v: &Value| {
        v.as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    match details {
        Value::String(_) => non_blank(details),
        Value::Object(fields) => fields
            .get("error")
            .and_then(non_blank)
            .or_else(|| fields.get("message").and_then(non_blank)),
        _ => None,
    }
    .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Receives one notification per failed API call.
pub trait Notifier: Send + Sync {
    /// Shows `message` to the user.
    fn notify(&self, message: &str);
}

/// Anything able to persist a task update. Implemented by [`ApiClient`]
/// and by test doubles driving the board.
pub trait TaskUpdater {
    /// Sends the full task and returns the stored version.
    fn update_task(&self, task: &Task) -> impl Future<Output = Result<Task, ApiError>> + Send;
}
