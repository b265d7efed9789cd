//! Handler outcome contract
//!
//! Every handler invocation produces exactly one [`Outcome`]: a status,
//! optional notes, context updates to merge, and routing hints the
//! engine consults when selecting the next node.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical statuses a handler can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    PartialSuccess,
    Retry,
    Fail,
    Skipped,
}

impl StageStatus {
    /// Stable wire/reporting name
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Success => "success",
            StageStatus::PartialSuccess => "partial_success",
            StageStatus::Retry => "retry",
            StageStatus::Fail => "fail",
            StageStatus::Skipped => "skipped",
        }
    }

    /// Whether this status triggers the engine's retry policy
    pub fn is_failure(&self) -> bool {
        matches!(self, StageStatus::Fail | StageStatus::Retry)
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result a handler returns to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub status: StageStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub context_updates: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_next_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Outcome {
    /// An outcome with the given status and no extras
    pub fn new(status: StageStatus) -> Self {
        Self {
            status,
            notes: String::new(),
            context_updates: Map::new(),
            preferred_label: None,
            suggested_next_ids: Vec::new(),
            failure_reason: None,
        }
    }

    /// Successful outcome
    pub fn success() -> Self {
        Self::new(StageStatus::Success)
    }

    /// Failed outcome carrying a failure reason
    pub fn fail(reason: impl Into<String>) -> Self {
        let mut outcome = Self::new(StageStatus::Fail);
        outcome.failure_reason = Some(reason.into());
        outcome
    }

    /// Retry request
    pub fn retry() -> Self {
        Self::new(StageStatus::Retry)
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Queue a single context update
    pub fn with_update(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context_updates.insert(key.into(), value.into());
        self
    }

    /// Ask the engine to prefer the edge carrying this label
    pub fn with_preferred_label(mut self, label: impl Into<String>) -> Self {
        self.preferred_label = Some(label.into());
        self
    }

    /// Ask the engine to jump to the first of these nodes that exists
    pub fn with_suggested_next(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggested_next_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_names() {
        assert_eq!(StageStatus::Success.as_str(), "success");
        assert_eq!(StageStatus::PartialSuccess.as_str(), "partial_success");
        assert_eq!(format!("{}", StageStatus::Retry), "retry");
    }

    #[test]
    fn test_is_failure() {
        assert!(StageStatus::Fail.is_failure());
        assert!(StageStatus::Retry.is_failure());
        assert!(!StageStatus::Success.is_failure());
        assert!(!StageStatus::PartialSuccess.is_failure());
        assert!(!StageStatus::Skipped.is_failure());
    }

    #[test]
    fn test_builders() {
        let outcome = Outcome::success()
            .with_notes("done")
            .with_update("last_response", "ok")
            .with_preferred_label("approve")
            .with_suggested_next(["review", "fixup"]);
        assert_eq!(outcome.status, StageStatus::Success);
        assert_eq!(outcome.notes, "done");
        assert_eq!(outcome.context_updates.get("last_response"), Some(&json!("ok")));
        assert_eq!(outcome.preferred_label.as_deref(), Some("approve"));
        assert_eq!(outcome.suggested_next_ids, vec!["review", "fixup"]);
        assert!(outcome.failure_reason.is_none());
    }

    #[test]
    fn test_fail_carries_reason() {
        let outcome = Outcome::fail("command exited 2");
        assert_eq!(outcome.status, StageStatus::Fail);
        assert_eq!(outcome.failure_reason.as_deref(), Some("command exited 2"));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&StageStatus::PartialSuccess).unwrap();
        assert_eq!(json, "\"partial_success\"");
        let back: StageStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StageStatus::PartialSuccess);
    }
}
