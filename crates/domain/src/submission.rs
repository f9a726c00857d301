use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::staged_file::StagedFile;

/// Error key for messages that do not belong to a single field.
pub const FORM_ERROR_KEY: &str = "form";

/// Message reported when the submit handler itself fails.
pub const GENERIC_SUBMISSION_ERROR: &str = "submission failed, please try again";

/// Payload key under which staged files are submitted.
pub const FILES_PAYLOAD_KEY: &str = "files";

/// Per-field validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Lifecycle phase of one form instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Waiting for the submit handler.
    Pending,
    /// Last submission succeeded and its banner is visible.
    Succeeded,
    /// Last submission failed.
    Failed,
}

impl SubmissionPhase {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Outcome reported by a submit handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmissionResult {
    /// No result yet.
    #[default]
    Pending,
    /// Handler accepted the payload.
    Success {
        /// Message shown in the success banner.
        message: String,
        /// Optional handler-specific data.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    /// Handler rejected the payload.
    Failure {
        /// Messages per field name.
        field_errors: FieldErrors,
    },
}

impl SubmissionResult {
    /// Builds a success result without data.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
            data: None,
        }
    }

    /// Builds a failure carrying one message for one field.
    #[must_use]
    pub fn field_failure(field_name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field_name.into(), vec![message.into()]);
        Self::Failure { field_errors }
    }

    /// Builds the field-independent failure used for handler rejections.
    #[must_use]
    pub fn generic_failure() -> Self {
        Self::field_failure(FORM_ERROR_KEY, GENERIC_SUBMISSION_ERROR)
    }

    /// Returns the phase this result settles a submission into.
    #[must_use]
    pub fn settled_phase(&self) -> SubmissionPhase {
        match self {
            Self::Pending => SubmissionPhase::Idle,
            Self::Success { .. } => SubmissionPhase::Succeeded,
            Self::Failure { .. } => SubmissionPhase::Failed,
        }
    }

    /// Returns messages for one field, empty when none are reported.
    #[must_use]
    pub fn errors_for(&self, field_name: &str) -> &[String] {
        match self {
            Self::Failure { field_errors } => field_errors
                .get(field_name)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            Self::Pending | Self::Success { .. } => &[],
        }
    }
}

/// Data handed to the submit handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    /// Submitted field values keyed by field name.
    pub values: BTreeMap<String, String>,
    /// Staged files, in attachment order.
    pub files: Vec<StagedFile>,
    /// Previously persisted attachment references that were kept.
    pub remote_refs: Vec<String>,
}

impl FormPayload {
    /// Returns one submitted value.
    #[must_use]
    pub fn value(&self, field_name: &str) -> Option<&str> {
        self.values.get(field_name).map(String::as_str)
    }

    /// Returns a JSON view of values and file metadata, omitting file contents.
    #[must_use]
    pub fn summary(&self) -> Value {
        let values = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect::<serde_json::Map<_, _>>();
        let files = self
            .files
            .iter()
            .map(|file| {
                serde_json::json!({
                    "name": file.name(),
                    "mime_type": file.mime_type(),
                    "size_bytes": file.size_bytes(),
                })
            })
            .collect::<Vec<_>>();

        let mut summary = serde_json::Map::new();
        summary.insert("values".to_owned(), Value::Object(values));
        summary.insert(FILES_PAYLOAD_KEY.to_owned(), Value::Array(files));
        summary.insert(
            "remote_refs".to_owned(),
            Value::from(self.remote_refs.clone()),
        );
        Value::Object(summary)
    }
}
