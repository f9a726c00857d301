//! Development submit handler that accepts payloads and echoes them back.

use async_trait::async_trait;
use formline_application::SubmitHandler;
use formline_core::AppResult;
use formline_domain::{FieldErrors, FormPayload, SubmissionResult};
use tracing::info;

/// Submit handler that logs the payload and reports it as saved.
///
/// Fields listed as required fail with a per-field message when blank.
#[derive(Debug, Clone)]
pub struct EchoSubmitHandler {
    message: String,
    required: Vec<String>,
}

impl EchoSubmitHandler {
    /// Creates a handler that answers with `message` on success.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            required: Vec::new(),
        }
    }

    /// Marks fields that must not be submitted blank.
    #[must_use]
    pub fn with_required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = fields.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for EchoSubmitHandler {
    fn default() -> Self {
        Self::new("Saved successfully")
    }
}

#[async_trait]
impl SubmitHandler for EchoSubmitHandler {
    async fn submit(
        &self,
        _previous: &SubmissionResult,
        payload: FormPayload,
    ) -> AppResult<SubmissionResult> {
        let field_errors: FieldErrors = self
            .required
            .iter()
            .filter(|name| payload.value(name).is_none_or(|value| value.trim().is_empty()))
            .map(|name| (name.clone(), vec![format!("{name} is required")]))
            .collect();
        if !field_errors.is_empty() {
            info!(fields = field_errors.len(), "echo handler rejected blank fields");
            return Ok(SubmissionResult::Failure { field_errors });
        }

        let summary = payload.summary();
        info!(payload = %summary, "echo handler accepted submission");
        Ok(SubmissionResult::Success {
            message: self.message.clone(),
            data: Some(summary),
        })
    }
}
