use std::sync::Arc;

use async_trait::async_trait;
use formline_core::AppResult;
use formline_domain::{FieldConfig, FormPayload, StagedFile, SubmissionResult};

/// Port that validates and persists a submitted form.
///
/// Returning `Err` is treated as a handler rejection: the engine logs it and
/// reports a generic failure instead of propagating it.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Handles one submission given the previous result and the new payload.
    async fn submit(
        &self,
        previous: &SubmissionResult,
        payload: FormPayload,
    ) -> AppResult<SubmissionResult>;
}

/// Collaborator invoked when the success banner auto-dismisses.
///
/// Hosting containers such as modals use it to close themselves.
pub type AutoClose = Arc<dyn Fn() + Send + Sync>;

/// Everything a renderer needs to draw one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    /// Field configuration.
    pub config: &'a FieldConfig,
    /// Current bound value.
    pub value: &'a str,
    /// Messages reported for this field by the last failed submission.
    pub errors: &'a [String],
}

/// Pluggable rendering port driven by [`crate::render_form`].
pub trait FormRenderer {
    /// Draws the transient success banner.
    fn success(&mut self, message: &str);

    /// Draws field-independent error messages.
    fn form_errors(&mut self, messages: &[String]);

    /// Draws a group heading.
    fn heading(&mut self, label: &str);

    /// Draws one field.
    fn field(&mut self, view: &FieldView<'_>);

    /// Draws staged files and retained remote references.
    fn attachments(&mut self, files: &[StagedFile], remote_refs: &[String]);

    /// Draws the submit control.
    fn submit_button(&mut self, label: &str, busy: bool);
}
