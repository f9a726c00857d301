use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use formline_core::{AppError, AppResult};
use formline_domain::{
    FORM_ERROR_KEY, FieldSet, FormAction, FormLayout, FormPayload, StagedFile, StagedFileId,
    SubmissionPhase, SubmissionResult, initial_remote_refs, remote_refs_from_field,
};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::delayed_task::DelayedTask;
use crate::file_staging::FileStaging;
use crate::form_ports::{AutoClose, SubmitHandler};

#[cfg(test)]
mod tests;

/// How long a success banner stays visible.
pub const DEFAULT_SUCCESS_DISMISS: Duration = Duration::from_millis(3000);

/// Per-instance form behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    /// Whether the form creates or updates.
    pub action: FormAction,
    /// Flat or grouped field layout.
    pub layout: FormLayout,
    /// Enables file staging and attachment submission.
    pub include_files: bool,
    /// Payload key holding persisted attachment references.
    ///
    /// When unset, initial data is scanned for the first key containing
    /// `image`.
    pub attachment_field: Option<String>,
    /// Success banner lifetime.
    pub success_dismiss: Duration,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            action: FormAction::default(),
            layout: FormLayout::default(),
            include_files: false,
            attachment_field: None,
            success_dismiss: DEFAULT_SUCCESS_DISMISS,
        }
    }
}

/// Point-in-time copy of a form's observable state.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    /// Current lifecycle phase.
    pub phase: SubmissionPhase,
    /// Layout to render.
    pub layout: FormLayout,
    /// Bound values keyed by field name.
    pub values: BTreeMap<String, String>,
    /// Last settled result.
    pub result: SubmissionResult,
    /// Banner text while the success banner is visible.
    pub success_message: Option<String>,
    /// Whether attachments are rendered at all.
    pub include_files: bool,
    /// Staged files.
    pub files: Vec<StagedFile>,
    /// Retained remote references.
    pub remote_refs: Vec<String>,
    /// Submit control label for the current phase.
    pub submit_label: &'static str,
}

impl FormSnapshot {
    /// Returns the bound value of a field, empty when unset.
    #[must_use]
    pub fn value(&self, field_name: &str) -> &str {
        self.values.get(field_name).map_or("", String::as_str)
    }

    /// Returns the messages of a field while the form is failed.
    #[must_use]
    pub fn field_errors(&self, field_name: &str) -> &[String] {
        if self.phase == SubmissionPhase::Failed {
            self.result.errors_for(field_name)
        } else {
            &[]
        }
    }

    /// Returns field-independent messages while the form is failed.
    #[must_use]
    pub fn form_errors(&self) -> &[String] {
        self.field_errors(FORM_ERROR_KEY)
    }

    /// Returns whether a submission is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.phase == SubmissionPhase::Pending
    }
}

#[derive(Debug, Default)]
struct FormState {
    phase: SubmissionPhase,
    result: SubmissionResult,
    values: BTreeMap<String, String>,
    staging: FileStaging,
    submission_seq: u64,
    dismiss_timer: Option<DelayedTask>,
    torn_down: bool,
}

/// Dynamic form engine for one form instance.
///
/// Clones share state. Dropping the last clone, or calling
/// [`FormEngine::teardown`], cancels a pending success-dismiss timer.
#[derive(Clone)]
pub struct FormEngine {
    fields: Arc<FieldSet>,
    options: Arc<FormOptions>,
    handler: Arc<dyn SubmitHandler>,
    on_auto_close: Option<AutoClose>,
    state: Arc<Mutex<FormState>>,
}

impl FormEngine {
    /// Creates a form engine.
    #[must_use]
    pub fn new(fields: FieldSet, handler: Arc<dyn SubmitHandler>, options: FormOptions) -> Self {
        Self {
            fields: Arc::new(fields),
            options: Arc::new(options),
            handler,
            on_auto_close: None,
            state: Arc::new(Mutex::new(FormState::default())),
        }
    }

    /// Adds a collaborator invoked when the success banner auto-dismisses.
    #[must_use]
    pub fn with_auto_close(mut self, on_auto_close: AutoClose) -> Self {
        self.on_auto_close = Some(on_auto_close);
        self
    }

    /// Returns the configured fields.
    #[must_use]
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Returns the instance options.
    #[must_use]
    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Binds a value to a field.
    pub fn set_value(&self, field_name: &str, value: impl Into<String>) -> AppResult<()> {
        let field = self.fields.find(field_name).ok_or_else(|| {
            AppError::NotFound(format!("field '{field_name}' is not part of this form"))
        })?;
        if field.disabled() {
            return Err(AppError::Validation(format!(
                "field '{field_name}' is disabled"
            )));
        }

        self.lock_state()
            .values
            .insert(field_name.to_owned(), value.into());
        Ok(())
    }

    /// Returns the bound value of a field.
    #[must_use]
    pub fn value(&self, field_name: &str) -> Option<String> {
        self.lock_state().values.get(field_name).cloned()
    }

    /// Prefills values from an existing record.
    ///
    /// Keys matching field names are bound; strings, numbers and booleans
    /// are accepted. When files are enabled, persisted attachment references
    /// are seeded from the configured attachment field or the naming scan.
    pub fn load_initial_data(&self, data: &Map<String, Value>) {
        let mut state = self.lock_state();
        for field in self.fields.fields() {
            if let Some(value) = data.get(field.name()).and_then(submitted_text) {
                state.values.insert(field.name().to_owned(), value);
            }
        }

        if self.options.include_files {
            let remote_refs = match self.options.attachment_field.as_deref() {
                Some(field_name) => remote_refs_from_field(data, field_name),
                None => initial_remote_refs(data),
            };
            debug!(
                remote_refs = remote_refs.len(),
                "seeded persisted attachment references"
            );
            state.staging.set_remote_refs(remote_refs);
        }
    }

    /// Stages a selected file.
    pub fn attach_file(&self, file: StagedFile) -> AppResult<StagedFileId> {
        self.ensure_files_enabled()?;
        debug!(file = %file.name(), size_bytes = file.size_bytes(), "file staged");
        Ok(self.lock_state().staging.attach_file(file))
    }

    /// Removes a staged file. Removing an absent handle is a no-op.
    pub fn detach_file(&self, id: StagedFileId) -> AppResult<bool> {
        self.ensure_files_enabled()?;
        Ok(self.lock_state().staging.detach_file(id))
    }

    /// Removes a persisted reference. Removing an absent reference is a no-op.
    pub fn detach_remote_ref(&self, reference: &str) -> AppResult<bool> {
        self.ensure_files_enabled()?;
        Ok(self.lock_state().staging.detach_remote_ref(reference))
    }

    /// Returns the staged files.
    #[must_use]
    pub fn staged_files(&self) -> Vec<StagedFile> {
        self.lock_state().staging.current_files().to_vec()
    }

    /// Returns the retained remote references.
    #[must_use]
    pub fn remote_refs(&self) -> Vec<String> {
        self.lock_state().staging.remote_refs().to_vec()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        self.lock_state().phase
    }

    /// Returns the last settled result.
    #[must_use]
    pub fn result(&self) -> SubmissionResult {
        self.lock_state().result.clone()
    }

    /// Returns the messages of one field while the form is failed.
    #[must_use]
    pub fn field_errors(&self, field_name: &str) -> Vec<String> {
        self.snapshot().field_errors(field_name).to_vec()
    }

    /// Returns field-independent messages while the form is failed.
    #[must_use]
    pub fn form_errors(&self) -> Vec<String> {
        self.snapshot().form_errors().to_vec()
    }

    /// Returns the banner text while the success banner is visible.
    #[must_use]
    pub fn success_message(&self) -> Option<String> {
        let state = self.lock_state();
        success_message(&state)
    }

    /// Returns the submit control label for the current phase.
    #[must_use]
    pub fn submit_label(&self) -> &'static str {
        submit_label(self.options.action, self.phase())
    }

    /// Returns a copy of the observable state.
    #[must_use]
    pub fn snapshot(&self) -> FormSnapshot {
        let state = self.lock_state();
        FormSnapshot {
            phase: state.phase,
            layout: self.options.layout,
            values: state.values.clone(),
            result: state.result.clone(),
            success_message: success_message(&state),
            include_files: self.options.include_files,
            files: state.staging.current_files().to_vec(),
            remote_refs: state.staging.remote_refs().to_vec(),
            submit_label: submit_label(self.options.action, state.phase),
        }
    }

    /// Submits the current values.
    ///
    /// The phase moves to `Pending` and the handler is dispatched before this
    /// call returns. The returned future resolves to the settled phase;
    /// dropping it does not cancel the submission. A second submit while
    /// pending fails with [`AppError::Conflict`] without reaching the
    /// handler. Handler errors and panics settle as a generic failure.
    pub fn submit(&self) -> impl Future<Output = AppResult<SubmissionPhase>> + Send + 'static {
        let started = self.start_submission();
        async move {
            started?.await.map_err(|error| {
                AppError::Internal(format!("form submission task failed: {error}"))
            })
        }
    }

    fn start_submission(&self) -> AppResult<JoinHandle<SubmissionPhase>> {
        let (previous, payload, submission_seq) = {
            let mut state = self.lock_state();
            if state.torn_down {
                return Err(AppError::Conflict(
                    "form has been torn down and no longer accepts submissions".to_owned(),
                ));
            }
            if state.phase == SubmissionPhase::Pending {
                return Err(AppError::Conflict(
                    "a submission is already in flight for this form".to_owned(),
                ));
            }

            state.dismiss_timer = None;
            state.phase = SubmissionPhase::Pending;
            state.submission_seq += 1;
            let payload = self.build_payload(&state);
            (state.result.clone(), payload, state.submission_seq)
        };

        debug!(
            submission = submission_seq,
            action = self.options.action.as_str(),
            fields = payload.values.len(),
            files = payload.files.len(),
            "form submission started"
        );

        // Settling runs on its own task so a dropped caller cannot strand the
        // form in `Pending`.
        let engine = self.clone();
        Ok(tokio::spawn(async move {
            let handler = Arc::clone(&engine.handler);
            let outcome =
                tokio::spawn(async move { handler.submit(&previous, payload).await }).await;
            let result = match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(error)) => {
                    warn!(
                        submission = submission_seq,
                        error = %error,
                        "submit handler rejected the submission"
                    );
                    SubmissionResult::generic_failure()
                }
                Err(error) => {
                    warn!(
                        submission = submission_seq,
                        error = %error,
                        "submit handler did not complete"
                    );
                    SubmissionResult::generic_failure()
                }
            };

            engine.settle(submission_seq, result)
        }))
    }

    /// Stops the instance: cancels the dismiss timer, discards staged files
    /// and rejects new submits.
    pub fn teardown(&self) {
        let mut state = self.lock_state();
        state.torn_down = true;
        state.dismiss_timer = None;
        state.staging.clear_files();
        debug!("form engine torn down");
    }

    fn settle(&self, submission_seq: u64, result: SubmissionResult) -> SubmissionPhase {
        let mut state = self.lock_state();
        if state.torn_down || state.submission_seq != submission_seq {
            return state.phase;
        }

        let phase = result.settled_phase();
        match &result {
            SubmissionResult::Success { message, .. } => {
                info!(submission = submission_seq, message = %message, "form submission succeeded");
                state.staging.clear_files();
                state.dismiss_timer = Some(self.arm_success_dismiss(submission_seq));
            }
            SubmissionResult::Failure { field_errors } => {
                info!(
                    submission = submission_seq,
                    fields = field_errors.len(),
                    "form submission failed"
                );
            }
            SubmissionResult::Pending => {}
        }

        state.phase = phase;
        state.result = result;
        phase
    }

    fn arm_success_dismiss(&self, submission_seq: u64) -> DelayedTask {
        let state = Arc::downgrade(&self.state);
        let on_auto_close = self.on_auto_close.clone();
        DelayedTask::spawn(self.options.success_dismiss, async move {
            let Some(state) = state.upgrade() else {
                return;
            };
            if !dismiss_success(&state, submission_seq) {
                return;
            }

            debug!(submission = submission_seq, "success banner dismissed");
            if let Some(on_auto_close) = on_auto_close {
                on_auto_close();
            }
        })
    }

    fn build_payload(&self, state: &FormState) -> FormPayload {
        let values = self
            .fields
            .fields()
            .iter()
            .filter(|field| !field.disabled())
            .map(|field| {
                let value = state.values.get(field.name()).cloned().unwrap_or_default();
                (field.name().to_owned(), value)
            })
            .collect();

        if !self.options.include_files {
            return FormPayload {
                values,
                ..FormPayload::default()
            };
        }

        FormPayload {
            values,
            files: state.staging.current_files().to_vec(),
            remote_refs: state.staging.remote_refs().to_vec(),
        }
    }

    fn ensure_files_enabled(&self) -> AppResult<()> {
        if self.options.include_files {
            return Ok(());
        }

        Err(AppError::Validation(
            "file attachments are not enabled for this form".to_owned(),
        ))
    }

    fn lock_state(&self) -> MutexGuard<'_, FormState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<FormState>) -> MutexGuard<'_, FormState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dismiss_success(state: &Mutex<FormState>, submission_seq: u64) -> bool {
    let mut state = lock(state);
    if state.torn_down
        || state.submission_seq != submission_seq
        || state.phase != SubmissionPhase::Succeeded
    {
        return false;
    }

    state.phase = SubmissionPhase::Idle;
    true
}

fn success_message(state: &FormState) -> Option<String> {
    match (&state.phase, &state.result) {
        (SubmissionPhase::Succeeded, SubmissionResult::Success { message, .. }) => {
            Some(message.clone())
        }
        _ => None,
    }
}

fn submit_label(action: FormAction, phase: SubmissionPhase) -> &'static str {
    if phase == SubmissionPhase::Pending {
        action.pending_label()
    } else {
        action.submit_label()
    }
}

fn submitted_text(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
