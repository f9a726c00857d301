use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use formline_core::{AppError, AppResult};
use formline_domain::{
    FieldConfigInput, FieldKind, FieldSet, FormAction, FormPayload, StagedFile, SubmissionPhase,
    SubmissionResult,
};
use serde_json::json;
use tokio::sync::{Mutex, oneshot};

use super::{FormEngine, FormOptions};
use crate::form_ports::SubmitHandler;
use crate::modal_state::{ModalState, modal_key};

enum Reply {
    Result(SubmissionResult),
    Reject,
    Panic,
    Wait(oneshot::Receiver<SubmissionResult>),
}

#[derive(Default)]
struct ScriptedHandler {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(SubmissionResult, FormPayload)>>,
}

impl ScriptedHandler {
    fn with_replies(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SubmitHandler for ScriptedHandler {
    async fn submit(
        &self,
        previous: &SubmissionResult,
        payload: FormPayload,
    ) -> AppResult<SubmissionResult> {
        self.calls.lock().await.push((previous.clone(), payload));
        let reply = self.replies.lock().await.pop_front();
        match reply {
            Some(Reply::Result(result)) => Ok(result),
            Some(Reply::Reject) => Err(AppError::Internal("backend unavailable".to_owned())),
            Some(Reply::Panic) => panic!("handler bug"),
            Some(Reply::Wait(receiver)) => receiver
                .await
                .map_err(|_| AppError::Internal("reply dropped".to_owned())),
            None => Ok(SubmissionResult::success("saved")),
        }
    }
}

fn text_field(name: &str, group: Option<&str>, disabled: bool) -> FieldConfigInput {
    FieldConfigInput {
        name: name.to_owned(),
        label: name.to_uppercase(),
        kind: FieldKind::Text,
        options: Vec::new(),
        placeholder: None,
        group: group.map(str::to_owned),
        disabled,
        description: None,
    }
}

fn product_fields() -> FieldSet {
    FieldSet::from_inputs(vec![
        text_field("title", Some("General"), false),
        text_field("sku", Some("General"), true),
        text_field("price", Some("Pricing"), false),
    ])
    .unwrap_or_else(|_| unreachable!())
}

fn engine(handler: Arc<ScriptedHandler>, options: FormOptions) -> FormEngine {
    FormEngine::new(product_fields(), handler, options)
}

fn file(name: &str) -> StagedFile {
    StagedFile::new(name, "image/png", Utc::now(), vec![7_u8; 16])
        .unwrap_or_else(|_| unreachable!())
}

fn counter() -> (Arc<AtomicUsize>, crate::form_ports::AutoClose) {
    let count = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&count);
    (
        count,
        Arc::new(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

async fn run_pending_tasks() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn submit_is_pending_until_handler_settles() {
    let (sender, receiver) = oneshot::channel();
    let handler = ScriptedHandler::with_replies(vec![Reply::Wait(receiver)]);
    let engine = engine(handler.clone(), FormOptions::default());
    assert_eq!(engine.phase(), SubmissionPhase::Idle);

    let in_flight = tokio::spawn({
        let engine = engine.clone();
        async move { engine.submit().await }
    });
    run_pending_tasks().await;

    assert_eq!(engine.phase(), SubmissionPhase::Pending);
    assert_eq!(engine.submit_label(), "Creating...");

    let second = engine.submit().await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert_eq!(handler.calls.lock().await.len(), 1);

    assert!(sender.send(SubmissionResult::success("created")).is_ok());
    let settled = in_flight.await;
    assert!(matches!(settled, Ok(Ok(SubmissionPhase::Succeeded))));
    assert_eq!(engine.success_message().as_deref(), Some("created"));
    assert_eq!(engine.submit_label(), "Create");
}

#[tokio::test]
async fn submit_enters_pending_at_call_time() {
    let (sender, receiver) = oneshot::channel();
    let handler = ScriptedHandler::with_replies(vec![Reply::Wait(receiver)]);
    let engine = engine(handler.clone(), FormOptions::default());

    let in_flight = engine.submit();
    assert_eq!(engine.phase(), SubmissionPhase::Pending);
    assert_eq!(engine.submit_label(), "Creating...");

    drop(in_flight);
    run_pending_tasks().await;
    assert_eq!(handler.calls.lock().await.len(), 1);

    assert!(sender.send(SubmissionResult::success("created")).is_ok());
    run_pending_tasks().await;
    assert_eq!(engine.phase(), SubmissionPhase::Succeeded);
    assert_eq!(engine.success_message().as_deref(), Some("created"));
}

#[tokio::test(start_paused = true)]
async fn success_banner_hides_exactly_at_dismiss_deadline() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let engine = engine(handler, FormOptions::default());

    let phase = engine.submit().await;
    assert!(matches!(phase, Ok(SubmissionPhase::Succeeded)));
    assert_eq!(engine.success_message().as_deref(), Some("saved"));

    tokio::time::advance(Duration::from_millis(2999)).await;
    run_pending_tasks().await;
    assert_eq!(engine.phase(), SubmissionPhase::Succeeded);
    assert!(engine.success_message().is_some());

    tokio::time::advance(Duration::from_millis(1)).await;
    run_pending_tasks().await;
    assert_eq!(engine.phase(), SubmissionPhase::Idle);
    assert!(engine.success_message().is_none());
}

#[tokio::test(start_paused = true)]
async fn auto_dismiss_closes_hosting_modal() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let modals = ModalState::new();
    modals.set_open("products-update", true);
    let engine = engine(
        handler,
        FormOptions {
            action: FormAction::Update,
            ..FormOptions::default()
        },
    )
    .with_auto_close(modals.auto_close(modal_key("products", FormAction::Update)));

    assert!(engine.submit().await.is_ok());
    assert!(modals.is_open("products-update"));

    tokio::time::advance(Duration::from_millis(3000)).await;
    run_pending_tasks().await;
    assert!(!modals.is_open("products-update"));
}

#[tokio::test]
async fn handler_rejection_becomes_generic_failure() {
    let handler = ScriptedHandler::with_replies(vec![Reply::Reject]);
    let engine = engine(handler, FormOptions::default());

    let phase = engine.submit().await;
    assert!(matches!(phase, Ok(SubmissionPhase::Failed)));
    assert_eq!(
        engine.form_errors(),
        vec!["submission failed, please try again".to_owned()]
    );
    assert!(engine.success_message().is_none());
}

#[tokio::test]
async fn handler_panic_becomes_generic_failure() {
    let handler = ScriptedHandler::with_replies(vec![Reply::Panic]);
    let engine = engine(handler, FormOptions::default());

    let phase = engine.submit().await;
    assert!(matches!(phase, Ok(SubmissionPhase::Failed)));
    assert_eq!(engine.form_errors().len(), 1);
}

#[tokio::test]
async fn validation_failure_is_exposed_per_field_and_retry_sees_previous_result() {
    let failure = SubmissionResult::field_failure("price", "price must be positive");
    let handler = ScriptedHandler::with_replies(vec![
        Reply::Result(failure.clone()),
        Reply::Result(SubmissionResult::success("saved")),
    ]);
    let engine = engine(handler.clone(), FormOptions::default());

    assert!(engine.set_value("price", "-4").is_ok());
    assert!(matches!(
        engine.submit().await,
        Ok(SubmissionPhase::Failed)
    ));
    assert_eq!(
        engine.field_errors("price"),
        vec!["price must be positive".to_owned()]
    );
    assert!(engine.field_errors("title").is_empty());
    assert!(engine.success_message().is_none());

    assert!(engine.set_value("price", "4").is_ok());
    assert!(matches!(
        engine.submit().await,
        Ok(SubmissionPhase::Succeeded)
    ));
    assert!(engine.field_errors("price").is_empty());

    let calls = handler.calls.lock().await;
    assert_eq!(calls[0].0, SubmissionResult::Pending);
    assert_eq!(calls[1].0, failure);
    assert_eq!(calls[1].1.value("price"), Some("4"));
}

#[tokio::test(start_paused = true)]
async fn resubmit_cancels_pending_dismiss_timer() {
    let handler = ScriptedHandler::with_replies(vec![
        Reply::Result(SubmissionResult::success("first")),
        Reply::Result(SubmissionResult::field_failure("title", "taken")),
    ]);
    let (closed, on_auto_close) = counter();
    let engine = engine(handler, FormOptions::default()).with_auto_close(on_auto_close);

    assert!(engine.submit().await.is_ok());
    tokio::time::advance(Duration::from_millis(2000)).await;
    run_pending_tasks().await;

    assert!(matches!(
        engine.submit().await,
        Ok(SubmissionPhase::Failed)
    ));
    tokio::time::advance(Duration::from_millis(5000)).await;
    run_pending_tasks().await;

    assert_eq!(engine.phase(), SubmissionPhase::Failed);
    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_dismiss_timer() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let (closed, on_auto_close) = counter();
    let engine = engine(handler, FormOptions::default()).with_auto_close(on_auto_close);

    assert!(engine.submit().await.is_ok());
    engine.teardown();
    tokio::time::advance(Duration::from_millis(5000)).await;
    run_pending_tasks().await;

    assert_eq!(closed.load(Ordering::SeqCst), 0);
    assert!(matches!(engine.submit().await, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn teardown_discards_staged_files() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let engine = engine(
        handler,
        FormOptions {
            include_files: true,
            ..FormOptions::default()
        },
    );

    assert!(engine.attach_file(file("a.png")).is_ok());
    assert_eq!(engine.staged_files().len(), 1);

    engine.teardown();

    assert!(engine.staged_files().is_empty());
    assert!(engine.snapshot().files.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_engine_cancels_dismiss_timer() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let (closed, on_auto_close) = counter();
    let engine = engine(handler, FormOptions::default()).with_auto_close(on_auto_close);

    assert!(engine.submit().await.is_ok());
    drop(engine);
    tokio::time::advance(Duration::from_millis(5000)).await;
    run_pending_tasks().await;

    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn payload_skips_disabled_fields_and_rejects_unknown_ones() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let engine = engine(handler.clone(), FormOptions::default());

    assert!(engine.set_value("title", "Desk lamp").is_ok());
    assert!(matches!(
        engine.set_value("sku", "L-1"),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        engine.set_value("colour", "red"),
        Err(AppError::NotFound(_))
    ));
    assert!(engine.submit().await.is_ok());

    let calls = handler.calls.lock().await;
    let payload = &calls[0].1;
    assert_eq!(payload.value("title"), Some("Desk lamp"));
    assert_eq!(payload.value("price"), Some(""));
    assert_eq!(payload.value("sku"), None);
    assert!(payload.files.is_empty());
}

#[tokio::test]
async fn file_operations_are_bypassed_when_disabled() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let engine = engine(handler, FormOptions::default());

    assert!(matches!(
        engine.attach_file(file("a.png")),
        Err(AppError::Validation(_))
    ));

    let data = json!({"title": "Lamp", "productImage": "lamp.png"});
    engine.load_initial_data(data.as_object().unwrap_or(&serde_json::Map::new()));
    assert!(engine.remote_refs().is_empty());
    assert_eq!(engine.value("title").as_deref(), Some("Lamp"));
}

#[tokio::test]
async fn staged_files_are_submitted_and_discarded_on_success() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let engine = engine(
        handler.clone(),
        FormOptions {
            include_files: true,
            ..FormOptions::default()
        },
    );

    let data = json!({"title": "Lamp", "price": 12.5, "productImage": ["a.png", "b.png"]});
    engine.load_initial_data(data.as_object().unwrap_or(&serde_json::Map::new()));
    assert_eq!(engine.value("price").as_deref(), Some("12.5"));

    let kept = engine.attach_file(file("new.png"));
    let dropped = engine.attach_file(file("old.png"));
    assert!(kept.is_ok() && dropped.is_ok());
    let dropped = dropped.unwrap_or_else(|_| unreachable!());
    assert!(matches!(engine.detach_file(dropped), Ok(true)));
    assert!(matches!(engine.detach_file(dropped), Ok(false)));
    assert!(matches!(engine.detach_remote_ref("a.png"), Ok(true)));

    assert!(engine.submit().await.is_ok());

    let calls = handler.calls.lock().await;
    let payload = &calls[0].1;
    let names: Vec<&str> = payload.files.iter().map(StagedFile::name).collect();
    assert_eq!(names, vec!["new.png"]);
    assert_eq!(payload.remote_refs, vec!["b.png".to_owned()]);
    assert!(engine.staged_files().is_empty());
    assert_eq!(engine.remote_refs(), vec!["b.png".to_owned()]);
}

#[tokio::test]
async fn explicit_attachment_field_overrides_naming_scan() {
    let handler = ScriptedHandler::with_replies(Vec::new());
    let engine = engine(
        handler,
        FormOptions {
            include_files: true,
            attachment_field: Some("gallery".to_owned()),
            ..FormOptions::default()
        },
    );

    let data = json!({"avatarImage": "me.png", "gallery": ["g1.png", "g2.png"]});
    engine.load_initial_data(data.as_object().unwrap_or(&serde_json::Map::new()));
    assert_eq!(
        engine.remote_refs(),
        vec!["g1.png".to_owned(), "g2.png".to_owned()]
    );
}
