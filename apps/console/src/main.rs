//! Formline console driver.

#![forbid(unsafe_code)]

mod console_config;

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use formline_application::{
    FormEngine, FormOptions, ModalState, PaginationControl, SearchSync, modal_key, render_form,
};
use formline_core::{AppError, AppResult};
use formline_domain::{PaginationView, StagedFile, SubmissionPhase};
use formline_infrastructure::{
    EchoSubmitHandler, InMemoryQueryNavigator, PlainTextFormRenderer, load_field_set,
    load_param_registry, load_record,
};
use tokio::sync::Notify;
use tracing::info;

use crate::console_config::{ConsoleConfig, init_tracing};

const USAGE: &str = concat!(
    "usage:\n",
    "  formline-console form [name=value | @file]...\n",
    "  formline-console pages <current> <total> [next | prev | <page> | size=<n>]\n",
    "  formline-console search <key> <value>...",
);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        return Err(AppError::Validation(USAGE.to_owned()));
    };

    match command.as_str() {
        "form" => run_form(&config, rest).await,
        "pages" => run_pages(&config, rest).await,
        "search" => run_search(&config, rest).await,
        other => Err(AppError::Validation(format!(
            "unknown command '{other}'\n{USAGE}"
        ))),
    }
}

async fn run_form(config: &ConsoleConfig, args: &[String]) -> AppResult<()> {
    let fields = load_field_set(&config.fields_path).await?;
    let handler = Arc::new(
        EchoSubmitHandler::default().with_required(config.required_fields.iter().cloned()),
    );
    let options = FormOptions {
        action: config.action,
        layout: config.layout,
        include_files: config.include_files,
        attachment_field: config.attachment_field.clone(),
        success_dismiss: config.success_dismiss,
    };

    let modals = ModalState::new();
    let modal = modal_key(&config.entity, config.action);
    modals.set_open(&modal, true);

    let dismissed = Arc::new(Notify::new());
    let close_modal = modals.auto_close(modal.clone());
    let on_auto_close = {
        let dismissed = Arc::clone(&dismissed);
        Arc::new(move || {
            close_modal();
            dismissed.notify_one();
        })
    };
    let engine = FormEngine::new(fields, handler, options).with_auto_close(on_auto_close);

    if let Some(path) = &config.initial_data_path {
        let record = load_record(path).await?;
        engine.load_initial_data(&record);
    }

    for arg in args {
        if let Some(path) = arg.strip_prefix('@') {
            let file = read_staged_file(Path::new(path)).await?;
            engine.attach_file(file)?;
            continue;
        }

        let (name, value) = arg.split_once('=').ok_or_else(|| {
            AppError::Validation(format!("expected name=value or @file, got '{arg}'"))
        })?;
        engine.set_value(name, value)?;
    }

    print_form(&engine);
    let phase = engine.submit().await?;
    info!(
        action = engine.options().action.as_str(),
        phase = ?phase,
        "form submitted"
    );
    print_form(&engine);

    if phase == SubmissionPhase::Succeeded {
        dismissed.notified().await;
        info!(
            modal = %modal,
            open = modals.is_open(&modal),
            "success banner dismissed"
        );
        print_form(&engine);
    }

    engine.teardown();
    Ok(())
}

async fn run_pages(config: &ConsoleConfig, args: &[String]) -> AppResult<()> {
    let current_page = parse_arg::<u32>(args, 0, "current page")?;
    let total_pages = parse_arg::<u32>(args, 1, "total pages")?;

    let navigator = Arc::new(InMemoryQueryNavigator::new(&config.start_url)?);
    let pagination = PaginationControl::new(navigator.clone());
    let mut view = pagination.go_to_page(total_pages, current_page).await?;

    match args.get(2).map(String::as_str) {
        None => {}
        Some("next") => {
            if let Some(next) = pagination.next_page(total_pages).await? {
                view = next;
            }
        }
        Some("prev") => {
            if let Some(previous) = pagination.previous_page(total_pages).await? {
                view = previous;
            }
        }
        Some(target) => {
            if let Some(size) = target.strip_prefix("size=") {
                let size = size.parse::<u32>().map_err(|error| {
                    AppError::Validation(format!("invalid page size '{size}': {error}"))
                })?;
                view = pagination.select_page_size(total_pages, size).await?;
            } else {
                let page = target.parse::<u32>().map_err(|error| {
                    AppError::Validation(format!("invalid page '{target}': {error}"))
                })?;
                view = pagination.go_to_page(total_pages, page).await?;
            }
        }
    }

    println!("{}", describe_pages(&view));
    println!("{}", navigator.current_url().await?);
    info!(
        page = view.current_page(),
        history = navigator.history_len().await,
        "pagination updated"
    );
    Ok(())
}

async fn run_search(config: &ConsoleConfig, args: &[String]) -> AppResult<()> {
    let Some((key, keystrokes)) = args.split_first() else {
        return Err(AppError::Validation(USAGE.to_owned()));
    };
    let path = config.search_params_path.as_ref().ok_or_else(|| {
        AppError::Configuration("FORMLINE_SEARCH_PARAMS_PATH is required for search".to_owned())
    })?;

    let registry = load_param_registry(path).await?;
    registry.validate_keys([key.as_str()])?;

    let navigator = Arc::new(InMemoryQueryNavigator::new(&config.start_url)?);
    let search = SearchSync::new(Arc::new(registry), navigator.clone())
        .with_delay(config.search_debounce);

    let param_name = search.registry().resolve(key)?;
    for value in keystrokes {
        search.set_search(key, value.as_str())?;
    }
    while search.is_pending() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    println!("{}", navigator.current_url().await?);
    info!(
        search_key = %key,
        param = param_name,
        keystrokes = keystrokes.len(),
        writes = navigator.replace_count().await,
        "search synced"
    );
    Ok(())
}

fn print_form(engine: &FormEngine) {
    let mut renderer = PlainTextFormRenderer::new();
    render_form(&engine.snapshot(), engine.fields(), &mut renderer);
    println!("{}", renderer.take_output());
}

fn describe_pages(view: &PaginationView) -> String {
    let items: Vec<String> = view
        .items()
        .into_iter()
        .map(|(item, _, active)| {
            if active {
                format!("[{item}]")
            } else {
                item.to_string()
            }
        })
        .collect();

    let previous = if view.has_previous() { "<" } else { " " };
    let next = if view.has_next() { ">" } else { " " };
    format!("{previous} {} {next}", items.join(" "))
}

async fn read_staged_file(path: &Path) -> AppResult<StagedFile> {
    let contents = tokio::fs::read(path).await.map_err(|error| {
        AppError::Validation(format!("failed to read '{}': {error}", path.display()))
    })?;
    let last_modified = tokio::fs::metadata(path)
        .await
        .and_then(|metadata| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    StagedFile::new(name, guess_mime_type(path), last_modified, contents)
}

fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn parse_arg<T>(args: &[String], index: usize, name: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = args
        .get(index)
        .ok_or_else(|| AppError::Validation(format!("missing {name}\n{USAGE}")))?;
    raw.parse::<T>()
        .map_err(|error| AppError::Validation(format!("invalid {name} '{raw}': {error}")))
}
