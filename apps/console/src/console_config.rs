use std::env;
use std::path::PathBuf;
use std::time::Duration;

use formline_core::{AppError, AppResult};
use formline_domain::{FormAction, FormLayout};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub fields_path: PathBuf,
    pub search_params_path: Option<PathBuf>,
    pub initial_data_path: Option<PathBuf>,
    pub entity: String,
    pub layout: FormLayout,
    pub action: FormAction,
    pub include_files: bool,
    pub attachment_field: Option<String>,
    pub required_fields: Vec<String>,
    pub start_url: String,
    pub success_dismiss: Duration,
    pub search_debounce: Duration,
}

impl ConsoleConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_source(|name| env::var(name).ok())
    }

    fn from_source(source: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let fields_path = PathBuf::from(required_env(&source, "FORMLINE_FIELDS_PATH")?);
        let search_params_path =
            optional_env(&source, "FORMLINE_SEARCH_PARAMS_PATH").map(PathBuf::from);
        let initial_data_path =
            optional_env(&source, "FORMLINE_INITIAL_DATA_PATH").map(PathBuf::from);
        let entity =
            optional_env(&source, "FORMLINE_ENTITY").unwrap_or_else(|| "items".to_owned());

        let layout = optional_env(&source, "FORMLINE_LAYOUT")
            .map(|value| value.parse::<FormLayout>())
            .transpose()
            .map_err(|error| AppError::Configuration(format!("invalid FORMLINE_LAYOUT: {error}")))?
            .unwrap_or_default();
        let action = optional_env(&source, "FORMLINE_ACTION")
            .map(|value| value.parse::<FormAction>())
            .transpose()
            .map_err(|error| AppError::Configuration(format!("invalid FORMLINE_ACTION: {error}")))?
            .unwrap_or_default();
        let include_files = optional_env(&source, "FORMLINE_INCLUDE_FILES")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        let attachment_field = optional_env(&source, "FORMLINE_ATTACHMENT_FIELD");
        let required_fields = optional_env(&source, "FORMLINE_REQUIRED_FIELDS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let start_url = optional_env(&source, "FORMLINE_START_URL")
            .unwrap_or_else(|| format!("http://localhost/{entity}"));

        let success_dismiss_ms = parse_env_u64(&source, "FORMLINE_SUCCESS_DISMISS_MS", 3000)?;
        let search_debounce_ms = parse_env_u64(&source, "FORMLINE_SEARCH_DEBOUNCE_MS", 300)?;

        if success_dismiss_ms == 0 {
            return Err(AppError::Configuration(
                "FORMLINE_SUCCESS_DISMISS_MS must be greater than zero".to_owned(),
            ));
        }

        if search_debounce_ms == 0 {
            return Err(AppError::Configuration(
                "FORMLINE_SEARCH_DEBOUNCE_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            fields_path,
            search_params_path,
            initial_data_path,
            entity,
            layout,
            action,
            include_files,
            attachment_field,
            required_fields,
            start_url,
            success_dismiss: Duration::from_millis(success_dismiss_ms),
            search_debounce: Duration::from_millis(search_debounce_ms),
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(source: &impl Fn(&str) -> Option<String>, name: &str) -> AppResult<String> {
    optional_env(source, name)
        .ok_or_else(|| AppError::Configuration(format!("{name} is required")))
}

fn optional_env(source: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    source(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env_u64(
    source: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> AppResult<u64> {
    match optional_env(source, name) {
        Some(value) => value.parse::<u64>().map_err(|error| {
            AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
