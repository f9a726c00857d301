use std::collections::BTreeMap;
use std::path::Path;

use formline_core::{AppError, AppResult};
use formline_domain::{FieldConfigInput, FieldSet, ParamRegistry};
use serde_json::{Map, Value};
use tracing::info;

async fn read_json(path: &Path) -> AppResult<Value> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Configuration(format!("failed to read '{}': {error}", path.display()))
    })?;

    serde_json::from_str(&raw).map_err(|error| {
        AppError::Configuration(format!("invalid JSON in '{}': {error}", path.display()))
    })
}

/// Loads a field set from a JSON array of field configurations.
pub async fn load_field_set(path: &Path) -> AppResult<FieldSet> {
    let document = read_json(path).await?;
    let inputs: Vec<FieldConfigInput> = serde_json::from_value(document).map_err(|error| {
        AppError::Configuration(format!(
            "invalid field configuration in '{}': {error}",
            path.display()
        ))
    })?;

    let fields = FieldSet::from_inputs(inputs)?;
    info!(path = %path.display(), fields = fields.fields().len(), "loaded form fields");
    Ok(fields)
}

/// Loads the search-parameter registry from a JSON object of
/// logical key to parameter name.
pub async fn load_param_registry(path: &Path) -> AppResult<ParamRegistry> {
    let document = read_json(path).await?;
    let entries: BTreeMap<String, String> = serde_json::from_value(document).map_err(|error| {
        AppError::Configuration(format!(
            "search parameters in '{}' must map keys to names: {error}",
            path.display()
        ))
    })?;

    let registry = ParamRegistry::new(entries)?;
    info!(path = %path.display(), keys = registry.len(), "loaded search parameters");
    Ok(registry)
}

/// Loads an existing record used to prefill a form.
pub async fn load_record(path: &Path) -> AppResult<Map<String, Value>> {
    match read_json(path).await? {
        Value::Object(record) => {
            info!(path = %path.display(), keys = record.len(), "loaded initial record");
            Ok(record)
        }
        _ => Err(AppError::Configuration(format!(
            "initial record in '{}' must be a JSON object",
            path.display()
        ))),
    }
}
