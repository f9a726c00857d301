use std::str::FromStr;

use formline_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Group label used for fields that do not declare one.
pub const DEFAULT_FIELD_GROUP: &str = "default";

/// Supported form field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Email address input.
    Email,
    /// Masked password input.
    Password,
    /// Numeric input.
    Number,
    /// One-of-many radio choice.
    Radio,
    /// Dropdown choice backed by declared options.
    Select,
    /// Multi-line text input.
    Textarea,
}

impl FieldKind {
    /// Returns the stable configuration value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Number => "number",
            Self::Radio => "radio",
            Self::Select => "select",
            Self::Textarea => "textarea",
        }
    }
}

impl FromStr for FieldKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "email" => Ok(Self::Email),
            "password" => Ok(Self::Password),
            "number" => Ok(Self::Number),
            "radio" => Ok(Self::Radio),
            "select" => Ok(Self::Select),
            "textarea" => Ok(Self::Textarea),
            _ => Err(AppError::Validation(format!("unknown field kind '{value}'"))),
        }
    }
}

/// One selectable option of a select or radio field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    value: String,
    label: NonEmptyString,
}

impl FieldOption {
    /// Creates a validated field option.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            value: value.into(),
            label: NonEmptyString::new(label)?,
        })
    }

    /// Returns the submitted value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }
}

/// Raw option shape accepted from configuration files.
///
/// Option values may be written as strings or numbers; both submit as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOptionInput {
    /// Submitted value.
    pub value: OptionValueInput,
    /// Display label.
    pub label: String,
}

/// Option value as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValueInput {
    /// Textual option value.
    Text(String),
    /// Numeric option value.
    Number(serde_json::Number),
}

impl OptionValueInput {
    fn into_submitted(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Number(value) => value.to_string(),
        }
    }
}

/// Input payload for field configuration construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfigInput {
    /// Unique field key inside a field set.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Ordered options, required for select fields.
    #[serde(default)]
    pub options: Vec<FieldOptionInput>,
    /// Optional placeholder text.
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Optional group label.
    #[serde(default)]
    pub group: Option<String>,
    /// Whether the field is rendered read-only and left out of submissions.
    #[serde(default)]
    pub disabled: bool,
    /// Optional helper text.
    #[serde(default)]
    pub description: Option<String>,
}

/// Validated configuration of one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    name: NonEmptyString,
    label: NonEmptyString,
    kind: FieldKind,
    options: Vec<FieldOption>,
    placeholder: Option<String>,
    group: Option<String>,
    disabled: bool,
    description: Option<String>,
}

impl FieldConfig {
    /// Creates a validated field configuration.
    pub fn new(input: FieldConfigInput) -> AppResult<Self> {
        let name = NonEmptyString::new(input.name)?;
        if input.kind == FieldKind::Select && input.options.is_empty() {
            return Err(AppError::Validation(format!(
                "select field '{}' must declare at least one option",
                name.as_str()
            )));
        }

        let options = input
            .options
            .into_iter()
            .map(|option| FieldOption::new(option.value.into_submitted(), option.label))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            label: NonEmptyString::new(input.label)?,
            name,
            kind: input.kind,
            options,
            placeholder: trimmed_non_empty(input.placeholder),
            group: trimmed_non_empty(input.group),
            disabled: input.disabled,
            description: trimmed_non_empty(input.description),
        })
    }

    /// Returns the unique field key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the field kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns declared options in order.
    #[must_use]
    pub fn options(&self) -> &[FieldOption] {
        &self.options
    }

    /// Returns the placeholder text.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// Returns the explicitly declared group.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns the group label, falling back to [`DEFAULT_FIELD_GROUP`].
    #[must_use]
    pub fn group_label(&self) -> &str {
        self.group().unwrap_or(DEFAULT_FIELD_GROUP)
    }

    /// Returns whether the field is disabled.
    #[must_use]
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the helper text.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the control a renderer should draw for this field.
    #[must_use]
    pub fn control(&self) -> FieldControl<'_> {
        match self.kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Password | FieldKind::Number => {
                FieldControl::Input {
                    input_type: self.kind.as_str(),
                }
            }
            FieldKind::Select => FieldControl::Select {
                options: &self.options,
            },
            FieldKind::Radio => FieldControl::Radio {
                options: &self.options,
            },
            FieldKind::Textarea => FieldControl::TextArea,
        }
    }
}

/// Render dispatch target derived from a field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldControl<'a> {
    /// Single-line input with an HTML-style input type.
    Input {
        /// Input type attribute value.
        input_type: &'static str,
    },
    /// Dropdown over the declared options.
    Select {
        /// Options in display order.
        options: &'a [FieldOption],
    },
    /// Radio group over the declared options.
    Radio {
        /// Options in display order.
        options: &'a [FieldOption],
    },
    /// Multi-line text area.
    TextArea,
}

fn trimmed_non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().to_owned();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}
