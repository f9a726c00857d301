use std::collections::HashSet;
use std::str::FromStr;

use formline_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::field::{FieldConfig, FieldConfigInput};
use crate::submission::FORM_ERROR_KEY;

/// Ordered field configurations with unique names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    fields: Vec<FieldConfig>,
}

impl FieldSet {
    /// Creates a validated field set.
    pub fn new(fields: Vec<FieldConfig>) -> AppResult<Self> {
        let mut seen_names = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name() == FORM_ERROR_KEY {
                return Err(AppError::Validation(format!(
                    "field name '{FORM_ERROR_KEY}' is reserved for form-level errors"
                )));
            }
            if !seen_names.insert(field.name()) {
                return Err(AppError::Validation(format!(
                    "duplicate field name '{}' in field set",
                    field.name()
                )));
            }
        }

        Ok(Self { fields })
    }

    /// Validates raw inputs and builds a field set from them.
    pub fn from_inputs(inputs: Vec<FieldConfigInput>) -> AppResult<Self> {
        let fields = inputs
            .into_iter()
            .map(FieldConfig::new)
            .collect::<AppResult<Vec<_>>>()?;
        Self::new(fields)
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldConfig] {
        &self.fields
    }

    /// Returns one field by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns the fields grouped by label.
    #[must_use]
    pub fn groups(&self) -> FieldGroups<'_> {
        group_fields(&self.fields)
    }
}

/// Fields sharing one group label, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup<'a> {
    label: &'a str,
    fields: Vec<&'a FieldConfig>,
}

impl<'a> FieldGroup<'a> {
    /// Returns the group label.
    #[must_use]
    pub fn label(&self) -> &'a str {
        self.label
    }

    /// Returns the fields of this group.
    #[must_use]
    pub fn fields(&self) -> &[&'a FieldConfig] {
        &self.fields
    }
}

/// Group label to field mapping, ordered by first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldGroups<'a> {
    groups: Vec<FieldGroup<'a>>,
}

impl<'a> FieldGroups<'a> {
    /// Returns one group by label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&FieldGroup<'a>> {
        self.groups.iter().find(|group| group.label == label)
    }

    /// Returns group labels in first-occurrence order.
    pub fn labels(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.groups.iter().map(|group| group.label)
    }

    /// Iterates groups in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldGroup<'a>> {
        self.groups.iter()
    }

    /// Returns the number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns whether no group exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Groups fields by their group label.
///
/// Groups appear in order of first occurrence and fields keep their relative
/// input order inside a group. Fields without a group land in
/// [`crate::DEFAULT_FIELD_GROUP`].
#[must_use]
pub fn group_fields(fields: &[FieldConfig]) -> FieldGroups<'_> {
    let mut groups: Vec<FieldGroup<'_>> = Vec::new();
    for field in fields {
        let label = field.group_label();
        match groups.iter_mut().find(|group| group.label == label) {
            Some(group) => group.fields.push(field),
            None => groups.push(FieldGroup {
                label,
                fields: vec![field],
            }),
        }
    }

    FieldGroups { groups }
}

/// How a form lays out its fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormLayout {
    /// All fields in declaration order without headings.
    Single,
    /// One heading per field group.
    #[default]
    Grouped,
}

impl FromStr for FormLayout {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single" => Ok(Self::Single),
            "grouped" => Ok(Self::Grouped),
            _ => Err(AppError::Validation(format!(
                "unknown form layout '{value}'"
            ))),
        }
    }
}

/// Whether a form creates or updates its entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormAction {
    /// Creates a new entity.
    #[default]
    Create,
    /// Updates an existing entity.
    Update,
}

impl FormAction {
    /// Returns the stable identifier used in container keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }

    /// Returns the idle submit-button label.
    #[must_use]
    pub fn submit_label(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
        }
    }

    /// Returns the submit-button label shown while a submission is in flight.
    #[must_use]
    pub fn pending_label(&self) -> &'static str {
        match self {
            Self::Create => "Creating...",
            Self::Update => "Updating...",
        }
    }
}

impl FromStr for FormAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            _ => Err(AppError::Validation(format!(
                "unknown form action '{value}'"
            ))),
        }
    }
}
