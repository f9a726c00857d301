//! Domain types and pure functions for forms and query state.

#![forbid(unsafe_code)]

mod field;
mod field_set;
mod pagination;
mod query;
mod staged_file;
mod submission;

pub use field::{
    DEFAULT_FIELD_GROUP, FieldConfig, FieldConfigInput, FieldControl, FieldKind, FieldOption,
    FieldOptionInput, OptionValueInput,
};
pub use field_set::{FieldGroup, FieldGroups, FieldSet, FormAction, FormLayout, group_fields};
pub use pagination::{
    ELLIPSIS, PAGE_PARAM, PAGE_SIZE_OPTIONS, PageItem, PageItemPosition, PaginationView,
    SIZE_PARAM, generate_page_window, page_item_position,
};
pub use query::{ParamRegistry, QueryParams};
pub use staged_file::{
    ATTACHMENT_KEY_MARKER, StagedFile, StagedFileId, initial_remote_refs, remote_ref_file_name,
    remote_refs_from_field,
};
pub use submission::{
    FILES_PAYLOAD_KEY, FORM_ERROR_KEY, FieldErrors, FormPayload, GENERIC_SUBMISSION_ERROR,
    SubmissionPhase, SubmissionResult,
};
