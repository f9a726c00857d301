use std::fmt::{Display, Formatter};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use formline_core::{AppResult, NonEmptyString};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Key fragment marking a payload entry as an attachment reference.
pub const ATTACHMENT_KEY_MARKER: &str = "image";

/// Opaque handle of one staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StagedFileId(Uuid);

impl StagedFileId {
    /// Creates a random staged-file handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StagedFileId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for StagedFileId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A user-selected attachment that the backend has not confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    id: StagedFileId,
    name: NonEmptyString,
    mime_type: String,
    size_bytes: u64,
    last_modified: DateTime<Utc>,
    contents: Arc<[u8]>,
}

impl StagedFile {
    /// Creates a staged file with a fresh handle.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        last_modified: DateTime<Utc>,
        contents: impl Into<Arc<[u8]>>,
    ) -> AppResult<Self> {
        let contents = contents.into();
        Ok(Self {
            id: StagedFileId::new(),
            name: NonEmptyString::new(name)?,
            mime_type: mime_type.into().trim().to_ascii_lowercase(),
            size_bytes: u64::try_from(contents.len()).unwrap_or(u64::MAX),
            last_modified,
            contents,
        })
    }

    /// Returns the staged-file handle.
    #[must_use]
    pub fn id(&self) -> StagedFileId {
        self.id
    }

    /// Returns the original file name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the MIME type, lowercased.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.mime_type.as_str()
    }

    /// Returns the content length in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Returns the last modification timestamp reported by the picker.
    #[must_use]
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Returns the file contents.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Returns whether the file can be previewed as an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Returns the size in megabytes with two decimals, e.g. `1.50 MB`.
    #[must_use]
    pub fn size_label(&self) -> String {
        let megabytes = self.size_bytes as f64 / (1024.0 * 1024.0);
        format!("{megabytes:.2} MB")
    }
}

/// Extracts previously persisted attachment references from initial data.
///
/// Scans keys in map order for one containing [`ATTACHMENT_KEY_MARKER`]
/// (case-insensitive). The first key holding a string or an array yields the
/// result; non-string array entries are skipped.
#[must_use]
pub fn initial_remote_refs(payload: &Map<String, Value>) -> Vec<String> {
    payload
        .iter()
        .filter(|(key, _)| key.to_lowercase().contains(ATTACHMENT_KEY_MARKER))
        .find_map(|(_, value)| refs_from_value(value))
        .unwrap_or_default()
}

/// Reads attachment references from one explicitly named payload key.
#[must_use]
pub fn remote_refs_from_field(payload: &Map<String, Value>, field_name: &str) -> Vec<String> {
    payload
        .get(field_name)
        .and_then(refs_from_value)
        .unwrap_or_default()
}

/// Returns the display name of a remote reference: its last path segment.
#[must_use]
pub fn remote_ref_file_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn refs_from_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(reference) => Some(vec![reference.clone()]),
        Value::Array(values) => Some(
            values
                .iter()
                .filter_map(|value| value.as_str().map(str::to_owned))
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::{Map, Value, json};

    use super::{StagedFile, initial_remote_refs, remote_ref_file_name, remote_refs_from_field};

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn single_reference_is_wrapped() {
        let refs = initial_remote_refs(&object(json!({"productImage": "x.png"})));
        assert_eq!(refs, vec!["x.png".to_owned()]);
    }

    #[test]
    fn reference_arrays_are_returned_in_order() {
        let refs = initial_remote_refs(&object(json!({"images": ["a", "b"]})));
        assert_eq!(refs, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn keys_without_marker_yield_nothing() {
        let refs = initial_remote_refs(&object(json!({"title": "lamp", "price": 4})));
        assert!(refs.is_empty());
    }

    #[test]
    fn non_reference_values_are_skipped_until_a_match() {
        let refs = initial_remote_refs(&object(json!({
            "image_count": 2,
            "images": ["a.png", 7, "b.png"]
        })));
        assert_eq!(refs, vec!["a.png".to_owned(), "b.png".to_owned()]);
    }

    #[test]
    fn explicit_field_ignores_other_attachment_keys() {
        let payload = object(json!({"avatarImage": "me.png", "gallery": ["g1.png"]}));
        assert_eq!(
            remote_refs_from_field(&payload, "gallery"),
            vec!["g1.png".to_owned()]
        );
        assert!(remote_refs_from_field(&payload, "missing").is_empty());
    }

    #[test]
    fn file_name_is_last_path_segment() {
        assert_eq!(remote_ref_file_name("uploads/2024/lamp.png"), "lamp.png");
        assert_eq!(remote_ref_file_name("lamp.png"), "lamp.png");
    }

    #[test]
    fn staged_file_reports_metadata() {
        let file = StagedFile::new("photo.PNG", "Image/PNG", Utc::now(), vec![0_u8; 1_572_864]);
        assert!(file.is_ok());
        let file = file.unwrap_or_else(|_| unreachable!());
        assert!(file.is_image());
        assert_eq!(file.size_bytes(), 1_572_864);
        assert_eq!(file.size_label(), "1.50 MB");
    }

    #[test]
    fn staged_files_get_distinct_handles() {
        let first = StagedFile::new("a.txt", "text/plain", Utc::now(), Vec::<u8>::new());
        let second = StagedFile::new("a.txt", "text/plain", Utc::now(), Vec::<u8>::new());
        assert!(first.is_ok() && second.is_ok());
        let first = first.unwrap_or_else(|_| unreachable!());
        let second = second.unwrap_or_else(|_| unreachable!());
        assert_ne!(first.id(), second.id());
        assert_ne!(first, second);
    }
}
