use formline_domain::{StagedFile, StagedFileId};

/// Attachments tracked for one form submission cycle.
///
/// Newly selected files and previously persisted remote references live in
/// two independent ordered lists. Removal from either is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStaging {
    files: Vec<StagedFile>,
    remote_refs: Vec<String>,
}

impl FileStaging {
    /// Creates empty staging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a selected file and returns its handle.
    pub fn attach_file(&mut self, file: StagedFile) -> StagedFileId {
        let id = file.id();
        self.files.push(file);
        id
    }

    /// Removes a staged file by handle. Returns whether anything was removed.
    pub fn detach_file(&mut self, id: StagedFileId) -> bool {
        let before = self.files.len();
        self.files.retain(|file| file.id() != id);
        self.files.len() != before
    }

    /// Removes a remote reference by value. Returns whether anything was removed.
    pub fn detach_remote_ref(&mut self, reference: &str) -> bool {
        let before = self.remote_refs.len();
        self.remote_refs.retain(|stored| stored != reference);
        self.remote_refs.len() != before
    }

    /// Replaces the remote references.
    pub fn set_remote_refs(&mut self, remote_refs: Vec<String>) {
        self.remote_refs = remote_refs;
    }

    /// Discards every staged file, keeping remote references.
    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    /// Returns staged files in attachment order.
    #[must_use]
    pub fn current_files(&self) -> &[StagedFile] {
        &self.files
    }

    /// Returns retained remote references in order.
    #[must_use]
    pub fn remote_refs(&self) -> &[String] {
        &self.remote_refs
    }
}
