//! Module-wide table of `CodeView` file IDs.

use rustc_hash::FxHashMap;

use crate::error::CodeViewError;
use crate::metadata::{DebugMetadata, FileRef};
use crate::path::full_path;
use crate::streamer::CodeViewStreamer;

/// Assigns dense 1-based IDs to canonical source paths.
///
/// Each distinct path is announced to the streamer exactly once. Distinct
/// `FileRef`s that canonicalize to the same path share an ID.
#[derive(Debug, Default)]
pub struct FileTable {
    /// Memoized canonical path per front-end file.
    paths: FxHashMap<FileRef, String>,
    /// Canonical path -> assigned ID.
    ids: FxHashMap<String, u32>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct paths registered so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Canonical path of `file`, computed at most once per module.
    pub fn canonical_path(&mut self, file: FileRef, metadata: &DebugMetadata) -> &str {
        self.paths.entry(file).or_insert_with(|| {
            let di = metadata.file(file);
            full_path(&di.directory, &di.filename)
        })
    }

    /// Return the ID for `file`, registering its path on first sight.
    pub fn register<S: CodeViewStreamer + ?Sized>(
        &mut self,
        file: FileRef,
        metadata: &DebugMetadata,
        out: &mut S,
    ) -> Result<u32, CodeViewError> {
        let path = self.canonical_path(file, metadata).to_owned();
        if let Some(&id) = self.ids.get(&path) {
            return Ok(id);
        }

        let id = u32::try_from(self.ids.len() + 1).map_err(|_| CodeViewError::TooManyFiles)?;
        let registered = out.emit_cv_file(id, &path);
        if registered != id {
            return Err(CodeViewError::FileRegistrationMismatch {
                expected: id,
                registered,
            });
        }
        tracing::trace!(id, path = %path, "registered source file");
        self.ids.insert(path, id);
        Ok(id)
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.ids.clear();
    }
}
