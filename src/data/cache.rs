use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::loader::{load, FileFormat, LoadError, LoaderOptions};
use super::model::Table;

/// Identity of an upload: content digest plus the format it was read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadKey {
    digest: [u8; 32],
    format: FileFormat,
}

impl UploadKey {
    pub fn new(bytes: &[u8], format: FileFormat) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(bytes));
        Self { digest, format }
    }
}

/// Memo of the last successful load. Holds at most one table, so a new upload
/// evicts the previous one. Owned by a single session, never shared.
#[derive(Debug, Default)]
pub struct LoadCache {
    entry: Option<(UploadKey, Arc<Table>)>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for this content, or load and remember it.
    /// Failed loads are not cached and leave the current entry in place.
    pub fn get_or_load(
        &mut self,
        bytes: &[u8],
        format: FileFormat,
        options: &LoaderOptions,
    ) -> Result<Arc<Table>, LoadError> {
        let key = UploadKey::new(bytes, format);
        if let Some((cached, table)) = &self.entry {
            if *cached == key {
                log::debug!("load cache hit ({format})");
                return Ok(Arc::clone(table));
            }
        }
        let table = Arc::new(load(bytes, format, options)?);
        self.entry = Some((key, Arc::clone(&table)));
        Ok(table)
    }
}
