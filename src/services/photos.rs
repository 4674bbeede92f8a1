//! Storage of uploaded book covers and author portraits on local disk

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{AppError, AppResult};

/// What a photo belongs to; decides the subdirectory it lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Book,
    Author,
}

impl PhotoKind {
    fn dir(self) -> &'static str {
        match self {
            PhotoKind::Book => "books",
            PhotoKind::Author => "authors",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhotoStorage {
    root: PathBuf,
}

impl PhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` to `{root}/{kind}/{id}/fullsize{ext}` and return that path.
    ///
    /// Only the extension of the client file name is kept; anything else in it is ignored.
    pub async fn store(&self, kind: PhotoKind, id: i32, file_name: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        let dir = self.root.join(kind.dir()).join(id.to_string());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create {}: {}", dir.display(), e)))?;

        let path = dir.join(format!("fullsize{}", extension(file_name)));
        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::info!(id, kind = kind.dir(), bytes = bytes.len(), "Stored photo");
        Ok(path.to_string_lossy().into_owned())
    }
}

/// `.ext` in lowercase when the name has a short alphanumeric extension, else empty
fn extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
