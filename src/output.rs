//! Output persistence
//!
//! One file per captured viewport, named after the viewport's canonical
//! size/scale string. Writes create or truncate; repeat runs overwrite.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Output path for one captured document: `<out_dir>/page-<key>.asketch.json`.
pub fn document_path(out_dir: &Path, key: &str) -> PathBuf {
    out_dir.join(format!("page-{}.asketch.json", key))
}

/// Create the output directory tree if absent.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| Error::OutputDir(format!("'{}': {}", path.display(), e)))
}

/// Persist one captured document.
pub async fn write(path: PathBuf, content: String) -> Result<()> {
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| Error::OutputWrite(format!("'{}': {}", path.display(), e)))
}
