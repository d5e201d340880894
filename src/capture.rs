//! Viewport capture loop
//!
//! Viewports are processed strictly sequentially on the shared page: the
//! resize for entry *i+1* never starts before the extraction for entry *i*
//! has completed. Output writes, by contrast, are spawned and run
//! concurrently with the following captures; the loop only settles them all
//! before reporting success.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use indexmap::IndexMap;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ViewportSpec;
use crate::output;
use crate::{Error, PageSession, Result};

/// Capture every viewport and persist each document under `out_dir`.
///
/// Output files are keyed by the viewport's canonical size/scale string, not
/// its name: two differently-named viewports with identical size and scale
/// share one file, and the later-processed one wins. A resize or extraction
/// failure aborts the loop with the offending viewport's name; writes already
/// spawned at that point are left to settle on their own.
pub async fn capture_all<S: PageSession>(
    session: &S,
    viewports: &IndexMap<String, ViewportSpec>,
    out_dir: &Path,
) -> Result<()> {
    output::ensure_dir(out_dir).await?;

    let mut pending: IndexMap<PathBuf, JoinHandle<Result<()>>> = IndexMap::new();

    for (name, spec) in viewports {
        session
            .set_viewport(spec)
            .await
            .map_err(|e| Error::capture(name, e))?;
        let document = session
            .extract()
            .await
            .map_err(|e| Error::capture(name, e))?;
        info!(viewport = %name, size = %spec, "captured");

        let path = output::document_path(out_dir, &spec.to_string());
        // A colliding size/scale targets the same file; the earlier write
        // must settle before the overwrite is issued so the later viewport's
        // document wins.
        if let Some(previous) = pending.shift_remove(&path) {
            joined(previous.await)?;
        }
        pending.insert(path.clone(), tokio::spawn(output::write(path, document)));
    }

    for result in join_all(pending.into_iter().map(|(_, handle)| handle)).await {
        joined(result)?;
    }
    Ok(())
}

fn joined(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    result.map_err(|e| Error::OutputWrite(format!("write task failed: {}", e)))?
}
