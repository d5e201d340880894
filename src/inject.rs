//! Extraction script injection
//!
//! Loads the page-side extraction script into the page's execution context
//! once per session, before any viewport is captured. The script is an opaque
//! collaborator: the pipeline only relies on it defining the
//! `window.__layersnap_capture` entry point, which returns a serializable
//! document for the page's current rendered state.

use std::path::Path;

use tracing::debug;

use crate::{Error, PageSession, Result, RunConfig};

/// Bundled fallback extractor, used when no `--extractor` override is given.
pub const DEFAULT_EXTRACTOR: &str = include_str!("../assets/extractor.js");

/// Inject the extraction script, then the optional symbol-middleware hook.
pub async fn inject_all<S: PageSession>(session: &S, config: &RunConfig) -> Result<()> {
    let source = extraction_source(config).await?;
    session.inject(&source).await?;
    debug!("extraction script injected");

    if let Some(path) = &config.symbol_middleware {
        let source = read_script(path).await?;
        session.inject(&source).await?;
        debug!(path = %path.display(), "symbol middleware injected");
    }
    Ok(())
}

async fn extraction_source(config: &RunConfig) -> Result<String> {
    match &config.extractor {
        Some(path) => read_script(path).await,
        None => Ok(DEFAULT_EXTRACTOR.to_string()),
    }
}

async fn read_script(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Injection(format!("cannot read script '{}': {}", path.display(), e)))
}
