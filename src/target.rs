//! Target URL resolution
//!
//! A run has exactly one navigable URL. The target kind is classified once
//! from the configuration instead of re-branching throughout the pipeline.

use std::path::PathBuf;

use url::Url;

use crate::{Error, Result, RunConfig};

/// The single navigation target of a run
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A local file, navigated via a file:// URL anchored at the working directory
    File(PathBuf),
    /// A path relative to the ephemeral server's origin
    Served(String),
    /// An absolute URL used verbatim
    Remote(String),
}

/// Classify the run configuration into its target kind.
///
/// Precedence: `file`, then `serve` (with `url` as the served path, default
/// `/`), then `url` verbatim. A configuration naming none of them has no
/// navigable target and is rejected here, before any browser is launched.
pub fn classify(config: &RunConfig) -> Result<Target> {
    if let Some(file) = &config.file {
        return Ok(Target::File(file.clone()));
    }
    if config.serve.is_some() {
        let path = config.url.clone().unwrap_or_else(|| "/".to_string());
        return Ok(Target::Served(path));
    }
    if let Some(url) = &config.url {
        return Ok(Target::Remote(url.clone()));
    }
    Err(Error::Configuration(
        "no capture target: pass --url, --file, or --serve".to_string(),
    ))
}

/// Resolve the classified target to a navigable URL string.
///
/// `origin` is the ephemeral server's origin (`http://localhost:<port>`) and
/// must be present when the target is served.
pub fn resolve(target: &Target, origin: Option<&str>) -> Result<String> {
    match target {
        Target::File(path) => {
            let cwd = std::env::current_dir().map_err(|e| {
                Error::Configuration(format!("cannot resolve working directory: {}", e))
            })?;
            let url = Url::from_file_path(cwd.join(path)).map_err(|_| {
                Error::Configuration(format!(
                    "cannot build a file URL for '{}'",
                    path.display()
                ))
            })?;
            Ok(url.into())
        }
        Target::Served(path) => {
            let origin = origin.ok_or_else(|| {
                Error::Configuration("served target requires a running server".to_string())
            })?;
            let base = Url::parse(origin)
                .map_err(|e| Error::Configuration(format!("bad server origin: {}", e)))?;
            let url = base
                .join(path)
                .map_err(|e| Error::Configuration(format!("bad served path '{}': {}", path, e)))?;
            Ok(url.into())
        }
        Target::Remote(url) => Ok(url.clone()),
    }
}
