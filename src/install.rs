//! Import-plugin installation
//!
//! Downloads the versioned Sketch import plugin that consumes the
//! `.asketch.json` documents this tool produces, then hands the archive to
//! the platform opener. A linear, one-shot action with no retries; unpacking
//! is the opener's job.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::info;

/// Plugin release used when no explicit version is requested.
pub const DEFAULT_PLUGIN_VERSION: &str = "4.3";

fn archive_url(version: &str) -> String {
    format!(
        "https://github.com/brainly/html-sketchapp/releases/download/v{}/asketch2sketch.sketchplugin.zip",
        version
    )
}

/// Download the plugin archive for `version` and open it.
pub async fn install(version: Option<&str>) -> Result<()> {
    let version = version.unwrap_or(DEFAULT_PLUGIN_VERSION);
    let url = archive_url(version);

    info!(url = %url, "downloading import plugin");
    let response = reqwest::get(&url)
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("plugin download failed for version {}", version))?;
    let bytes = response
        .bytes()
        .await
        .context("plugin download was interrupted")?;

    let archive =
        std::env::temp_dir().join(format!("asketch2sketch-{}.sketchplugin.zip", version));
    tokio::fs::write(&archive, &bytes)
        .await
        .with_context(|| format!("cannot write '{}'", archive.display()))?;

    open_archive(&archive)?;
    info!(path = %archive.display(), "plugin archive handed to the system opener");
    Ok(())
}

fn open_archive(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    let mut command = {
        let mut command = Command::new("open");
        command.arg(path);
        command
    };
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        command
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    };

    let status = command
        .status()
        .with_context(|| format!("cannot open '{}'", path.display()))?;
    if !status.success() {
        bail!("opener exited with {} for '{}'", status, path.display());
    }
    Ok(())
}
