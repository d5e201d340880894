//! Layersnap
//!
//! Captures a rendered web page's visual layer structure across one or more
//! named viewports and writes one JSON document per viewport for design-tool
//! import.
//!
//! The pipeline optionally serves a local directory over HTTP, drives a
//! headless Chrome to the target page, injects a page-side extraction script,
//! resizes the page once per declared viewport, and persists each extracted
//! document to `<out-dir>/page-<size>.asketch.json`.
//!
//! # Example
//!
//! ```no_run
//! use layersnap::{BrowserConfig, RunConfig};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> layersnap::Result<()> {
//! let config = RunConfig {
//!     serve: Some(PathBuf::from("./site")),
//!     url: None,
//!     file: None,
//!     out_dir: PathBuf::from("./sketch"),
//!     viewports: [("Desktop".to_string(), "1024x768".parse()?)]
//!         .into_iter()
//!         .collect(),
//!     debug: false,
//!     extractor: None,
//!     symbol_middleware: None,
//!     browser: BrowserConfig::default(),
//! };
//!
//! layersnap::run(&config).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{BrowserConfig, RunConfig, ViewportSpec, WaitUntil};

pub mod capture;
pub mod inject;
pub mod install;
pub mod output;
pub mod server;
pub mod session;
pub mod target;

mod run;
pub use run::{run, run_with};
pub use session::CdpLauncher;

/// One live page inside a launched browser
///
/// This is the seam the orchestrator and the capture loop drive. The
/// production implementation wraps a Chrome tab ([`session::CdpSession`]);
/// tests substitute scripted stand-ins.
#[async_trait]
pub trait PageSession: Send + Sized {
    /// Navigate the page and block until the chosen completion signal fires.
    async fn navigate(&self, url: &str, wait_until: WaitUntil) -> Result<()>;

    /// Apply a viewport to the page. Returns only once the resize is
    /// acknowledged, so a following extraction sees the new metrics.
    async fn set_viewport(&self, viewport: &ViewportSpec) -> Result<()>;

    /// Evaluate a script source in the page's execution context.
    async fn inject(&self, source: &str) -> Result<()>;

    /// Invoke the extraction entry point and return its serialized result.
    async fn extract(&self) -> Result<String>;

    /// Tear the session down. With `keep_alive` the browser process is left
    /// running so it can be inspected manually.
    async fn close(self, keep_alive: bool) -> Result<()>;
}

/// Launches one browser session per run
#[async_trait]
pub trait Launcher {
    type Session: PageSession;

    /// Start a browser process and open its single page.
    async fn launch(&self, config: &BrowserConfig, headless: bool) -> Result<Self::Session>;
}
