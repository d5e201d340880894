//! Error types for the capture pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a capture run
///
/// Every variant aborts the remainder of the run; none is retried. Resources
/// acquired before the failure are still torn down before the error reaches
/// the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// The run configuration is unusable (no target, malformed viewport spec)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The ephemeral static server could not be started
    #[error("Failed to start static server: {0}")]
    ServerStart(String),

    /// The browser process could not be launched
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    /// Navigation to the target URL failed or timed out
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// The extraction script could not be loaded or evaluated
    #[error("Failed to inject extraction script: {0}")]
    Injection(String),

    /// Resize or extraction failed for one viewport, aborting the loop
    #[error("Capture failed for viewport '{viewport}': {message}")]
    Capture { viewport: String, message: String },

    /// The output directory could not be created
    #[error("Failed to create output directory: {0}")]
    OutputDir(String),

    /// A captured document could not be persisted
    #[error("Failed to write output: {0}")]
    OutputWrite(String),

    /// Session transport fault (worker channel or CDP-level failure)
    #[error("Browser error: {0}")]
    Browser(String),
}

impl Error {
    /// Wrap a resize/extraction failure with the viewport it happened on.
    pub(crate) fn capture(viewport: &str, err: Error) -> Self {
        Error::Capture {
            viewport: viewport.to_string(),
            message: err.to_string(),
        }
    }
}
