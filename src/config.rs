//! Run configuration value types
//!
//! A [`RunConfig`] is constructed once from parsed arguments and defaults and
//! is passed by reference into the orchestrator; nothing in the pipeline
//! consults ambient state.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use indexmap::IndexMap;

use crate::{Error, Result};

/// The resolved set of inputs for one capture run
///
/// Immutable once the run starts. Exactly one of `file`, `serve`, or `url`
/// must describe a navigable target; the resolver rejects configurations
/// where none does.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Local directory to serve over HTTP for the duration of the run
    pub serve: Option<PathBuf>,
    /// Absolute target URL, or a path relative to the served origin
    pub url: Option<String>,
    /// Local file to capture directly via a file:// URL
    pub file: Option<PathBuf>,
    /// Directory the per-viewport documents are written to
    pub out_dir: PathBuf,
    /// Named viewports, captured in insertion order
    pub viewports: IndexMap<String, ViewportSpec>,
    /// Run headed and keep the browser alive for inspection
    pub debug: bool,
    /// Override for the bundled extraction script
    pub extractor: Option<PathBuf>,
    /// Optional post-processing hook injected after the extraction script
    pub symbol_middleware: Option<PathBuf>,
    /// Browser launch options
    pub browser: BrowserConfig,
}

/// Browser launch options
#[derive(Debug, Clone, Default)]
pub struct BrowserConfig {
    /// Extra command-line arguments passed to the browser process
    pub args: Vec<String>,
    /// Browser executable override
    pub executable: Option<PathBuf>,
    /// Profile directory for the browser process
    pub user_data_dir: Option<PathBuf>,
    /// Navigation-completion policy
    pub wait_until: WaitUntil,
}

/// Navigation-completion policy
///
/// The network-idle policies wait for load completion plus a quiescence
/// window; in-flight connection counts are not tracked exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WaitUntil {
    /// The initial load event
    #[value(name = "load")]
    Load,
    /// The DOM-ready event
    #[value(name = "domcontentloaded")]
    DomContentLoaded,
    /// Network idle with zero in-flight connections
    #[value(name = "networkidle0")]
    NetworkIdle0,
    /// Network idle with at most two in-flight connections
    #[default]
    #[value(name = "networkidle2")]
    NetworkIdle2,
}

/// A named logical screen size applied before extraction
///
/// Parsed from the compact form `<width>x<height>[@<scale>]`. The `Display`
/// rendering is the canonical string form and doubles as the output-file key,
/// so two viewports with identical size and scale share one output file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSpec {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Device scale factor
    pub scale: f64,
}

impl FromStr for ViewportSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || {
            Error::Configuration(format!(
                "invalid viewport spec '{}': expected <width>x<height>[@<scale>]",
                s
            ))
        };

        let (width, rest) = s.split_once('x').ok_or_else(malformed)?;
        let (height, scale) = match rest.split_once('@') {
            Some((h, sc)) => (h, Some(sc)),
            None => (rest, None),
        };

        let width: u32 = width.trim().parse().map_err(|_| malformed())?;
        let height: u32 = height.trim().parse().map_err(|_| malformed())?;
        if width == 0 || height == 0 {
            return Err(malformed());
        }

        let scale = match scale {
            Some(sc) => {
                let scale: f64 = sc.trim().parse().map_err(|_| malformed())?;
                if !scale.is_finite() || scale <= 0.0 {
                    return Err(malformed());
                }
                scale
            }
            None => 1.0,
        };

        Ok(Self {
            width,
            height,
            scale,
        })
    }
}

impl fmt::Display for ViewportSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 1.0 {
            write!(f, "{}x{}", self.width, self.height)
        } else {
            write!(f, "{}x{}@{}", self.width, self.height, self.scale)
        }
    }
}

/// Parse one `NAME=WxH[@S]` viewport argument.
pub fn parse_viewport_entry(arg: &str) -> Result<(String, ViewportSpec)> {
    let (name, spec) = arg.split_once('=').ok_or_else(|| {
        Error::Configuration(format!(
            "invalid viewport '{}': expected NAME=<width>x<height>[@<scale>]",
            arg
        ))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Configuration(format!(
            "invalid viewport '{}': empty name",
            arg
        )));
    }
    Ok((name.to_string(), spec.parse()?))
}

/// Build the viewport map from repeated `NAME=SPEC` arguments.
///
/// Later entries silently replace earlier entries with the same name; the
/// map preserves first-insertion order.
pub fn parse_viewports(args: &[String]) -> Result<IndexMap<String, ViewportSpec>> {
    let mut viewports = IndexMap::new();
    for arg in args {
        let (name, spec) = parse_viewport_entry(arg)?;
        viewports.insert(name, spec);
    }
    Ok(viewports)
}
