//! Layersnap CLI
//!
//! Thin glue: parse arguments, build the run configuration, hand it to the
//! pipeline, and map any failure to a non-zero exit.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::error;

use layersnap::config::{parse_viewports, BrowserConfig, WaitUntil};
use layersnap::RunConfig;

#[derive(Parser)]
#[command(name = "layersnap")]
#[command(about = "Capture a page's layer structure per viewport", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the target page across the declared viewports
    Capture(CaptureArgs),
    /// Download and open the Sketch import plugin
    Install {
        /// Plugin release to fetch
        #[arg(long)]
        version: Option<String>,
    },
}

#[derive(Args)]
struct CaptureArgs {
    /// Serve this directory over HTTP for the duration of the run
    #[arg(long, value_name = "DIR")]
    serve: Option<PathBuf>,

    /// Absolute target URL, or a path relative to the served origin
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Capture a local file directly via a file:// URL
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Directory the per-viewport documents are written to
    #[arg(long, value_name = "DIR")]
    out_dir: PathBuf,

    /// Named viewport as NAME=<width>x<height>[@<scale>]; repeatable
    #[arg(
        long = "viewport",
        value_name = "NAME=SPEC",
        default_value = "Desktop=1024x768"
    )]
    viewports: Vec<String>,

    /// Run headed and keep the browser open for inspection
    #[arg(long)]
    debug: bool,

    /// Override for the bundled extraction script
    #[arg(long, value_name = "PATH")]
    extractor: Option<PathBuf>,

    /// Post-processing hook injected after the extraction script
    #[arg(long, value_name = "PATH")]
    symbol_middleware: Option<PathBuf>,

    /// Extra browser arguments, space separated
    #[arg(long, value_name = "ARGS")]
    browser_args: Option<String>,

    /// Browser executable override
    #[arg(long, value_name = "PATH")]
    browser_executable: Option<PathBuf>,

    /// Profile directory for the browser process
    #[arg(long, value_name = "DIR")]
    browser_user_data_dir: Option<PathBuf>,

    /// Navigation-completion policy
    #[arg(long, value_enum, default_value_t = WaitUntil::NetworkIdle2)]
    wait_until: WaitUntil,
}

impl CaptureArgs {
    fn into_config(self) -> layersnap::Result<RunConfig> {
        Ok(RunConfig {
            viewports: parse_viewports(&self.viewports)?,
            serve: self.serve,
            url: self.url,
            file: self.file,
            out_dir: self.out_dir,
            debug: self.debug,
            extractor: self.extractor,
            symbol_middleware: self.symbol_middleware,
            browser: BrowserConfig {
                args: self
                    .browser_args
                    .map(|args| args.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
                executable: self.browser_executable,
                user_data_dir: self.browser_user_data_dir,
                wait_until: self.wait_until,
            },
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Capture(args) => {
            let result = async {
                let config = args.into_config()?;
                layersnap::run(&config).await
            }
            .await;

            if let Err(e) = result {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        Commands::Install { version } => {
            if let Err(e) = layersnap::install::install(version.as_deref()).await {
                error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }
}
