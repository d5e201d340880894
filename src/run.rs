//! Run orchestration
//!
//! Acquisition order: static server, then browser session; teardown runs in
//! reverse on every exit path. The first error encountered is the reported
//! failure; teardown errors that follow it are logged, not substituted. A
//! teardown error with no earlier failure is itself the failure.

use tracing::{info, warn};

use crate::server::StaticServer;
use crate::session::CdpLauncher;
use crate::{capture, inject, target, Launcher, PageSession, Result, RunConfig};

/// Execute one capture run with the production Chrome-backed session.
pub async fn run(config: &RunConfig) -> Result<()> {
    run_with(config, &CdpLauncher).await
}

/// Execute one capture run against an arbitrary [`Launcher`].
pub async fn run_with<L: Launcher>(config: &RunConfig, launcher: &L) -> Result<()> {
    // An unusable configuration must be rejected before anything is acquired.
    let target = target::classify(config)?;

    let mut server = match &config.serve {
        Some(dir) => Some(StaticServer::start(dir).await?),
        None => None,
    };
    let origin = server.as_ref().map(|s| s.origin());

    let outcome = drive(config, launcher, &target, origin.as_deref()).await;

    let teardown = match server.as_mut() {
        Some(server) => server.stop().await,
        None => Ok(()),
    };
    settle("server teardown", outcome, teardown)
}

/// Everything that runs while the server (if any) is up.
async fn drive<L: Launcher>(
    config: &RunConfig,
    launcher: &L,
    target: &target::Target,
    origin: Option<&str>,
) -> Result<()> {
    let url = target::resolve(target, origin)?;
    let session = launcher.launch(&config.browser, !config.debug).await?;

    let outcome = async {
        info!(url = %url, "navigating");
        session.navigate(&url, config.browser.wait_until).await?;
        inject::inject_all(&session, config).await?;
        capture::capture_all(&session, &config.viewports, &config.out_dir).await
    }
    .await;

    if config.debug {
        info!("debug mode: leaving the browser open for inspection");
    }
    let teardown = session.close(config.debug).await;
    settle("browser teardown", outcome, teardown)
}

fn settle(stage: &str, primary: Result<()>, teardown: Result<()>) -> Result<()> {
    match (primary, teardown) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(primary), Ok(())) => Err(primary),
        (Ok(()), Err(teardown)) => Err(teardown),
        (Err(primary), Err(teardown)) => {
            warn!("{} also failed after an earlier error: {}", stage, teardown);
            Err(primary)
        }
    }
}
