//! Chrome-backed browser session
//!
//! The `headless_chrome` API is synchronous, so the session is backed by a
//! dedicated worker thread that owns the browser process and its single tab.
//! Async callers send commands over a channel and await oneshot replies,
//! which keeps the orchestrating task free to interleave output writes while
//! the browser works.

use std::ffi::OsStr;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::{Browser, LaunchOptions};
use tokio::sync::oneshot;
use tracing::debug;

use crate::config::{BrowserConfig, ViewportSpec, WaitUntil};
use crate::{Error, Launcher, PageSession, Result};

/// Settle window applied after load for the network-idle wait policies.
const NETWORK_SETTLE: Duration = Duration::from_millis(500);

/// Keeps the DevTools connection alive across slow navigations and captures.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

/// Expression invoking the extraction entry point for the current viewport.
const EXTRACT_EXPR: &str =
    "(async () => JSON.stringify(await window.__layersnap_capture()))()";

enum Command {
    Navigate(String, WaitUntil, oneshot::Sender<Result<()>>),
    SetViewport(ViewportSpec, oneshot::Sender<Result<()>>),
    Eval(String, bool, oneshot::Sender<Result<String>>),
    Close(bool, oneshot::Sender<Result<()>>),
}

/// Launches the production Chrome-backed session
pub struct CdpLauncher;

#[async_trait]
impl Launcher for CdpLauncher {
    type Session = CdpSession;

    async fn launch(&self, config: &BrowserConfig, headless: bool) -> Result<CdpSession> {
        CdpSession::launch(config, headless).await
    }
}

/// One browser process and one page, owned by a worker thread
pub struct CdpSession {
    cmd_tx: Sender<Command>,
}

impl CdpSession {
    /// Launch the browser process and open its page.
    pub async fn launch(config: &BrowserConfig, headless: bool) -> Result<Self> {
        let config = config.clone();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut worker = match Worker::start(&config, headless) {
                Ok(worker) => worker,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Navigate(url, wait_until, resp) => {
                        let _ = resp.send(worker.navigate(&url, wait_until));
                    }
                    Command::SetViewport(viewport, resp) => {
                        let _ = resp.send(worker.set_viewport(&viewport));
                    }
                    Command::Eval(expr, await_promise, resp) => {
                        let _ = resp.send(worker.eval(&expr, await_promise));
                    }
                    Command::Close(keep_alive, resp) => {
                        worker.shutdown(keep_alive);
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        init_rx
            .await
            .map_err(|_| Error::BrowserLaunch("browser worker exited during launch".into()))??;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::Browser("browser worker exited".into()))?;
        rx.await
            .map_err(|_| Error::Browser("browser worker dropped the reply".into()))?
    }
}

#[async_trait]
impl PageSession for CdpSession {
    async fn navigate(&self, url: &str, wait_until: WaitUntil) -> Result<()> {
        let url = url.to_string();
        self.request(|tx| Command::Navigate(url, wait_until, tx)).await
    }

    async fn set_viewport(&self, viewport: &ViewportSpec) -> Result<()> {
        let viewport = *viewport;
        self.request(|tx| Command::SetViewport(viewport, tx)).await
    }

    async fn inject(&self, source: &str) -> Result<()> {
        let source = source.to_string();
        self.request(|tx| Command::Eval(source, false, tx))
            .await
            .map_err(|e| Error::Injection(e.to_string()))?;
        Ok(())
    }

    async fn extract(&self) -> Result<String> {
        self.request(|tx| Command::Eval(EXTRACT_EXPR.to_string(), true, tx))
            .await
    }

    async fn close(self, keep_alive: bool) -> Result<()> {
        self.request(|tx| Command::Close(keep_alive, tx)).await
    }
}

/// Worker-thread side: the actual browser process and tab.
struct Worker {
    browser: Browser,
    tab: Arc<Tab>,
}

impl Worker {
    fn start(config: &BrowserConfig, headless: bool) -> Result<Self> {
        let args: Vec<&OsStr> = config.args.iter().map(OsStr::new).collect();

        let launch_options = LaunchOptions::default_builder()
            .headless(headless)
            .path(config.executable.clone())
            .user_data_dir(config.user_data_dir.clone())
            .args(args)
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .build()
            .map_err(|e| Error::BrowserLaunch(format!("bad launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::BrowserLaunch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| Error::BrowserLaunch(format!("failed to open page: {}", e)))?;

        debug!(headless, "browser session ready");
        Ok(Self { browser, tab })
    }

    fn navigate(&self, url: &str, wait_until: WaitUntil) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::Navigation(e.to_string()))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::Navigation(e.to_string()))?;

        match wait_until {
            WaitUntil::Load | WaitUntil::DomContentLoaded => {}
            // wait_until_navigated fires on load; the idle policies get an
            // extra settle window instead of exact connection counting.
            WaitUntil::NetworkIdle0 | WaitUntil::NetworkIdle2 => {
                thread::sleep(NETWORK_SETTLE);
            }
        }
        Ok(())
    }

    fn set_viewport(&self, viewport: &ViewportSpec) -> Result<()> {
        self.tab
            .call_method(Emulation::SetDeviceMetricsOverride {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: viewport.scale,
                mobile: false,
                scale: None,
                screen_width: None,
                screen_height: None,
                position_x: None,
                position_y: None,
                dont_set_visible_size: None,
                screen_orientation: None,
                viewport: None,
                display_feature: None,
                device_posture: None,
            })
            .map_err(|e| Error::Browser(format!("viewport override failed: {}", e)))?;
        Ok(())
    }

    fn eval(&self, expr: &str, await_promise: bool) -> Result<String> {
        let result = self
            .tab
            .evaluate(expr, await_promise)
            .map_err(|e| Error::Browser(format!("evaluation failed: {}", e)))?;

        let value = match result.value {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => "null".to_string(),
        };
        Ok(value)
    }

    fn shutdown(self, keep_alive: bool) {
        if keep_alive {
            // Leak the handles so the headed browser survives this process
            // and can be inspected manually.
            std::mem::forget(self.tab);
            std::mem::forget(self.browser);
        } else {
            drop(self.tab);
            drop(self.browser);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn launches_a_headless_session() {
        // Requires a local Chrome; skip where none is available.
        if std::env::var("CI").is_ok() {
            return;
        }
        let config = BrowserConfig::default();
        let session = match CdpSession::launch(&config, true).await {
            Ok(session) => session,
            Err(e) => {
                eprintln!("skipping: browser unavailable ({})", e);
                return;
            }
        };
        session.close(false).await.unwrap();
    }
}
