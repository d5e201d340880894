//! Integration tests for the capture pipeline
//!
//! The orchestrator is driven through a scripted stand-in session, so these
//! tests exercise the full pipeline (target resolution, server lifecycle,
//! capture loop, output writing, teardown discipline) without a browser.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use layersnap::config::{parse_viewports, BrowserConfig, ViewportSpec, WaitUntil};
use layersnap::{run_with, Error, Launcher, PageSession, Result, RunConfig};

const EMPTY_DOC: &str = "{\"layers\": []}";

/// Scripted behavior for a run.
#[derive(Default)]
struct Script {
    fail_navigation: bool,
    /// Fail the nth extraction (1-based).
    fail_extract_at: Option<u32>,
    /// Documents handed out per extraction, then `EMPTY_DOC`.
    documents: VecDeque<String>,
}

/// What the stub observed.
#[derive(Default)]
struct Observed {
    launches: u32,
    headless: Vec<bool>,
    navigated: Vec<String>,
    injected: u32,
    viewports: Vec<String>,
    extracts: u32,
    closed: Vec<bool>,
}

#[derive(Clone, Default)]
struct StubLauncher {
    script: Arc<Mutex<Script>>,
    observed: Arc<Mutex<Observed>>,
}

impl StubLauncher {
    fn scripted(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            observed: Arc::default(),
        }
    }
}

struct StubSession {
    script: Arc<Mutex<Script>>,
    observed: Arc<Mutex<Observed>>,
}

#[async_trait]
impl Launcher for StubLauncher {
    type Session = StubSession;

    async fn launch(&self, _config: &BrowserConfig, headless: bool) -> Result<StubSession> {
        let mut observed = self.observed.lock().unwrap();
        observed.launches += 1;
        observed.headless.push(headless);
        Ok(StubSession {
            script: self.script.clone(),
            observed: self.observed.clone(),
        })
    }
}

#[async_trait]
impl PageSession for StubSession {
    async fn navigate(&self, url: &str, _wait_until: WaitUntil) -> Result<()> {
        self.observed.lock().unwrap().navigated.push(url.to_string());
        if self.script.lock().unwrap().fail_navigation {
            return Err(Error::Navigation("injected fault".into()));
        }
        Ok(())
    }

    async fn set_viewport(&self, viewport: &ViewportSpec) -> Result<()> {
        self.observed
            .lock()
            .unwrap()
            .viewports
            .push(viewport.to_string());
        Ok(())
    }

    async fn inject(&self, _source: &str) -> Result<()> {
        self.observed.lock().unwrap().injected += 1;
        Ok(())
    }

    async fn extract(&self) -> Result<String> {
        let nth = {
            let mut observed = self.observed.lock().unwrap();
            observed.extracts += 1;
            observed.extracts
        };
        let mut script = self.script.lock().unwrap();
        if script.fail_extract_at == Some(nth) {
            return Err(Error::Browser("injected extraction fault".into()));
        }
        Ok(script
            .documents
            .pop_front()
            .unwrap_or_else(|| EMPTY_DOC.to_string()))
    }

    async fn close(self, keep_alive: bool) -> Result<()> {
        self.observed.lock().unwrap().closed.push(keep_alive);
        Ok(())
    }
}

fn config(out_dir: &Path, viewports: &[&str]) -> RunConfig {
    let viewports: Vec<String> = viewports.iter().map(|s| s.to_string()).collect();
    RunConfig {
        serve: None,
        url: Some("https://example.com/".to_string()),
        file: None,
        out_dir: out_dir.to_path_buf(),
        viewports: parse_viewports(&viewports).unwrap(),
        debug: false,
        extractor: None,
        symbol_middleware: None,
        browser: BrowserConfig::default(),
    }
}

fn site_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<!DOCTYPE html><p>site</p>").unwrap();
    dir
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

#[tokio::test]
async fn captures_one_file_per_viewport() {
    let out = tempfile::tempdir().unwrap();
    let cfg = config(out.path(), &["Desktop=1024x768", "Mobile=320x568"]);
    let launcher = StubLauncher::default();

    run_with(&cfg, &launcher).await.unwrap();

    assert_eq!(
        read(out.path().join("page-1024x768.asketch.json")),
        EMPTY_DOC
    );
    assert_eq!(read(out.path().join("page-320x568.asketch.json")), EMPTY_DOC);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 2);

    let observed = launcher.observed.lock().unwrap();
    assert_eq!(observed.navigated, vec!["https://example.com/"]);
    assert_eq!(observed.injected, 1);
    assert_eq!(observed.viewports, vec!["1024x768", "320x568"]);
    assert_eq!(observed.closed, vec![false]);
}

#[tokio::test]
async fn creates_nested_output_directories() {
    let out = tempfile::tempdir().unwrap();
    let nested = out.path().join("deeply/nested/out");
    let cfg = config(&nested, &["Desktop=1024x768"]);

    run_with(&cfg, &StubLauncher::default()).await.unwrap();

    assert!(nested.join("page-1024x768.asketch.json").is_file());
}

#[tokio::test]
async fn reruns_produce_identical_bytes() {
    let out = tempfile::tempdir().unwrap();
    let cfg = config(out.path(), &["Desktop=1024x768"]);
    let path = out.path().join("page-1024x768.asketch.json");

    run_with(&cfg, &StubLauncher::default()).await.unwrap();
    let first = fs::read(&path).unwrap();

    run_with(&cfg, &StubLauncher::default()).await.unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn identical_specs_collide_to_the_later_document() {
    let out = tempfile::tempdir().unwrap();
    let cfg = config(out.path(), &["Tablet=768x1024", "TabletCopy=768x1024"]);
    let launcher = StubLauncher::scripted(Script {
        documents: VecDeque::from([
            "{\"layers\": [\"first\"]}".to_string(),
            "{\"layers\": [\"second\"]}".to_string(),
        ]),
        ..Script::default()
    });

    run_with(&cfg, &launcher).await.unwrap();

    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
    assert_eq!(
        read(out.path().join("page-768x1024.asketch.json")),
        "{\"layers\": [\"second\"]}"
    );
}

#[tokio::test]
async fn missing_target_fails_before_any_launch() {
    let out = tempfile::tempdir().unwrap();
    let mut cfg = config(out.path(), &["Desktop=1024x768"]);
    cfg.url = None;
    let launcher = StubLauncher::default();

    let err = run_with(&cfg, &launcher).await.unwrap_err();

    assert!(matches!(err, Error::Configuration(_)), "got {:?}", err);
    assert_eq!(launcher.observed.lock().unwrap().launches, 0);
}

#[tokio::test]
async fn served_runs_navigate_to_the_ephemeral_origin() {
    let out = tempfile::tempdir().unwrap();
    let site = site_dir();
    let mut cfg = config(out.path(), &["Desktop=1024x768"]);
    cfg.serve = Some(site.path().to_path_buf());
    cfg.url = Some("sub/page.html".to_string());
    let launcher = StubLauncher::default();

    run_with(&cfg, &launcher).await.unwrap();

    let navigated = launcher.observed.lock().unwrap().navigated.clone();
    let target = url::Url::parse(&navigated[0]).unwrap();
    assert_eq!(target.host_str(), Some("localhost"));
    assert!(target.port().is_some());
    assert_eq!(target.path(), "/sub/page.html");
}

#[tokio::test]
async fn navigation_failure_still_stops_the_server() {
    let out = tempfile::tempdir().unwrap();
    let site = site_dir();
    let mut cfg = config(out.path(), &["Desktop=1024x768"]);
    cfg.serve = Some(site.path().to_path_buf());
    cfg.url = None;
    let launcher = StubLauncher::scripted(Script {
        fail_navigation: true,
        ..Script::default()
    });

    let err = run_with(&cfg, &launcher).await.unwrap_err();
    assert!(matches!(err, Error::Navigation(_)), "got {:?}", err);

    let (closed, navigated) = {
        let observed = launcher.observed.lock().unwrap();
        (observed.closed.clone(), observed.navigated.clone())
    };
    // The browser was torn down before the failure was reported.
    assert_eq!(closed, vec![false]);

    // The listener is gone: the port the run navigated to no longer accepts.
    let target = url::Url::parse(&navigated[0]).unwrap();
    let port = target.port().unwrap();
    assert!(
        tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_err(),
        "server port {} still accepting after the run",
        port
    );
}

#[tokio::test]
async fn capture_failure_names_the_viewport() {
    let out = tempfile::tempdir().unwrap();
    let cfg = config(out.path(), &["Desktop=1024x768", "Mobile=320x568"]);
    let launcher = StubLauncher::scripted(Script {
        fail_extract_at: Some(2),
        ..Script::default()
    });

    let err = run_with(&cfg, &launcher).await.unwrap_err();

    match err {
        Error::Capture { viewport, .. } => assert_eq!(viewport, "Mobile"),
        other => panic!("expected a capture error, got {:?}", other),
    }
    // Teardown still ran.
    assert_eq!(launcher.observed.lock().unwrap().closed, vec![false]);
}

#[tokio::test]
async fn debug_mode_runs_headed_and_skips_browser_teardown() {
    let out = tempfile::tempdir().unwrap();
    let mut cfg = config(out.path(), &["Desktop=1024x768"]);
    cfg.debug = true;
    let launcher = StubLauncher::default();

    run_with(&cfg, &launcher).await.unwrap();

    let observed = launcher.observed.lock().unwrap();
    assert_eq!(observed.headless, vec![false]);
    assert_eq!(observed.closed, vec![true]);
}

#[tokio::test]
async fn symbol_middleware_is_injected_after_the_extractor() {
    let out = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let middleware = dir.path().join("middleware.js");
    fs::write(&middleware, "window.__layersnap_symbols = () => {};").unwrap();

    let mut cfg = config(out.path(), &["Desktop=1024x768"]);
    cfg.symbol_middleware = Some(middleware);
    let launcher = StubLauncher::default();

    run_with(&cfg, &launcher).await.unwrap();

    assert_eq!(launcher.observed.lock().unwrap().injected, 2);
}

#[tokio::test]
async fn scaled_viewports_key_their_own_file() {
    let out = tempfile::tempdir().unwrap();
    let cfg = config(out.path(), &["Mobile=320x568@2"]);

    run_with(&cfg, &StubLauncher::default()).await.unwrap();

    assert!(out.path().join("page-320x568@2.asketch.json").is_file());
}
