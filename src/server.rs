//! Ephemeral static server
//!
//! Serves the `--serve` directory over HTTP on an OS-assigned port for the
//! duration of one capture run. The server is not a daemon: the orchestrator
//! starts it before the browser and stops it unconditionally at run end.

use std::path::Path;

use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Handle owning the HTTP listener for one run
pub struct StaticServer {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StaticServer {
    /// Bind an OS-assigned port and serve `directory` as static content.
    pub async fn start(directory: &Path) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::ServerStart(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| Error::ServerStart(e.to_string()))?
            .port();

        let app = Router::new()
            .fallback_service(ServeDir::new(directory).append_index_html_on_directories(true));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                warn!("static server error: {}", e);
            }
        });

        debug!(port, directory = %directory.display(), "static server ready");
        Ok(Self {
            port,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// The OS-assigned port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Local origin used to resolve served targets.
    pub fn origin(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Close the listener. Safe to call more than once; later calls are no-ops.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(shutdown) = self.shutdown.take() else {
            return Ok(());
        };
        let _ = shutdown.send(());
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| Error::ServerStart(format!("server task failed: {}", e)))?;
        }
        debug!(port = self.port, "static server stopped");
        Ok(())
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
