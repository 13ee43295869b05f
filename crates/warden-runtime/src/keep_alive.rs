//! Keep-alive HTTP page.
//!
//! Some hosts stop idle processes unless something answers HTTP. When
//! enabled, a tiny axum server answers `GET /` with a static page.

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::KeepAliveConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// Body served at `/`.
pub const KEEP_ALIVE_PAGE: &str = r#"<html>
  <head><title>Warden</title></head>
  <body>
    <div style="position:relative;min-height:10em;text-align:center;">
      <p>I'm a webpage!<br>I keep the bot awake.</p>
    </div>
  </body>
</html>
"#;

/// Builds the keep-alive router.
pub fn router() -> Router {
    Router::new().route("/", get(home))
}

async fn home() -> Html<&'static str> {
    Html(KEEP_ALIVE_PAGE)
}

/// A running keep-alive server.
#[derive(Debug)]
pub struct KeepAliveHandle {
    addr: std::net::SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl KeepAliveHandle {
    /// The address actually bound.
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.addr
    }

    /// Stops the server and waits for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!(error = %e, "Keep-alive task failed");
        }
    }
}

/// Binds the configured address and serves the page in the background.
pub async fn spawn_keep_alive(config: &KeepAliveConfig) -> RuntimeResult<KeepAliveHandle> {
    let bind = config.bind_addr();
    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|source| RuntimeError::KeepAlive {
            addr: bind.clone(),
            source,
        })?;
    let addr = listener
        .local_addr()
        .map_err(|source| RuntimeError::KeepAlive { addr: bind, source })?;

    info!(addr = %addr, "Keep-alive page listening");

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let server = axum::serve(listener, router());

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!(error = %e, "Keep-alive server error");
                }
            }
            _ = &mut shutdown_rx => {
                info!("Keep-alive page shutting down");
            }
        }
    });

    Ok(KeepAliveHandle {
        addr,
        shutdown: Some(shutdown_tx),
        task,
    })
}
