//! HTTP server lifecycle.
//!
//! bind → spawn background tasks → serve until shutdown.
//! A session sweep task runs alongside when an idle TTL is configured.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::api::router::app_router;
use crate::core_state::CoreState;

/// Upper bound on how often idle sessions are swept.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Handle to a running server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl ApiServer {
    /// Signal graceful shutdown.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!("Server task failed: {e}");
        }
    }
}

/// Bind `addr` and serve the application in a background task.
pub async fn start_server(core: Arc<CoreState>, addr: SocketAddr) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr()?;

    if let Some(ttl) = core.config.session_ttl {
        spawn_session_sweep(Arc::clone(&core), ttl);
    }

    let app = app_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Server received shutdown signal");
        };

        tracing::info!(%addr, "Server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Server error: {e}");
        }

        tracing::info!("Server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

/// Serve on the configured address until Ctrl-C.
pub async fn serve(core: Arc<CoreState>) -> Result<(), ServerError> {
    let addr = SocketAddr::new(core.config.host, core.config.port);
    let mut server = start_server(core, addr).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.join().await;
    Ok(())
}

fn sweep_interval(ttl: Duration) -> Duration {
    (ttl / 2).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL)
}

fn spawn_session_sweep(core: Arc<CoreState>, ttl: Duration) {
    let interval = sweep_interval(ttl);
    tracing::info!(ttl_secs = ttl.as_secs(), "Idle session eviction enabled");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = core.sessions.evict_idle(ttl) {
                tracing::error!("Session sweep failed: {e}");
            }
        }
    });
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_core() -> Arc<CoreState> {
        let config = AppConfig {
            knowledge_dir: "/nonexistent/knowledge".into(),
            frontend_dir: "/nonexistent/frontend".into(),
            ..AppConfig::default()
        };
        Arc::new(CoreState::from_config(config).unwrap())
    }

    #[tokio::test]
    async fn start_serve_and_stop() {
        let mut server = start_server(test_core(), SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .unwrap();
        assert!(server.addr.port() > 0);

        let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"healthy\""));

        server.shutdown();
        server.join().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_error() {
        let server = start_server(test_core(), SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .unwrap();
        let err = start_server(test_core(), server.addr).await.err().unwrap();
        assert!(matches!(err, ServerError::Bind { .. }));
    }

    #[test]
    fn sweep_interval_bounds() {
        assert_eq!(sweep_interval(Duration::from_secs(1)), Duration::from_secs(1));
        assert_eq!(sweep_interval(Duration::from_secs(30)), Duration::from_secs(15));
        assert_eq!(sweep_interval(Duration::from_secs(3600)), MAX_SWEEP_INTERVAL);
    }
}
