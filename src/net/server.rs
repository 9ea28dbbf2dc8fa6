//! HTTP server lifecycle on `axum-server`.
//!
//! # Responsibilities
//! - Serve a built router over plain TCP or rustls
//! - Report the bound address once the listener is up
//! - Close gracefully (drain in-flight requests) or immediately
//!
//! # Design Decisions
//! - The server runs on its own task; `close` waits for that task
//! - Forced close drops open connections, including idle keep-alive ones

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use tokio::task::JoinHandle;

use crate::config::{AdapterConfig, TlsConfig};
use crate::error::{AdapterError, AdapterResult};
use crate::net::tls::load_tls_config;

/// Options applied when the HTTP server is created.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Serve HTTPS with these PEM files.
    pub tls: Option<TlsConfig>,
    /// Drop open connections on close instead of draining them.
    pub force_close_connections: bool,
    /// Upper bound on a graceful close.
    pub shutdown_timeout: Duration,
    /// Per-request timeout.
    pub request_timeout: Option<Duration>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from(&AdapterConfig::default())
    }
}

impl From<&AdapterConfig> for ServerOptions {
    fn from(config: &AdapterConfig) -> Self {
        let request_timeout = match config.server.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            tls: config.listener.tls.clone(),
            force_close_connections: config.server.force_close_connections,
            shutdown_timeout: Duration::from_secs(config.server.shutdown_timeout_secs),
            request_timeout,
        }
    }
}

/// A server task started by [`serve`].
#[derive(Debug)]
pub struct RunningServer {
    handle: Handle,
    task: JoinHandle<io::Result<()>>,
    local_addr: SocketAddr,
    force_close: bool,
    shutdown_timeout: Duration,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }

    /// Stop the server and wait for its task to finish.
    pub async fn close(self) -> AdapterResult<()> {
        let open = self.handle.connection_count();
        if self.force_close {
            tracing::info!(open_connections = open, "Closing server, dropping open connections");
            self.handle.shutdown();
        } else {
            tracing::info!(
                open_connections = open,
                timeout_secs = self.shutdown_timeout.as_secs(),
                "Closing server gracefully"
            );
            self.handle.graceful_shutdown(Some(self.shutdown_timeout));
        }

        join(self.task).await?;
        tracing::info!(address = %self.local_addr, "HTTP server stopped");
        Ok(())
    }
}

async fn join(task: JoinHandle<io::Result<()>>) -> AdapterResult<()> {
    match task.await {
        Ok(result) => result.map_err(AdapterError::Io),
        Err(e) => Err(AdapterError::Io(io::Error::other(e))),
    }
}

/// Start serving `router` on `addr`.
pub async fn serve(
    router: Router,
    addr: SocketAddr,
    options: &ServerOptions,
) -> AdapterResult<RunningServer> {
    let handle = Handle::new();
    let app = router.into_make_service();

    let task = match &options.tls {
        Some(tls) => {
            let config = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
            tokio::spawn(
                axum_server::bind_rustls(addr, config)
                    .handle(handle.clone())
                    .serve(app),
            )
        }
        None => tokio::spawn(axum_server::bind(addr).handle(handle.clone()).serve(app)),
    };

    let Some(local_addr) = handle.listening().await else {
        // The task ended before binding; surface its error.
        join(task).await?;
        return Err(AdapterError::Io(io::Error::other("server stopped before listening")));
    };

    tracing::info!(
        address = %local_addr,
        tls = options.tls.is_some(),
        "HTTP server listening"
    );

    Ok(RunningServer {
        handle,
        task,
        local_addr,
        force_close: options.force_close_connections,
        shutdown_timeout: options.shutdown_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[test]
    fn test_options_from_config() {
        let mut config = AdapterConfig::default();
        config.server.request_timeout_secs = 0;
        config.server.force_close_connections = true;

        let options = ServerOptions::from(&config);
        assert_eq!(options.request_timeout, None);
        assert!(options.force_close_connections);
        assert_eq!(options.shutdown_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_serve_and_close() {
        let router = Router::new().route("/", get(|| async { "up" }));
        let server = serve(router, "127.0.0.1:0".parse().unwrap(), &ServerOptions::default())
            .await
            .unwrap();
        assert_ne!(server.local_addr().port(), 0);
        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();
        let router = Router::new();
        let result = serve(router, addr, &ServerOptions::default()).await;
        assert!(result.is_err());
    }
}
