//! HTTP/1 listener driving an [`AssetService`].

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::error::{Result, ServeError};
use crate::serve::AssetService;

/// Accepts connections and serves each on its own task
pub struct AssetServer {
    service: Arc<AssetService>,
    shutdown_timeout: Duration,
}

impl AssetServer {
    pub fn new(service: Arc<AssetService>) -> Self {
        Self {
            service,
            shutdown_timeout: Duration::from_secs(30),
        }
    }

    /// How long in-flight connections may take to finish after shutdown starts
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })
    }

    /// Serve until `shutdown` completes, then drain open connections.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if let Ok(addr) = listener.local_addr() {
            info!("Serving on http://{}", addr);
        }

        let graceful = GracefulShutdown::new();
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            // Per-connection failures (e.g. EMFILE) must not stop the server.
                            warn!(error = %err, "failed to accept connection");
                            continue;
                        }
                    };

                    let service = self.service.clone();
                    let connection = http1::Builder::new().serve_connection(
                        TokioIo::new(stream),
                        service_fn(move |request| {
                            let service = service.clone();
                            async move { Ok::<_, Infallible>(service.handle(request).await) }
                        }),
                    );
                    let connection = graceful.watch(connection);

                    tokio::spawn(async move {
                        if let Err(err) = connection.await {
                            debug!(%peer, error = %err, "connection closed with error");
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, draining connections");
                    break;
                }
            }
        }

        drop(listener);

        tokio::select! {
            _ = graceful.shutdown() => {
                info!("All connections closed");
            }
            _ = tokio::time::sleep(self.shutdown_timeout) => {
                warn!(timeout = ?self.shutdown_timeout, "Timed out waiting for connections to close");
            }
        }

        Ok(())
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C, shutting down");
    }
}
