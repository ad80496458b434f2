//! Shared listener setup for every HTTP front end.
//!
//! # Responsibilities
//! - Bind the front end's port
//! - Wire up middleware (tracing, request timeout)
//! - Serve in the background until the shutdown signal fires

use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::frontend::FrontEndError;
use crate::lifecycle::Shutdown;

/// Per-request timeout applied to every front end.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Add the common middleware layers.
#[allow(deprecated)]
pub fn with_middleware(router: Router) -> Router {
    router
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}

/// Bind `host:port` and serve `router` until `shutdown` fires.
///
/// Returns once the listener is bound; serving continues on its own task.
pub async fn bind_and_serve(
    front_end: &'static str,
    host: &str,
    port: u16,
    router: Router,
    shutdown: &Shutdown,
) -> Result<SocketAddr, FrontEndError> {
    let address = format!("{host}:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| FrontEndError::Bind {
            address: address.clone(),
            source,
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| FrontEndError::Bind { address, source })?;

    tracing::info!(front_end, address = %local_addr, "Listening for connections");

    let stopped = shutdown.signalled();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, with_middleware(router))
            .with_graceful_shutdown(stopped)
            .await
        {
            tracing::error!(front_end, address = %local_addr, error = %e, "Server error");
        }
        tracing::info!(front_end, address = %local_addr, "Server stopped");
    });

    Ok(local_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind_and_serve("test", "127.0.0.1", port, Router::new(), &Shutdown::new())
            .await
            .unwrap_err();
        match err {
            FrontEndError::Bind { address, .. } => assert_eq!(address, format!("127.0.0.1:{port}")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let shutdown = Shutdown::new();
        let router = Router::new().route("/ping", get(|| async { "pong" }));
        let addr = bind_and_serve("test", "127.0.0.1", 0, router, &shutdown)
            .await
            .unwrap();

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .unwrap();

        let body = client
            .get(format!("http://{addr}/ping"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        shutdown.trigger();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(client.get(format!("http://{addr}/ping")).send().await.is_err());
    }
}
