// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct and implementation for the
//! explorer API server, including server lifecycle management, router
//! configuration, and coordinated graceful shutdown using `CancellationToken`.

use std::{future::IntoFuture, net::SocketAddr, pin::pin, sync::Arc, time::Duration};

use axum::{Router, http::HeaderName, middleware::from_fn_with_state};
use external_apis::ApiRegistry;
use hyper::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};
use tx_analyzer::TransactionAnalyzer;

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    middleware::{RateLimiter, request_timeout},
    routes::create_routes,
    state::ServerState,
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time in-flight requests (chat streams included) get to finish
    /// once shutdown starts
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if an upstream client cannot be built
    /// from the configuration.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let api_registry =
            ApiRegistry::new(config.registry_config()).map_err(|e| ServerError::Config {
                message: format!("failed to create API registry: {e}"),
            })?;
        Self::with_api_registry(config, shutdown_config, Arc::new(api_registry))
    }

    /// Create server with custom API registry for dependency injection
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the OpenAI configuration is invalid.
    pub fn with_api_registry(
        config: ServerConfig,
        shutdown_config: ShutdownConfig,
        api_registry: Arc<ApiRegistry>,
    ) -> ServerResult<Self> {
        let analyzer = TransactionAnalyzer::new(api_registry.clone(), config.openai_config())
            .map_err(|e| ServerError::Config {
                message: format!("failed to create transaction analyzer: {e}"),
            })?;

        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(
            config.clone(),
            api_registry,
            Arc::new(analyzer),
            cancellation_token.child_token(),
        );
        let router = Self::create_router(state.clone());

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            shutdown_config,
        })
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> Router {
        let timeout_duration = state.config().timeout_seconds.value();
        let rate_limiter = RateLimiter::new(state.config().rate_limiting.clone());

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, method = %req.method(), uri = %req.uri())
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown")
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive())
            .layer(from_fn_with_state(timeout_duration, request_timeout));

        create_routes(rate_limiter)
            .layer(middleware)
            .with_state(state)
    }

    async fn bind(&self) -> ServerResult<(TcpListener, SocketAddr)> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        Ok((listener, actual_addr))
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// or `ServerError::Shutdown` if the server fails while serving.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, actual_addr) = self.bind().await?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            analysis_enabled = self.state.analyzer().is_configured(),
            "explorer API server starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(signal_token).await;
        });

        let serve = axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(cancellation_token.clone().cancelled_owned())
        .into_future();
        let mut serve = pin!(serve);

        let finished = tokio::select! {
            result = &mut serve => Some(result),
            () = cancellation_token.cancelled() => None,
        };

        // Open chat streams may outlive the signal; bound how long we wait
        let graceful_timeout = self.shutdown_config.graceful_timeout;
        let server_result = match finished {
            Some(result) => result,
            None => {
                if let Ok(result) = tokio::time::timeout(graceful_timeout, serve).await {
                    result
                } else {
                    warn!(
                        timeout = ?graceful_timeout,
                        "graceful shutdown timed out, dropping open connections"
                    );
                    Ok(())
                }
            }
        };

        match server_result {
            Ok(()) => {
                info!("explorer API server shut down gracefully");
                Ok(())
            }
            Err(e) => {
                error!(error = ?e, "server error during shutdown");
                Err(ServerError::Shutdown { source: e })
            }
        }
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// Listens for SIGINT (Ctrl+C) and SIGTERM and cancels the token when
    /// either arrives.
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            #[allow(clippy::expect_used)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
                let mut sigint =
                    signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            }

            #[cfg(not(unix))]
            #[allow(clippy::expect_used)]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!(signal = signal_name, "shutdown signal received, cancelling all operations");
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                warn!("cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, actual_addr) = self.bind().await?;

        let token = self.cancellation_token.clone();
        let task = token.child_token();
        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                self.router
                    .into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { task.cancelled().await })
            .await;
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[tokio::test]
    async fn server_creation() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let server = Server::new(config, ShutdownConfig::default())?;
        assert_eq!(server.config().environment, Environment::Testing);
        assert!(!server.cancellation_token().is_cancelled());
        assert!(!server.state().analyzer().is_configured());
        Ok(())
    }

    #[tokio::test]
    async fn analysis_enabled_with_key() -> ServerResult<()> {
        let mut config = ServerConfig::for_testing();
        config.analyzer.openai_api_key = Some("sk-test".to_string());
        let server = Server::new(config, ShutdownConfig::default())?;
        assert!(server.state().analyzer().is_configured());
        Ok(())
    }

    #[test]
    fn invalid_upstream_url_is_config_error() {
        let mut config = ServerConfig::for_testing();
        config.upstream.rebar_base_url = "ftp://rebar.example".to_string();
        let result = Server::new(config, ShutdownConfig::default());
        assert!(matches!(result, Err(ServerError::Config { .. })));
    }

    #[tokio::test]
    async fn programmatic_shutdown() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let server = Server::new(config, ShutdownConfig::default())?;

        assert!(!server.cancellation_token().is_cancelled());
        assert!(!server.state().cancellation_token.is_cancelled());

        server.shutdown();

        assert!(server.cancellation_token().is_cancelled());
        assert!(server.state().cancellation_token.is_cancelled());
        Ok(())
    }

    #[test]
    fn shutdown_config_default() {
        let config = ShutdownConfig::default();
        assert_eq!(
            config.graceful_timeout,
            Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS)
        );
    }
}
