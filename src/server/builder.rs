//! ServerBuilder for fluent API to build HTTP servers

use super::logging::with_request_logging;
use crate::config::RequestLoggingConfig;
use crate::core::auth::PublicRoutes;
use anyhow::{Result, anyhow};
use axum::http::Method;
use axum::routing::{MethodRouter, get};
use axum::{Extension, Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for creating HTTP servers with request logging and public-route marking
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_routes(crud_routes(users))
///     .with_public_route(Method::POST, "/login", post(login))
///     .with_health_check()
///     .with_logging_config(RequestLoggingConfig::from_env())
///     .build()?;
/// ```
pub struct ServerBuilder {
    routes: Vec<Router>,
    public_routes: PublicRoutes,
    logging_config: RequestLoggingConfig,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            public_routes: PublicRoutes::new(),
            logging_config: RequestLoggingConfig::default(),
        }
    }

    /// Add routes that require authentication (the default)
    pub fn with_routes(mut self, routes: Router) -> Self {
        self.routes.push(routes);
        self
    }

    /// Add a route and mark it public for the authorization layer
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .with_public_route(Method::POST, "/auth/login", post(login_handler))
    ///     .with_public_route(Method::GET, "/docs", get(docs_handler));
    /// ```
    pub fn with_public_route(mut self, method: Method, path: &str, route: MethodRouter) -> Self {
        self.routes.push(Router::new().route(path, route));
        self.public_routes.mark_public(method, path);
        self
    }

    /// Mark routes public without registering them here
    ///
    /// Useful when the routes come from another router passed to
    /// [`with_routes`](Self::with_routes).
    pub fn with_public_routes(mut self, routes: PublicRoutes) -> Self {
        self.public_routes.merge(routes);
        self
    }

    /// Register a public `GET /health` endpoint
    pub fn with_health_check(self) -> Self {
        self.with_public_route(Method::GET, "/health", get(health_check))
    }

    /// Set the request logging configuration
    pub fn with_logging_config(mut self, config: RequestLoggingConfig) -> Self {
        self.logging_config = config;
        self
    }

    /// Routes marked public so far
    pub fn public_routes(&self) -> &PublicRoutes {
        &self.public_routes
    }

    /// Build the final router
    ///
    /// Merges all registered routes, installs the public-route table as an
    /// `Extension<Arc<PublicRoutes>>` and wraps everything in the request
    /// logging middleware.
    pub fn build(self) -> Result<Router> {
        if self.routes.is_empty() {
            return Err(anyhow!(
                "No routes registered. Call .with_routes() or .with_public_route()"
            ));
        }

        let router = self
            .routes
            .into_iter()
            .fold(Router::new(), |acc, routes| acc.merge(routes))
            .layer(Extension(Arc::new(self.public_routes)));

        Ok(with_request_logging(router, self.logging_config))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
