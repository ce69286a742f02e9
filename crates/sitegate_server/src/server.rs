//! Router assembly and the server lifecycle.

use crate::config::ServerConfig;
use crate::csrf::require_csrf;
use crate::error::ServerResult;
use crate::handler::{csrf_token, login, logout, me, register};
use crate::state::AppState;
use crate::static_files::serve_static;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Builds the application router.
///
/// ```text
/// POST /api/register   (CSRF-checked)
/// POST /api/login      (CSRF-checked)
/// POST /api/logout     (CSRF-checked)
/// GET  /api/me
/// GET  /api/csrf
/// GET  /*              static files
/// ```
pub fn router(state: Arc<AppState>) -> Router {
    let guarded = Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route_layer(from_fn_with_state(Arc::clone(&state), require_csrf));

    Router::new()
        .merge(guarded)
        .route("/api/me", get(me))
        .route("/api/csrf", get(csrf_token))
        .fallback(serve_static)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The sitegate HTTP server.
///
/// # Example
///
/// ```rust,no_run
/// use sitegate_server::{BackendKind, Server, ServerConfig};
///
/// # async fn run() -> sitegate_server::ServerResult<()> {
/// let config = ServerConfig::default().with_backend(BackendKind::Memory);
/// Server::new(config)?.serve().await
/// # }
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Creates a server, opening the configured backend.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self {
            state: AppState::new(config)?,
        })
    }

    /// Creates a server over prepared state.
    pub fn with_state(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Returns the shared state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Returns the router for this server.
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until Ctrl+C or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serves on an existing listener until `shutdown` completes.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        info!(
            backend = %self.state.backend.kind,
            csrf = self.state.csrf.is_enabled(),
            public_dir = ?self.state.config.public_dir,
            "Server running on port {}",
            addr.port()
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
