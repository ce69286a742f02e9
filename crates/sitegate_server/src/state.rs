//! Shared request state.

use crate::config::ServerConfig;
use crate::csrf::CsrfGuard;
use crate::error::ServerResult;
use crate::session::SessionManager;
use crate::store::Backend;
use std::sync::Arc;

/// Everything a request handler needs.
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,
    /// User and session stores.
    pub backend: Backend,
    /// Session handling over `backend.sessions`.
    pub sessions: SessionManager,
    /// CSRF token issuer and checker.
    pub csrf: CsrfGuard,
}

impl AppState {
    /// Opens the configured backend and builds the state.
    pub fn new(config: ServerConfig) -> ServerResult<Arc<Self>> {
        let backend = Backend::open(&config)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Builds the state over an existing backend.
    pub fn with_backend(config: ServerConfig, backend: Backend) -> Arc<Self> {
        let sessions = SessionManager::new(Arc::clone(&backend.sessions), config.session.clone());
        let csrf = CsrfGuard::new(config.csrf_enabled()).with_secure_cookie(config.session.secure);
        Arc::new(Self {
            config,
            backend,
            sessions,
            csrf,
        })
    }
}
