//! # Sitegate Server
//!
//! HTTP server for a sitegate-built site.
//!
//! This crate provides:
//! - Static file serving from the build output, guarded against path traversal
//! - Registration and login with salted scrypt password hashes
//! - Cookie sessions with optional expiry
//! - Double-submit CSRF protection for state-changing endpoints
//!
//! # Backends
//!
//! Accounts and sessions live in one of three backends:
//!
//! | Backend  | Users                         | Sessions         |
//! |----------|-------------------------------|------------------|
//! | `demo`   | one fixed account             | memory           |
//! | `memory` | memory                        | memory           |
//! | `file`   | `<data_dir>/users.json`       | `sessions.json`  |
//!
//! ```rust,no_run
//! use sitegate_server::{BackendKind, Server, ServerConfig};
//!
//! # async fn run() -> sitegate_server::ServerResult<()> {
//! let config = ServerConfig::default()
//!     .with_backend(BackendKind::File)
//!     .with_data_dir("data")
//!     .with_public_dir("dist");
//! Server::new(config)?.serve().await
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod cookies;
mod csrf;
mod error;
mod handler;
mod password;
mod server;
mod session;
mod state;
mod static_files;
mod store;

pub use config::{BackendKind, ServerConfig, SessionConfig};
pub use cookies::{get_cookie, SameSite, SetCookie};
pub use csrf::{CsrfGuard, CSRF_COOKIE, CSRF_HEADER};
pub use error::{ErrorBody, ServerError, ServerResult};
pub use handler::{AuthResponse, CsrfResponse, LoginRequest, ProfileResponse, RegisterRequest};
pub use password::{hash_password, verify_password};
pub use server::{router, Server};
pub use session::SessionManager;
pub use state::AppState;
pub use static_files::resolve_path;
pub use store::{
    Backend, JsonSessionStore, JsonUserStore, MemorySessionStore, MemoryUserStore, Session,
    SessionStore, UserRecord, UserStore, DEMO_EMAIL, DEMO_PASSWORD,
};
