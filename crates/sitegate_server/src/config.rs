//! Server configuration.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which user/session storage the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// One hard-coded account, sessions in memory, registration refused.
    Demo,
    /// Users and sessions in memory; lost on restart.
    Memory,
    /// Users and sessions persisted as JSON files in the data directory.
    File,
}

impl BackendKind {
    /// Returns the lowercase name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Demo => "demo",
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "demo" => Ok(BackendKind::Demo),
            "memory" => Ok(BackendKind::Memory),
            "file" => Ok(BackendKind::File),
            other => Err(format!(
                "unknown backend {other:?} (expected demo, memory or file)"
            )),
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// How long a session stays valid (`None` = until logout).
    pub ttl: Option<Duration>,
    /// Whether to mark cookies `Secure`.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            ttl: Some(Duration::from_secs(24 * 60 * 60)),
            secure: false,
        }
    }
}

/// Configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Directory of built site files to serve.
    pub public_dir: PathBuf,
    /// Storage backend.
    pub backend: BackendKind,
    /// Directory for `users.json` and `sessions.json` (file backend).
    pub data_dir: PathBuf,
    /// CSRF protection override; `None` uses the backend default.
    pub csrf: Option<bool>,
    /// Session settings.
    pub session: SessionConfig,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
    /// Where successful logins are sent.
    pub login_redirect: String,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            public_dir: PathBuf::from("dist"),
            backend: BackendKind::File,
            data_dir: PathBuf::from("data"),
            csrf: None,
            session: SessionConfig::default(),
            max_body_bytes: 1_000_000,
            login_redirect: "/dashboard.html".to_string(),
        }
    }

    /// Sets the directory to serve.
    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    /// Sets the storage backend.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Forces CSRF protection on or off.
    pub fn with_csrf(mut self, enabled: bool) -> Self {
        self.csrf = Some(enabled);
        self
    }

    /// Sets the session lifetime.
    pub fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session.ttl = ttl;
        self
    }

    /// Marks cookies `Secure`.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.session.secure = secure;
        self
    }

    /// Sets the maximum request body size.
    pub fn with_max_body_bytes(mut self, size: usize) -> Self {
        self.max_body_bytes = size;
        self
    }

    /// Returns whether CSRF checks are enforced.
    ///
    /// Defaults to on for the file backend and off for the others.
    pub fn csrf_enabled(&self) -> bool {
        self.csrf
            .unwrap_or(matches!(self.backend, BackendKind::File))
    }

    /// Path of the persisted user map.
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    /// Path of the persisted session map.
    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join("sessions.json")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 3000)))
    }
}
