//! User and session storage.
//!
//! Two traits form the storage seam:
//! - [`UserStore`] maps an email to a [`UserRecord`]
//! - [`SessionStore`] maps a session token to a [`Session`]
//!
//! [`Backend`] bundles one of each according to [`BackendKind`].

mod json;
mod memory;

pub use json::{JsonSessionStore, JsonUserStore};
pub use memory::{MemorySessionStore, MemoryUserStore};

use crate::config::{BackendKind, ServerConfig};
use crate::error::ServerResult;
use crate::password::hash_password;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Account used by the demo backend.
pub const DEMO_EMAIL: &str = "user@example.com";
/// Password of the demo account.
pub const DEMO_PASSWORD: &str = "password";

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// `<salt>:<key>` scrypt hash.
    pub password_hash: String,
}

/// A logged-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Email of the session owner.
    pub email: String,
    /// Creation time, seconds since the Unix epoch.
    pub created_at: u64,
}

impl Session {
    /// Creates a session starting now.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            created_at: unix_now(),
        }
    }
}

/// Current time in seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Storage for accounts keyed by email.
pub trait UserStore: Send + Sync {
    /// Looks up an account.
    fn get(&self, email: &str) -> ServerResult<Option<UserRecord>>;

    /// Adds an account.
    ///
    /// Returns `ServerError::UserExists` if the email is taken.
    fn insert(&self, email: &str, user: UserRecord) -> ServerResult<()>;

    /// Returns the number of accounts.
    fn len(&self) -> usize;

    /// Returns true if there are no accounts.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage for sessions keyed by token.
pub trait SessionStore: Send + Sync {
    /// Stores a session.
    fn insert(&self, token: &str, session: Session) -> ServerResult<()>;

    /// Looks up a session.
    fn get(&self, token: &str) -> ServerResult<Option<Session>>;

    /// Removes a session, returning it if it existed.
    fn remove(&self, token: &str) -> ServerResult<Option<Session>>;

    /// Removes every session created before `cutoff` (Unix seconds).
    ///
    /// Returns the number of sessions removed.
    fn purge_created_before(&self, cutoff: u64) -> ServerResult<usize>;

    /// Returns the number of sessions.
    fn len(&self) -> usize;

    /// Returns true if there are no sessions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The user and session stores a server runs on.
#[derive(Clone)]
pub struct Backend {
    /// Which kind of backend this is.
    pub kind: BackendKind,
    /// Account storage.
    pub users: Arc<dyn UserStore>,
    /// Session storage.
    pub sessions: Arc<dyn SessionStore>,
    /// Whether new accounts may be registered.
    pub allow_registration: bool,
}

impl Backend {
    /// Opens the backend selected by `config`.
    ///
    /// The file backend creates its data directory if needed.
    pub fn open(config: &ServerConfig) -> ServerResult<Self> {
        match config.backend {
            BackendKind::Demo => Self::demo(),
            BackendKind::Memory => Ok(Self::memory()),
            BackendKind::File => {
                fs::create_dir_all(&config.data_dir)?;
                info!("Using data directory {:?}", config.data_dir);
                Ok(Self {
                    kind: BackendKind::File,
                    users: Arc::new(JsonUserStore::open(config.users_path())),
                    sessions: Arc::new(JsonSessionStore::open(config.sessions_path())),
                    allow_registration: true,
                })
            }
        }
    }

    /// Single hard-coded account; registration refused.
    pub fn demo() -> ServerResult<Self> {
        let users = MemoryUserStore::new();
        users.insert(
            DEMO_EMAIL,
            UserRecord {
                first_name: "User".to_string(),
                last_name: String::new(),
                password_hash: hash_password(DEMO_PASSWORD)?,
            },
        )?;
        Ok(Self {
            kind: BackendKind::Demo,
            users: Arc::new(users),
            sessions: Arc::new(MemorySessionStore::new()),
            allow_registration: false,
        })
    }

    /// Empty in-memory stores.
    pub fn memory() -> Self {
        Self {
            kind: BackendKind::Memory,
            users: Arc::new(MemoryUserStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            allow_registration: true,
        }
    }
}
