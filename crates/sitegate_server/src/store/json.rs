//! JSON-file-backed stores.
//!
//! Each store keeps its whole map in memory and rewrites the file on every
//! change. Writes go to `<file>.tmp` first and are renamed into place so a
//! crash never leaves a half-written map behind.
//!
//! ```text
//! <data_dir>/
//! ├─ users.json      # email -> { firstName, lastName, passwordHash }
//! └─ sessions.json   # token -> { email, createdAt }
//! ```

use super::{unix_now, Session, SessionStore, UserRecord, UserStore};
use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads a JSON map, falling back to empty on a missing or unreadable file.
fn load_map<V: DeserializeOwned>(path: &Path) -> BTreeMap<String, V> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!("{:?} not loaded ({}), starting empty", path, e);
            return BTreeMap::new();
        }
    };
    match serde_json::from_str(&text) {
        Ok(map) => map,
        Err(e) => {
            warn!("{:?} is not a valid JSON map ({}), starting empty", path, e);
            BTreeMap::new()
        }
    }
}

/// Writes a JSON map with two-space indentation using write-then-rename.
fn save_map<V: Serialize>(path: &Path, map: &BTreeMap<String, V>) -> ServerResult<()> {
    let data = serde_json::to_string_pretty(map)?;
    let temp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| {
        ServerError::Storage(format!("failed to replace {}: {}", path.display(), e))
    })
}

/// Accounts persisted in `users.json`.
#[derive(Debug)]
pub struct JsonUserStore {
    path: PathBuf,
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl JsonUserStore {
    /// Opens the store, loading existing accounts if the file is readable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = load_map(&path);
        debug!("loaded {} users from {:?}", users.len(), path);
        Self {
            path,
            users: RwLock::new(users),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UserStore for JsonUserStore {
    fn get(&self, email: &str) -> ServerResult<Option<UserRecord>> {
        Ok(self.users.read().get(email).cloned())
    }

    fn insert(&self, email: &str, user: UserRecord) -> ServerResult<()> {
        let mut users = self.users.write();
        if users.contains_key(email) {
            return Err(ServerError::UserExists);
        }
        users.insert(email.to_string(), user);
        if let Err(e) = save_map(&self.path, &users) {
            users.remove(email);
            return Err(e);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.users.read().len()
    }
}

/// On-disk session entry.
///
/// Older files map tokens straight to an email; those load as sessions
/// created at load time.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSession {
    Full(Session),
    EmailOnly(String),
}

/// Sessions persisted in `sessions.json`.
#[derive(Debug)]
pub struct JsonSessionStore {
    path: PathBuf,
    sessions: RwLock<BTreeMap<String, Session>>,
}

impl JsonSessionStore {
    /// Opens the store, loading existing sessions if the file is readable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let now = unix_now();
        let sessions: BTreeMap<String, Session> = load_map::<StoredSession>(&path)
            .into_iter()
            .map(|(token, stored)| {
                let session = match stored {
                    StoredSession::Full(session) => session,
                    StoredSession::EmailOnly(email) => Session {
                        email,
                        created_at: now,
                    },
                };
                (token, session)
            })
            .collect();
        debug!("loaded {} sessions from {:?}", sessions.len(), path);
        Self {
            path,
            sessions: RwLock::new(sessions),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonSessionStore {
    fn insert(&self, token: &str, session: Session) -> ServerResult<()> {
        let mut sessions = self.sessions.write();
        let previous = sessions.insert(token.to_string(), session);
        if let Err(e) = save_map(&self.path, &sessions) {
            match previous {
                Some(previous) => sessions.insert(token.to_string(), previous),
                None => sessions.remove(token),
            };
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, token: &str) -> ServerResult<Option<Session>> {
        Ok(self.sessions.read().get(token).cloned())
    }

    fn remove(&self, token: &str) -> ServerResult<Option<Session>> {
        let mut sessions = self.sessions.write();
        let Some(removed) = sessions.remove(token) else {
            return Ok(None);
        };
        if let Err(e) = save_map(&self.path, &sessions) {
            sessions.insert(token.to_string(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    fn purge_created_before(&self, cutoff: u64) -> ServerResult<usize> {
        let mut sessions = self.sessions.write();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.created_at < cutoff)
            .map(|(token, _)| token.clone())
            .collect();
        if expired.is_empty() {
            return Ok(0);
        }

        let removed: Vec<(String, Session)> = expired
            .into_iter()
            .filter_map(|token| sessions.remove(&token).map(|session| (token, session)))
            .collect();
        if let Err(e) = save_map(&self.path, &sessions) {
            sessions.extend(removed);
            return Err(e);
        }
        debug!("purged {} expired sessions", removed.len());
        Ok(removed.len())
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(hash: &str) -> UserRecord {
        UserRecord {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            password_hash: hash.into(),
        }
    }

    #[test]
    fn users_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");

        let store = JsonUserStore::open(&path);
        store.insert("g@navy.mil", record("s:k")).unwrap();
        drop(store);

        let reopened = JsonUserStore::open(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("g@navy.mil").unwrap(), Some(record("s:k")));
    }

    #[test]
    fn users_file_is_pretty_camel_case() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonUserStore::open(&path);
        store.insert("g@navy.mil", record("s:k")).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"g@navy.mil\": {"));
        assert!(text.contains("\"passwordHash\": \"s:k\""));
        assert!(!dir.path().join("users.json.tmp").exists());
    }

    #[test]
    fn duplicate_user_rejected() {
        let dir = TempDir::new().unwrap();
        let store = JsonUserStore::open(dir.path().join("users.json"));
        store.insert("g@navy.mil", record("a:b")).unwrap();

        let result = store.insert("g@navy.mil", record("c:d"));
        assert!(matches!(result, Err(ServerError::UserExists)));
        assert_eq!(store.get("g@navy.mil").unwrap(), Some(record("a:b")));
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonUserStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let store = JsonUserStore::open(dir.path().join("missing-dir/users.json"));

        assert!(store.insert("g@navy.mil", record("a:b")).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn sessions_persist_and_remove() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");

        let store = JsonSessionStore::open(&path);
        store.insert("t1", Session::new("a@b.c")).unwrap();
        store.insert("t2", Session::new("d@e.f")).unwrap();
        store.remove("t1").unwrap();
        drop(store);

        let reopened = JsonSessionStore::open(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("t2").unwrap().unwrap().email, "d@e.f");
    }

    #[test]
    fn failed_session_remove_keeps_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        let store = JsonSessionStore::open(&path);
        store.insert("t1", Session::new("a@b.c")).unwrap();

        fs::create_dir(dir.path().join("sessions.json.tmp")).unwrap();
        assert!(store.remove("t1").is_err());
        assert_eq!(store.get("t1").unwrap().unwrap().email, "a@b.c");

        fs::remove_dir(dir.path().join("sessions.json.tmp")).unwrap();
        assert!(store.remove("t1").unwrap().is_some());
        assert!(JsonSessionStore::open(&path).is_empty());
    }

    #[test]
    fn purge_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        let store = JsonSessionStore::open(&path);
        let stale = Session {
            email: "old@b.c".into(),
            created_at: 10,
        };
        store.insert("stale", stale).unwrap();
        store.insert("fresh", Session::new("new@b.c")).unwrap();

        assert_eq!(store.purge_created_before(1_000).unwrap(), 1);
        assert_eq!(store.purge_created_before(1_000).unwrap(), 0);

        let reopened = JsonSessionStore::open(&path);
        assert_eq!(reopened.len(), 1);
        assert!(reopened.get("stale").unwrap().is_none());
    }

    #[test]
    fn failed_purge_keeps_sessions() {
        let dir = TempDir::new().unwrap();
        let store = JsonSessionStore::open(dir.path().join("sessions.json"));
        let stale = Session {
            email: "old@b.c".into(),
            created_at: 10,
        };
        store.insert("stale", stale).unwrap();

        fs::create_dir(dir.path().join("sessions.json.tmp")).unwrap();
        assert!(store.purge_created_before(1_000).is_err());
        assert!(store.get("stale").unwrap().is_some());
    }

    #[test]
    fn legacy_email_only_sessions_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions.json");
        fs::write(&path, r#"{ "abc": "old@example.com" }"#).unwrap();

        let store = JsonSessionStore::open(&path);
        let session = store.get("abc").unwrap().unwrap();
        assert_eq!(session.email, "old@example.com");
        assert!(session.created_at > 0);
    }
}
