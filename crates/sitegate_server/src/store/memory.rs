//! In-memory stores.

use super::{Session, SessionStore, UserRecord, UserStore};
use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Accounts held in a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    fn get(&self, email: &str) -> ServerResult<Option<UserRecord>> {
        Ok(self.users.read().get(email).cloned())
    }

    fn insert(&self, email: &str, user: UserRecord) -> ServerResult<()> {
        match self.users.write().entry(email.to_string()) {
            Entry::Occupied(_) => Err(ServerError::UserExists),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    fn len(&self) -> usize {
        self.users.read().len()
    }
}

/// Sessions held in a `HashMap`.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, token: &str, session: Session) -> ServerResult<()> {
        self.sessions.write().insert(token.to_string(), session);
        Ok(())
    }

    fn get(&self, token: &str) -> ServerResult<Option<Session>> {
        Ok(self.sessions.read().get(token).cloned())
    }

    fn remove(&self, token: &str) -> ServerResult<Option<Session>> {
        Ok(self.sessions.write().remove(token))
    }

    fn purge_created_before(&self, cutoff: u64) -> ServerResult<usize> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.created_at >= cutoff);
        Ok(before - sessions.len())
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}
