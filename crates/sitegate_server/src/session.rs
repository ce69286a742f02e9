//! Session issuance and lookup.

use crate::config::SessionConfig;
use crate::cookies::{get_cookie, SameSite, SetCookie};
use crate::error::ServerResult;
use crate::store::{unix_now, Session, SessionStore};
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Creates, resolves and destroys cookie sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a session manager over the given store.
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Returns the session settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts a session for `email`, returning its token.
    ///
    /// Expired sessions are purged first.
    pub fn create(&self, email: &str) -> ServerResult<String> {
        self.purge_expired()?;
        let token = Uuid::new_v4().to_string();
        self.store.insert(&token, Session::new(email))?;
        debug!("session created for {}", email);
        Ok(token)
    }

    /// Looks up a live session. Expired sessions are removed.
    pub fn resolve(&self, token: &str) -> ServerResult<Option<Session>> {
        let Some(session) = self.store.get(token)? else {
            return Ok(None);
        };
        if self.is_expired(&session) {
            debug!("session for {} expired", session.email);
            self.store.remove(token)?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Looks up the session named by the request's session cookie.
    pub fn current(&self, headers: &HeaderMap) -> ServerResult<Option<(String, Session)>> {
        let Some(token) = get_cookie(headers, &self.config.cookie_name) else {
            return Ok(None);
        };
        Ok(self
            .resolve(token)?
            .map(|session| (token.to_string(), session)))
    }

    /// Ends a session. Unknown tokens are ignored.
    pub fn destroy(&self, token: &str) -> ServerResult<bool> {
        Ok(self.store.remove(token)?.is_some())
    }

    /// Cookie carrying a freshly issued token.
    pub fn cookie(&self, token: &str) -> SetCookie {
        SetCookie::new(&self.config.cookie_name, token)
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(self.config.ttl.map(|ttl| ttl.as_secs()))
            .secure(self.config.secure)
    }

    /// Cookie that clears the session cookie.
    pub fn clear_cookie(&self) -> SetCookie {
        SetCookie::expired(&self.config.cookie_name)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.config.secure)
    }

    /// Removes every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> ServerResult<usize> {
        let Some(ttl) = self.config.ttl else {
            return Ok(0);
        };
        let cutoff = unix_now().saturating_sub(ttl.as_secs());
        let purged = self.store.purge_created_before(cutoff)?;
        if purged > 0 {
            debug!("purged {} expired sessions", purged);
        }
        Ok(purged)
    }

    fn is_expired(&self, session: &Session) -> bool {
        match self.config.ttl {
            Some(ttl) => unix_now().saturating_sub(session.created_at) >= ttl.as_secs(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn manager(ttl: Option<Duration>) -> (Arc<MemorySessionStore>, SessionManager) {
        let store = Arc::new(MemorySessionStore::new());
        let config = SessionConfig {
            ttl,
            ..SessionConfig::default()
        };
        (Arc::clone(&store), SessionManager::new(store, config))
    }

    #[test]
    fn create_and_resolve() {
        let (_, sessions) = manager(None);
        let token = sessions.create("a@b.c").unwrap();

        assert!(Uuid::parse_str(&token).is_ok());
        assert_eq!(sessions.resolve(&token).unwrap().unwrap().email, "a@b.c");
        assert!(sessions.resolve("nope").unwrap().is_none());
    }

    #[test]
    fn tokens_are_unique() {
        let (_, sessions) = manager(None);
        let a = sessions.create("a@b.c").unwrap();
        let b = sessions.create("a@b.c").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn expired_sessions_are_removed() {
        let (store, sessions) = manager(Some(Duration::from_secs(60)));
        store
            .insert(
                "old",
                Session {
                    email: "a@b.c".into(),
                    created_at: unix_now() - 120,
                },
            )
            .unwrap();

        assert!(sessions.resolve("old").unwrap().is_none());
        assert!(store.get("old").unwrap().is_none());
    }

    #[test]
    fn create_purges_abandoned_sessions() {
        let (store, sessions) = manager(Some(Duration::from_secs(60)));
        for token in ["a", "b", "c"] {
            let stale = Session {
                email: "a@b.c".into(),
                created_at: unix_now() - 120,
            };
            store.insert(token, stale).unwrap();
        }

        let token = sessions.create("a@b.c").unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&token).unwrap().is_some());
    }

    #[test]
    fn no_ttl_keeps_old_sessions() {
        let (store, sessions) = manager(None);
        let old = Session {
            email: "a@b.c".into(),
            created_at: 0,
        };
        store.insert("old", old).unwrap();

        assert_eq!(sessions.purge_expired().unwrap(), 0);
        sessions.create("a@b.c").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn resolve_from_cookie_header() {
        let (_, sessions) = manager(None);
        let token = sessions.create("a@b.c").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("session={token}")).unwrap(),
        );

        let (found, session) = sessions.current(&headers).unwrap().unwrap();
        assert_eq!(found, token);
        assert_eq!(session.email, "a@b.c");
    }

    #[test]
    fn destroy_session() {
        let (_, sessions) = manager(None);
        let token = sessions.create("a@b.c").unwrap();

        assert!(sessions.destroy(&token).unwrap());
        assert!(!sessions.destroy(&token).unwrap());
        assert!(sessions.resolve(&token).unwrap().is_none());
    }

    #[test]
    fn cookie_attributes() {
        let (_, sessions) = manager(Some(Duration::from_secs(3600)));
        assert_eq!(
            sessions.cookie("t").to_string(),
            "session=t; HttpOnly; Path=/; SameSite=Strict; Max-Age=3600"
        );

        let (_, sessions) = manager(None);
        assert_eq!(
            sessions.cookie("t").to_string(),
            "session=t; HttpOnly; Path=/; SameSite=Strict"
        );
    }
}
