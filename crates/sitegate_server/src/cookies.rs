//! Cookie header parsing and `Set-Cookie` formatting.

use crate::error::{ServerError, ServerResult};
use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use std::fmt;

/// Returns the value of the named cookie from the request's `Cookie` headers.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Never sent on cross-site requests.
    Strict,
    /// Sent on top-level cross-site navigation.
    Lax,
}

/// A `Set-Cookie` header value.
#[derive(Debug, Clone)]
pub struct SetCookie {
    name: String,
    value: String,
    path: String,
    http_only: bool,
    same_site: Option<SameSite>,
    max_age: Option<u64>,
    secure: bool,
}

impl SetCookie {
    /// Creates a cookie with `Path=/` and no other attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            http_only: false,
            same_site: None,
            max_age: None,
            secure: false,
        }
    }

    /// Creates a cookie that tells the browser to drop `name`.
    pub fn expired(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(Some(0))
    }

    /// Sets `HttpOnly`.
    #[must_use]
    pub fn http_only(mut self, value: bool) -> Self {
        self.http_only = value;
        self
    }

    /// Sets `SameSite`.
    #[must_use]
    pub fn same_site(mut self, value: SameSite) -> Self {
        self.same_site = Some(value);
        self
    }

    /// Sets `Max-Age` in seconds.
    #[must_use]
    pub fn max_age(mut self, seconds: Option<u64>) -> Self {
        self.max_age = seconds;
        self
    }

    /// Sets `Secure`.
    #[must_use]
    pub fn secure(mut self, value: bool) -> Self {
        self.secure = value;
        self
    }

    /// Converts to a header value.
    pub fn to_header(&self) -> ServerResult<HeaderValue> {
        HeaderValue::from_str(&self.to_string())
            .map_err(|e| ServerError::Internal(format!("invalid cookie header: {e}")))
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        write!(f, "; Path={}", self.path)?;
        match self.same_site {
            Some(SameSite::Strict) => f.write_str("; SameSite=Strict")?,
            Some(SameSite::Lax) => f.write_str("; SameSite=Lax")?,
            None => {}
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}
