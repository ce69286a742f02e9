//! Double-submit CSRF protection.
//!
//! `GET /api/csrf` hands the client a token both in the response body and in
//! a `csrf` cookie. State-changing requests must echo the token in the
//! `X-CSRF-Token` header; the header must equal the cookie and carry a valid
//! signature from this server.
//!
//! ## Token Format
//!
//! `<nonce>.<signature>`, both hex encoded:
//! - 16 bytes: random nonce
//! - 32 bytes: HMAC-SHA256 of the nonce under the server secret

use crate::cookies::{get_cookie, SameSite, SetCookie};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Name of the CSRF cookie.
pub const CSRF_COOKIE: &str = "csrf";
/// Header that must echo the CSRF cookie.
pub const CSRF_HEADER: &str = "x-csrf-token";

const NONCE_LEN: usize = 16;

/// Issues and checks CSRF tokens.
#[derive(Clone)]
pub struct CsrfGuard {
    secret: [u8; 32],
    enabled: bool,
    secure: bool,
}

impl CsrfGuard {
    /// Creates a guard with a random per-process secret.
    pub fn new(enabled: bool) -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::with_secret(secret, enabled)
    }

    /// Creates a guard with a fixed secret.
    pub fn with_secret(secret: [u8; 32], enabled: bool) -> Self {
        Self {
            secret,
            enabled,
            secure: false,
        }
    }

    /// Marks the CSRF cookie `Secure`.
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Returns whether requests are checked.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Creates a new signed token.
    pub fn issue(&self) -> ServerResult<String> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let signature = self.mac(&nonce)?.finalize().into_bytes();
        Ok(format!("{}.{}", hex::encode(nonce), hex::encode(signature)))
    }

    /// Cookie carrying `token`.
    pub fn cookie(&self, token: &str) -> SetCookie {
        SetCookie::new(CSRF_COOKIE, token)
            .same_site(SameSite::Strict)
            .secure(self.secure)
    }

    /// Returns true if `token` was signed by this guard.
    pub fn is_authentic(&self, token: &str) -> bool {
        let Some((nonce_hex, signature_hex)) = token.split_once('.') else {
            return false;
        };
        let (Ok(nonce), Ok(signature)) = (hex::decode(nonce_hex), hex::decode(signature_hex))
        else {
            return false;
        };
        if nonce.len() != NONCE_LEN {
            return false;
        }
        match self.mac(&nonce) {
            Ok(mac) => mac.verify_slice(&signature).is_ok(),
            Err(_) => false,
        }
    }

    /// Checks the request's cookie and header against each other.
    pub fn check(&self, headers: &HeaderMap) -> ServerResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let cookie = get_cookie(headers, CSRF_COOKIE);
        let header = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        match (cookie, header) {
            (Some(cookie), Some(header))
                if bool::from(cookie.as_bytes().ct_eq(header.as_bytes()))
                    && self.is_authentic(header) =>
            {
                Ok(())
            }
            _ => {
                debug!("CSRF check failed");
                Err(ServerError::CsrfRejected)
            }
        }
    }

    fn mac(&self, nonce: &[u8]) -> ServerResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ServerError::Internal(format!("hmac key: {e}")))?;
        mac.update(nonce);
        Ok(mac)
    }
}

/// Middleware rejecting requests that fail the CSRF check.
pub async fn require_csrf(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    state.csrf.check(request.headers())?;
    Ok(next.run(request).await)
}
