//! Request handlers for the auth API.

use crate::error::{ServerError, ServerResult};
use crate::password::{hash_password, verify_password, verify_unknown_account};
use crate::state::AppState;
use crate::store::UserRecord;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Body of `POST /api/register`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Body of `POST /api/login`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Successful login or registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Session token (also set as the session cookie).
    pub token: String,
    /// Page the client should navigate to.
    pub redirect: String,
}

/// `GET /api/me` response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// Account email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// `GET /api/csrf` response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfResponse {
    /// Token to echo in the `X-CSRF-Token` header.
    pub csrf_token: String,
}

/// Parses a JSON body. An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> ServerResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|_| ServerError::MalformedBody)
}

/// Runs a CPU-heavy password operation off the async workers.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("password task failed: {e}")))
}

fn signed_in(state: &AppState, email: &str) -> ServerResult<Response> {
    let token = state.sessions.create(email)?;
    let cookie = state.sessions.cookie(&token).to_header()?;
    let body = AuthResponse {
        token,
        redirect: state.config.login_redirect.clone(),
    };
    Ok((StatusCode::OK, [(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// `POST /api/register`
pub async fn register(State(state): State<Arc<AppState>>, body: Bytes) -> ServerResult<Response> {
    let request: RegisterRequest = parse_body(&body)?;
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ServerError::MissingCredentials);
    }
    if !state.backend.allow_registration {
        return Err(ServerError::RegistrationDisabled);
    }
    if state.backend.users.get(&request.email)?.is_some() {
        return Err(ServerError::UserExists);
    }

    let password = request.password;
    let password_hash = blocking(move || hash_password(&password)).await??;
    state.backend.users.insert(
        &request.email,
        UserRecord {
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash,
        },
    )?;
    info!("registered {}", request.email);

    signed_in(&state, &request.email)
}

/// `POST /api/login`
pub async fn login(State(state): State<Arc<AppState>>, body: Bytes) -> ServerResult<Response> {
    let request: LoginRequest = parse_body(&body)?;
    let password = request.password;
    let Some(user) = state.backend.users.get(&request.email)? else {
        blocking(move || verify_unknown_account(&password)).await?;
        warn!("login for unknown account");
        return Err(ServerError::InvalidCredentials);
    };

    let stored = user.password_hash;
    if !blocking(move || verify_password(&password, &stored)).await? {
        warn!("wrong password for {}", request.email);
        return Err(ServerError::InvalidCredentials);
    }
    info!("login {}", request.email);

    signed_in(&state, &request.email)
}

/// `POST /api/logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    if let Some((token, session)) = state.sessions.current(&headers)? {
        state.sessions.destroy(&token)?;
        info!("logout {}", session.email);
    }
    let cookie = state.sessions.clear_cookie().to_header()?;
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response())
}

/// `GET /api/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ServerResult<Json<ProfileResponse>> {
    let Some((_, session)) = state.sessions.current(&headers)? else {
        return Err(ServerError::NotAuthenticated);
    };
    let user = state.backend.users.get(&session.email)?;
    let (first_name, last_name) = user
        .map(|user| (user.first_name, user.last_name))
        .unwrap_or_default();

    Ok(Json(ProfileResponse {
        email: session.email,
        first_name,
        last_name,
    }))
}

/// `GET /api/csrf`
pub async fn csrf_token(State(state): State<Arc<AppState>>) -> ServerResult<Response> {
    let token = state.csrf.issue()?;
    let cookie = state.csrf.cookie(&token).to_header()?;
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(CsrfResponse { csrf_token: token }),
    )
        .into_response())
}
