//! Serving the built site.

use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

const INDEX_FILE: &str = "index.html";

/// Maps a request path onto a file under `root`.
///
/// `/` maps to `/index.html`. Returns `None` for anything that could escape
/// `root`: parent components, absolute or prefixed components, NUL bytes and
/// undecodable percent escapes.
pub fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let request_path = if request_path == "/" {
        "/index.html"
    } else {
        request_path
    };
    let decoded = percent_decode(request_path)?;
    if decoded.contains('\0') || decoded.contains('\\') {
        return None;
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "Not found",
    )
        .into_response()
}

/// Fallback handler: serves GET/HEAD from the public directory, 405 otherwise.
pub async fn serve_static(State(state): State<Arc<AppState>>, request: Request) -> Response {
    if *request.method() != Method::GET && *request.method() != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(mut path) = resolve_path(&state.config.public_dir, request.uri().path()) else {
        debug!("rejected path {:?}", request.uri().path());
        return not_found();
    };

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => path.push(INDEX_FILE),
        Ok(_) => {}
        Err(_) => return not_found(),
    }
    if !tokio::fs::metadata(&path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
    {
        return not_found();
    }

    match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_maps_to_index() {
        assert_eq!(
            resolve_path(Path::new("dist"), "/"),
            Some(PathBuf::from("dist/index.html"))
        );
    }

    #[test]
    fn nested_paths_resolve() {
        assert_eq!(
            resolve_path(Path::new("dist"), "/js/./dark-mode.js"),
            Some(PathBuf::from("dist/js/dark-mode.js"))
        );
        assert_eq!(
            resolve_path(Path::new("dist"), "/about%20us.html"),
            Some(PathBuf::from("dist/about us.html"))
        );
    }

    #[test]
    fn traversal_is_rejected() {
        let root = Path::new("dist");
        assert_eq!(resolve_path(root, "/../server.js"), None);
        assert_eq!(resolve_path(root, "/js/../../secret"), None);
        assert_eq!(resolve_path(root, "/%2e%2e/server.js"), None);
        assert_eq!(resolve_path(root, "/..%2fserver.js"), None);
        assert_eq!(resolve_path(root, "/a%00b"), None);
        assert_eq!(resolve_path(root, "/..%5cserver.js"), None);
    }

    #[test]
    fn bad_escapes_are_rejected() {
        assert_eq!(resolve_path(Path::new("dist"), "/%zz"), None);
        assert_eq!(resolve_path(Path::new("dist"), "/%4"), None);
        assert_eq!(resolve_path(Path::new("dist"), "/%ff"), None);
    }
}
