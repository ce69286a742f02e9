//! Tests against a server bound to a real socket.

use sitegate_server::{BackendKind, Server, ServerConfig};
use std::fs;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Sends a raw HTTP/1.1 request and returns the full response text.
async fn raw_request(addr: std::net::SocketAddr, request_line: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("{request_line}\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn raw_traversal_request_is_404() {
    let dir = TempDir::new().unwrap();
    let dist = dir.path().join("dist");
    fs::create_dir_all(&dist).unwrap();
    fs::write(dist.join("index.html"), "home").unwrap();
    fs::write(dir.path().join("server.js"), "secret").unwrap();

    let config = ServerConfig::default()
        .with_backend(BackendKind::Memory)
        .with_public_dir(&dist);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let server = Server::new(config).unwrap();
    let handle = tokio::spawn(server.serve_on(listener, async move {
        let _ = stopped.await;
    }));

    let response = raw_request(addr, "GET /../server.js HTTP/1.1").await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(!response.contains("secret"));

    let response = raw_request(addr, "GET / HTTP/1.1").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("home"));

    stop.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
