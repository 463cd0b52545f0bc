//! WebSocket handshake tests.
//!
//! The upgrade needs a real connection, so these tests bind the app to
//! a local port and speak the HTTP/1.1 handshake over a raw TCP
//! stream. Frame exchange itself is covered by the realtime crate's
//! unit tests.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::helpers::TestApp;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server error");
    });
    addr
}

/// Send a websocket handshake and return the HTTP status line.
async fn handshake(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("Failed to connect");
    let request = format!(
        "GET {path} HTTP/1.1\r\n\
         Host: 127.0.0.1\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
         \r\n"
    );
    stream
        .write_all(request.as_bytes())
        .await
        .expect("Failed to write handshake");

    let mut buffer = vec![0u8; 4096];
    let n = stream.read(&mut buffer).await.expect("Failed to read");
    let response = String::from_utf8_lossy(&buffer[..n]).to_string();
    response.lines().next().unwrap_or_default().to_string()
}

#[tokio::test]
async fn upgrade_accepts_a_valid_token() {
    let app = TestApp::new().await;
    let token = app.token_for(uuid::Uuid::new_v4());
    let addr = serve(&app).await;

    let status_line = handshake(addr, &format!("/ws?token={token}")).await;

    assert!(
        status_line.contains("101"),
        "Expected 101, got: {status_line}"
    );
}

#[tokio::test]
async fn upgrade_rejects_an_invalid_token() {
    let app = TestApp::new().await;
    let addr = serve(&app).await;

    let status_line = handshake(addr, "/ws?token=not-a-jwt").await;

    assert!(
        status_line.contains("401"),
        "Expected 401, got: {status_line}"
    );
}

#[tokio::test]
async fn upgrade_requires_a_token() {
    let app = TestApp::new().await;
    let addr = serve(&app).await;

    let status_line = handshake(addr, "/ws").await;

    assert!(
        status_line.contains("400"),
        "Expected 400, got: {status_line}"
    );
}
