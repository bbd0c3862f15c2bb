// Tests for the token cache and the printer transport, using one-shot local
// HTTP responders so nothing leaves the machine.

use chrono::{Duration as ChronoDuration, Utc};
use partmark::auth::DigikeyAuth;
use partmark::error::PartmarkError;
use partmark::ledger::LedgerStore;
use partmark::printer::PrintTransport;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Serve exactly one canned HTTP response, then go away. A second request
/// against the returned URL fails to connect.
async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });
    format!("http://{addr}")
}

fn temp_store() -> (TempDir, Arc<LedgerStore>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(LedgerStore::load(dir.path().join("ledger.json")).unwrap());
    (dir, store)
}

#[tokio::test]
async fn unexpired_cached_token_is_returned_without_a_network_call() {
    let (_dir, store) = temp_store();
    store
        .refresh_auth(
            "tok-cached".to_string(),
            Utc::now() + ChronoDuration::hours(1),
        )
        .unwrap();

    // The endpoint is unroutable: any network attempt would fail loudly.
    let auth = DigikeyAuth::new(
        reqwest::Client::new(),
        "id".to_string(),
        "secret".to_string(),
        Arc::clone(&store),
    )
    .with_token_url("http://127.0.0.1:1/oauth2/token");

    assert_eq!(auth.token().await.unwrap(), "tok-cached");
}

#[tokio::test]
async fn expired_token_triggers_one_exchange_and_persists_before_returning() {
    let (_dir, store) = temp_store();
    store
        .refresh_auth(
            "tok-stale".to_string(),
            Utc::now() - ChronoDuration::hours(1),
        )
        .unwrap();

    let url = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"access_token":"tok-new","expires_in":600}"#,
    )
    .await;
    let auth = DigikeyAuth::new(
        reqwest::Client::new(),
        "id".to_string(),
        "secret".to_string(),
        Arc::clone(&store),
    )
    .with_token_url(url);

    assert_eq!(auth.token().await.unwrap(), "tok-new");

    // Persisted with a future expiry.
    let cached = store.cached_auth().expect("refreshed token persisted");
    assert_eq!(cached.token, "tok-new");
    assert!(cached.expires_at > Utc::now());

    // The responder is gone; a second exchange attempt would error. This one
    // must come from the cache.
    assert_eq!(auth.token().await.unwrap(), "tok-new");
}

#[tokio::test]
async fn failed_exchange_is_an_auth_error() {
    let (_dir, store) = temp_store();
    let url = serve_once("HTTP/1.1 401 Unauthorized", r#"{"error":"bad client"}"#).await;
    let auth = DigikeyAuth::new(
        reqwest::Client::new(),
        "id".to_string(),
        "secret".to_string(),
        Arc::clone(&store),
    )
    .with_token_url(url);

    match auth.token().await {
        Err(PartmarkError::Auth(message)) => assert!(message.contains("401")),
        other => panic!("expected auth error, got {other:?}"),
    }
    assert!(store.cached_auth().is_none(), "failed exchange must not be cached");
}

#[tokio::test]
async fn printer_accepts_2xx_and_surfaces_failures() {
    let ok_url = serve_once("HTTP/1.1 200 OK", "").await;
    let transport = PrintTransport::new(reqwest::Client::new(), ok_url);
    transport
        .send("SIZE 75 mm, 120 mm\nPRINT 1\nEND".to_string())
        .await
        .unwrap();

    let err_url = serve_once("HTTP/1.1 500 Internal Server Error", "usb device not found").await;
    let transport = PrintTransport::new(reqwest::Client::new(), err_url);
    match transport.send("PRINT 1\nEND".to_string()).await {
        Err(PartmarkError::Printer(message)) => {
            assert!(message.contains("500"));
            assert!(message.contains("usb device not found"));
        }
        other => panic!("expected printer error, got {other:?}"),
    }
}
