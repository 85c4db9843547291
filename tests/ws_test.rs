//! End-to-end tests using a real WebSocket client.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use livetrack::server;
use livetrack::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Boot a test server on an ephemeral port and return the WS URL
async fn boot_server() -> (String, Arc<AppState>) {
    let state = Arc::new(AppState::default());
    let static_dir = tempfile::tempdir().unwrap();
    let app = server::router(state.clone(), static_dir.path());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // Keep the directory alive for as long as the server runs
        let _static_dir = static_dir;
        axum::serve(listener, app).await.unwrap();
    });

    (format!("ws://{}/ws", addr), state)
}

async fn connect(url: &str) -> WsStream {
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

/// Wait until the hub has registered the expected number of connections
async fn wait_for_connections(state: &AppState, expected: usize) {
    timeout(TIMEOUT, async {
        while state.hub.connection_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timeout waiting for connections");
}

/// Read the next text message as JSON
async fn read_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timeout waiting for message")
            .expect("stream closed")
            .expect("ws error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Assert nothing arrives within a short window
async fn assert_silent(ws: &mut WsStream) {
    let result = timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "expected no message, got {:?}", result);
}

async fn send_location(ws: &mut WsStream, latitude: f64, longitude: f64) {
    let frame = json!({
        "event": "send-location",
        "data": { "latitude": latitude, "longitude": longitude }
    });
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

#[tokio::test]
async fn e2e_location_fan_out_and_disconnect() {
    let (url, state) = boot_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    let mut c = connect(&url).await;
    wait_for_connections(&state, 3).await;

    send_location(&mut a, 10.0, 20.0).await;

    let to_b = read_json(&mut b).await;
    let to_c = read_json(&mut c).await;
    assert_eq!(to_b["event"], "receive-location");
    assert_eq!(to_b["data"]["latitude"], 10.0);
    assert_eq!(to_b["data"]["longitude"], 20.0);
    assert_eq!(to_b, to_c);
    let a_id = to_b["data"]["id"].as_str().unwrap().to_string();

    send_location(&mut b, 11.0, 21.0).await;

    let to_a = read_json(&mut a).await;
    let to_c = read_json(&mut c).await;
    assert_eq!(to_a, to_c);
    assert_eq!(to_a["data"]["latitude"], 11.0);
    assert_ne!(to_a["data"]["id"].as_str().unwrap(), a_id);

    // A never hears its own update
    assert_silent(&mut a).await;

    a.close(None).await.unwrap();

    let expected = json!({ "event": "user-disconnected", "data": a_id });
    assert_eq!(read_json(&mut b).await, expected);
    assert_eq!(read_json(&mut c).await, expected);
    wait_for_connections(&state, 2).await;
    assert!(!state.hub.is_connected(&a_id).await);
}

#[tokio::test]
async fn e2e_dropped_socket_triggers_single_disconnect() {
    let (url, state) = boot_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    wait_for_connections(&state, 2).await;

    send_location(&mut a, 1.0, 2.0).await;
    let a_id = read_json(&mut b).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Drop without a close handshake
    drop(a);

    let msg = read_json(&mut b).await;
    assert_eq!(msg, json!({ "event": "user-disconnected", "data": a_id }));
    assert_silent(&mut b).await;
    wait_for_connections(&state, 1).await;
}

#[tokio::test]
async fn e2e_malformed_frame_keeps_connection_open() {
    let (url, state) = boot_server().await;
    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    wait_for_connections(&state, 2).await;

    a.send(Message::text(r#"{"event":"send-location","data":{"latitude":1.0}}"#))
        .await
        .unwrap();
    a.send(Message::text("garbage")).await.unwrap();
    send_location(&mut a, 3.0, 4.0).await;

    let msg = read_json(&mut b).await;
    assert_eq!(msg["event"], "receive-location");
    assert_eq!(msg["data"]["latitude"], 3.0);
    assert_eq!(state.hub.connection_count().await, 2);
}

#[tokio::test]
async fn e2e_connect_is_silent() {
    let (url, state) = boot_server().await;
    let mut a = connect(&url).await;
    let _b = connect(&url).await;
    wait_for_connections(&state, 2).await;

    assert_silent(&mut a).await;
}

#[tokio::test]
async fn test_static_fallback_serves_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>map</h1>").unwrap();
    let app = server::router(Arc::new(AppState::default()), dir.path());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"<h1>map</h1>");
}

#[tokio::test]
async fn test_missing_static_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = server::router(Arc::new(AppState::default()), dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/js/missing.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
