// Integration tests for the reqwest transport against a local mock server

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pawhub_sync::api::{ApiClient, interests, pets};
use pawhub_sync::config::{ApiConfig, Environment};
use pawhub_sync::models::InterestFormData;
use pawhub_sync::transport::{HttpTransport, Outcome, Request, Transport};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ApiConfig {
    let mut config = ApiConfig::for_environment(Environment::Development);
    config.base_url = server.uri();
    config.retry_base_delay = Duration::from_millis(10);
    config
}

#[tokio::test]
async fn test_get_sends_prefix_query_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pets"))
        .and(query_param("breed", "Poodle"))
        .and(query_param("page", "2"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "id": "42", "name": "Rex" }],
            "meta": { "total": 13, "page": 2, "limit": 12, "pages": 2 },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).expect("client should build");
    let outcome = transport
        .send(&Request::get("/pets").param("breed", "Poodle").param("page", 2))
        .await;

    assert!(outcome.is_ok());
    assert_eq!(outcome.status(), Some(200));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/interests/submit"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "pet_id": "42" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "id": "7" },
        })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).expect("client should build");
    let request = Request::post("/interests/submit")
        .json(&json!({ "pet_id": "42" }))
        .expect("body should encode");

    assert_eq!(transport.send(&request).await.status(), Some(201));
}

#[tokio::test]
async fn test_error_status_keeps_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pets/featured"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).expect("client should build");
    let outcome = transport.send(&Request::get("/pets/featured")).await;

    assert_eq!(outcome, Outcome::HttpError {
        status: 502,
        body: json!("Bad Gateway"),
    });
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pets"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).expect("client should build");
    let request = Request::get("/pets").with_timeout(Duration::from_millis(50));

    assert_eq!(transport.send(&request).await, Outcome::TimeoutError);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let config = config(&server);
    drop(server);

    let transport = HttpTransport::new(&config).expect("client should build");
    let outcome = transport.send(&Request::get("/pets")).await;

    assert!(matches!(outcome, Outcome::NetworkError { .. }));
}

#[tokio::test]
async fn test_api_client_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pets/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "id": "42", "name": "Rex", "breed": "Poodle" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(config(&server)).expect("client should build");
    let (a, b) = tokio::join!(api.fetch(pets::by_id("42")), api.fetch(pets::by_id("42")));

    assert_eq!(a.expect("first").breed, "Poodle");
    assert_eq!(b.expect("second").name, "Rex");
}

/// Reads one request, head and body, from the socket.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }
}

/// A server that answers every request with `201 Created` and then hangs up
/// partway through the promised body. Returns its URL and a request counter.
async fn truncating_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 201 Created\r\ncontent-type: application/json\r\n\
                          content-length: 200\r\n\r\n{\"success\":",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });
    (format!("http://{addr}"), seen)
}

#[tokio::test]
async fn test_broken_body_keeps_status() {
    let (uri, seen) = truncating_server().await;
    let mut config = ApiConfig::for_environment(Environment::Development);
    config.base_url = uri;

    let transport = HttpTransport::new(&config).expect("client should build");
    let outcome = transport.send(&Request::post("/interests/submit")).await;

    assert_eq!(outcome, Outcome::Ok {
        status: 201,
        body: Value::Null,
    });
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_accepted_write_with_broken_body_is_not_resent() {
    let (uri, seen) = truncating_server().await;
    let mut config = ApiConfig::for_environment(Environment::Production);
    config.base_url = uri;
    config.retry_base_delay = Duration::from_millis(10);
    let api = ApiClient::new(config).expect("client should build");

    let form = InterestFormData {
        pet_id: "42".to_string(),
        buyer_name: "Amina".to_string(),
        buyer_email: "amina@example.com".to_string(),
        ..InterestFormData::default()
    };
    let err = api
        .mutate(interests::submit(&form).expect("form should encode"))
        .await
        .expect_err("an unreadable body is not a success");

    assert_eq!(err.code.to_string(), "UNKNOWN_ERROR");
    assert_eq!(err.status, Some(201));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}
