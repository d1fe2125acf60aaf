// Integration tests for mutations and their cache invalidation

use std::sync::Arc;

use futures::StreamExt;
use pawhub_sync::api::{ApiClient, interests, pets};
use pawhub_sync::config::{ApiConfig, Environment};
use pawhub_sync::models::{InterestFormData, SubmittedInterest};
use pawhub_sync::mutation::{MutationResult, MutationState};
use pawhub_sync::prelude::Command;
use pawhub_sync::transport::{Method, MockTransport, Outcome};
use serde_json::json;
use tokio::time::Duration;

fn api(mock: &MockTransport, environment: Environment) -> ApiClient {
    let mut config = ApiConfig::for_environment(environment);
    config.retry_base_delay = Duration::from_millis(10);
    ApiClient::with_transport(config, Arc::new(mock.clone()))
}

fn form() -> InterestFormData {
    InterestFormData {
        pet_id: "42".to_string(),
        buyer_name: "Amina".to_string(),
        buyer_email: "amina@example.com".to_string(),
        buyer_phone: "+254700000000".to_string(),
        buyer_location: "Nairobi".to_string(),
        message: "Is Rex still available?".to_string(),
        ..InterestFormData::default()
    }
}

fn scripted() -> MockTransport {
    let mock = MockTransport::new();
    mock.respond_page(Method::Get, "/interests", json!([{ "id": "1", "pet_id": "42" }]), 1);
    mock.respond_ok(Method::Get, "/pets/42", json!({ "id": "42", "name": "Rex" }));
    mock
}

#[tokio::test]
async fn test_submit_interest_refreshes_pending_but_not_pet() {
    let mock = scripted();
    mock.respond_ok(
        Method::Post,
        "/interests/submit",
        json!({ "id": "2", "message": "Interest submitted" }),
    );
    let api = api(&mock, Environment::Development);

    let mut pending = api.query(interests::pending(None));
    let mut pet = api.query(pets::by_id("42"));
    pending.settled().await.expect("pending should load");
    pet.settled().await.expect("pet should load");
    assert_eq!(mock.call_count(), 2);

    let submitted = api
        .mutate(interests::submit(&form()).expect("form should encode"))
        .await
        .expect("submit should succeed");
    assert_eq!(submitted.id, "2");

    // The pending list is subscribed, so it refetches right away
    pending.settled().await.expect("pending should reload");
    assert_eq!(mock.calls_to(Method::Get, "/interests"), 2);
    assert_eq!(mock.calls_to(Method::Get, "/pets/42"), 1);

    let pet_info = api.cache().entry_info(pet.key()).expect("pet is cached");
    assert!(!pet_info.is_stale);

    let body = mock
        .calls()
        .into_iter()
        .find(|c| c.request.method == Method::Post)
        .and_then(|c| c.request.body)
        .expect("submit should send a body");
    assert_eq!(body["pet_id"], "42");
    assert_eq!(body["buyer_name"], "Amina");
}

#[tokio::test]
async fn test_failed_mutation_leaves_cache_untouched() {
    let mock = scripted();
    mock.on(Method::Post, "/interests/submit", Outcome::HttpError {
        status: 400,
        body: json!({
            "success": false,
            "message": "Invalid form",
            "errors": { "buyer_email": ["Enter a valid email address."] },
        }),
    });
    let api = api(&mock, Environment::Development);

    let mut pending = api.query(interests::pending(None));
    pending.settled().await.expect("pending should load");

    let err = api
        .mutate(interests::submit(&form()).expect("form should encode"))
        .await
        .expect_err("400 should fail");
    assert_eq!(err.code.to_string(), "VALIDATION_ERROR");
    assert_eq!(
        err.details
            .as_ref()
            .and_then(|d| d.get("buyer_email"))
            .map(Vec::len),
        Some(1),
        "field errors should be kept"
    );

    tokio::task::yield_now().await;
    assert_eq!(mock.calls_to(Method::Get, "/interests"), 1);
    assert_eq!(mock.calls_to(Method::Post, "/interests/submit"), 1);
    assert!(!pending.current().is_stale());
}

#[tokio::test(start_paused = true)]
async fn test_mutation_server_error_is_not_retried() {
    let mock = MockTransport::new();
    mock.on(Method::Post, "/interests/submit", Outcome::HttpError {
        status: 502,
        body: json!("Bad Gateway"),
    });
    let api = api(&mock, Environment::Production);

    let err = api
        .mutate(interests::submit(&form()).expect("form should encode"))
        .await
        .expect_err("502 should fail");

    assert_eq!(err.code.to_string(), "502");
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mutation_network_error_is_retried() {
    let mock = MockTransport::new();
    mock.on(Method::Post, "/interests/submit", Outcome::NetworkError {
        message: "connection reset".to_string(),
    });
    mock.respond_ok(Method::Post, "/interests/submit", json!({ "id": "3" }));
    let api = api(&mock, Environment::Production);

    let submitted = api
        .mutate(interests::submit(&form()).expect("form should encode"))
        .await
        .expect("second attempt should succeed");
    assert_eq!(submitted.id, "3");
    assert_eq!(mock.call_count(), 2);
}

#[derive(Debug)]
enum Message {
    Submitted(MutationResult<SubmittedInterest>),
}

#[tokio::test]
async fn test_mutation_command_delivers_result() {
    let mock = MockTransport::new();
    mock.respond_ok(Method::Post, "/interests/submit", json!({ "id": "4" }));
    let api = api(&mock, Environment::Development);

    let command: Command<Message> = api.mutation_command(
        interests::submit(&form()).expect("form should encode"),
        |result| Message::Submitted(result.into()),
    );
    let mut stream = command.into_stream().expect("command should produce a stream");

    let Some(Message::Submitted(result)) = stream.next().await else {
        panic!("expected a message");
    };
    assert!(result.is_success());
    assert!(matches!(result.state, MutationState::Success(ref s) if s.id == "4"));
    assert!(stream.next().await.is_none());
}
