use std::time::Duration;

use aurith::core::message::{Message, Role};
use aurith::core::turn::{Persona, Resolution, TurnController};
use aurith::inference::{
    CompletionError, CompletionService, EndpointService, FailureKind, OpenRouterService,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

const FALLBACK: &str = "Sorry, I encountered an error. Please try again.";

fn persona() -> Persona {
    Persona {
        name: "Aurith AI".to_string(),
        system_prompt: "You are Aurith AI.".to_string(),
        greeting: "Hello! How can I help?".to_string(),
        fallback_message: FALLBACK.to_string(),
    }
}

fn user_log() -> Vec<Message> {
    vec![Message::user("Hello")]
}

fn choices_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

async fn endpoint_server(template: ResponseTemplate) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .respond_with(template)
        .mount(&mock_server)
        .await;
    mock_server
}

fn endpoint(server: &MockServer, timeout: Option<Duration>) -> EndpointService {
    EndpointService::new(format!("{}/api/chatbot", server.uri()), timeout)
}

// ============================================================================
// Endpoint Service Tests
// ============================================================================

#[tokio::test]
async fn test_endpoint_choices_response() {
    let server = endpoint_server(
        ResponseTemplate::new(200).set_body_json(choices_body("We build AI agents.")),
    )
    .await;

    let completion = endpoint(&server, None).complete(&user_log()).await.unwrap();
    assert_eq!(completion.content, "We build AI agents.");
    assert!(completion.auxiliary.is_none());
}

#[tokio::test]
async fn test_endpoint_bare_message_response() {
    let server = endpoint_server(
        ResponseTemplate::new(200).set_body_json(json!({"message": {"content": "**Hi**"}})),
    )
    .await;

    let completion = endpoint(&server, None).complete(&user_log()).await.unwrap();
    assert_eq!(completion.content, "**Hi**");
}

#[tokio::test]
async fn test_endpoint_sends_full_log() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "You are Aurith AI."},
                {"role": "assistant", "content": "Hello! How can I help?"},
                {"role": "user", "content": "What do you do?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(choices_body("Automation.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = endpoint(&mock_server, None);
    let mut controller = TurnController::new(&persona());
    let (resolution, reply) = controller.converse(&service, "What do you do?").await.unwrap();
    assert_eq!(resolution, Resolution::Replied);
    assert_eq!(reply.content(), "Automation.");
}

#[tokio::test]
async fn test_endpoint_server_error() {
    let server = endpoint_server(ResponseTemplate::new(500).set_body_string("boom")).await;

    let err = endpoint(&server, None).complete(&user_log()).await.unwrap_err();
    match &err {
        CompletionError::Api { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
    assert_eq!(err.kind(), FailureKind::Transport);
}

#[tokio::test]
async fn test_endpoint_malformed_body() {
    let server = endpoint_server(ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let err = endpoint(&server, None).complete(&user_log()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Parse(_)));
}

#[tokio::test]
async fn test_endpoint_connection_refused() {
    // Nothing listens on this port once the server is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let service = EndpointService::new(format!("{uri}/api/chatbot"), None);

    let err = service.complete(&user_log()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
}

// ============================================================================
// OpenRouter Service Tests
// ============================================================================

#[tokio::test]
async fn test_openrouter_sends_bearer_and_model() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-or-test"))
        .and(body_partial_json(json!({"model": "openrouter/auto"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Sure.",
                    "reasoning_details": [{"type": "reasoning.text", "text": "thinking"}]
                }
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = OpenRouterService::new(
        "sk-or-test".to_string(),
        Some(mock_server.uri()),
        "openrouter/auto".to_string(),
        None,
    )
    .unwrap();

    let completion = service.complete(&user_log()).await.unwrap();
    assert_eq!(completion.content, "Sure.");
    assert_eq!(
        completion.auxiliary,
        Some(json!([{"type": "reasoning.text", "text": "thinking"}]))
    );
}

#[tokio::test]
async fn test_openrouter_unauthorized() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let service = OpenRouterService::new(
        "bad-key".to_string(),
        Some(mock_server.uri()),
        "openrouter/auto".to_string(),
        None,
    )
    .unwrap();

    let err = service.complete(&user_log()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Api { status: 401, .. }));
}

// ============================================================================
// Turn Controller End-to-End
// ============================================================================

#[tokio::test]
async fn test_failed_turn_appends_fallback() {
    let server = endpoint_server(ResponseTemplate::new(503)).await;
    let service = endpoint(&server, None);
    let mut controller = TurnController::new(&persona());

    let (resolution, reply) = controller.converse(&service, "Hello?").await.unwrap();
    assert_eq!(resolution, Resolution::Fallback);
    assert_eq!(reply.role(), Role::Assistant);
    assert_eq!(reply.content(), FALLBACK);
    assert!(!controller.is_pending());
    assert_eq!(controller.store().len(), 4);
}

#[tokio::test]
async fn test_timeout_turns_hung_request_into_fallback() {
    let server = endpoint_server(
        ResponseTemplate::new(200)
            .set_body_json(choices_body("too late"))
            .set_delay(Duration::from_secs(5)),
    )
    .await;
    let service = endpoint(&server, Some(Duration::from_millis(200)));

    let err = service.complete(&user_log()).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);

    let mut controller = TurnController::new(&persona());
    let (resolution, reply) = controller.converse(&service, "Hello?").await.unwrap();
    assert_eq!(resolution, Resolution::Fallback);
    assert_eq!(reply.content(), FALLBACK);
}

#[tokio::test]
async fn test_reasoning_details_round_trip_on_next_turn() {
    let mock_server = MockServer::start().await;
    // Second turn must carry the first reply's reasoning details back
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system"},
                {"role": "assistant"},
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "one", "reasoning_details": {"step": 1}},
                {"role": "user", "content": "second"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(choices_body("two")))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "one", "reasoning_details": {"step": 1}}}]
        })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    let service = endpoint(&mock_server, None);
    let mut controller = TurnController::new(&persona());
    assert_eq!(controller.converse(&service, "first").await.unwrap().1.content(), "one");
    assert_eq!(controller.converse(&service, "second").await.unwrap().1.content(), "two");
}
