use repo_report::config::GenerationConfig;
use repo_report::generate::{ChatClient, ChatMessage, GenerateError, OpenAiClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generation_config(base_url: String, api_key: Option<&str>) -> GenerationConfig {
    GenerationConfig {
        model: "gpt-4o".to_string(),
        temperature: 0.0,
        base_url,
        api_key: api_key.map(|k| k.to_string()),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn sends_model_messages_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "You are terse."},
                {"role": "user", "content": "hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "hello there"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&generation_config(server.uri(), Some("test-key"))).unwrap();
    let response = client
        .complete(vec![
            ChatMessage::system("You are terse."),
            ChatMessage::user("hi"),
        ])
        .await
        .expect("completion should succeed");
    assert_eq!(response, "hello there");
}

#[tokio::test]
async fn missing_credential_fails_at_point_of_use() {
    let client = OpenAiClient::new(&generation_config(
        "http://localhost:9".to_string(),
        None,
    ))
    .unwrap();
    let err = client
        .complete(vec![ChatMessage::user("hi")])
        .await
        .expect_err("call without credential must fail");
    assert!(matches!(err, GenerateError::MissingCredential));
}

#[tokio::test]
async fn api_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&generation_config(server.uri(), Some("bad-key"))).unwrap();
    let err = client
        .complete(vec![ChatMessage::user("hi")])
        .await
        .expect_err("401 must surface as an API error");
    match err {
        GenerateError::Api { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid key"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&generation_config(server.uri(), Some("key"))).unwrap();
    let err = client
        .complete(vec![ChatMessage::user("hi")])
        .await
        .expect_err("empty choices must fail");
    assert!(matches!(err, GenerateError::EmptyResponse));
}
