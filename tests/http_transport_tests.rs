// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seer::auth::StaticCredentials;
use seer::chat::{ChatController, ControllerOptions, ErrorKind, RecordingObserver, TurnOutcome};
use seer::config::Settings;
use seer::error::{ApiError, SeerError};
use seer::transport::{ChatTransport, Endpoint, HttpTransport, OutgoingRequest};

fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body.to_string())
}

fn controller_for(
    server: &MockServer,
    observer: Arc<RecordingObserver>,
    credentials: Arc<StaticCredentials>,
) -> ChatController {
    ChatController::new(Arc::new(HttpTransport::new(server.uri())), credentials, observer)
        .with_options(ControllerOptions {
            user_message_delay: Duration::ZERO,
            ..ControllerOptions::default()
        })
}

#[tokio::test]
async fn test_turn_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .and(header("accept", "text/event-stream"))
        .and(bearer_token("tok-123"))
        .and(body_partial_json(json!({
            "message": "Will it rain?",
            "mode": "chat",
            "stream": true,
            "language": "en_US",
            "session_id": null
        })))
        .respond_with(sse_response(concat!(
            "data: {\"session_id\":\"srv-1\",\"content\":{\"text\":\"Proba\"},\"partial\":true}\n\n",
            "data: {\"session_id\":\"srv-1\",\"content\":{\"text\":\"bly\"},\"partial\":true}\n\n",
            "data: {\"session_id\":\"srv-1\",\"content\":{\"text\":\"Probably not.\"},\"partial\":false}\n\n",
            "data: [DONE]\n\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let observer = Arc::new(RecordingObserver::new());
    let controller = controller_for(
        &server,
        observer.clone(),
        Arc::new(StaticCredentials::with_token("tok-123")),
    );

    let outcome = controller.send("Will it rain?", "chat", None, false).await;

    assert_eq!(
        outcome,
        TurnOutcome::Completed {
            session_id: Some("srv-1".to_string())
        }
    );
    let messages = observer.messages();
    assert_eq!(messages.last().unwrap().content, "Probably not.");
}

#[tokio::test]
async fn test_resume_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/resume"))
        .and(body_partial_json(json!({"session_id": "srv-9", "stream": true})))
        .respond_with(sse_response(
            "data: {\"content\":{\"text\":\"and so on\"},\"partial\":false}\n\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let observer = Arc::new(RecordingObserver::new());
    let controller = controller_for(&server, observer.clone(), Arc::new(StaticCredentials::new(None)))
        .with_session("srv-9");

    let outcome = controller.resume_conversation().await;

    assert!(matches!(outcome, TurnOutcome::Completed { .. }));
    assert_eq!(observer.messages()[0].content, "and so on");
}

#[tokio::test]
async fn test_unauthorized_triggers_reauth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let observer = Arc::new(RecordingObserver::new());
    let credentials = Arc::new(StaticCredentials::with_token("stale"));
    let controller = controller_for(&server, observer.clone(), credentials.clone());

    let outcome = controller.send("hi", "chat", None, false).await;

    let TurnOutcome::Errored(error) = outcome else {
        panic!("expected error, got {:?}", outcome);
    };
    assert_eq!(error.kind, ErrorKind::Auth);
    assert_eq!(credentials.reauth_requests(), 1);
    assert_eq!(observer.errors().len(), 1);
}

#[tokio::test]
async fn test_server_error_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri());
    let result = transport
        .open(OutgoingRequest {
            endpoint: Endpoint::Chat,
            body: json!({"message": "hi"}),
            bearer_token: None,
        })
        .await;

    match result {
        Err(SeerError::Api(ApiError::ServerError { status, message })) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn test_body_is_streamed_as_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/custom/stream"))
        .respond_with(sse_response("data: [DONE]\n\n"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).with_paths("/custom/stream", "/custom/resume");
    let mut stream = transport
        .open(OutgoingRequest {
            endpoint: Endpoint::Chat,
            body: json!({}),
            bearer_token: None,
        })
        .await
        .unwrap();

    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, b"data: [DONE]\n\n");
}

#[tokio::test]
async fn test_transport_from_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(sse_response("data: [DONE]\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = Settings::default();
    settings.api.base_url = server.uri();
    settings.api.chat_path = "/v2/chat".to_string();
    let transport = HttpTransport::from_settings(&settings).unwrap();

    assert_eq!(transport.url(Endpoint::Chat), format!("{}/v2/chat", server.uri()));
    let stream = transport
        .open(OutgoingRequest {
            endpoint: Endpoint::Chat,
            body: json!({}),
            bearer_token: None,
        })
        .await;
    assert!(stream.is_ok());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 9 of localhost in the test environment.
    let transport = HttpTransport::new("http://127.0.0.1:9");
    let result = transport
        .open(OutgoingRequest {
            endpoint: Endpoint::Chat,
            body: json!({}),
            bearer_token: None,
        })
        .await;

    assert!(matches!(result, Err(SeerError::Api(ApiError::Network(_)))));
}
