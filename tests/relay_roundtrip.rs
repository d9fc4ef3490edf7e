use relaychat::client::{ChatStreamService, ClientError, FrameMode, RelayClient, StreamMessage};
use relaychat::core::conversation::{Conversation, ERROR_REPLY};
use relaychat::core::message::Role;
use relaychat::core::scripted::{ScriptStep, ScriptedProvider};
use relaychat::server::{serve, AppState};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a relay on an ephemeral port and return its base URL.
async fn spawn_relay(provider: ScriptedProvider) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(
        listener,
        AppState::new(provider),
        std::future::pending(),
    ));
    format!("http://{addr}")
}

fn entries(conversation: &Conversation) -> Vec<(Role, String)> {
    conversation
        .entries()
        .iter()
        .map(|entry| (entry.role, entry.content.clone()))
        .collect()
}

#[tokio::test]
async fn two_plus_two_accumulates_into_one_bot_entry() {
    let base_url = spawn_relay(ScriptedProvider::from_fragments(["4", "."])).await;
    let client = RelayClient::new(base_url, FrameMode::Events);
    let mut conversation = Conversation::new();

    client.chat_turn(&mut conversation, "2+2").await.unwrap();

    assert_eq!(
        entries(&conversation),
        vec![(Role::User, "2+2".into()), (Role::Bot, "4.".into())]
    );
    assert!(!conversation.is_loading());
}

#[tokio::test]
async fn legacy_mode_keeps_frame_terminators() {
    let base_url = spawn_relay(ScriptedProvider::from_fragments(["4", "."])).await;
    let client = RelayClient::new(base_url, FrameMode::Legacy);
    let mut conversation = Conversation::new();

    client.chat_turn(&mut conversation, "2+2").await.unwrap();

    assert_eq!(conversation.entries()[1].content, "4\n\n.\n\n");
}

#[tokio::test]
async fn multi_line_fragments_survive_the_relay() {
    let fragments = ["Steps:\n* one", "\n* **two**\n", "```int x;```"];
    let base_url = spawn_relay(ScriptedProvider::from_fragments(fragments)).await;
    let client = RelayClient::new(base_url, FrameMode::Events);
    let mut conversation = Conversation::new();

    client.chat_turn(&mut conversation, "list").await.unwrap();

    assert_eq!(conversation.entries()[1].content, fragments.concat());
}

#[tokio::test]
async fn empty_stream_yields_no_bot_entry() {
    let base_url = spawn_relay(ScriptedProvider::new(Vec::new())).await;
    let client = RelayClient::new(base_url, FrameMode::Events);
    let mut conversation = Conversation::new();

    client.chat_turn(&mut conversation, "hello").await.unwrap();

    assert_eq!(entries(&conversation), vec![(Role::User, "hello".into())]);
    assert!(!conversation.is_loading());
}

#[tokio::test]
async fn failure_mid_stream_clears_loading_and_keeps_partial_text() {
    let provider = ScriptedProvider::new(vec![
        ScriptStep::fragment("partial"),
        ScriptStep::fail("upstream reset"),
    ]);
    let base_url = spawn_relay(provider).await;
    let client = RelayClient::new(base_url, FrameMode::Events);
    let mut conversation = Conversation::new();

    let result = client.chat_turn(&mut conversation, "hi").await;

    assert!(matches!(result, Err(ClientError::Transport(_))));
    assert!(!conversation.is_loading());

    assert_eq!(
        entries(&conversation),
        vec![
            (Role::User, "hi".into()),
            (Role::Bot, "partial".into()),
            (Role::Bot, ERROR_REPLY.into()),
        ]
    );
}

#[tokio::test]
async fn frames_before_a_failure_reach_the_socket() {
    let provider = ScriptedProvider::new(vec![
        ScriptStep::fragment("partial"),
        ScriptStep::fail("upstream reset"),
    ]);
    let base_url = spawn_relay(provider).await;
    let addr = base_url.trim_start_matches("http://");

    let body = r#"{"message":"hi"}"#;
    let request = format!(
        "POST /chat/stream HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    let _ = socket.read_to_end(&mut raw).await;
    let raw = String::from_utf8_lossy(&raw);

    assert!(raw.starts_with("HTTP/1.1 200"), "response: {raw:?}");
    assert!(raw.contains("text/event-stream"));
    assert!(raw.contains("data: partial\n\n"));
    // The chunked body is never terminated.
    assert!(!raw.ends_with("0\r\n\r\n"));
}

#[tokio::test]
async fn failure_before_first_fragment_is_a_status_error() {
    let base_url = spawn_relay(ScriptedProvider::failing_open("quota exceeded")).await;
    let client = RelayClient::new(base_url.clone(), FrameMode::Events);
    let mut conversation = Conversation::new();

    let result = client.chat_turn(&mut conversation, "hi").await;

    assert!(matches!(result, Err(ClientError::Status(status)) if status.as_u16() == 500));
    assert_eq!(
        entries(&conversation),
        vec![(Role::User, "hi".into()), (Role::Bot, ERROR_REPLY.into())]
    );

    let response = reqwest::Client::new()
        .post(format!("{base_url}/chat/stream"))
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Error streaming response from Gemini API"}));
}

#[tokio::test]
async fn empty_message_is_forwarded_when_called_directly() {
    let provider = ScriptedProvider::from_fragments(["?"]);
    let base_url = spawn_relay(provider.clone()).await;
    let client = RelayClient::new(base_url, FrameMode::Events);

    let reply = client.send("").await.unwrap();

    assert_eq!(reply, "?");
    assert_eq!(provider.received(), vec![""]);
}

#[tokio::test]
async fn repeated_message_opens_independent_sessions() {
    let provider = ScriptedProvider::from_fragments(["same"]);
    let base_url = spawn_relay(provider.clone()).await;
    let client = RelayClient::new(base_url, FrameMode::Events);
    let mut conversation = Conversation::new();

    client.chat_turn(&mut conversation, "hi").await.unwrap();
    client.chat_turn(&mut conversation, "hi").await.unwrap();

    assert_eq!(
        entries(&conversation),
        vec![
            (Role::User, "hi".into()),
            (Role::Bot, "same".into()),
            (Role::User, "hi".into()),
            (Role::Bot, "same".into()),
        ]
    );
    assert_eq!(provider.received(), vec!["hi", "hi"]);
}

#[tokio::test]
async fn malformed_request_is_rejected() {
    let base_url = spawn_relay(ScriptedProvider::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{base_url}/chat"))
        .json(&json!({"text": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn stream_service_reports_chunks_then_end() {
    let base_url = spawn_relay(ScriptedProvider::from_fragments(["a", "b"])).await;
    let client = RelayClient::new(base_url, FrameMode::Events);
    let (service, mut rx) = ChatStreamService::new();

    service
        .spawn_stream(client, "go".to_string(), 3)
        .await
        .unwrap();

    let mut messages = Vec::new();
    while let Ok((message, stream_id)) = rx.try_recv() {
        assert_eq!(stream_id, 3);
        messages.push(message);
    }
    assert_eq!(
        messages,
        vec![
            StreamMessage::Chunk("a".into()),
            StreamMessage::Chunk("b".into()),
            StreamMessage::End,
        ]
    );
}
