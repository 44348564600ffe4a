//! HTTP gateway tests: event-stream and session-HTTP transports driven through
//! the axum router.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mailbridge_mcp::transport::streamable::MCP_SESSION_ID_HEADER;
use mailbridge_mcp::{router, GatewayState, SessionStore};

use common::*;

const BAD_SESSION_BODY: &str = r#"{"jsonrpc":"2.0","error":{"code":-32000,"message":"Bad Request: No valid session ID provided"},"id":null}"#;

struct Gateway {
    app: Router,
    sessions: Arc<SessionStore>,
}

fn gateway_with(sessions: SessionStore, default_api_key: Option<&str>) -> Gateway {
    let sessions = Arc::new(sessions);
    let state = GatewayState::new(test_handler(), sessions.clone())
        .with_default_api_key(default_api_key.map(str::to_string));
    Gateway {
        app: router(state),
        sessions,
    }
}

fn gateway() -> Gateway {
    gateway_with(SessionStore::new(), None)
}

impl Gateway {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn open_stream(&self, uri: &str) -> Body {
        let response = self
            .send(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        response.into_body()
    }

    async fn post_message(&self, session_id: &str, body: Value) -> Response {
        self.send(
            Request::post(format!("/messages?sessionId={session_id}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn mcp(&self, method: Method, session_id: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri("/mcp");
        if let Some(id) = session_id {
            builder = builder.header(MCP_SESSION_ID_HEADER, id);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }
}

/// Read one complete server-sent event (terminated by a blank line).
async fn next_event(body: &mut Body) -> String {
    let mut buffer = String::new();
    while !buffer.contains("\n\n") {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("body error");
        if let Ok(data) = frame.into_data() {
            buffer.push_str(std::str::from_utf8(&data).unwrap());
        }
    }
    buffer
}

fn event_data(event: &str) -> Value {
    let data = event
        .lines()
        .find_map(|l| l.strip_prefix("data: ").or_else(|| l.strip_prefix("data:")))
        .expect("event without data");
    serde_json::from_str(data).unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

// ─────────────────────── event stream ───────────────────────

#[tokio::test]
async fn event_stream_round_trip() {
    let gw = gateway_with(
        SessionStore::with_id_source(Box::new(|| "abc-123".to_string())),
        None,
    );

    let mut stream = gw.open_stream("/sse?token=t").await;
    let endpoint = next_event(&mut stream).await;
    assert!(endpoint.contains("event: endpoint"));
    assert!(endpoint.contains("/messages?sessionId=abc-123"));
    assert!(gw.sessions.get("abc-123").is_some());

    let response = gw
        .post_message("abc-123", tool_call(1, "say_hello", json!({"name": "Ada"})))
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let event = next_event(&mut stream).await;
    assert!(event.contains("event: message"));
    assert_eq!(
        event_data(&event),
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"content": [{"type": "text", "text": "hello Ada"}]}
        })
    );
}

#[tokio::test]
async fn event_stream_responses_follow_dispatch_order() {
    let gw = gateway();
    let mut stream = gw.open_stream("/sse").await;
    let id = session_id_from_endpoint(&next_event(&mut stream).await);

    let slow = gw.post_message(&id, tool_call(1, "sleepy", json!({"ms": 150}))).await;
    let fast = gw.post_message(&id, tool_call(2, "sleepy", json!({"ms": 0}))).await;
    assert_eq!(slow.status(), StatusCode::ACCEPTED);
    assert_eq!(fast.status(), StatusCode::ACCEPTED);

    assert_eq!(event_data(&next_event(&mut stream).await)["id"], 1);
    assert_eq!(event_data(&next_event(&mut stream).await)["id"], 2);
}

#[tokio::test]
async fn event_stream_session_uses_credentials_captured_at_open() {
    let gw = gateway_with(SessionStore::new(), Some("env-key"));
    let mut stream = gw.open_stream("/sse?token=opening-token").await;
    let id = session_id_from_endpoint(&next_event(&mut stream).await);

    // A different token on the message request must not leak into the session.
    let response = gw
        .send(
            Request::post(format!("/messages?sessionId={id}&token=other"))
                .body(Body::from(tool_call(1, "whoami", json!({})).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let reply = event_data(&next_event(&mut stream).await);
    let identity: Value =
        serde_json::from_str(reply["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(identity, json!({"token": "opening-token", "api_key": "env-key"}));
}

#[tokio::test]
async fn closing_a_stream_removes_only_its_session() {
    let gw = gateway();

    let mut first = gw.open_stream("/sse").await;
    let first_endpoint = next_event(&mut first).await;
    let mut second = gw.open_stream("/sse").await;
    let second_endpoint = next_event(&mut second).await;
    assert_eq!(gw.sessions.len(), 2);

    let first_id = session_id_from_endpoint(&first_endpoint);
    let second_id = session_id_from_endpoint(&second_endpoint);

    drop(first);
    assert!(gw.sessions.get(&first_id).is_none());
    assert_eq!(gw.sessions.len(), 1);

    let response = gw.post_message(&first_id, tool_call(1, "say_hello", json!({"name": "x"}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], -32001);

    let response = gw
        .post_message(&second_id, tool_call(2, "say_hello", json!({"name": "y"})))
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let reply = event_data(&next_event(&mut second).await);
    assert_eq!(reply["result"]["content"][0]["text"], "hello y");
}

#[tokio::test]
async fn messages_for_unknown_or_missing_sessions_are_404() {
    let gw = gateway();

    let response = gw.post_message("nope", tool_call(1, "say_hello", json!({"name": "x"}))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = gw
        .send(
            Request::post("/messages")
                .body(Body::from(tool_call(1, "say_hello", json!({"name": "x"})).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], -32001);
}

#[tokio::test]
async fn unparseable_message_is_400() {
    let gw = gateway();
    let mut stream = gw.open_stream("/sse").await;
    let id = session_id_from_endpoint(&next_event(&mut stream).await);

    let response = gw
        .send(
            Request::post(format!("/messages?sessionId={id}"))
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], -32700);
    assert!(gw.sessions.get(&id).is_some());
}

// ─────────────────────── session HTTP ───────────────────────

#[tokio::test]
async fn mcp_without_session_is_rejected_with_exact_body() {
    let gw = gateway();

    let response = gw
        .mcp(
            Method::POST,
            None,
            Some(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, BAD_SESSION_BODY);

    let response = gw
        .mcp(Method::POST, Some("unknown"), Some(init_request(1)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, BAD_SESSION_BODY);
    assert!(gw.sessions.is_empty());
}

#[tokio::test]
async fn mcp_session_lifecycle() {
    let gw = gateway();

    let response = gw.mcp(Method::POST, None, Some(init_request(0))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let id = response.headers()[MCP_SESSION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(body_json(response).await["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(gw.sessions.len(), 1);

    let response = gw
        .mcp(
            Method::POST,
            Some(&id),
            Some(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = gw
        .mcp(Method::POST, Some(&id), Some(tool_call(1, "say_hello", json!({"name": "Ada"}))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gw.sessions.len(), 1);
    assert_eq!(body_json(response).await["result"]["content"][0]["text"], "hello Ada");

    let response = gw.mcp(Method::DELETE, Some(&id), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(gw.sessions.is_empty());

    let response = gw.mcp(Method::GET, Some(&id), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, BAD_SESSION_BODY);

    let response = gw
        .mcp(Method::POST, Some(&id), Some(tool_call(2, "say_hello", json!({"name": "x"}))))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = gw.mcp(Method::DELETE, Some(&id), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mcp_get_and_delete_never_create_sessions() {
    let gw = gateway();

    let response = gw.mcp(Method::GET, None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, BAD_SESSION_BODY);

    let response = gw.mcp(Method::DELETE, None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(gw.sessions.is_empty());
}

#[tokio::test]
async fn mcp_get_stream_ends_when_session_is_deleted() {
    let gw = gateway();
    let response = gw.mcp(Method::POST, None, Some(init_request(0))).await;
    let id = response.headers()[MCP_SESSION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    let response = gw.mcp(Method::GET, Some(&id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut stream = response.into_body();

    let response = gw.mcp(Method::DELETE, Some(&id), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let end = tokio::time::timeout(Duration::from_secs(5), stream.frame())
        .await
        .expect("stream should end after delete");
    assert!(end.is_none());
}

#[tokio::test]
async fn mcp_session_uses_credentials_from_initialize() {
    let gw = gateway();
    let response = gw
        .send(
            Request::post("/mcp?apiKey=from-query")
                .header("token", "from-header")
                .body(Body::from(init_request(0).to_string()))
                .unwrap(),
        )
        .await;
    let id = response.headers()[MCP_SESSION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    let response = gw
        .send(
            Request::post("/mcp")
                .header(MCP_SESSION_ID_HEADER, &id)
                .header("token", "later-token")
                .body(Body::from(tool_call(1, "whoami", json!({})).to_string()))
                .unwrap(),
        )
        .await;
    let reply = body_json(response).await;
    let identity: Value =
        serde_json::from_str(reply["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(identity, json!({"token": "from-header", "api_key": "from-query"}));
}

async fn post_raw_mcp(gw: &Gateway, session_id: Option<&str>, body: &str) -> Response {
    let mut builder = Request::post("/mcp").header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session_id {
        builder = builder.header(MCP_SESSION_ID_HEADER, id);
    }
    gw.send(builder.body(Body::from(body.to_string())).unwrap()).await
}

#[tokio::test]
async fn mcp_without_session_rejects_any_non_handshake_body() {
    let gw = gateway();
    let batch = json!([init_request(0), init_request(1)]).to_string();

    for body in [r#"{"foo":1}"#, batch.as_str(), "{oops", ""] {
        let response = post_raw_mcp(&gw, None, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(body_string(response).await, BAD_SESSION_BODY, "body {body:?}");
    }
    assert!(gw.sessions.is_empty());
}

#[tokio::test]
async fn mcp_session_reports_malformed_bodies() {
    let gw = gateway();
    let response = gw.mcp(Method::POST, None, Some(init_request(0))).await;
    let id = response.headers()[MCP_SESSION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    let batch = json!([tool_call(1, "say_hello", json!({"name": "a"}))]).to_string();
    let response = post_raw_mcp(&gw, Some(&id), &batch).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], -32600);

    let response = post_raw_mcp(&gw, Some(&id), "{oops").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], -32700);

    let response = post_raw_mcp(&gw, Some("unknown"), "{oops").await;
    assert_eq!(body_string(response).await, BAD_SESSION_BODY);
    assert_eq!(gw.sessions.len(), 1);
}

#[tokio::test]
async fn health_reports_session_count() {
    let gw = gateway();
    gw.mcp(Method::POST, None, Some(init_request(0))).await;

    let response = gw
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["sessions"], 1);
}

// ─────────────────────── helpers ───────────────────────

fn session_id_from_endpoint(event: &str) -> String {
    event
        .split("sessionId=")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .expect("endpoint event carries a session id")
        .to_string()
}
