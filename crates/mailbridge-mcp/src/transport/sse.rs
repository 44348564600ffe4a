//! Event-stream transport: `GET /sse` opens a session and its server-push
//! stream, `POST /messages?sessionId=` feeds it.
//!
//! Each session owns a worker task that drains its inbound queue one message
//! at a time, so responses are pushed in dispatch order. Dropping the stream
//! (client disconnect) removes the session.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Extension,
};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::auth::AuthContext;
use crate::protocol::ProtocolHandler;
use crate::server::GatewayState;
use crate::session::{SessionStore, TransportHandle, TransportKind};
use crate::types::{GatewayError, JsonRpcMessage};

use super::{error_response, framing, KEEP_ALIVE_SECS};

/// Route the client posts messages to, announced in the endpoint event.
pub const MESSAGES_PATH: &str = "/messages";

const INBOUND_CAPACITY: usize = 64;
const OUTBOUND_CAPACITY: usize = 64;

#[derive(Debug, Default, Deserialize)]
pub struct OpenParams {
    /// Optional client hint; only logged.
    #[serde(default)]
    pub transport: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageParams {
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Deregisters a session when its stream goes away. Removal happens once.
struct SessionGuard {
    sessions: Arc<SessionStore>,
    id: String,
    closed: AtomicBool,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.sessions.remove(&self.id);
            tracing::info!(session_id = %self.id, "Event stream closed");
        }
    }
}

/// `GET /sse`
pub async fn open_stream(
    State(state): State<GatewayState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<OpenParams>,
) -> Response {
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel::<Event>(OUTBOUND_CAPACITY);

    let session = match state
        .sessions
        .create(TransportHandle::event_stream(inbound_tx), auth.clone())
    {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to open event stream: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e);
        }
    };
    let id = session.id().to_string();
    drop(session);

    tracing::info!(
        session_id = %id,
        transport_hint = params.transport.as_deref().unwrap_or("-"),
        "Event stream opened"
    );

    let span = tracing::info_span!("session", session_id = %id);
    tokio::spawn(run_worker(state.handler.clone(), auth, inbound_rx, outbound_tx).instrument(span));

    let guard = SessionGuard {
        sessions: state.sessions.clone(),
        id: id.clone(),
        closed: AtomicBool::new(false),
    };

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?sessionId={id}"));

    let responses = stream::unfold((outbound_rx, guard), |(mut rx, guard)| async move {
        rx.recv()
            .await
            .map(|event| (Ok::<_, Infallible>(event), (rx, guard)))
    });
    let events = stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(responses);

    Sse::new(events)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(KEEP_ALIVE_SECS)))
        .into_response()
}

/// `POST /messages?sessionId=<id>`
pub async fn post_message(
    State(state): State<GatewayState>,
    Query(params): Query<MessageParams>,
    body: Bytes,
) -> Response {
    let Some(id) = params.session_id.filter(|id| !id.is_empty()) else {
        return error_response(
            StatusCode::NOT_FOUND,
            &GatewayError::SessionNotFound("(missing sessionId)".to_string()),
        );
    };

    let inbound = match state.sessions.get(&id) {
        Some(session) if session.kind() == TransportKind::EventStream => match session.handle() {
            TransportHandle::EventStream { inbound } => inbound.clone(),
            TransportHandle::SessionHttp { .. } => return session_not_found(&id),
        },
        _ => return session_not_found(&id),
    };

    let msg = match framing::decode_body(&body) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(session_id = %id, "Rejected message body: {e}");
            return error_response(StatusCode::BAD_REQUEST, &e);
        }
    };

    if inbound.send(msg).await.is_err() {
        return session_not_found(&id);
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

fn session_not_found(id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        &GatewayError::SessionNotFound(id.to_string()),
    )
}

/// Dispatch queued messages in order and push each reply onto the stream.
/// Ends once the session is gone and its queue is drained.
async fn run_worker(
    handler: ProtocolHandler,
    auth: AuthContext,
    mut inbound: mpsc::Receiver<JsonRpcMessage>,
    outbound: mpsc::Sender<Event>,
) {
    while let Some(msg) = inbound.recv().await {
        let Some(reply) = handler.handle_message(msg, &auth).await else {
            continue;
        };

        let data = match serde_json::to_string(&reply) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Failed to encode response: {e}");
                continue;
            }
        };

        if outbound.send(Event::default().event("message").data(data)).await.is_err() {
            let err = GatewayError::Transport("event stream closed, response discarded".to_string());
            tracing::warn!("{err}");
        }
    }

    tracing::debug!("Session worker stopped");
}
