//! Session-HTTP transport on `/mcp`. The session id travels in the
//! `mcp-session-id` header; sessions are created only by an `initialize`
//! request carrying no id.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    Extension,
};
use futures::future;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;

use crate::auth::AuthContext;
use crate::server::GatewayState;
use crate::session::{Session, TransportHandle, TransportKind};
use crate::types::GatewayError;

use super::{error_response, framing, KEEP_ALIVE_SECS};

/// Header carrying the session id in both directions.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// The session named by the request header, if it exists and speaks this
/// transport. Resolving counts as activity.
fn resolve(state: &GatewayState, headers: &HeaderMap) -> Option<Arc<Session>> {
    let session = session_id(headers)
        .and_then(|id| state.sessions.get(id))
        .filter(|session| session.kind() == TransportKind::SessionHttp)?;
    session.touch();
    Some(session)
}

fn bad_session() -> Response {
    error_response(StatusCode::BAD_REQUEST, &GatewayError::BadSession)
}

/// `POST /mcp`
pub async fn post(
    State(state): State<GatewayState>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Without a session id only a well-formed `initialize` request is accepted;
    // anything else, including an undecodable body, is a bad session.
    let (session, msg) = match session_id(&headers) {
        Some(_) => {
            let Some(session) = resolve(&state, &headers) else {
                return bad_session();
            };
            match framing::decode_body(&body) {
                Ok(msg) => (session, msg),
                Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
            }
        }
        None => match framing::decode_body(&body) {
            Ok(msg) if msg.is_initialize_request() => {
                match state.sessions.create(TransportHandle::session_http(), auth) {
                    Ok(session) => {
                        tracing::info!(session_id = %session.id(), "Session-HTTP session initialized");
                        (session, msg)
                    }
                    Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
                }
            }
            _ => return bad_session(),
        },
    };

    let TransportHandle::SessionHttp { lane, .. } = session.handle() else {
        return bad_session();
    };

    let reply = {
        let _turn = lane.lock().await;
        state.handler.handle_message(msg, session.auth()).await
    };
    session.touch();

    let mut response = match reply {
        Some(value) => Json(value).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    if let Ok(value) = HeaderValue::from_str(session.id()) {
        response.headers_mut().insert(MCP_SESSION_ID_HEADER, value);
    }
    response
}

/// `GET /mcp`: a standalone stream carrying keep-alives until the session ends.
pub async fn get(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    let Some(liveness) = resolve(&state, &headers).and_then(|s| s.subscribe_liveness()) else {
        return bad_session();
    };

    let events = WatchStream::new(liveness)
        .take_while(|alive| future::ready(*alive))
        .filter_map(|_| future::ready(None::<Result<Event, Infallible>>));

    Sse::new(events)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(KEEP_ALIVE_SECS)))
        .into_response()
}

/// `DELETE /mcp`
pub async fn delete(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    match resolve(&state, &headers) {
        Some(session) => {
            state.sessions.remove(session.id());
            tracing::info!(session_id = %session.id(), "Session-HTTP session terminated");
            StatusCode::NO_CONTENT.into_response()
        }
        None => bad_session(),
    }
}
