//! HTTP server front: routes, per-request auth extraction, /health, shutdown.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthContext;
use crate::protocol::ProtocolHandler;
use crate::session::{SessionStore, IDLE_SWEEP_INTERVAL, SESSION_IDLE_TIMEOUT};
use crate::transport::{sse, streamable};
use crate::types::{GatewayError, GatewayResult, SERVER_VERSION};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct GatewayState {
    pub handler: ProtocolHandler,
    pub sessions: Arc<SessionStore>,
    pub default_api_key: Option<Arc<str>>,
}

impl GatewayState {
    pub fn new(handler: ProtocolHandler, sessions: Arc<SessionStore>) -> Self {
        Self {
            handler,
            sessions,
            default_api_key: None,
        }
    }

    pub fn with_default_api_key(mut self, key: Option<String>) -> Self {
        self.default_api_key = key.map(Arc::from);
        self
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/sse", get(sse::open_stream))
        .route(sse::MESSAGES_PATH, post(sse::post_message))
        .route(
            "/mcp",
            post(streamable::post)
                .get(streamable::get)
                .delete(streamable::delete),
        )
        .route("/health", get(handle_health))
        .layer(middleware::from_fn_with_state(state.clone(), attach_auth))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Derive the request's [`AuthContext`] and store it in the request extensions.
async fn attach_auth(State(state): State<GatewayState>, mut request: Request, next: Next) -> Response {
    let uri = request.uri();
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let auth = AuthContext::extract(uri.query(), request.headers(), path_and_query)
        .with_default_api_key(state.default_api_key.as_deref());

    request.extensions_mut().insert(auth);
    next.run(request).await
}

async fn handle_health(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": SERVER_VERSION,
        "sessions": state.sessions.len(),
    }))
}

/// HTTP server for event-stream and session-HTTP clients.
pub struct GatewayServer {
    state: GatewayState,
}

impl GatewayServer {
    pub fn new(state: GatewayState) -> Self {
        Self { state }
    }

    /// Serve until Ctrl-C, then close every session.
    pub async fn run(&self, addr: &str) -> GatewayResult<()> {
        let app = router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP transport listening on {addr}");
        tracing::info!("Event stream: GET /sse, POST {}", sse::MESSAGES_PATH);
        tracing::info!("Session HTTP: POST|GET|DELETE /mcp");

        let sweeper = spawn_idle_sweep(self.state.sessions.clone());

        let sessions = self.state.sessions.clone();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for shutdown signal: {e}");
                    std::future::pending::<()>().await;
                }
                tracing::info!("Shutdown requested, closing {} session(s)", sessions.len());
                sessions.clear();
            })
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()));

        sweeper.abort();
        served
    }
}

/// Periodically drop session-HTTP sessions whose client went away without `DELETE`.
fn spawn_idle_sweep(sessions: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(IDLE_SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let expired = sessions.expire_idle(SESSION_IDLE_TIMEOUT);
            if expired > 0 {
                tracing::debug!("Idle sweep removed {expired} session(s)");
            }
        }
    })
}
