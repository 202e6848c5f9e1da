//! Relay HTTP + WebSocket server (single port).

use crate::config::{self, Config};
use crate::gateway::protocol::{ChatRequest, ClientMessage};
use crate::rasa::{RasaClient, RasaError};
use crate::registry::SessionRegistry;
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Service name reported by /health.
const SERVICE_NAME: &str = "chatbridge";

/// First message pushed to every new WebSocket session.
const WELCOME_TEXT: &str = "Hello! I'm your AI assistant. How can I help you today?";
/// Pushed when the webhook answers with a non-success status.
const SERVER_TROUBLE_TEXT: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again.";
/// Pushed when the webhook cannot be reached at all. Wording must stay
/// distinguishable from SERVER_TROUBLE_TEXT.
const UNAVAILABLE_TEXT: &str =
    "Sorry, I'm currently unavailable. Please ensure the Rasa server is running.";

/// Shared state for the relay (config, session registry, downstream client).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<SessionRegistry>,
    pub rasa: RasaClient,
}

/// Run the relay server; binds to config.server.bind:config.server.port.
/// Probes the Rasa server once at startup (failure is a warning, not fatal).
/// Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_server(config: Config) -> Result<()> {
    let rasa = RasaClient::new(config::resolve_rasa_url(&config));
    let state = AppState {
        config: Arc::new(config),
        registry: Arc::new(SessionRegistry::new()),
        rasa,
    };

    match state.rasa.version().await {
        Ok(_) => log::info!("rasa server is accessible"),
        Err(RasaError::Api { status, .. }) => {
            log::warn!("rasa server returned status {} at startup", status.as_u16());
        }
        Err(e) => {
            log::warn!("could not connect to rasa server: {}", e);
            log::info!("start it with: rasa run --enable-api --cors '*'");
        }
    }

    let bind_addr = format!(
        "{}:{}",
        state.config.server.bind, state.config.server.port
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("relay listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server exited")?;
    log::info!("relay stopped");
    Ok(())
}

fn build_router(state: AppState) -> Router {
    let static_dir = state.config.ui.static_dir.clone();
    let mut app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/rasa/status", get(rasa_status))
        .route("/chat", post(chat))
        .route("/ws", get(ws_handler))
        .route("/ws/:session_id", get(ws_session_handler))
        .with_state(state);
    if static_dir.is_dir() {
        app = app.nest_service("/static", ServeDir::new(static_dir));
    } else {
        log::debug!(
            "static directory {} not found; /static not mounted",
            static_dir.display()
        );
    }
    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// GET / serves the chat page, rewiring the embedded widget config from its
/// hardcoded default to this relay's own WebSocket endpoint.
async fn index(State(state): State<AppState>) -> Response {
    let path = &state.config.ui.index;
    let html = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                format!("{} not found", path.display()),
            )
                .into_response();
        }
    };
    let socket_url = format!(
        "socketUrl: 'ws://localhost:{}/ws',",
        state.config.server.port
    );
    let html = html
        .replace("socketUrl: 'http://localhost:5005',", &socket_url)
        .replace("socketPath: '/socket.io/',", "socketPath: '/',");
    Html(html).into_response()
}

/// GET /health returns a simple health JSON (for probes).
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

/// GET /rasa/status probes the downstream server. Always HTTP 200; the probe
/// outcome is encoded in the body.
async fn rasa_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.rasa.version().await {
        Ok(version) => Json(json!({ "status": "connected", "rasa_version": version })),
        Err(RasaError::Api { status, .. }) => Json(json!({
            "status": "error",
            "message": format!("Rasa server returned status {}", status.as_u16()),
        })),
        Err(e) => Json(json!({ "status": "disconnected", "error": e.to_string() })),
    }
}

/// POST /chat — one relay round-trip over plain HTTP. Downstream errors are
/// reported in the body; the relay itself still answers 200.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<serde_json::Value> {
    let sender = req
        .sender
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    match state.rasa.send_message(&sender, &req.message).await {
        Ok(responses) => Json(json!({
            "status": "success",
            "responses": responses,
            "sender": sender,
        })),
        Err(RasaError::Api { status, body }) => Json(json!({
            "status": "error",
            "message": format!("Rasa server error: {}", status.as_u16()),
            "detail": body,
        })),
        Err(e) => {
            log::error!("error in chat endpoint: {}", e);
            Json(json!({ "status": "error", "message": e.to_string() }))
        }
    }
}

/// GET /ws upgrades to WebSocket with a generated session id.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let session_id = uuid::Uuid::new_v4().to_string();
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

/// GET /ws/{session_id} upgrades to WebSocket for a caller-supplied id.
async fn ws_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

/// One task per connection: register, welcome, then relay frames until the
/// client disconnects or a frame fails to parse.
async fn handle_socket(mut socket: WebSocket, state: AppState, session_id: String) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.registry.register(session_id.clone(), tx.clone()).await;
    log::info!("websocket connection established for session: {}", session_id);

    let welcome = serde_json::to_string(&ClientMessage::text(WELCOME_TEXT)).unwrap_or_default();
    state.registry.send_to_session(&session_id, welcome).await;

    loop {
        tokio::select! {
            biased;

            out = rx.recv() => {
                let Some(text) = out else { break };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                let Message::Text(text) = msg else { continue };
                let Ok(frame) = serde_json::from_str::<ChatRequest>(&text) else {
                    log::error!("websocket error for session {}: malformed frame", session_id);
                    break;
                };
                if frame.message.is_empty() {
                    continue;
                }
                log::info!("received message from {}: {}", session_id, frame.message);
                relay_frame(&state, &session_id, &frame.message).await;
            }
        }
    }

    state.registry.unregister_channel(&session_id, &tx).await;
    log::info!("websocket connection closed for session: {}", session_id);
}

/// Forward one user message to the webhook and push the outcome to the
/// session: each reply in order on success, exactly one error message
/// otherwise. The connection stays open either way.
async fn relay_frame(state: &AppState, session_id: &str, message: &str) {
    match state.rasa.send_message(session_id, message).await {
        Ok(replies) => {
            for reply in replies {
                let frame =
                    serde_json::to_string(&ClientMessage::from_reply(reply)).unwrap_or_default();
                state.registry.send_to_session(session_id, frame).await;
            }
        }
        Err(RasaError::Api { status, body }) => {
            log::warn!(
                "rasa webhook returned status {} for session {}: {}",
                status.as_u16(),
                session_id,
                body
            );
            let frame =
                serde_json::to_string(&ClientMessage::error(SERVER_TROUBLE_TEXT)).unwrap_or_default();
            state.registry.send_to_session(session_id, frame).await;
        }
        Err(e) => {
            log::error!("rasa request error for session {}: {}", session_id, e);
            let frame =
                serde_json::to_string(&ClientMessage::error(UNAVAILABLE_TEXT)).unwrap_or_default();
            state.registry.send_to_session(session_id, frame).await;
        }
    }
}
