//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the tool surface
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener and stop on shutdown
//!
//! # Routes
//! - `GET /health`
//! - `GET /tools`: tool names, descriptions and input schemas
//! - `POST /tools/{name}`: call a tool with a JSON object of arguments
//!
//! Tool failures are reported inside the envelope with status 200; only an
//! unknown tool name or an unparseable body changes the HTTP status.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::blockchain::types::ErrorKind;
use crate::lifecycle::Shutdown;
use crate::tools::response::{SERVER_NAME, SERVER_VERSION};
use crate::tools::{tool_definitions, NanoTools, ToolResponse};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<NanoTools>,
}

/// HTTP front end for the wallet tools.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(tools: Arc<NanoTools>) -> Self {
        let router = Self::build_router(AppState { tools });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/tools", get(list_tools_handler))
            .route("/tools/{name}", post(call_tool_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Tool server listening");

        let rx = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(Shutdown::wait(rx))
            .await?;

        tracing::info!("Tool server stopped");
        Ok(())
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "server": SERVER_NAME,
        "version": SERVER_VERSION,
    }))
}

async fn list_tools_handler() -> impl IntoResponse {
    Json(json!({ "tools": tool_definitions() }))
}

async fn call_tool_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    if !tool_definitions().iter().any(|tool| tool.name == name) {
        tracing::warn!(tool = %name, "Unknown tool requested");
        let response = ToolResponse::error(ErrorKind::Validation, format!("Unknown tool: {}", name));
        return (StatusCode::NOT_FOUND, Json(response));
    }

    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(args) => args,
            Err(e) => {
                let response = ToolResponse::error(ErrorKind::Validation, format!("Invalid JSON body: {}", e));
                return (StatusCode::BAD_REQUEST, Json(response));
            }
        }
    };

    tracing::debug!(tool = %name, "Tool call");
    let response = state.tools.call(&name, args).await;
    (StatusCode::OK, Json(response))
}
