//! In-memory backend speaking the pcremote wire format: the approval queue the
//! client syncs against, the hook endpoints an automation agent raises requests
//! through, and the command relay to the PC-side agent.

pub mod state;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use pcremote_core::types::{
    AgentPoll, CommandList, ErrorBody, ExecuteResult, HookResult, StatusReport,
};
use pcremote_core::PendingAction;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::CorsLayer;

pub use state::AppState;

const TIMEOUT_OUTPUT: &str = "⏱ Timed out: the PC did not respond. Is the agent running?";
const STATUS_TIMEOUT_INFO: &str = "PC is not responding";

// ── Request / Response types ────────────────────────────────────────────────

#[derive(Serialize)]
struct PendingResponse {
    pending: Vec<PendingAction>,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Deserialize)]
struct DecideBody {
    #[serde(default)]
    approved: bool,
}

fn unknown_tool() -> String {
    "?".to_string()
}

#[derive(Deserialize)]
struct HookBody {
    #[serde(default = "unknown_tool")]
    tool: String,
    #[serde(default)]
    description: String,
}

#[derive(Serialize)]
struct HookCreated {
    ok: bool,
    hook_id: String,
}

#[derive(Deserialize)]
struct ExecuteBody {
    #[serde(default)]
    command: String,
}

#[derive(Deserialize)]
struct SendBody {
    #[serde(default)]
    text: String,
}

/// Error response carrying a `detail` message.
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/claude/pending", get(pending_handler))
        .route("/claude/decide/{id}", post(decide_handler))
        .route("/commands", get(commands_handler))
        .route("/execute", post(execute_handler))
        .route("/status", get(status_handler))
        .route("/send", post(send_handler))
        .route("/api/claude/hook", post(raise_hook_handler))
        .route("/api/claude/result/{id}", get(hook_result_handler))
        .route("/api/poll", get(agent_poll_handler))
        .route("/api/result/{id}", post(agent_result_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn run(port: u16) -> anyhow::Result<()> {
    let app = app_router(AppState::default());

    let addr = format!("0.0.0.0:{port}");
    println!("pcremote server running at http://localhost:{port}");
    println!("Press Ctrl+C to stop.\n");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

// ── Approval queue ──────────────────────────────────────────────────────────

async fn pending_handler(State(state): State<AppState>) -> Json<PendingResponse> {
    let pending = state.hooks.read().await.pending();
    Json(PendingResponse { pending })
}

async fn decide_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DecideBody>,
) -> Json<OkResponse> {
    // Unknown ids are accepted silently; the client resyncs either way.
    let waited = state.hooks.write().await.decide(&id, body.approved);
    tracing::info!(
        id = %id,
        approved = body.approved,
        known = waited.is_some(),
        waited_secs = waited.map(|w| w.num_seconds()),
        "decision recorded"
    );
    Json(OkResponse { ok: true })
}

async fn raise_hook_handler(
    State(state): State<AppState>,
    Json(body): Json<HookBody>,
) -> Json<HookCreated> {
    let tool = body.tool;
    let hook_id = state
        .hooks
        .write()
        .await
        .raise(tool.clone(), body.description);
    tracing::info!(id = %hook_id, tool = %tool, "approval requested");
    Json(HookCreated { ok: true, hook_id })
}

async fn hook_result_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<HookResult> {
    Json(state.hooks.read().await.result(&id))
}

// ── Command relay ───────────────────────────────────────────────────────────

async fn commands_handler(State(state): State<AppState>) -> Json<CommandList> {
    Json(CommandList {
        commands: state.catalog.as_ref().clone(),
    })
}

async fn execute_handler(
    State(state): State<AppState>,
    Json(body): Json<ExecuteBody>,
) -> Result<Json<ExecuteResult>, ApiError> {
    if !state.catalog.iter().any(|c| c.key == body.command) {
        return Err(ApiError::bad_request("Unknown command"));
    }

    let wait = state.execute_wait;
    let result = relay(&state, &body.command, None, wait)
        .await
        .unwrap_or_else(|| ExecuteResult {
            ok: false,
            output: TIMEOUT_OUTPUT.to_string(),
        });
    Ok(Json(result))
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    let wait = state.status_wait;
    let report = match relay(&state, "system_info", None, wait).await {
        Some(result) => StatusReport {
            ok: true,
            info: result.output,
        },
        None => StatusReport {
            ok: false,
            info: STATUS_TIMEOUT_INFO.to_string(),
        },
    };
    Json(report)
}

async fn send_handler(
    State(state): State<AppState>,
    Json(body): Json<SendBody>,
) -> Result<Json<ExecuteResult>, ApiError> {
    if body.text.trim().is_empty() {
        return Err(ApiError::bad_request("Text is empty"));
    }

    let wait = state.execute_wait;
    let result = relay(&state, "type_text", Some(body.text), wait)
        .await
        .unwrap_or_else(|| ExecuteResult {
            ok: false,
            output: TIMEOUT_OUTPUT.to_string(),
        });
    Ok(Json(result))
}

async fn agent_poll_handler(State(state): State<AppState>) -> Json<AgentPoll> {
    let commands = state.commands.lock().await.dispatch();
    Json(AgentPoll { commands })
}

async fn agent_result_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(result): Json<ExecuteResult>,
) -> Json<OkResponse> {
    let delivered = state.commands.lock().await.complete(&id, result);
    if !delivered {
        tracing::debug!(id = %id, "result arrived after the requester gave up");
    }
    Json(OkResponse { ok: true })
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Queue a command for the agent and wait for its result. `None` on timeout.
async fn relay(
    state: &AppState,
    key: &str,
    text: Option<String>,
    wait: Duration,
) -> Option<ExecuteResult> {
    let (id, rx) = state.commands.lock().await.enqueue(key, text);
    tracing::debug!(id = %id, key, "command queued for agent");

    match tokio::time::timeout(wait, rx).await {
        Ok(Ok(result)) => Some(result),
        _ => {
            state.commands.lock().await.cancel(&id);
            tracing::info!(id = %id, key, "agent did not answer in time");
            None
        }
    }
}
