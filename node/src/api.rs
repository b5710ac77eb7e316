//! # REST + JSON-RPC API
//!
//! Builds the axum router that exposes the vault engine over HTTP. All
//! endpoints share application state through axum's `State` extractor.
//!
//! Caller identity comes from the `x-caller-principal` header, set by the
//! authenticating proxy in front of the node. The node does not verify it;
//! a request without it is rejected with 401.
//!
//! ## Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/health`              | Liveness probe                       |
//! | GET    | `/plans`               | Caller's plans, closed ones included |
//! | POST   | `/plans`               | Create a plan                        |
//! | GET    | `/plans/:id`           | One plan (owner only)                |
//! | GET    | `/plans/:id/quote`     | Withdrawal preview, no state change  |
//! | POST   | `/plans/:id/withdraw`  | Withdraw and close a plan            |
//! | POST   | `/rpc`                 | JSON-RPC 2.0 gateway                 |

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use saving_vault::config::CALLER_PRINCIPAL_HEADER;
use saving_vault::{
    Clock, CreatePlanInput, Principal, SavingsError, SavingsErrorKind, SavingsPlan, SavingsResult,
    VaultDB, VaultEngine,
};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// The engine as the node runs it: sled ledger, injectable clock.
pub type NodeEngine = VaultEngine<VaultDB, Arc<dyn Clock + Send + Sync>>;

/// Shared application state available to all request handlers.
///
/// The engine sits behind a mutex so that calls run one at a time against
/// the ledger. Engine calls run on tokio's blocking pool (sled flushes to
/// disk on every write) and hold the lock for exactly one call.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    pub engine: Arc<Mutex<NodeEngine>>,
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/plans", get(list_plans_handler).post(create_plan_handler))
        .route("/plans/:id", get(get_plan_handler))
        .route("/plans/:id/quote", get(quote_handler))
        .route("/plans/:id/withdraw", post(withdraw_handler))
        .route("/rpc", post(rpc_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error body returned by REST endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// `SavingsErrorKind` name, or `Unauthenticated`.
    pub kind: String,
    pub message: String,
}

/// A REST failure: status code plus [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn unauthenticated() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorResponse {
                kind: "Unauthenticated".into(),
                message: format!("missing {CALLER_PRINCIPAL_HEADER} header"),
            },
        }
    }
}

/// HTTP status for each engine error kind.
pub fn status_for(kind: SavingsErrorKind) -> StatusCode {
    match kind {
        SavingsErrorKind::InvalidAmount | SavingsErrorKind::InvalidPlanDuration => {
            StatusCode::BAD_REQUEST
        }
        SavingsErrorKind::UnauthorizedAccess => StatusCode::FORBIDDEN,
        SavingsErrorKind::PlanNotFound => StatusCode::NOT_FOUND,
        SavingsErrorKind::WithdrawalBeforeMaturity => StatusCode::CONFLICT,
        SavingsErrorKind::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
        SavingsErrorKind::ArithmeticOverflow | SavingsErrorKind::Storage => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<SavingsError> for ApiError {
    fn from(err: SavingsError) -> Self {
        let kind = err.kind();
        if status_for(kind).is_server_error() {
            tracing::error!(%kind, "engine failure: {}", err);
        }
        Self {
            status: status_for(kind),
            body: ErrorResponse {
                kind: kind.to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        tracing::error!("engine task failed: {}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                kind: "Internal".into(),
                message: "engine task failed".into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Reads the caller principal set by the upstream proxy.
fn caller_from(headers: &HeaderMap) -> Result<Principal, ApiError> {
    headers
        .get(CALLER_PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Principal::new)
        .ok_or_else(ApiError::unauthenticated)
}

// ---------------------------------------------------------------------------
// Engine Calls
// ---------------------------------------------------------------------------
//
// REST and JSON-RPC both go through these so metrics stay consistent.

/// Runs `call` on the blocking pool with its own handle to the state.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, JoinError>
where
    F: FnOnce(&AppState) -> T + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || call(&state)).await
}

fn create_plan(
    state: &AppState,
    caller: &Principal,
    input: CreatePlanInput,
) -> SavingsResult<SavingsPlan> {
    let _timer = state.metrics.request_latency_seconds.start_timer();
    let plan = state.engine.lock().create_savings_plan(caller, input)?;
    state.metrics.plans_created_total.inc();
    Ok(plan)
}

fn list_plans(state: &AppState, caller: &Principal) -> SavingsResult<Vec<SavingsPlan>> {
    let _timer = state.metrics.request_latency_seconds.start_timer();
    state.engine.lock().get_user_plans(caller)
}

fn withdraw(state: &AppState, caller: &Principal, plan_id: &str) -> SavingsResult<u64> {
    let _timer = state.metrics.request_latency_seconds.start_timer();
    let result = state.engine.lock().withdraw_from_plan(caller, plan_id);
    match &result {
        Ok(payout) => {
            state.metrics.withdrawals_total.inc();
            state.metrics.payout_amount_total.inc_by(*payout);
        }
        Err(_) => state.metrics.withdrawals_rejected_total.inc(),
    }
    result
}

// ---------------------------------------------------------------------------
// REST Handlers
// ---------------------------------------------------------------------------

/// Response payload for `POST /plans/:id/withdraw`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResponse {
    pub plan_id: String,
    pub payout_amount: u64,
}

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /plans`: every plan the caller owns.
async fn list_plans_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from(&headers)?;
    let plans = blocking(&state, move |s| list_plans(s, &caller)).await??;
    Ok(Json(plans))
}

/// `POST /plans`: open a new plan for the caller.
async fn create_plan_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreatePlanInput>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from(&headers)?;
    let plan = blocking(&state, move |s| create_plan(s, &caller, input)).await??;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// `GET /plans/:id`: one plan, owner only.
async fn get_plan_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from(&headers)?;
    let plan = blocking(&state, move |s| s.engine.lock().get_plan(&caller, &id)).await??;
    Ok(Json(plan))
}

/// `GET /plans/:id/quote`: what a withdrawal would pay right now.
async fn quote_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from(&headers)?;
    let quote =
        blocking(&state, move |s| s.engine.lock().quote_withdrawal(&caller, &id)).await??;
    Ok(Json(quote))
}

/// `POST /plans/:id/withdraw`: close the plan and pay out.
async fn withdraw_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let caller = caller_from(&headers)?;
    let plan_id = id.clone();
    let payout_amount = blocking(&state, move |s| withdraw(s, &caller, &plan_id)).await??;
    Ok(Json(WithdrawResponse {
        plan_id: id,
        payout_amount,
    }))
}

// ---------------------------------------------------------------------------
// JSON-RPC
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<serde_json::Value>,
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Engine rejections (bad input, not found, not yours, too early).
pub const RPC_SAVINGS_ERROR: i32 = -32000;
/// Missing caller principal.
pub const RPC_UNAUTHENTICATED: i32 = -32001;

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn invalid_params(expected: &str) -> Self {
        Self::new(-32602, format!("Invalid params: expected {expected}"))
    }
}

impl From<SavingsError> for JsonRpcError {
    fn from(err: SavingsError) -> Self {
        let kind = err.kind();
        let code = if status_for(kind).is_server_error() {
            -32603
        } else {
            RPC_SAVINGS_ERROR
        };
        Self {
            code,
            message: err.to_string(),
            data: Some(serde_json::json!({ "kind": kind })),
        }
    }
}

/// First positional param, or the whole params value if it's an object.
fn single_param(params: &Option<serde_json::Value>) -> Option<&serde_json::Value> {
    match params.as_ref()? {
        serde_json::Value::Array(arr) => arr.first(),
        other => Some(other),
    }
}

fn to_result<T: Serialize>(value: T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(-32603, format!("Internal error: {e}")))
}

fn dispatch_rpc(
    state: &AppState,
    caller: &Principal,
    req: &JsonRpcRequest,
) -> Result<serde_json::Value, JsonRpcError> {
    match req.method.as_str() {
        "createSavingsPlan" => {
            // Expects params: [{ planType, amount, durationDays }] or the object itself.
            let input: CreatePlanInput = single_param(&req.params)
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .ok_or_else(|| JsonRpcError::invalid_params("[{planType, amount, durationDays}]"))?;
            to_result(create_plan(state, caller, input)?)
        }
        "getUserPlans" => to_result(list_plans(state, caller)?),
        "withdrawFromPlan" => {
            // Expects params: [planId] or { "planId": ... }
            let plan_id = single_param(&req.params)
                .and_then(|v| v.as_str().or_else(|| v.get("planId").and_then(|p| p.as_str())))
                .map(str::to_string)
                .ok_or_else(|| JsonRpcError::invalid_params("[planId]"))?;
            to_result(withdraw(state, caller, &plan_id)?)
        }
        _ => Err(JsonRpcError::new(
            -32601,
            format!("Method not found: {}", req.method),
        )),
    }
}

/// `POST /rpc`: JSON-RPC 2.0 gateway.
///
/// Methods: `createSavingsPlan`, `getUserPlans`, `withdrawFromPlan`.
/// Unknown methods return error code -32601 (Method not found).
async fn rpc_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let id = req.id.clone();
    let outcome = if req.jsonrpc != "2.0" {
        Err(JsonRpcError::new(
            -32600,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ))
    } else {
        match caller_from(&headers) {
            Ok(caller) => blocking(&state, move |s| dispatch_rpc(s, &caller, &req))
                .await
                .unwrap_or_else(|e| Err(JsonRpcError::new(-32603, format!("Internal error: {e}")))),
            Err(e) => Err(JsonRpcError::new(RPC_UNAUTHENTICATED, e.body.message)),
        }
    };

    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e)),
    };
    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
