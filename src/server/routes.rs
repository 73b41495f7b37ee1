//! HTTP routes for account operations

use alloy_primitives::Address;
use axum::{extract::{Query, State}, http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::account::PlasmaAccount;
use crate::console::ALREADY_INITIALIZED;
use crate::error::PlasmaError;
use crate::service::service_check;
use crate::types::{amount_serde, Amount, Currency, ETH_CURRENCY};

#[derive(Clone)]
pub struct AppState { pub account: Arc<PlasmaAccount>, pub app_name: String }

impl AppState {
    pub fn new(account: Arc<PlasmaAccount>, app_name: impl Into<String>) -> Self {
        Self { account, app_name: app_name.into() }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

#[derive(Deserialize)]
pub struct InitRequest { #[serde(default)] force: bool }

#[derive(Deserialize)]
pub struct DepositRequest {
    #[serde(with = "amount_serde")]
    amount: Amount,
    #[serde(default = "eth")]
    currency: Currency,
    #[serde(default)]
    approve: bool,
}

#[derive(Deserialize)]
pub struct TransferRequest {
    to: Address,
    #[serde(with = "amount_serde")]
    amount: Amount,
    #[serde(default = "eth")]
    currency: Currency,
}

fn eth() -> Currency { ETH_CURRENCY }

#[derive(Deserialize)]
pub struct TransactionsQuery { #[serde(default = "default_limit")] limit: usize }
fn default_limit() -> usize { 50 }

#[derive(Serialize)]
pub struct MessageResponse { message: String }

#[derive(Serialize)]
pub struct ExitResponse { messages: Vec<String>, count: usize }

pub fn create_router(account: Arc<PlasmaAccount>, app_name: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/balance", get(balance))
        .route("/utxos", get(utxos))
        .route("/transactions", get(transactions))
        .route("/init", post(init))
        .route("/deposit", post(deposit))
        .route("/transfer", post(transfer))
        .route("/exit", post(exit))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(account, app_name))
}

fn error_response(e: PlasmaError) -> (StatusCode, String) {
    let status = match &e {
        PlasmaError::NotInitialized | PlasmaError::AlreadyInitializing => StatusCode::CONFLICT,
        PlasmaError::InvalidAmount { .. }
        | PlasmaError::InsufficientFunds { .. }
        | PlasmaError::NoUtxoLargeEnough { .. }
        | PlasmaError::NoFeeUtxoAvailable
        | PlasmaError::InvalidTransaction(_) => StatusCode::BAD_REQUEST,
        PlasmaError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PlasmaError::Config(_) | PlasmaError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

async fn health(State(s): State<AppState>) -> impl IntoResponse {
    let plasma = service_check(s.account.root().as_ref()).await;
    Json(json!({"status": "ok", "service": s.app_name, "plasma": plasma}))
}

async fn status(State(s): State<AppState>) -> ApiResult<Value> {
    let state = s.account.state().map_err(error_response)?;
    Ok(Json(json!(state)))
}

async fn balance(State(s): State<AppState>) -> ApiResult<Value> {
    let state = s.account.refresh_balances().await.map_err(error_response)?;
    Ok(Json(json!(state)))
}

async fn utxos(State(s): State<AppState>) -> ApiResult<Value> {
    let utxos = s.account.utxos().await.map_err(error_response)?;
    Ok(Json(json!({"count": utxos.len(), "utxos": utxos})))
}

async fn transactions(State(s): State<AppState>, Query(q): Query<TransactionsQuery>) -> ApiResult<Value> {
    let txs = s.account.transactions(q.limit).await.map_err(error_response)?;
    Ok(Json(json!({"count": txs.len(), "transactions": txs})))
}

async fn init(State(s): State<AppState>, body: Option<Json<InitRequest>>) -> ApiResult<MessageResponse> {
    let force = body.map(|Json(req)| req.force).unwrap_or(false);
    if s.account.is_ready() && !force {
        return Err((StatusCode::CONFLICT, ALREADY_INITIALIZED.to_string()));
    }
    let message = s.account.initialize().await.map_err(error_response)?;
    Ok(Json(MessageResponse { message }))
}

async fn deposit(State(s): State<AppState>, Json(req): Json<DepositRequest>) -> ApiResult<MessageResponse> {
    let message = s.account.deposit(req.amount, req.currency, req.approve).await.map_err(error_response)?;
    Ok(Json(MessageResponse { message }))
}

async fn transfer(State(s): State<AppState>, Json(req): Json<TransferRequest>) -> ApiResult<MessageResponse> {
    let message = s.account.transfer(req.to, req.amount, req.currency).await.map_err(error_response)?;
    Ok(Json(MessageResponse { message }))
}

async fn exit(State(s): State<AppState>) -> ApiResult<ExitResponse> {
    let messages = s.account.exit().await.map_err(error_response)?;
    Ok(Json(ExitResponse { count: messages.len(), messages }))
}
