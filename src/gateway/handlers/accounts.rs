//! Account registration and account queries

use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use crate::gateway::middleware::AuthenticatedAccount;
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResult, created, ok};
use crate::account::{Account, BalanceView, RegisterAccount};
use crate::transaction::Transaction;

/// Register a player account
///
/// POST /api/v1/accounts
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = RegisterAccount,
    responses(
        (status = 201, description = "Account created", body = Account, content_type = "application/json"),
        (status = 400, description = "Invalid username or email"),
        (status = 409, description = "Username or email already exists"),
        (status = 503, description = "No wallet handle available")
    ),
    tag = "Account"
)]
pub async fn register_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterAccount>,
) -> ApiResult<Account> {
    let ctx = state.call_context();
    let account = state.accounts.register(&ctx, req).await?;
    created(account)
}

/// GET /api/v1/account/profile
#[utoipa::path(
    get,
    path = "/api/v1/account/profile",
    responses(
        (status = 200, description = "Account profile", body = Account, content_type = "application/json"),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Account not found")
    ),
    security(("account_id" = [])),
    tag = "Account"
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedAccount>,
) -> ApiResult<Account> {
    let ctx = state.call_context();
    ok(state.accounts.profile(&ctx, caller.account_id).await?)
}

/// Cached balance, as last confirmed by the wallet
///
/// GET /api/v1/account/balance
#[utoipa::path(
    get,
    path = "/api/v1/account/balance",
    responses(
        (status = 200, description = "Cached balance", body = BalanceView, content_type = "application/json"),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Account not found")
    ),
    security(("account_id" = [])),
    tag = "Account"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedAccount>,
) -> ApiResult<BalanceView> {
    let ctx = state.call_context();
    ok(state.accounts.balance(&ctx, caller.account_id).await?)
}

/// Transaction history, newest first
///
/// GET /api/v1/account/transactions
#[utoipa::path(
    get,
    path = "/api/v1/account/transactions",
    responses(
        (status = 200, description = "Transaction history", body = Vec<Transaction>, content_type = "application/json"),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Account not found")
    ),
    security(("account_id" = [])),
    tag = "Account"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedAccount>,
) -> ApiResult<Vec<Transaction>> {
    let ctx = state.call_context();
    ok(state.accounts.history(&ctx, caller.account_id).await?)
}
