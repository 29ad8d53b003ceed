//! Deposit, withdraw and cancel handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use validator::Validate;

use super::{parse_transaction_id, run_detached};
use crate::gateway::middleware::AuthenticatedAccount;
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiError, ApiResult, DepositRequest, WithdrawRequest, created, ok};
use crate::transaction::{
    Currency, DepositCommand, Transaction, TransactionReceipt, WithdrawCommand,
};

/// Credit the caller at the wallet
///
/// POST /api/v1/transactions/deposit
#[utoipa::path(
    post,
    path = "/api/v1/transactions/deposit",
    request_body = DepositRequest,
    responses(
        (status = 201, description = "Deposit settled", body = TransactionReceipt, content_type = "application/json"),
        (status = 400, description = "Invalid amount, currency or provider transaction id"),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal or indeterminate failure"),
        (status = 504, description = "Deadline exceeded")
    ),
    security(("account_id" = [])),
    tag = "Transactions"
)]
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<TransactionReceipt> {
    req.validate()?;
    let cmd = DepositCommand {
        currency: Currency::new(&req.currency).map_err(ApiError::from)?,
        amount: req.amount.inner(),
        provider_tx_id: req.provider_transaction_id,
        provider_withdrawn_id: req
            .provider_withdrawn_id
            .filter(|id| !id.trim().is_empty()),
    };
    tracing::info!(
        account_id = %caller.account_id,
        amount = %cmd.amount,
        currency = %cmd.currency,
        "Processing deposit"
    );

    let ctx = state.call_context();
    let orchestrator = state.orchestrator.clone();
    let receipt =
        run_detached(async move { orchestrator.deposit(&ctx, caller.account_id, cmd).await })
            .await?;
    created(receipt)
}

/// Debit the caller at the wallet
///
/// POST /api/v1/transactions/withdraw
#[utoipa::path(
    post,
    path = "/api/v1/transactions/withdraw",
    request_body = WithdrawRequest,
    responses(
        (status = 201, description = "Withdrawal settled", body = TransactionReceipt, content_type = "application/json"),
        (status = 400, description = "Invalid amount, currency or provider transaction id"),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Insufficient balance"),
        (status = 500, description = "Internal or indeterminate failure"),
        (status = 504, description = "Deadline exceeded")
    ),
    security(("account_id" = [])),
    tag = "Transactions"
)]
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Json(req): Json<WithdrawRequest>,
) -> ApiResult<TransactionReceipt> {
    req.validate()?;
    let cmd = WithdrawCommand {
        currency: Currency::new(&req.currency).map_err(ApiError::from)?,
        amount: req.amount.inner(),
        provider_tx_id: req.provider_transaction_id,
    };
    tracing::info!(
        account_id = %caller.account_id,
        amount = %cmd.amount,
        currency = %cmd.currency,
        "Processing withdraw"
    );

    let ctx = state.call_context();
    let orchestrator = state.orchestrator.clone();
    let receipt =
        run_detached(async move { orchestrator.withdraw(&ctx, caller.account_id, cmd).await })
            .await?;
    created(receipt)
}

/// Cancel a pending transaction
///
/// POST /api/v1/transactions/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/cancel",
    params(("id" = String, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction canceled", body = TransactionReceipt, content_type = "application/json"),
        (status = 400, description = "Invalid id or transaction not pending"),
        (status = 403, description = "Transaction belongs to another account"),
        (status = 404, description = "Transaction not found")
    ),
    security(("account_id" = [])),
    tag = "Transactions"
)]
pub async fn cancel_transaction(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> ApiResult<TransactionReceipt> {
    let transaction_id = parse_transaction_id(&id)?;
    tracing::info!(
        account_id = %caller.account_id,
        transaction_id = %transaction_id,
        "Processing cancel"
    );

    let ctx = state.call_context();
    let orchestrator = state.orchestrator.clone();
    let receipt = run_detached(async move {
        orchestrator
            .cancel(&ctx, caller.account_id, transaction_id)
            .await
    })
    .await?;
    ok(receipt)
}

/// Read one of the caller's transactions
///
/// GET /api/v1/transactions/{id}
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    params(("id" = String, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction record", body = Transaction, content_type = "application/json"),
        (status = 403, description = "Transaction belongs to another account"),
        (status = 404, description = "Transaction not found")
    ),
    security(("account_id" = [])),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Path(id): Path<String>,
) -> ApiResult<Transaction> {
    let transaction_id = parse_transaction_id(&id)?;
    let ctx = state.call_context();
    let tx = state
        .orchestrator
        .get_transaction(&ctx, caller.account_id, transaction_id)
        .await?;
    ok(tx)
}
