//! HTTP handlers
//!
//! Wallet-touching workflows run on a spawned task: once started they finish
//! their ledger bookkeeping even if the client disconnects.

pub mod accounts;
pub mod health;
pub mod transactions;

pub use accounts::{get_balance, get_history, get_profile, register_account};
pub use health::{HealthResponse, health_check};
pub use transactions::{cancel_transaction, deposit, get_transaction, withdraw};

use std::future::Future;

use uuid::Uuid;

use super::types::ApiError;
use crate::transaction::TransactionError;

/// Run an orchestrator workflow detached from the request future.
pub(crate) async fn run_detached<F, T>(workflow: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, TransactionError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(workflow).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            tracing::error!(error = %e, "Workflow task aborted");
            Err(ApiError::internal())
        }
    }
}

pub(crate) fn parse_transaction_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid transaction ID"))
}
