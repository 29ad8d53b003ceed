//! Transaction error taxonomy
//!
//! Client-fault errors are resolved locally and never retried. A wallet
//! rejection carries the remote status and message for pass-through.
//! `Indeterminate` means the ledger may disagree with the wallet and the
//! record needs manual reconciliation.

use thiserror::Error;
use uuid::Uuid;

use super::state::TransactionStatus;
use crate::ledger::StoreError;
use crate::wallet::WalletError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    // === Validation Errors ===
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    // === Lookup Errors ===
    #[error("Account not found")]
    AccountNotFound,

    #[error("Transaction not found")]
    TransactionNotFound,

    // === Business Rule Errors ===
    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Transaction belongs to another account")]
    Unauthorized,

    #[error("Transaction is not in pending status (current: {0})")]
    TransactionNotPending(TransactionStatus),

    // === Remote Errors ===
    #[error("Wallet rejected the operation ({status}): {message}")]
    WalletRejected { status: u16, message: String },

    // === System Errors ===
    #[error("Transaction {transaction_id} is in an indeterminate state: {reason}")]
    Indeterminate { transaction_id: Uuid, reason: String },

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl TransactionError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransactionError::InvalidAmount => "INVALID_AMOUNT",
            TransactionError::InvalidCurrency(_) => "INVALID_CURRENCY",
            TransactionError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            TransactionError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            TransactionError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransactionError::Unauthorized => "UNAUTHORIZED",
            TransactionError::TransactionNotPending(_) => "TRANSACTION_NOT_PENDING",
            TransactionError::WalletRejected { .. } => "WALLET_ERROR",
            TransactionError::Indeterminate { .. } => "INDETERMINATE_STATE",
            TransactionError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            TransactionError::Infrastructure(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransactionError::InvalidAmount
            | TransactionError::InvalidCurrency(_)
            | TransactionError::TransactionNotPending(_) => 400,
            TransactionError::Unauthorized => 403,
            TransactionError::AccountNotFound | TransactionError::TransactionNotFound => 404,
            TransactionError::InsufficientBalance => 409,
            TransactionError::WalletRejected { status, .. } => *status,
            TransactionError::Indeterminate { .. } | TransactionError::Infrastructure(_) => 500,
            TransactionError::DeadlineExceeded => 504,
        }
    }

    /// Errors the client caused and can fix; everything else is a server fault.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            TransactionError::InvalidAmount
                | TransactionError::InvalidCurrency(_)
                | TransactionError::AccountNotFound
                | TransactionError::TransactionNotFound
                | TransactionError::InsufficientBalance
                | TransactionError::Unauthorized
                | TransactionError::TransactionNotPending(_)
        )
    }
}

impl From<StoreError> for TransactionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DeadlineExceeded => TransactionError::DeadlineExceeded,
            other => TransactionError::Infrastructure(other.to_string()),
        }
    }
}

impl From<WalletError> for TransactionError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::Rejected { status, message } => {
                TransactionError::WalletRejected { status, message }
            }
            WalletError::Timeout => TransactionError::DeadlineExceeded,
            other => TransactionError::Infrastructure(other.to_string()),
        }
    }
}
