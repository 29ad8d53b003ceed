use thiserror::Error;

use crate::ledger::StoreError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Username or email already exists")]
    AlreadyExists,

    #[error("No wallet handle available")]
    WalletHandlesExhausted,

    #[error("Account not found")]
    NotFound,

    #[error("Database error: {0}")]
    Store(String),
}

impl AccountError {
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::InvalidInput(_) => "INVALID_INPUT",
            AccountError::AlreadyExists => "ACCOUNT_EXISTS",
            AccountError::WalletHandlesExhausted => "WALLET_HANDLES_EXHAUSTED",
            AccountError::NotFound => "ACCOUNT_NOT_FOUND",
            AccountError::Store(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AccountError::InvalidInput(_) => 400,
            AccountError::NotFound => 404,
            AccountError::AlreadyExists => 409,
            AccountError::WalletHandlesExhausted => 503,
            AccountError::Store(_) => 500,
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AccountError::NotFound,
            StoreError::Conflict(_) => AccountError::AlreadyExists,
            other => AccountError::Store(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AccountError {
    fn from(e: validator::ValidationErrors) -> Self {
        AccountError::InvalidInput(e.to_string())
    }
}
