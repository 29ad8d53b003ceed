//! Ledger store errors

use thiserror::Error;

use crate::context::DeadlineExceeded;
use crate::transaction::TransactionStatus;

/// Ledger store error
///
/// `NotFound` is a lookup miss, `IllegalTransition` a caller bug; everything
/// else is an infrastructure failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflicting record: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store call exceeded the caller deadline")]
    DeadlineExceeded,

    /// Status writes only move `pending` to a terminal status
    #[error("Illegal status transition: pending -> {0}")]
    IllegalTransition(TransactionStatus),
}

impl StoreError {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<DeadlineExceeded> for StoreError {
    fn from(_: DeadlineExceeded) -> Self {
        StoreError::DeadlineExceeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_lookup_miss() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_pool_timeout_is_infrastructure() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(!err.is_not_found());
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_deadline_conversion() {
        let err: StoreError = DeadlineExceeded.into();
        assert_eq!(err, StoreError::DeadlineExceeded);
    }
}
