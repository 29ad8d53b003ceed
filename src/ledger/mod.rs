//! Ledger store
//!
//! Durable records of accounts (with their cached balance) and transactions.
//! No business rules live here beyond the `pending`-only guard on status
//! writes; the orchestrator decides what to write and when.
//!
//! Two implementations:
//! - [`PgLedgerStore`]: PostgreSQL via sqlx
//! - [`MemoryLedgerStore`]: process-local, used when no database is configured

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::account::{Account, NewAccount};
use crate::context::CallContext;
use crate::transaction::{NewTransaction, Transaction, TransactionStatus};

/// Refuse any status write that is not `pending` -> terminal.
pub(crate) fn ensure_transition(to: TransactionStatus) -> Result<(), StoreError> {
    if TransactionStatus::Pending.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::IllegalTransition(to))
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_account(&self, ctx: &CallContext, id: Uuid) -> Result<Account, StoreError>;

    /// Fails with `Conflict` when the username or email is taken.
    async fn create_account(
        &self,
        ctx: &CallContext,
        new: &NewAccount,
    ) -> Result<Account, StoreError>;

    async fn find_account_by_username(
        &self,
        ctx: &CallContext,
        username: &str,
    ) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_email(
        &self,
        ctx: &CallContext,
        email: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Overwrite the cached balance.
    async fn set_account_balance(
        &self,
        ctx: &CallContext,
        id: Uuid,
        balance: Decimal,
    ) -> Result<(), StoreError>;

    /// Insert a `pending` record; the store assigns the id.
    async fn create_transaction(
        &self,
        ctx: &CallContext,
        new: &NewTransaction,
    ) -> Result<Transaction, StoreError>;

    /// Write status and settlement fields of `tx`.
    ///
    /// Applies only while the stored record is still `pending`; returns
    /// `false` when it had already left `pending`. A non-terminal target is
    /// `IllegalTransition`.
    async fn update_transaction(
        &self,
        ctx: &CallContext,
        tx: &Transaction,
    ) -> Result<bool, StoreError>;

    /// Move a `pending` record to the terminal `status`.
    ///
    /// Returns `false` when the record was no longer `pending`. A non-terminal
    /// target is `IllegalTransition`.
    async fn set_transaction_status(
        &self,
        ctx: &CallContext,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<bool, StoreError>;

    async fn get_transaction(&self, ctx: &CallContext, id: Uuid)
    -> Result<Transaction, StoreError>;

    /// Newest first.
    async fn list_transactions(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Record a confirmed settlement: the transaction update and the balance
    /// overwrite. Returns `false` (and writes nothing) when the transaction
    /// had already left `pending`.
    async fn settle(
        &self,
        ctx: &CallContext,
        tx: &Transaction,
        balance: Decimal,
    ) -> Result<bool, StoreError> {
        ensure_transition(tx.status)?;
        if !self.update_transaction(ctx, tx).await? {
            return Ok(false);
        }
        self.set_account_balance(ctx, tx.account_id, balance).await?;
        Ok(true)
    }

    /// `pending` records not touched for at least `older_than`, oldest first.
    async fn find_stale_pending(
        &self,
        ctx: &CallContext,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<Transaction>, StoreError>;

    async fn ping(&self, ctx: &CallContext) -> Result<(), StoreError>;
}
