//! In-memory ledger store
//!
//! Used when no PostgreSQL URL is configured, and by tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LedgerStore, StoreError, ensure_transition};
use crate::account::{Account, NewAccount};
use crate::context::CallContext;
use crate::transaction::{NewTransaction, Transaction, TransactionStatus};

#[derive(Default)]
pub struct MemoryLedgerStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
    transactions: RwLock<HashMap<Uuid, Transaction>>,
}

fn live(ctx: &CallContext) -> Result<(), StoreError> {
    if ctx.is_expired() {
        Err(StoreError::DeadlineExceeded)
    } else {
        Ok(())
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: overwrite `updated_at` to simulate an old record.
    #[cfg(test)]
    pub async fn backdate(&self, id: Uuid, by: Duration) {
        if let Some(tx) = self.transactions.write().await.get_mut(&id) {
            tx.updated_at -= chrono::Duration::from_std(by).unwrap();
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get_account(&self, ctx: &CallContext, id: Uuid) -> Result<Account, StoreError> {
        live(ctx)?;
        self.accounts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_account(
        &self,
        ctx: &CallContext,
        new: &NewAccount,
    ) -> Result<Account, StoreError> {
        live(ctx)?;
        let mut accounts = self.accounts.write().await;
        if accounts
            .values()
            .any(|a| a.username == new.username || a.email == new.email)
        {
            return Err(StoreError::Conflict(format!(
                "account {} already exists",
                new.username
            )));
        }
        let account = Account::from_new(Uuid::new_v4(), new, Utc::now());
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account_by_username(
        &self,
        ctx: &CallContext,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        live(ctx)?;
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_account_by_email(
        &self,
        ctx: &CallContext,
        email: &str,
    ) -> Result<Option<Account>, StoreError> {
        live(ctx)?;
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn set_account_balance(
        &self,
        ctx: &CallContext,
        id: Uuid,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        live(ctx)?;
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.balance = balance;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn create_transaction(
        &self,
        ctx: &CallContext,
        new: &NewTransaction,
    ) -> Result<Transaction, StoreError> {
        live(ctx)?;
        let tx = Transaction::pending(Uuid::new_v4(), new, Utc::now());
        self.transactions.write().await.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn update_transaction(
        &self,
        ctx: &CallContext,
        tx: &Transaction,
    ) -> Result<bool, StoreError> {
        live(ctx)?;
        ensure_transition(tx.status)?;
        let mut transactions = self.transactions.write().await;
        let stored = transactions.get_mut(&tx.id).ok_or(StoreError::NotFound)?;
        if stored.status != TransactionStatus::Pending {
            return Ok(false);
        }
        stored.status = tx.status;
        stored.settlement_ref = tx.settlement_ref.clone();
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_transaction_status(
        &self,
        ctx: &CallContext,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<bool, StoreError> {
        live(ctx)?;
        ensure_transition(status)?;
        let mut transactions = self.transactions.write().await;
        let stored = transactions.get_mut(&id).ok_or(StoreError::NotFound)?;
        if stored.status != TransactionStatus::Pending {
            return Ok(false);
        }
        stored.status = status;
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn get_transaction(
        &self,
        ctx: &CallContext,
        id: Uuid,
    ) -> Result<Transaction, StoreError> {
        live(ctx)?;
        self.transactions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_transactions(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StoreError> {
        live(ctx)?;
        let mut list: Vec<Transaction> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn settle(
        &self,
        ctx: &CallContext,
        tx: &Transaction,
        balance: Decimal,
    ) -> Result<bool, StoreError> {
        live(ctx)?;
        ensure_transition(tx.status)?;
        // Both maps locked so the pair of writes is observed atomically
        let mut transactions = self.transactions.write().await;
        let mut accounts = self.accounts.write().await;

        let stored = transactions.get_mut(&tx.id).ok_or(StoreError::NotFound)?;
        if stored.status != TransactionStatus::Pending {
            return Ok(false);
        }
        let account = accounts
            .get_mut(&tx.account_id)
            .ok_or(StoreError::NotFound)?;

        let now = Utc::now();
        stored.status = tx.status;
        stored.settlement_ref = tx.settlement_ref.clone();
        stored.updated_at = now;
        account.balance = balance;
        account.updated_at = now;
        Ok(true)
    }

    async fn find_stale_pending(
        &self,
        ctx: &CallContext,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<Transaction>, StoreError> {
        live(ctx)?;
        let cutoff = Utc::now()
            - chrono::Duration::from_std(older_than)
                .map_err(|e| StoreError::Database(e.to_string()))?;
        let mut stale: Vec<Transaction> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|t| t.status == TransactionStatus::Pending && t.updated_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        stale.truncate(limit);
        Ok(stale)
    }

    async fn ping(&self, ctx: &CallContext) -> Result<(), StoreError> {
        live(ctx)
    }
}
