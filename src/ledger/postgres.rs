//! PostgreSQL ledger store
//!
//! Expects two tables (schema is managed outside this crate):
//!
//! ```text
//! accounts_tb     (id UUID PK, wallet_handle BIGINT, username TEXT UNIQUE,
//!                  email TEXT UNIQUE, balance NUMERIC, created_at, updated_at)
//! transactions_tb (id UUID PK, account_id UUID, kind TEXT, amount NUMERIC,
//!                  currency TEXT, status TEXT, reference TEXT,
//!                  linked_reference TEXT NULL, settlement_ref TEXT NULL,
//!                  created_at, updated_at)
//! ```
//!
//! Status writes are compare-and-set on `status = 'pending'`.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{LedgerStore, StoreError, ensure_transition};
use crate::account::{Account, NewAccount};
use crate::context::CallContext;
use crate::transaction::{NewTransaction, Transaction, TransactionStatus};

const ACCOUNT_COLUMNS: &str = "id, wallet_handle, username, email, balance, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, account_id, kind, amount, currency, status, reference, \
     linked_reference, settlement_ref, created_at, updated_at";

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_account(row: &PgRow) -> Result<Account, StoreError> {
        Ok(Account {
            id: row.try_get("id")?,
            wallet_handle: row.try_get("wallet_handle")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            balance: row.try_get("balance")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_transaction(row: &PgRow) -> Result<Transaction, StoreError> {
        let kind: String = row.try_get("kind")?;
        let status: String = row.try_get("status")?;

        Ok(Transaction {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            kind: kind.parse().map_err(StoreError::Corrupt)?,
            amount: row.try_get("amount")?,
            currency: row.try_get("currency")?,
            status: status.parse().map_err(StoreError::Corrupt)?,
            reference: row.try_get("reference")?,
            linked_reference: row.try_get("linked_reference")?,
            settlement_ref: row.try_get("settlement_ref")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn find_account_by(
        &self,
        ctx: &CallContext,
        column: &'static str,
        value: &str,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts_tb WHERE {column} = $1");
        let row = ctx
            .run(sqlx::query(&sql).bind(value).fetch_optional(&self.pool))
            .await??;
        row.as_ref().map(Self::row_to_account).transpose()
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get_account(&self, ctx: &CallContext, id: Uuid) -> Result<Account, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts_tb WHERE id = $1");
        let row = ctx
            .run(sqlx::query(&sql).bind(id).fetch_optional(&self.pool))
            .await??
            .ok_or(StoreError::NotFound)?;
        Self::row_to_account(&row)
    }

    async fn create_account(
        &self,
        ctx: &CallContext,
        new: &NewAccount,
    ) -> Result<Account, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO accounts_tb (id, wallet_handle, username, email, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, NOW(), NOW())
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = ctx
            .run(
                sqlx::query(&sql)
                    .bind(Uuid::new_v4())
                    .bind(new.wallet_handle)
                    .bind(&new.username)
                    .bind(&new.email)
                    .fetch_one(&self.pool),
            )
            .await??;
        Self::row_to_account(&row)
    }

    async fn find_account_by_username(
        &self,
        ctx: &CallContext,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.find_account_by(ctx, "username", username).await
    }

    async fn find_account_by_email(
        &self,
        ctx: &CallContext,
        email: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.find_account_by(ctx, "email", email).await
    }

    async fn set_account_balance(
        &self,
        ctx: &CallContext,
        id: Uuid,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        let result = ctx
            .run(
                sqlx::query("UPDATE accounts_tb SET balance = $1, updated_at = NOW() WHERE id = $2")
                    .bind(balance)
                    .bind(id)
                    .execute(&self.pool),
            )
            .await??;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_transaction(
        &self,
        ctx: &CallContext,
        new: &NewTransaction,
    ) -> Result<Transaction, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO transactions_tb
                (id, account_id, kind, amount, currency, status, reference, linked_reference,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, NOW(), NOW())
            RETURNING {TRANSACTION_COLUMNS}
            "#
        );
        let row = ctx
            .run(
                sqlx::query(&sql)
                    .bind(Uuid::new_v4())
                    .bind(new.account_id)
                    .bind(new.kind.as_str())
                    .bind(new.amount)
                    .bind(new.currency.as_str())
                    .bind(&new.reference)
                    .bind(&new.linked_reference)
                    .fetch_one(&self.pool),
            )
            .await??;
        Self::row_to_transaction(&row)
    }

    async fn update_transaction(
        &self,
        ctx: &CallContext,
        tx: &Transaction,
    ) -> Result<bool, StoreError> {
        ensure_transition(tx.status)?;
        let result = ctx
            .run(
                sqlx::query(
                    r#"
                    UPDATE transactions_tb
                    SET status = $1, settlement_ref = $2, updated_at = NOW()
                    WHERE id = $3 AND status = 'pending'
                    "#,
                )
                .bind(tx.status.as_str())
                .bind(&tx.settlement_ref)
                .bind(tx.id)
                .execute(&self.pool),
            )
            .await??;
        Ok(result.rows_affected() > 0)
    }

    async fn set_transaction_status(
        &self,
        ctx: &CallContext,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<bool, StoreError> {
        ensure_transition(status)?;
        let result = ctx
            .run(
                sqlx::query(
                    r#"
                    UPDATE transactions_tb
                    SET status = $1, updated_at = NOW()
                    WHERE id = $2 AND status = 'pending'
                    "#,
                )
                .bind(status.as_str())
                .bind(id)
                .execute(&self.pool),
            )
            .await??;
        Ok(result.rows_affected() > 0)
    }

    async fn get_transaction(
        &self,
        ctx: &CallContext,
        id: Uuid,
    ) -> Result<Transaction, StoreError> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions_tb WHERE id = $1");
        let row = ctx
            .run(sqlx::query(&sql).bind(id).fetch_optional(&self.pool))
            .await??
            .ok_or(StoreError::NotFound)?;
        Self::row_to_transaction(&row)
    }

    async fn list_transactions(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions_tb \
             WHERE account_id = $1 ORDER BY created_at DESC"
        );
        let rows = ctx
            .run(sqlx::query(&sql).bind(account_id).fetch_all(&self.pool))
            .await??;
        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn settle(
        &self,
        ctx: &CallContext,
        tx: &Transaction,
        balance: Decimal,
    ) -> Result<bool, StoreError> {
        ensure_transition(tx.status)?;
        ctx.run(async {
            let mut db_tx = self.pool.begin().await?;

            let updated = sqlx::query(
                r#"
                UPDATE transactions_tb
                SET status = $1, settlement_ref = $2, updated_at = NOW()
                WHERE id = $3 AND status = 'pending'
                "#,
            )
            .bind(tx.status.as_str())
            .bind(&tx.settlement_ref)
            .bind(tx.id)
            .execute(&mut *db_tx)
            .await?;

            if updated.rows_affected() == 0 {
                db_tx.rollback().await?;
                return Ok(false);
            }

            let balance_written = sqlx::query(
                "UPDATE accounts_tb SET balance = $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(balance)
            .bind(tx.account_id)
            .execute(&mut *db_tx)
            .await?;

            if balance_written.rows_affected() == 0 {
                db_tx.rollback().await?;
                return Err(StoreError::NotFound);
            }

            db_tx.commit().await?;
            Ok::<_, StoreError>(true)
        })
        .await?
    }

    async fn find_stale_pending(
        &self,
        ctx: &CallContext,
        older_than: Duration,
        limit: usize,
    ) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions_tb
            WHERE status = 'pending'
              AND updated_at < NOW() - make_interval(secs => $1)
            ORDER BY updated_at ASC
            LIMIT $2
            "#
        );
        let rows = ctx
            .run(
                sqlx::query(&sql)
                    .bind(older_than.as_secs_f64())
                    .bind(limit as i64)
                    .fetch_all(&self.pool),
            )
            .await??;
        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn ping(&self, ctx: &CallContext) -> Result<(), StoreError> {
        ctx.run(sqlx::query("SELECT 1").execute(&self.pool))
            .await??;
        Ok(())
    }
}
