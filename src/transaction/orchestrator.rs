//! Transaction Orchestrator
//!
//! Drives deposit, withdraw and cancel against the ledger store and the
//! wallet gateway.
//!
//! # Ordering
//! 1. The `pending` record is durable before the wallet is called.
//! 2. The cached balance is written only from a wallet-confirmed value,
//!    wholesale, never by local arithmetic.
//! 3. At most one wallet call per invocation; nothing is retried here.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::TransactionError;
use super::state::{TransactionKind, TransactionStatus};
use super::types::{
    DepositCommand, NewTransaction, ReceiptStatus, Transaction, TransactionReceipt,
    WithdrawCommand,
};
use crate::account::Account;
use crate::context::CallContext;
use crate::ledger::{LedgerStore, StoreError};
use crate::wallet::{Settlement, WalletError, WalletGateway, WalletOperation};

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Budget for ledger writes made after the wallet answered (or after the
    /// caller deadline fired). Runs on a fresh deadline so the outcome is
    /// still recorded.
    pub bookkeeping_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            bookkeeping_timeout: Duration::from_secs(5),
        }
    }
}

pub struct TransactionOrchestrator {
    store: Arc<dyn LedgerStore>,
    wallet: Arc<dyn WalletGateway>,
    config: OrchestratorConfig,
}

impl TransactionOrchestrator {
    pub fn new(store: Arc<dyn LedgerStore>, wallet: Arc<dyn WalletGateway>) -> Self {
        Self::with_config(store, wallet, OrchestratorConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn LedgerStore>,
        wallet: Arc<dyn WalletGateway>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            wallet,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Credit the player at the wallet.
    ///
    /// A zero amount is accepted and settles as `LOST`.
    pub async fn deposit(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
        cmd: DepositCommand,
    ) -> Result<TransactionReceipt, TransactionError> {
        debug!(
            account_id = %account_id,
            amount = %cmd.amount,
            currency = %cmd.currency,
            provider_tx_id = %cmd.provider_tx_id,
            "Deposit requested"
        );

        if cmd.amount < Decimal::ZERO {
            warn!(account_id = %account_id, amount = %cmd.amount, "Deposit rejected: invalid amount");
            return Err(TransactionError::InvalidAmount);
        }

        let account = self.load_account(ctx, account_id).await?;
        let old_balance = account.balance;

        let tx = self
            .store
            .create_transaction(
                ctx,
                &NewTransaction {
                    account_id,
                    kind: TransactionKind::Deposit,
                    amount: cmd.amount,
                    currency: cmd.currency.clone(),
                    reference: cmd.provider_tx_id.clone(),
                    linked_reference: cmd.provider_withdrawn_id.clone(),
                },
            )
            .await?;
        debug!(transaction_id = %tx.id, "Pending deposit recorded");

        let op = wallet_operation(&account, &tx);
        let outcome = ctx
            .run(self.wallet.deposit(ctx, &op))
            .await
            .unwrap_or(Err(WalletError::Timeout));

        let new_balance = self.conclude(ctx, tx.clone(), outcome).await?;
        let status = ReceiptStatus::for_deposit(cmd.amount);

        info!(
            account_id = %account_id,
            transaction_id = %tx.id,
            old_balance = %old_balance,
            new_balance = %new_balance,
            status = %status,
            "Deposit settled"
        );

        Ok(TransactionReceipt {
            transaction_id: tx.id,
            provider_transaction_id: cmd.provider_tx_id,
            old_balance,
            new_balance,
            status,
        })
    }

    /// Debit the player at the wallet.
    ///
    /// The cached balance is only a fast-path guard; the wallet may still
    /// reject.
    pub async fn withdraw(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
        cmd: WithdrawCommand,
    ) -> Result<TransactionReceipt, TransactionError> {
        debug!(
            account_id = %account_id,
            amount = %cmd.amount,
            currency = %cmd.currency,
            provider_tx_id = %cmd.provider_tx_id,
            "Withdraw requested"
        );

        if cmd.amount <= Decimal::ZERO {
            warn!(account_id = %account_id, amount = %cmd.amount, "Withdraw rejected: invalid amount");
            return Err(TransactionError::InvalidAmount);
        }

        let account = self.load_account(ctx, account_id).await?;
        let old_balance = account.balance;

        if old_balance < cmd.amount {
            warn!(
                account_id = %account_id,
                requested = %cmd.amount,
                available = %old_balance,
                "Withdraw rejected: insufficient balance"
            );
            return Err(TransactionError::InsufficientBalance);
        }

        let tx = self
            .store
            .create_transaction(
                ctx,
                &NewTransaction {
                    account_id,
                    kind: TransactionKind::Withdraw,
                    amount: cmd.amount,
                    currency: cmd.currency.clone(),
                    reference: cmd.provider_tx_id.clone(),
                    linked_reference: None,
                },
            )
            .await?;
        debug!(transaction_id = %tx.id, "Pending withdraw recorded");

        let op = wallet_operation(&account, &tx);
        let outcome = ctx
            .run(self.wallet.withdraw(ctx, &op))
            .await
            .unwrap_or(Err(WalletError::Timeout));

        let new_balance = self.conclude(ctx, tx.clone(), outcome).await?;

        info!(
            account_id = %account_id,
            transaction_id = %tx.id,
            old_balance = %old_balance,
            new_balance = %new_balance,
            "Withdraw settled"
        );

        Ok(TransactionReceipt {
            transaction_id: tx.id,
            provider_transaction_id: cmd.provider_tx_id,
            old_balance,
            new_balance,
            status: ReceiptStatus::Completed,
        })
    }

    /// Cancel a still-pending transaction owned by `account_id`.
    ///
    /// A wallet refusal leaves the record `pending` so the cancel can be
    /// retried.
    pub async fn cancel(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<TransactionReceipt, TransactionError> {
        debug!(account_id = %account_id, transaction_id = %transaction_id, "Cancel requested");

        let tx = self.load_owned(ctx, account_id, transaction_id).await?;
        if tx.status != TransactionStatus::Pending {
            warn!(
                transaction_id = %transaction_id,
                status = %tx.status,
                "Cancel rejected: transaction not pending"
            );
            return Err(TransactionError::TransactionNotPending(tx.status));
        }

        let old_balance = self.reported_balance(ctx, account_id).await;

        let remote_canceled = !tx.reference.is_empty();
        if remote_canceled {
            debug!(reference = %tx.reference, "Cancelling at wallet");
            ctx.run(self.wallet.cancel_by_reference(ctx, &tx.reference))
                .await
                .unwrap_or(Err(WalletError::Timeout))
                .map_err(|e| {
                    error!(transaction_id = %transaction_id, error = %e, "Wallet cancel failed");
                    TransactionError::from(e)
                })?;
        }

        // Once the wallet dropped the operation the local write must still happen
        let write_ctx = if remote_canceled {
            ctx.grace(self.config.bookkeeping_timeout)
        } else {
            *ctx
        };

        match self
            .store
            .set_transaction_status(&write_ctx, transaction_id, TransactionStatus::Canceled)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                // Settled or failed concurrently between our read and write
                let current = self.store.get_transaction(&write_ctx, transaction_id).await?;
                warn!(
                    transaction_id = %transaction_id,
                    status = %current.status,
                    remote_canceled,
                    "Cancel lost race with concurrent transition"
                );
                return Err(TransactionError::TransactionNotPending(current.status));
            }
            Err(e) if remote_canceled => {
                error!(
                    transaction_id = %transaction_id,
                    error = %e,
                    reconcile = true,
                    "Wallet canceled but ledger write failed"
                );
                return Err(TransactionError::Indeterminate {
                    transaction_id,
                    reason: format!("canceled at wallet, ledger write failed: {e}"),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let new_balance = match self.store.get_account(&write_ctx, account_id).await {
            Ok(account) => account.balance,
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "Balance re-read after cancel failed");
                old_balance
            }
        };

        info!(
            account_id = %account_id,
            transaction_id = %transaction_id,
            "Transaction canceled"
        );

        Ok(TransactionReceipt {
            transaction_id,
            provider_transaction_id: tx.reference,
            old_balance,
            new_balance,
            status: ReceiptStatus::Canceled,
        })
    }

    /// Read one transaction, enforcing ownership.
    pub async fn get_transaction(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Transaction, TransactionError> {
        self.load_owned(ctx, account_id, transaction_id).await
    }

    async fn load_account(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
    ) -> Result<Account, TransactionError> {
        self.store
            .get_account(ctx, account_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => {
                    warn!(account_id = %account_id, "Account not found");
                    TransactionError::AccountNotFound
                }
                other => {
                    error!(account_id = %account_id, error = %other, "Account lookup failed");
                    other.into()
                }
            })
    }

    async fn load_owned(
        &self,
        ctx: &CallContext,
        account_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Transaction, TransactionError> {
        let tx = self
            .store
            .get_transaction(ctx, transaction_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => TransactionError::TransactionNotFound,
                other => other.into(),
            })?;

        if !tx.is_owned_by(account_id) {
            warn!(
                account_id = %account_id,
                transaction_id = %transaction_id,
                "Transaction belongs to another account"
            );
            return Err(TransactionError::Unauthorized);
        }
        Ok(tx)
    }

    /// Cached balance for reporting; a failed read reports zero.
    async fn reported_balance(&self, ctx: &CallContext, account_id: Uuid) -> Decimal {
        match self.store.get_account(ctx, account_id).await {
            Ok(account) => account.balance,
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "Balance read for cancel failed");
                Decimal::ZERO
            }
        }
    }

    /// Fold the wallet outcome into the ledger. Returns the settled balance.
    async fn conclude(
        &self,
        ctx: &CallContext,
        tx: Transaction,
        outcome: Result<Settlement, WalletError>,
    ) -> Result<Decimal, TransactionError> {
        match outcome {
            Ok(settlement) => self.record_settlement(ctx, tx, settlement).await,
            Err(cause) => Err(self.record_failure(ctx, &tx, cause).await),
        }
    }

    async fn record_failure(
        &self,
        ctx: &CallContext,
        tx: &Transaction,
        cause: WalletError,
    ) -> TransactionError {
        error!(
            transaction_id = %tx.id,
            kind = %tx.kind,
            error = %cause,
            "Wallet call failed"
        );

        let grace = ctx.grace(self.config.bookkeeping_timeout);
        match self
            .store
            .set_transaction_status(&grace, tx.id, TransactionStatus::Failed)
            .await
        {
            Ok(true) => cause.into(),
            Ok(false) => {
                warn!(transaction_id = %tx.id, "Transaction left pending before failure was recorded");
                cause.into()
            }
            Err(e) => {
                error!(
                    transaction_id = %tx.id,
                    error = %e,
                    cause = %cause,
                    reconcile = true,
                    "Failed to record wallet failure"
                );
                TransactionError::Indeterminate {
                    transaction_id: tx.id,
                    reason: format!("could not mark failed: {e}"),
                }
            }
        }
    }

    async fn record_settlement(
        &self,
        ctx: &CallContext,
        mut tx: Transaction,
        settlement: Settlement,
    ) -> Result<Decimal, TransactionError> {
        let new_balance = Decimal::from_str(settlement.balance.trim()).map_err(|e| {
            error!(
                transaction_id = %tx.id,
                balance = %settlement.balance,
                error = %e,
                reconcile = true,
                "Unparseable settled balance"
            );
            TransactionError::Indeterminate {
                transaction_id: tx.id,
                reason: format!(
                    "wallet settled but balance '{}' is unreadable",
                    settlement.balance
                ),
            }
        })?;

        tx.status = TransactionStatus::Completed;
        tx.settlement_ref = settlement.reference;

        let grace = ctx.grace(self.config.bookkeeping_timeout);
        match self.store.settle(&grace, &tx, new_balance).await {
            Ok(true) => Ok(new_balance),
            Ok(false) => {
                error!(
                    transaction_id = %tx.id,
                    reconcile = true,
                    "Wallet settled a transaction that is no longer pending"
                );
                Err(TransactionError::Indeterminate {
                    transaction_id: tx.id,
                    reason: "wallet settled but record already left pending".to_string(),
                })
            }
            Err(e) => {
                error!(
                    transaction_id = %tx.id,
                    new_balance = %new_balance,
                    error = %e,
                    reconcile = true,
                    "Wallet settled but ledger write failed"
                );
                Err(TransactionError::Indeterminate {
                    transaction_id: tx.id,
                    reason: format!("wallet settled, ledger write failed: {e}"),
                })
            }
        }
    }
}

fn wallet_operation(account: &Account, tx: &Transaction) -> WalletOperation {
    WalletOperation {
        wallet_handle: account.wallet_handle,
        amount: tx.amount,
        currency: tx.currency.clone(),
        reference: tx.reference.clone(),
    }
}
