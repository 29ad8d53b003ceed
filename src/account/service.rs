//! Account registration and read-only queries
//!
//! Reads are straight passthroughs to the ledger store. Registration draws
//! a wallet handle from the injected allocator.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::allocator::WalletHandleAllocator;
use super::error::AccountError;
use super::models::{Account, NewAccount};
use crate::context::CallContext;
use crate::ledger::LedgerStore;
use crate::transaction::Transaction;

/// Registration payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterAccount {
    #[validate(length(min = 3, max = 32))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(email)]
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Cached balance as last confirmed by the wallet
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BalanceView {
    pub account_id: Uuid,
    #[schema(value_type = String, example = "65.00")]
    pub balance: Decimal,
}

pub struct AccountService {
    store: Arc<dyn LedgerStore>,
    allocator: Arc<dyn WalletHandleAllocator>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>, allocator: Arc<dyn WalletHandleAllocator>) -> Self {
        Self { store, allocator }
    }

    pub async fn register(
        &self,
        ctx: &CallContext,
        req: RegisterAccount,
    ) -> Result<Account, AccountError> {
        let req = RegisterAccount {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_ascii_lowercase(),
        };
        req.validate()?;
        debug!(username = %req.username, "Register requested");

        if self
            .store
            .find_account_by_username(ctx, &req.username)
            .await?
            .is_some()
        {
            warn!(username = %req.username, "Register rejected: username taken");
            return Err(AccountError::AlreadyExists);
        }
        if self
            .store
            .find_account_by_email(ctx, &req.email)
            .await?
            .is_some()
        {
            warn!(email = %req.email, "Register rejected: email taken");
            return Err(AccountError::AlreadyExists);
        }

        let wallet_handle = self
            .allocator
            .allocate()
            .ok_or(AccountError::WalletHandlesExhausted)?;

        let account = self
            .store
            .create_account(
                ctx,
                &NewAccount {
                    username: req.username,
                    email: req.email,
                    wallet_handle,
                },
            )
            .await?;

        info!(
            account_id = %account.id,
            username = %account.username,
            wallet_handle,
            "Account registered"
        );
        Ok(account)
    }

    pub async fn profile(&self, ctx: &CallContext, id: Uuid) -> Result<Account, AccountError> {
        Ok(self.store.get_account(ctx, id).await?)
    }

    pub async fn balance(&self, ctx: &CallContext, id: Uuid) -> Result<BalanceView, AccountError> {
        let account = self.store.get_account(ctx, id).await?;
        Ok(BalanceView {
            account_id: account.id,
            balance: account.balance,
        })
    }

    /// Newest first.
    pub async fn history(
        &self,
        ctx: &CallContext,
        id: Uuid,
    ) -> Result<Vec<Transaction>, AccountError> {
        self.store.get_account(ctx, id).await?;
        Ok(self.store.list_transactions(ctx, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::RoundRobinAllocator;
    use crate::ledger::MemoryLedgerStore;

    fn service(pool: Vec<i64>) -> (AccountService, Arc<MemoryLedgerStore>) {
        let store = Arc::new(MemoryLedgerStore::new());
        let svc = AccountService::new(store.clone(), Arc::new(RoundRobinAllocator::new(pool)));
        (svc, store)
    }

    fn req(username: &str, email: &str) -> RegisterAccount {
        RegisterAccount {
            username: username.into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn test_register_assigns_handles_round_robin() {
        let (svc, _) = service(vec![34633089486, 34679664254]);
        let ctx = CallContext::background();

        let a = svc.register(&ctx, req("alice", "alice@example.com")).await.unwrap();
        let b = svc.register(&ctx, req("bob", "bob@example.com")).await.unwrap();
        let c = svc.register(&ctx, req("carol", "carol@example.com")).await.unwrap();

        assert_eq!(a.wallet_handle, 34633089486);
        assert_eq!(b.wallet_handle, 34679664254);
        assert_eq!(c.wallet_handle, 34633089486);
        assert_eq!(a.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let (svc, _) = service(vec![1]);
        let ctx = CallContext::background();

        svc.register(&ctx, req("alice", "alice@example.com")).await.unwrap();
        let same_name = svc.register(&ctx, req("alice", "other@example.com")).await;
        let same_mail = svc.register(&ctx, req("alicia", "ALICE@example.com")).await;

        assert_eq!(same_name.unwrap_err(), AccountError::AlreadyExists);
        assert_eq!(same_mail.unwrap_err(), AccountError::AlreadyExists);
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let (svc, _) = service(vec![1]);
        let ctx = CallContext::background();

        let err = svc.register(&ctx, req("al", "al@example.com")).await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput(_)));
        let err = svc.register(&ctx, req("alice", "not-an-email")).await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_register_with_empty_pool() {
        let (svc, _) = service(Vec::new());
        let err = svc
            .register(&CallContext::background(), req("dave", "dave@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, AccountError::WalletHandlesExhausted);
    }

    #[tokio::test]
    async fn test_queries() {
        let (svc, store) = service(vec![7]);
        let ctx = CallContext::background();
        let account = svc.register(&ctx, req("erin", "erin@example.com")).await.unwrap();
        store
            .set_account_balance(&ctx, account.id, Decimal::new(6500, 2))
            .await
            .unwrap();

        assert_eq!(svc.profile(&ctx, account.id).await.unwrap().username, "erin");
        assert_eq!(
            svc.balance(&ctx, account.id).await.unwrap().balance,
            Decimal::new(6500, 2)
        );
        assert!(svc.history(&ctx, account.id).await.unwrap().is_empty());
        assert_eq!(
            svc.history(&ctx, Uuid::new_v4()).await.unwrap_err(),
            AccountError::NotFound
        );
    }
}
