//! Wallet gateway
//!
//! The wallet-of-record is the authoritative balance source. It is reachable
//! only over HTTP; [`WalletGateway`] is the seam the orchestrator calls and
//! [`HttpWalletClient`] the production implementation.

pub mod client;
pub mod error;

pub use client::HttpWalletClient;
pub use error::WalletError;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::context::CallContext;

/// One deposit or withdraw call
#[derive(Debug, Clone, PartialEq)]
pub struct WalletOperation {
    pub wallet_handle: i64,
    pub amount: Decimal,
    pub currency: String,
    pub reference: String,
}

/// Wallet-confirmed outcome of a deposit or withdraw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Settled balance exactly as the wallet reported it
    pub balance: String,
    /// Operation id(s) assigned by the wallet
    pub reference: Option<String>,
}

/// Remote wallet operations
///
/// Implementations must honor the caller deadline in `ctx` and apply their
/// own upper-bound timeout on top of it.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn deposit(
        &self,
        ctx: &CallContext,
        op: &WalletOperation,
    ) -> Result<Settlement, WalletError>;

    async fn withdraw(
        &self,
        ctx: &CallContext,
        op: &WalletOperation,
    ) -> Result<Settlement, WalletError>;

    async fn cancel_by_reference(&self, ctx: &CallContext, reference: &str)
    -> Result<(), WalletError>;
}
