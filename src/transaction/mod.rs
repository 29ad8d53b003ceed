//! Transaction Orchestration
//!
//! Deposits, withdrawals and cancellations mediated between the local ledger
//! and the remote wallet-of-record.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐  wallet ok   ┌───────────┐
//! │ PENDING │─────────────▶│ COMPLETED │
//! └────┬────┘              └───────────┘
//!      │ wallet error      ┌───────────┐
//!      ├──────────────────▶│  FAILED   │
//!      │ cancel            ├───────────┤
//!      └──────────────────▶│ CANCELED  │
//!                          └───────────┘
//! ```
//!
//! # Invariants
//! 1. **Persist-before-call**: the `pending` record exists before the wallet
//!    is contacted, so a crash leaves evidence.
//! 2. **Confirmed balances only**: the cached balance is overwritten from the
//!    wallet's reported balance, never adjusted locally.
//! 3. **Terminal is final**: completed, failed and canceled never move again.
//! 4. **Unsigned amounts**: direction lives in the kind, not the sign.

pub mod error;
pub mod monitor;
pub mod orchestrator;
pub mod state;
pub mod types;


pub use error::TransactionError;
pub use monitor::{MonitorConfig, PendingMonitor};
pub use orchestrator::{OrchestratorConfig, TransactionOrchestrator};
pub use state::{TransactionKind, TransactionStatus};
pub use types::{
    Currency, DepositCommand, MAX_PROVIDER_REFERENCE_LEN, NewTransaction, ReceiptStatus,
    Transaction, TransactionReceipt, WithdrawCommand, is_valid_provider_reference,
};
