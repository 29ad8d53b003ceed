//! Player Wallet - transaction orchestration against a remote wallet
//!
//! The remote wallet is the balance of record. This crate keeps a local
//! ledger of accounts and transactions, drives each deposit, withdrawal and
//! cancellation through it, and caches the balance the wallet confirms.
//!
//! # Modules
//!
//! - [`transaction`] - Orchestrator, state machine, pending monitor
//! - [`ledger`] - Ledger store trait with PostgreSQL and in-memory backends
//! - [`wallet`] - Wallet gateway trait and HTTP client
//! - [`account`] - Registration, wallet handle allocation, account queries
//! - [`context`] - Per-call deadlines
//! - [`gateway`] - HTTP API (axum)
//! - [`config`] / [`logging`] - Process setup

pub mod account;
pub mod config;
pub mod context;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod transaction;
pub mod wallet;

pub use account::{Account, AccountService, RoundRobinAllocator};
pub use context::CallContext;
pub use ledger::{LedgerStore, MemoryLedgerStore, PgLedgerStore, StoreError};
pub use transaction::{
    PendingMonitor, TransactionError, TransactionOrchestrator, TransactionReceipt,
};
pub use wallet::{HttpWalletClient, WalletError, WalletGateway};
