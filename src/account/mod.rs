//! Player accounts
//!
//! Registration (with wallet handle allocation) and the read-only account
//! queries: profile, cached balance, transaction history.

pub mod allocator;
pub mod error;
pub mod models;
pub mod service;

pub use allocator::{RoundRobinAllocator, WalletHandleAllocator};
pub use error::AccountError;
pub use models::{Account, NewAccount};
pub use service::{AccountService, BalanceView, RegisterAccount};
