//! Wallet handle allocation
//!
//! The wallet-of-record cannot create players, so new accounts are mapped
//! onto a fixed pool of pre-provisioned wallet identities.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out a wallet identity for a newly registered account.
pub trait WalletHandleAllocator: Send + Sync {
    /// `None` when no handle can be issued.
    fn allocate(&self) -> Option<i64>;
}

/// Cycles through a fixed pool in order.
#[derive(Debug)]
pub struct RoundRobinAllocator {
    pool: Vec<i64>,
    cursor: AtomicUsize,
}

impl RoundRobinAllocator {
    pub fn new(pool: Vec<i64>) -> Self {
        Self {
            pool,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl WalletHandleAllocator for RoundRobinAllocator {
    fn allocate(&self) -> Option<i64> {
        if self.pool.is_empty() {
            return None;
        }
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.pool.len();
        Some(self.pool[slot])
    }
}
