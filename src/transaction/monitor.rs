//! Pending Monitor
//!
//! Background task that reports transactions stuck in `pending`. A record
//! stays `pending` when the process died mid-flight or a ledger write failed
//! after the wallet answered. The monitor never mutates records; it only
//! surfaces them for manual reconciliation.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::context::CallContext;
use crate::ledger::{LedgerStore, StoreError};

/// Configuration for the pending monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How often to scan
    pub scan_interval: Duration,
    /// How long a record must sit in `pending` to be reported
    pub stale_after: Duration,
    /// Maximum records reported per scan
    pub batch_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(30),
            stale_after: Duration::from_secs(120),
            batch_size: 100,
        }
    }
}

pub struct PendingMonitor {
    store: Arc<dyn LedgerStore>,
    config: MonitorConfig,
}

impl PendingMonitor {
    pub fn new(store: Arc<dyn LedgerStore>, config: MonitorConfig) -> Self {
        Self { store, config }
    }

    /// Scan forever.
    pub async fn run(&self) {
        info!(
            scan_interval_secs = self.config.scan_interval.as_secs(),
            stale_after_secs = self.config.stale_after.as_secs(),
            "Starting pending monitor"
        );

        loop {
            if let Err(e) = self.scan_once().await {
                error!(error = %e, "Pending scan failed");
            }

            tokio::time::sleep(self.config.scan_interval).await;
        }
    }

    /// Run a single scan. Returns how many stale records were reported.
    pub async fn scan_once(&self) -> Result<usize, StoreError> {
        let ctx = CallContext::with_timeout(self.config.scan_interval.max(Duration::from_secs(1)));
        let stale = self
            .store
            .find_stale_pending(&ctx, self.config.stale_after, self.config.batch_size)
            .await?;

        if stale.is_empty() {
            debug!("No stale pending transactions");
            return Ok(0);
        }

        for tx in &stale {
            warn!(
                transaction_id = %tx.id,
                account_id = %tx.account_id,
                kind = %tx.kind,
                amount = %tx.amount,
                reference = %tx.reference,
                pending_since = %tx.updated_at,
                reconcile = true,
                "Transaction stuck in pending"
            );
        }

        info!(count = stale.len(), "Stale pending transactions reported");
        Ok(stale.len())
    }
}
