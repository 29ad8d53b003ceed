use std::sync::Arc;
use std::time::Duration;

use crate::account::AccountService;
use crate::context::CallContext;
use crate::ledger::LedgerStore;
use crate::transaction::TransactionOrchestrator;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub accounts: Arc<AccountService>,
    /// Used directly only by the health check
    pub store: Arc<dyn LedgerStore>,
    /// Deadline applied to each API-initiated operation
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<TransactionOrchestrator>,
        accounts: Arc<AccountService>,
        store: Arc<dyn LedgerStore>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            accounts,
            store,
            request_timeout,
        }
    }

    /// Fresh deadline for one request
    pub fn call_context(&self) -> CallContext {
        CallContext::with_timeout(self.request_timeout)
    }
}
