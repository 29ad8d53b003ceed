//! Player Wallet service
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Gateway  │───▶│ Orchestrator │───▶│ Wallet (HTTP)│
//! │  (axum)  │    │              │    └──────────────┘
//! └──────────┘    │              │    ┌──────────────┐
//!                 │              │───▶│ Ledger store │
//!                 └──────────────┘    └──────────────┘
//!                                            ▲
//!                              PendingMonitor┘
//! ```

use std::sync::Arc;

use anyhow::Context;

use player_wallet::account::{AccountService, RoundRobinAllocator};
use player_wallet::config::AppConfig;
use player_wallet::db::Database;
use player_wallet::gateway::{self, AppState};
use player_wallet::ledger::{LedgerStore, MemoryLedgerStore, PgLedgerStore};
use player_wallet::transaction::{PendingMonitor, TransactionOrchestrator};
use player_wallet::wallet::HttpWalletClient;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env).context("loading configuration")?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = player_wallet::logging::init_logging(&app_config);

    tracing::info!(env = %env, "Starting player wallet");

    let store: Arc<dyn LedgerStore> = match app_config.postgres_url.as_deref() {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("connecting to PostgreSQL")?;
            db.health_check().await.context("PostgreSQL health check")?;
            Arc::new(PgLedgerStore::new(db.into_pool()))
        }
        None => {
            tracing::warn!("postgres_url not set, using in-memory ledger (data is lost on exit)");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let wallet = Arc::new(
        HttpWalletClient::from_config(&app_config.wallet).context("building wallet client")?,
    );
    tracing::info!(
        wallet_url = %wallet.base_url(),
        timeout_ms = app_config.wallet.timeout_ms,
        "Wallet client ready"
    );

    if app_config.wallet_handles.is_empty() {
        tracing::warn!("wallet_handles is empty, registration will be refused");
    }
    let allocator = Arc::new(RoundRobinAllocator::new(app_config.wallet_handles.clone()));

    let orchestrator = Arc::new(TransactionOrchestrator::with_config(
        store.clone(),
        wallet,
        app_config.orchestrator.to_orchestrator_config(),
    ));
    let accounts = Arc::new(AccountService::new(store.clone(), allocator));

    if app_config.monitor.enabled {
        let monitor = PendingMonitor::new(store.clone(), app_config.monitor.to_monitor_config());
        tokio::spawn(async move {
            monitor.run().await;
        });
    }

    let state = Arc::new(AppState::new(
        orchestrator,
        accounts,
        store,
        app_config.orchestrator.request_timeout(),
    ));

    gateway::run_server(&app_config.gateway.host, app_config.gateway.port, state)
        .await
        .context("gateway server")?;
    Ok(())
}
