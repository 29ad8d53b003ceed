//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::account::{Account, BalanceView, RegisterAccount};
use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{DepositRequest, WithdrawRequest};
use crate::transaction::{
    ReceiptStatus, Transaction, TransactionKind, TransactionReceipt, TransactionStatus,
};

/// Caller identity forwarded by the upstream authenticator
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "account_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-Account-Id",
                    "Account UUID resolved by the upstream authenticator",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Player Wallet API",
        version = "1.0.0",
        description = "Deposits, withdrawals and cancellations settled against a remote wallet, with a local ledger of record.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::accounts::register_account,
        crate::gateway::handlers::accounts::get_profile,
        crate::gateway::handlers::accounts::get_balance,
        crate::gateway::handlers::accounts::get_history,
        crate::gateway::handlers::transactions::deposit,
        crate::gateway::handlers::transactions::withdraw,
        crate::gateway::handlers::transactions::cancel_transaction,
        crate::gateway::handlers::transactions::get_transaction,
    ),
    components(
        schemas(
            HealthResponse,
            Account,
            BalanceView,
            RegisterAccount,
            DepositRequest,
            WithdrawRequest,
            Transaction,
            TransactionKind,
            TransactionStatus,
            TransactionReceipt,
            ReceiptStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Account", description = "Registration and account queries"),
        (name = "Transactions", description = "Wallet-settled deposits, withdrawals and cancellations"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
