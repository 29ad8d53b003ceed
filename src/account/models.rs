//! Data models for player accounts

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Player account
///
/// `balance` is a cache of the wallet's settled balance. It is only ever
/// overwritten with a value the wallet confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    /// Identity of this player at the wallet-of-record
    pub wallet_handle: i64,
    pub username: String,
    pub email: String,
    #[schema(value_type = String, example = "100.00")]
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the store assigns id, timestamps and a zero balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub wallet_handle: i64,
}

impl Account {
    pub fn from_new(id: Uuid, new: &NewAccount, now: DateTime<Utc>) -> Self {
        Self {
            id,
            wallet_handle: new.wallet_handle,
            username: new.username.clone(),
            email: new.email.clone(),
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}
