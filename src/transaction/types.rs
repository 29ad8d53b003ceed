//! Transaction records, commands and receipts

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::TransactionError;
use super::state::{TransactionKind, TransactionStatus};

/// Validated currency code (uppercase letters, 3-8 chars)
///
/// Fields are private to force validation through `new()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Input is trimmed and upper-cased before checking.
    pub fn new(code: &str) -> Result<Self, TransactionError> {
        let code = code.trim().to_ascii_uppercase();
        if !(3..=8).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(TransactionError::InvalidCurrency(code));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = TransactionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(&value)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

/// Longest provider reference accepted
pub const MAX_PROVIDER_REFERENCE_LEN: usize = 128;

/// Provider references travel as a single wallet URL path segment: ASCII
/// alphanumerics plus `-`, `_`, `.` and `:`, never blank and never only dots.
pub fn is_valid_provider_reference(reference: &str) -> bool {
    !reference.is_empty()
        && reference.len() <= MAX_PROVIDER_REFERENCE_LEN
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        && !reference.chars().all(|c| c == '.')
}

/// Ledger record of one deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    /// Never negative; direction is carried by `kind`
    #[schema(value_type = String, example = "25.00")]
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    /// Caller-supplied provider transaction id, forwarded to the wallet
    pub reference: String,
    /// Provider id of the withdrawal a deposit settles, if any
    pub linked_reference: Option<String>,
    /// Operation id(s) the wallet assigned on settlement
    pub settlement_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new `pending` record
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: Currency,
    pub reference: String,
    pub linked_reference: Option<String>,
}

impl Transaction {
    /// Materialize a `pending` record from its insert payload.
    pub fn pending(id: Uuid, new: &NewTransaction, now: DateTime<Utc>) -> Self {
        Self {
            id,
            account_id: new.account_id,
            kind: new.kind,
            amount: new.amount,
            currency: new.currency.to_string(),
            status: TransactionStatus::Pending,
            reference: new.reference.clone(),
            linked_reference: new.linked_reference.clone(),
            settlement_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.account_id == account_id
    }
}

/// Deposit command as resolved by the boundary layer
#[derive(Debug, Clone, PartialEq)]
pub struct DepositCommand {
    pub currency: Currency,
    pub amount: Decimal,
    pub provider_tx_id: String,
    pub provider_withdrawn_id: Option<String>,
}

/// Withdraw command as resolved by the boundary layer
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawCommand {
    pub currency: Currency,
    pub amount: Decimal,
    pub provider_tx_id: String,
}

/// Outcome label reported to the caller
///
/// Deposits report the wagering settlement (`WON` when the amount is positive,
/// otherwise `LOST`); withdrawals report `COMPLETED`; cancellations `canceled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReceiptStatus {
    #[serde(rename = "WON")]
    Won,
    #[serde(rename = "LOST")]
    Lost,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "canceled")]
    Canceled,
}

impl ReceiptStatus {
    pub fn for_deposit(amount: Decimal) -> Self {
        if amount > Decimal::ZERO {
            ReceiptStatus::Won
        } else {
            ReceiptStatus::Lost
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Won => "WON",
            ReceiptStatus::Lost => "LOST",
            ReceiptStatus::Completed => "COMPLETED",
            ReceiptStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a deposit, withdrawal or cancellation
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TransactionReceipt {
    pub transaction_id: Uuid,
    pub provider_transaction_id: String,
    #[schema(value_type = String, example = "100.00")]
    pub old_balance: Decimal,
    #[schema(value_type = String, example = "40.00")]
    pub new_balance: Decimal,
    pub status: ReceiptStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_provider_reference_charset() {
        assert!(is_valid_provider_reference("bet-20240101-0001"));
        assert!(is_valid_provider_reference("round:42.a_b"));

        assert!(!is_valid_provider_reference(""));
        assert!(!is_valid_provider_reference("   "));
        assert!(!is_valid_provider_reference("victim-ref?mine=1"));
        assert!(!is_valid_provider_reference("../api/v1/deposit"));
        assert!(!is_valid_provider_reference("bet#42"));
        assert!(!is_valid_provider_reference(".."));
        assert!(!is_valid_provider_reference(&"a".repeat(MAX_PROVIDER_REFERENCE_LEN + 1)));
    }

    #[test]
    fn test_currency_normalized() {
        assert_eq!(Currency::new(" usd ").unwrap().as_str(), "USD");
        assert_eq!(Currency::new("USDT").unwrap().to_string(), "USDT");
    }

    #[test]
    fn test_currency_rejects_garbage() {
        assert!(Currency::new("").is_err());
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("US1").is_err());
        assert!(Currency::new("DOLLARSXX").is_err());
    }

    #[test]
    fn test_currency_deserialize_validates() {
        let ok: Currency = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(ok.as_str(), "EUR");
        assert!(serde_json::from_str::<Currency>("\"e\"").is_err());
    }

    #[test]
    fn test_deposit_label_boundary() {
        assert_eq!(ReceiptStatus::for_deposit(dec("25")), ReceiptStatus::Won);
        assert_eq!(ReceiptStatus::for_deposit(dec("0.01")), ReceiptStatus::Won);
        assert_eq!(ReceiptStatus::for_deposit(Decimal::ZERO), ReceiptStatus::Lost);
    }

    #[test]
    fn test_receipt_labels_serialize() {
        assert_eq!(serde_json::to_string(&ReceiptStatus::Won).unwrap(), "\"WON\"");
        assert_eq!(
            serde_json::to_string(&ReceiptStatus::Canceled).unwrap(),
            "\"canceled\""
        );
    }

    #[test]
    fn test_pending_record() {
        let new = NewTransaction {
            account_id: Uuid::new_v4(),
            kind: TransactionKind::Deposit,
            amount: dec("10.50"),
            currency: Currency::new("USD").unwrap(),
            reference: "prov-1".into(),
            linked_reference: Some("prov-w-1".into()),
        };
        let tx = Transaction::pending(Uuid::new_v4(), &new, Utc::now());

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.currency, "USD");
        assert!(tx.is_owned_by(new.account_id));
        assert!(!tx.is_owned_by(Uuid::new_v4()));
        assert!(tx.settlement_ref.is_none());
    }
}
