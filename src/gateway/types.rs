//! API boundary types
//!
//! - `ApiResponse<T>`: unified response envelope
//! - `ApiError`: typed failure that renders into the envelope
//! - `ApiAmount`: request amount accepted as a JSON number or string
//! - Request DTOs for the transaction endpoints

use std::fmt;
use std::str::FromStr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::account::AccountError;
use crate::transaction::{TransactionError, is_valid_provider_reference};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: payload on success, absent on error
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Standard API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const INVALID_AMOUNT: i32 = 1003;
    pub const INVALID_CURRENCY: i32 = 1004;
    pub const TRANSACTION_NOT_PENDING: i32 = 1005;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const FORBIDDEN: i32 = 2003;

    // Wallet errors (3xxx)
    pub const WALLET_ERROR: i32 = 3001;

    // Resource errors (4xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 4001;
    pub const TRANSACTION_NOT_FOUND: i32 = 4002;
    pub const ACCOUNT_EXISTS: i32 = 4091;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const INDETERMINATE_STATE: i32 = 5002;
    pub const DEADLINE_EXCEEDED: i32 = 5004;
}

// ============================================================================
// ApiError / ApiResult
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED, msg)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "Internal server error",
        )
    }

    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.msg)),
        )
            .into_response()
    }
}

impl From<TransactionError> for ApiError {
    fn from(e: TransactionError) -> Self {
        let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
        let code = match &e {
            TransactionError::InvalidAmount => error_codes::INVALID_AMOUNT,
            TransactionError::InvalidCurrency(_) => error_codes::INVALID_CURRENCY,
            TransactionError::TransactionNotPending(_) => error_codes::TRANSACTION_NOT_PENDING,
            TransactionError::Unauthorized => error_codes::FORBIDDEN,
            TransactionError::AccountNotFound => error_codes::ACCOUNT_NOT_FOUND,
            TransactionError::TransactionNotFound => error_codes::TRANSACTION_NOT_FOUND,
            TransactionError::InsufficientBalance => error_codes::INSUFFICIENT_BALANCE,
            TransactionError::WalletRejected { .. } => error_codes::WALLET_ERROR,
            TransactionError::Indeterminate { .. } => error_codes::INDETERMINATE_STATE,
            TransactionError::Infrastructure(_) => error_codes::INTERNAL_ERROR,
            TransactionError::DeadlineExceeded => error_codes::DEADLINE_EXCEEDED,
        };
        let msg = match &e {
            TransactionError::WalletRejected { message, .. } => message.clone(),
            TransactionError::Indeterminate { transaction_id, .. } => {
                format!("Transaction {} is pending reconciliation", transaction_id)
            }
            TransactionError::Infrastructure(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        Self::new(status, code, msg)
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match e {
            AccountError::InvalidInput(msg) => {
                Self::new(status, error_codes::INVALID_PARAMETER, msg)
            }
            AccountError::AlreadyExists => {
                Self::new(status, error_codes::ACCOUNT_EXISTS, e.to_string())
            }
            AccountError::NotFound => {
                Self::new(status, error_codes::ACCOUNT_NOT_FOUND, e.to_string())
            }
            AccountError::WalletHandlesExhausted => {
                Self::new(status, error_codes::SERVICE_UNAVAILABLE, e.to_string())
            }
            AccountError::Store(_) => Self::internal(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        let mut fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        Self::bad_request(format!("Invalid field: {}", fields.join(", ")))
    }
}

// ============================================================================
// ApiAmount
// ============================================================================

/// Monetary request amount
///
/// Accepts `25`, `25.5` or `"25.50"`. Strings are parsed exactly; numbers go
/// through `f64`. Sign is not checked here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApiAmount(Decimal);

impl ApiAmount {
    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl<'de> Deserialize<'de> for ApiAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl serde::de::Visitor<'_> for AmountVisitor {
            type Value = ApiAmount;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal amount as number or string")
            }

            fn visit_str<E: serde::de::Error>(self, s: &str) -> Result<ApiAmount, E> {
                let s = s.trim();
                if s.is_empty() {
                    return Err(E::custom("Amount cannot be empty"));
                }
                if s.contains(['e', 'E']) {
                    return Err(E::custom(
                        "Invalid format: scientific notation not allowed",
                    ));
                }
                Decimal::from_str(s)
                    .map(ApiAmount)
                    .map_err(|e| E::custom(format!("Invalid decimal: {}", e)))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<ApiAmount, E> {
                Decimal::from_f64(v)
                    .map(ApiAmount)
                    .ok_or_else(|| E::custom("Amount out of range"))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<ApiAmount, E> {
                Ok(ApiAmount(Decimal::from(v)))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<ApiAmount, E> {
                Ok(ApiAmount(Decimal::from(v)))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

fn validate_provider_reference(reference: &str) -> Result<(), ValidationError> {
    if is_valid_provider_reference(reference) {
        Ok(())
    } else {
        Err(ValidationError::new("provider_reference"))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DepositRequest {
    #[schema(example = "EUR")]
    pub currency: String,
    #[schema(value_type = String, example = "25.00")]
    pub amount: ApiAmount,
    #[validate(custom(function = "validate_provider_reference"))]
    #[schema(example = "bet-20240101-0001")]
    pub provider_transaction_id: String,
    /// Provider id of the withdrawal this deposit settles
    #[serde(default)]
    pub provider_withdrawn_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct WithdrawRequest {
    #[schema(example = "EUR")]
    pub currency: String,
    #[schema(value_type = String, example = "60.00")]
    pub amount: ApiAmount,
    #[validate(custom(function = "validate_provider_reference"))]
    #[schema(example = "bet-20240101-0001")]
    pub provider_transaction_id: String,
}
