//! HTTP wallet client
//!
//! Endpoints (all `POST`, authenticated with the `X-API-KEY` header):
//! - `{base}/api/v1/deposit`
//! - `{base}/api/v1/withdraw`
//! - `{base}/cancel/{reference}`

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::error::WalletError;
use super::{Settlement, WalletGateway, WalletOperation};
use crate::config::WalletConfig;
use crate::context::CallContext;
use crate::transaction::is_valid_provider_reference;

const API_KEY_HEADER: &str = "X-API-KEY";

/// Longest slice of a raw error body kept in `WalletError::Rejected`
const MAX_ERROR_BODY: usize = 256;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationRequest<'a> {
    currency: &'a str,
    user_id: i64,
    transactions: [OperationLine<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationLine<'a> {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    bet_id: i64,
    reference: &'a str,
}

#[derive(Deserialize)]
struct OperationResponse {
    balance: BalanceValue,
    #[serde(default)]
    transactions: Vec<SettledLine>,
}

/// The wallet reports balances as strings; some deployments send numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum BalanceValue {
    Text(String),
    Number(serde_json::Number),
}

impl BalanceValue {
    fn into_string(self) -> String {
        match self {
            BalanceValue::Text(s) => s,
            BalanceValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SettledLine {
    id: serde_json::Value,
}

impl From<OperationResponse> for Settlement {
    fn from(resp: OperationResponse) -> Self {
        let ids: Vec<String> = resp
            .transactions
            .iter()
            .map(|line| match &line.id {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();

        Settlement {
            balance: resp.balance.into_string(),
            reference: if ids.is_empty() {
                None
            } else {
                Some(ids.join(","))
            },
        }
    }
}

/// reqwest-backed [`WalletGateway`]
pub struct HttpWalletClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpWalletClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WalletError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        })
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/cancel/{reference}` with the reference percent-encoded as one
    /// path segment.
    fn cancel_url(&self, reference: &str) -> Result<reqwest::Url, WalletError> {
        if !is_valid_provider_reference(reference) {
            return Err(WalletError::InvalidReference(reference.to_string()));
        }
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| WalletError::Transport(format!("invalid wallet base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| WalletError::Transport("wallet base url cannot hold a path".to_string()))?
            .pop_if_empty()
            .push("cancel")
            .push(reference);
        Ok(url)
    }

    /// Per-request timeout: the fixed limit, shortened by the caller deadline.
    fn request_timeout(&self, ctx: &CallContext) -> Result<Duration, WalletError> {
        if ctx.is_expired() {
            return Err(WalletError::Timeout);
        }
        Ok(ctx.bounded(self.timeout))
    }

    async fn operate(
        &self,
        ctx: &CallContext,
        path: &str,
        op: &WalletOperation,
    ) -> Result<Settlement, WalletError> {
        let body = OperationRequest {
            currency: &op.currency,
            user_id: op.wallet_handle,
            transactions: [OperationLine {
                amount: op.amount,
                bet_id: 0,
                reference: &op.reference,
            }],
        };

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, reference = %op.reference, amount = %op.amount, "Calling wallet");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.request_timeout(ctx)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Wallet request failed");
                WalletError::from(e)
            })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), body = %text, "Wallet returned error");
            return Err(rejection(status.as_u16(), &text));
        }

        let parsed: OperationResponse = serde_json::from_str(&text).map_err(|e| {
            error!(url = %url, error = %e, body = %text, "Failed to decode wallet response");
            WalletError::Decode(e.to_string())
        })?;

        Ok(parsed.into())
    }
}

/// Build a `Rejected` error, preferring a message field from a JSON body.
fn rejection(status: u16, body: &str) -> WalletError {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        });

    let message = match from_json {
        Some(m) => m,
        None if body.trim().is_empty() => format!("wallet service returned status: {status}"),
        None => body.trim().chars().take(MAX_ERROR_BODY).collect(),
    };

    WalletError::Rejected { status, message }
}

#[async_trait]
impl WalletGateway for HttpWalletClient {
    async fn deposit(
        &self,
        ctx: &CallContext,
        op: &WalletOperation,
    ) -> Result<Settlement, WalletError> {
        self.operate(ctx, "/api/v1/deposit", op).await
    }

    async fn withdraw(
        &self,
        ctx: &CallContext,
        op: &WalletOperation,
    ) -> Result<Settlement, WalletError> {
        self.operate(ctx, "/api/v1/withdraw", op).await
    }

    async fn cancel_by_reference(
        &self,
        ctx: &CallContext,
        reference: &str,
    ) -> Result<(), WalletError> {
        let url = self.cancel_url(reference).inspect_err(|e| {
            warn!(reference = %reference, error = %e, "Refusing to send wallet cancel");
        })?;
        debug!(url = %url, "Cancelling wallet operation");

        let response = self
            .client
            .post(url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.request_timeout(ctx)?)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "Wallet refused cancel");
            return Err(rejection(status.as_u16(), &text));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    async fn spawn_wallet(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn op(reference: &str) -> WalletOperation {
        WalletOperation {
            wallet_handle: 34633089486,
            amount: "25.5".parse().unwrap(),
            currency: "USD".into(),
            reference: reference.into(),
        }
    }

    #[tokio::test]
    async fn test_deposit_wire_format() {
        let app = Router::new().route(
            "/api/v1/deposit",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers.get("x-api-key").unwrap(), "secret");
                assert_eq!(body["currency"], "USD");
                assert_eq!(body["userId"], 34633089486_i64);
                assert_eq!(body["transactions"][0]["amount"], 25.5);
                assert_eq!(body["transactions"][0]["betId"], 0);
                assert_eq!(body["transactions"][0]["reference"], "prov-1");
                Json(json!({
                    "balance": "125.50",
                    "transactions": [{"id": 991, "reference": "prov-1"}]
                }))
            }),
        );
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "secret", Duration::from_secs(5)).unwrap();

        let settlement = client
            .deposit(&CallContext::background(), &op("prov-1"))
            .await
            .unwrap();
        assert_eq!(settlement.balance, "125.50");
        assert_eq!(settlement.reference.as_deref(), Some("991"));
    }

    #[tokio::test]
    async fn test_numeric_balance_accepted() {
        let app = Router::new().route(
            "/api/v1/withdraw",
            post(|| async { Json(json!({"balance": 40.0, "transactions": []})) }),
        );
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "k", Duration::from_secs(5)).unwrap();

        let settlement = client
            .withdraw(&CallContext::background(), &op("w-1"))
            .await
            .unwrap();
        assert_eq!(settlement.balance, "40.0");
        assert!(settlement.reference.is_none());
    }

    #[tokio::test]
    async fn test_rejection_carries_status_and_message() {
        let app = Router::new().route(
            "/api/v1/withdraw",
            post(|| async {
                (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({"code": "LIMIT", "message": "daily limit reached"})),
                )
            }),
        );
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "k", Duration::from_secs(5)).unwrap();

        let err = client
            .withdraw(&CallContext::background(), &op("w-2"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::Rejected {
                status: 402,
                message: "daily limit reached".into()
            }
        );
    }

    #[tokio::test]
    async fn test_plain_text_rejection() {
        let app = Router::new().route(
            "/api/v1/deposit",
            post(|| async { (StatusCode::BAD_REQUEST, "bad currency") }),
        );
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "k", Duration::from_secs(5)).unwrap();

        let err = client
            .deposit(&CallContext::background(), &op("d-3"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::Rejected {
                status: 400,
                message: "bad currency".into()
            }
        );
    }

    #[tokio::test]
    async fn test_garbage_success_body_is_decode_error() {
        let app = Router::new().route("/api/v1/deposit", post(|| async { "not json" }));
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "k", Duration::from_secs(5)).unwrap();

        let err = client
            .deposit(&CallContext::background(), &op("d-4"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fixed_timeout_applies() {
        let app = Router::new().route(
            "/api/v1/deposit",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"balance": "1"}))
            }),
        );
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "k", Duration::from_millis(100)).unwrap();

        let err = client
            .deposit(&CallContext::background(), &op("slow"))
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::Timeout);
    }

    #[tokio::test]
    async fn test_caller_deadline_shortens_timeout() {
        let app = Router::new().route(
            "/api/v1/withdraw",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"balance": "1"}))
            }),
        );
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "k", Duration::from_secs(30)).unwrap();

        let started = std::time::Instant::now();
        let err = client
            .withdraw(&CallContext::with_timeout(Duration::from_millis(100)), &op("slow"))
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::Timeout);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancel_by_reference() {
        let app = Router::new().route(
            "/cancel/{reference}",
            post(|Path(reference): Path<String>| async move {
                if reference == "known" {
                    StatusCode::OK
                } else {
                    StatusCode::NOT_FOUND
                }
            }),
        );
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "k", Duration::from_secs(5)).unwrap();
        let ctx = CallContext::background();

        assert!(client.cancel_by_reference(&ctx, "known").await.is_ok());
        let err = client.cancel_by_reference(&ctx, "unknown").await.unwrap_err();
        assert!(matches!(err, WalletError::Rejected { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_cancel_reference_stays_one_path_segment() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let cancel_seen = seen.clone();
        let deposit_seen = seen.clone();
        let app = Router::new()
            .route(
                "/cancel/{reference}",
                post(move |Path(reference): Path<String>| async move {
                    cancel_seen.lock().unwrap().push(format!("cancel:{reference}"));
                    StatusCode::OK
                }),
            )
            .route(
                "/api/v1/deposit",
                post(move || async move {
                    deposit_seen.lock().unwrap().push("deposit".to_string());
                    StatusCode::OK
                }),
            );
        let base = spawn_wallet(app).await;
        let client = HttpWalletClient::new(base, "k", Duration::from_secs(5)).unwrap();
        let ctx = CallContext::background();

        for reference in ["victim-ref?mine=1", "../api/v1/deposit", "bet#42", "a/b", "..", ""] {
            let err = client.cancel_by_reference(&ctx, reference).await.unwrap_err();
            assert_eq!(err, WalletError::InvalidReference(reference.to_string()));
        }
        assert!(seen.lock().unwrap().is_empty());

        client.cancel_by_reference(&ctx, "round:7.bet_42").await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["cancel:round:7.bet_42".to_string()]);
    }

    #[test]
    fn test_cancel_url_keeps_base_path() {
        let client =
            HttpWalletClient::new("http://wallet.local/v2/", "k", Duration::from_secs(1)).unwrap();
        let url = client.cancel_url("bet-1").unwrap();
        assert_eq!(url.as_str(), "http://wallet.local/v2/cancel/bet-1");
    }

    #[tokio::test]
    async fn test_unreachable_wallet_is_transport_error() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            HttpWalletClient::new(format!("http://{}", addr), "k", Duration::from_secs(2)).unwrap();
        let err = client
            .deposit(&CallContext::background(), &op("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Transport(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            HttpWalletClient::new("http://wallet.local/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://wallet.local");
    }
}
