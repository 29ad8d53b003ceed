//! End-to-end: real router, in-memory ledger, HTTP wallet client pointed at a
//! fake wallet server.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use player_wallet::account::{AccountService, RoundRobinAllocator};
use player_wallet::gateway::{AppState, build_router};
use player_wallet::ledger::{LedgerStore, MemoryLedgerStore};
use player_wallet::transaction::{OrchestratorConfig, TransactionOrchestrator};
use player_wallet::wallet::HttpWalletClient;

const HANDLE: i64 = 34633089486;

/// Fake wallet: one balance per process, float amounts in, string balance out.
#[derive(Default)]
struct FakeWallet {
    balance: Mutex<f64>,
    calls: AtomicUsize,
    cancels: AtomicUsize,
}

async fn fake_operation(wallet: &FakeWallet, body: &Value, sign: f64) -> Response {
    wallet.calls.fetch_add(1, Ordering::SeqCst);
    let line = &body["transactions"][0];
    let reference = line["reference"].as_str().unwrap_or_default().to_string();
    let amount = line["amount"].as_f64().unwrap_or_default();

    if reference.starts_with("reject") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "limit exceeded"})),
        )
            .into_response();
    }
    if reference.starts_with("slow") {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    let balance = {
        let mut b = wallet.balance.lock().unwrap();
        *b += sign * amount;
        *b
    };
    Json(json!({
        "balance": format!("{:.2}", balance),
        "transactions": [{"id": 7001, "reference": reference}]
    }))
    .into_response()
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

struct TestApp {
    base: String,
    http: reqwest::Client,
    wallet: Arc<FakeWallet>,
}

impl TestApp {
    async fn start() -> Self {
        let wallet = Arc::new(FakeWallet::default());
        let wallet_app = Router::new()
            .route(
                "/api/v1/deposit",
                post(|State(w): State<Arc<FakeWallet>>, Json(body): Json<Value>| async move {
                    fake_operation(&w, &body, 1.0).await
                }),
            )
            .route(
                "/api/v1/withdraw",
                post(|State(w): State<Arc<FakeWallet>>, Json(body): Json<Value>| async move {
                    fake_operation(&w, &body, -1.0).await
                }),
            )
            .route(
                "/cancel/{reference}",
                post(
                    |State(w): State<Arc<FakeWallet>>, Path(_reference): Path<String>| async move {
                        w.cancels.fetch_add(1, Ordering::SeqCst);
                        StatusCode::OK
                    },
                ),
            )
            .with_state(wallet.clone());
        let wallet_url = spawn(wallet_app).await;

        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedgerStore::new());
        let client =
            HttpWalletClient::new(wallet_url, "test-key", Duration::from_millis(300)).unwrap();
        let orchestrator = Arc::new(TransactionOrchestrator::with_config(
            store.clone(),
            Arc::new(client),
            OrchestratorConfig {
                bookkeeping_timeout: Duration::from_secs(2),
            },
        ));
        let accounts = Arc::new(AccountService::new(
            store.clone(),
            Arc::new(RoundRobinAllocator::new(vec![HANDLE])),
        ));
        let state = Arc::new(AppState::new(
            orchestrator,
            accounts,
            store,
            Duration::from_secs(5),
        ));
        let base = spawn(build_router(state)).await;

        Self {
            base,
            http: reqwest::Client::new(),
            wallet,
        }
    }

    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/accounts",
                None,
                json!({"username": username, "email": format!("{username}@example.com")}),
            )
            .await;
        assert_eq!(status, 201, "register failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn post(&self, path: &str, account: Option<&str>, body: Value) -> (u16, Value) {
        let mut req = self.http.post(format!("{}{}", self.base, path)).json(&body);
        if let Some(id) = account {
            req = req.header("X-Account-Id", id);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str, account: Option<&str>) -> (u16, Value) {
        let mut req = self.http.get(format!("{}{}", self.base, path));
        if let Some(id) = account {
            req = req.header("X-Account-Id", id);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    fn wallet_calls(&self) -> usize {
        self.wallet.calls.load(Ordering::SeqCst)
    }
}

fn dec(v: &Value) -> Decimal {
    match v {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

#[tokio::test]
async fn test_deposit_withdraw_and_queries() {
    let app = TestApp::start().await;
    let alice = app.register("alice").await;

    let (status, body) = app
        .post(
            "/api/v1/transactions/deposit",
            Some(&alice),
            json!({"currency": "eur", "amount": 100, "provider_transaction_id": "p-1"}),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "WON");
    assert_eq!(dec(&body["data"]["old_balance"]), Decimal::ZERO);
    assert_eq!(dec(&body["data"]["new_balance"]), Decimal::from(100));

    let (status, body) = app
        .post(
            "/api/v1/transactions/withdraw",
            Some(&alice),
            json!({"currency": "EUR", "amount": "60", "provider_transaction_id": "p-2"}),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"]["status"], "COMPLETED");
    assert_eq!(dec(&body["data"]["old_balance"]), Decimal::from(100));
    assert_eq!(dec(&body["data"]["new_balance"]), Decimal::from(40));
    let withdraw_id = body["data"]["transaction_id"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/v1/account/balance", Some(&alice)).await;
    assert_eq!(status, 200);
    assert_eq!(dec(&body["data"]["balance"]), Decimal::from(40));

    let (status, body) = app.get("/api/v1/account/transactions", Some(&alice)).await;
    assert_eq!(status, 200);
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["kind"], "withdraw");
    assert_eq!(history[1]["kind"], "deposit");
    assert_eq!(history[1]["currency"], "EUR");

    let (status, body) = app
        .get(&format!("/api/v1/transactions/{withdraw_id}"), Some(&alice))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["reference"], "p-2");

    let (status, body) = app.get("/api/v1/account/profile", Some(&alice)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["wallet_handle"], HANDLE);
}

#[tokio::test]
async fn test_zero_deposit_reports_lost() {
    let app = TestApp::start().await;
    let alice = app.register("zoe").await;

    let (status, body) = app
        .post(
            "/api/v1/transactions/deposit",
            Some(&alice),
            json!({"currency": "EUR", "amount": 0, "provider_transaction_id": "p-0"}),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"]["status"], "LOST");
}

#[tokio::test]
async fn test_insufficient_balance_never_reaches_wallet() {
    let app = TestApp::start().await;
    let alice = app.register("carol").await;

    let (status, body) = app
        .post(
            "/api/v1/transactions/withdraw",
            Some(&alice),
            json!({"currency": "EUR", "amount": 500, "provider_transaction_id": "p-9"}),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], 1002);
    assert_eq!(app.wallet_calls(), 0);

    let (_, body) = app.get("/api/v1/account/transactions", Some(&alice)).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_errors() {
    let app = TestApp::start().await;
    let alice = app.register("dave").await;

    let (status, body) = app
        .post(
            "/api/v1/transactions/deposit",
            Some(&alice),
            json!({"currency": "EUR", "amount": -5, "provider_transaction_id": "p-1"}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 1003);

    let (status, body) = app
        .post(
            "/api/v1/transactions/deposit",
            Some(&alice),
            json!({"currency": "E1", "amount": 5, "provider_transaction_id": "p-1"}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 1004);
    assert_eq!(app.wallet_calls(), 0);
}

#[tokio::test]
async fn test_provider_transaction_id_is_checked_at_the_boundary() {
    let app = TestApp::start().await;
    let erin = app.register("erin").await;

    for (path, provider_id) in [
        ("/api/v1/transactions/deposit", ""),
        ("/api/v1/transactions/deposit", "   "),
        ("/api/v1/transactions/withdraw", "victim-ref?mine=1"),
        ("/api/v1/transactions/withdraw", "../api/v1/deposit"),
    ] {
        let (status, body) = app
            .post(
                path,
                Some(&erin),
                json!({"currency": "EUR", "amount": 5, "provider_transaction_id": provider_id}),
            )
            .await;
        assert_eq!(status, 400, "{provider_id:?}");
        assert_eq!(body["code"], 1001);
    }

    let (_, history) = app.get("/api/v1/account/transactions", Some(&erin)).await;
    assert_eq!(history["data"].as_array().map(Vec::len), Some(0));
    assert_eq!(app.wallet_calls(), 0);
}

#[tokio::test]
async fn test_wallet_rejection_passes_through_and_records_failure() {
    let app = TestApp::start().await;
    let alice = app.register("erin").await;

    let (status, body) = app
        .post(
            "/api/v1/transactions/deposit",
            Some(&alice),
            json!({"currency": "EUR", "amount": 10, "provider_transaction_id": "reject-1"}),
        )
        .await;
    assert_eq!(status, 422);
    assert_eq!(body["code"], 3001);
    assert_eq!(body["msg"], "limit exceeded");

    let (_, body) = app.get("/api/v1/account/transactions", Some(&alice)).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], "failed");

    let (_, body) = app.get("/api/v1/account/balance", Some(&alice)).await;
    assert_eq!(dec(&body["data"]["balance"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_wallet_timeout_marks_failed() {
    let app = TestApp::start().await;
    let alice = app.register("frank").await;

    let (status, body) = app
        .post(
            "/api/v1/transactions/deposit",
            Some(&alice),
            json!({"currency": "EUR", "amount": 10, "provider_transaction_id": "slow-1"}),
        )
        .await;
    assert_eq!(status, 504, "{body}");

    let (_, body) = app.get("/api/v1/account/transactions", Some(&alice)).await;
    assert_eq!(body["data"][0]["status"], "failed");
    let (_, body) = app.get("/api/v1/account/balance", Some(&alice)).await;
    assert_eq!(dec(&body["data"]["balance"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_cancel_rules() {
    let app = TestApp::start().await;
    let alice = app.register("grace").await;
    let bob = app.register("heidi").await;

    let (_, body) = app
        .post(
            "/api/v1/transactions/deposit",
            Some(&alice),
            json!({"currency": "EUR", "amount": 20, "provider_transaction_id": "p-1"}),
        )
        .await;
    let tx_id = body["data"]["transaction_id"].as_str().unwrap().to_string();
    let cancel_path = format!("/api/v1/transactions/{tx_id}/cancel");

    let (status, body) = app.post(&cancel_path, Some(&bob), json!({})).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], 2003);

    let (status, body) = app.post(&cancel_path, Some(&alice), json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 1005);
    assert_eq!(app.wallet.cancels.load(Ordering::SeqCst), 0);

    let (status, _) = app
        .post(
            &format!("/api/v1/transactions/{}/cancel", uuid::Uuid::new_v4()),
            Some(&alice),
            json!({}),
        )
        .await;
    assert_eq!(status, 404);

    let (status, body) = app
        .post("/api/v1/transactions/not-a-uuid/cancel", Some(&alice), json!({}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn test_identity_and_registration_errors() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/api/v1/account/balance", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], 2001);

    let (status, body) = app.get("/api/v1/account/balance", Some("nope")).await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], 2002);

    let (status, _) = app
        .get(
            "/api/v1/account/balance",
            Some(&uuid::Uuid::new_v4().to_string()),
        )
        .await;
    assert_eq!(status, 404);

    app.register("ivan").await;
    let (status, body) = app
        .post(
            "/api/v1/accounts",
            None,
            json!({"username": "ivan", "email": "other@example.com"}),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], 4091);

    let (status, _) = app
        .post(
            "/api/v1/accounts",
            None,
            json!({"username": "jo", "email": "jo@example.com"}),
        )
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::start().await;
    let (status, body) = app.get("/api/v1/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["code"], 0);
    assert!(body["data"]["timestamp_ms"].as_i64().unwrap() > 0);
}
