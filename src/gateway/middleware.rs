//! Caller identity
//!
//! Authentication happens upstream. The authenticator forwards the resolved
//! account id in `X-Account-Id`; this layer only parses it.

use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::types::{ApiResponse, error_codes};

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Injected into request extensions for authenticated routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub account_id: Uuid,
}

pub async fn account_identity_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<()>>)> {
    let raw = request
        .headers()
        .get(ACCOUNT_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::MISSING_AUTH,
                "Missing X-Account-Id header",
            )),
        ))?;

    let account_id = Uuid::parse_str(raw.trim()).map_err(|_| {
        tracing::warn!(header = raw, "Rejected malformed account id");
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::AUTH_FAILED,
                "Invalid X-Account-Id header",
            )),
        )
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedAccount { account_id });
    Ok(next.run(request).await)
}
