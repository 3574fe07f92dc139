use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State};
use serde_json::Value;

use crate::auth::{self, SharedSecret};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::VerifyResponse;

/// POST - Check an administrator password and mint a token
///
/// Input: `{"password": "string"}`. An empty body, a missing password or a
/// non-string password all count as a wrong password.
///
/// Any JSON body (or none) is answered with 200; only unparseable JSON is a 400:
/// ```json
/// { "valid": true, "token": "<64 hex chars>" }
/// { "valid": false }
/// ```
/// The token is not stored; nothing in this service validates it later.
pub async fn verify_post(
    State(secret): State<SharedSecret>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<VerifyResponse> {
    let password = extract_password(&body?)?;

    if secret.matches(&password) {
        tracing::info!("Password verified, token issued");
        Ok(ApiResponse::success(VerifyResponse::accepted(auth::issue_token(&password))))
    } else {
        tracing::info!("Password verification failed");
        Ok(ApiResponse::success(VerifyResponse::rejected()))
    }
}

/// Every method other than POST and OPTIONS
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

fn extract_password(body: &[u8]) -> Result<String, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(String::new());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))?;

    Ok(value
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}
