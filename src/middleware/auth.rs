use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::SharedSecret;
use crate::error::ApiError;

/// Header carrying the shared secret on data requests
pub const PASSWORD_HEADER: &str = "x-password";

/// Localized "wrong password" message expected by the site frontend
pub const WRONG_PASSWORD_MESSAGE: &str = "Неверный пароль";

/// Shared-secret gate for the data handler.
///
/// Every request must carry `X-Password` equal to the shared secret, or is
/// answered with 401 before the handler runs (and before any store session
/// is opened). Preflights never get here: the CORS layer sits outside the
/// gate and answers them itself.
pub async fn require_shared_secret(
    State(secret): State<SharedSecret>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !password_matches(request.headers(), &secret) {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request with missing or wrong password header"
        );
        return Err(ApiError::unauthorized(WRONG_PASSWORD_MESSAGE));
    }

    Ok(next.run(request).await)
}

/// Header names are case-insensitive; the value must match exactly
fn password_matches(headers: &HeaderMap, secret: &SharedSecret) -> bool {
    headers
        .get(PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|candidate| secret.matches(candidate))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_lookup_ignores_name_case() {
        let secret = SharedSecret::new("pw");
        let mut headers = HeaderMap::new();
        headers.insert("X-Password", HeaderValue::from_static("pw"));
        assert!(password_matches(&headers, &secret));
    }

    #[test]
    fn missing_or_wrong_header_fails() {
        let secret = SharedSecret::new("pw");
        assert!(!password_matches(&HeaderMap::new(), &secret));

        let mut headers = HeaderMap::new();
        headers.insert("x-password", HeaderValue::from_static("PW"));
        assert!(!password_matches(&headers, &secret));
    }
}
