use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::admin::AdminState;

/// Requires `Authorization: Bearer <admin.api_key>`. An empty configured
/// key rejects every request.
pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Some(token) = auth_header.and_then(|v| v.strip_prefix("Bearer ")) {
        if key_matches(token, &state.api_key) {
            return Ok(next.run(request).await);
        }
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request without valid key");
    Err(StatusCode::UNAUTHORIZED)
}

/// Constant-time comparison of the presented token against the key.
fn key_matches(token: &str, key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    // Slice ct_eq short-circuits on length, so compare equal-length prefixes.
    let same_len = token.len().ct_eq(&key.len());
    let len = token.len().min(key.len());
    let same_prefix = token.as_bytes()[..len].ct_eq(&key.as_bytes()[..len]);
    (same_len & same_prefix).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches() {
        assert!(key_matches("secret", "secret"));
        assert!(!key_matches("secreT", "secret"));
        assert!(!key_matches("secret-and-more", "secret"));
        assert!(!key_matches("sec", "secret"));
        assert!(!key_matches("", ""));
    }
}
