// =============================================================================
// API token checks
// =============================================================================
//
// Protected REST routes take an `AuthBearer` argument; the WebSocket route
// passes its `?token=` query value through `validate_token`. Both resolve
// against the token loaded from `ADVISOR_API_TOKEN` at startup, and both
// refuse everything when that token is absent.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::app_state::AppState;

/// Byte equality whose running time depends only on the lengths.
fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (p, e)| acc | (p ^ e))
            == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    NotConfigured,
    Missing,
    Mismatch,
}

impl AuthFailure {
    fn message(self) -> &'static str {
        match self {
            AuthFailure::NotConfigured => "Server authentication not configured",
            AuthFailure::Missing => "Missing or invalid authorization token",
            AuthFailure::Mismatch => "Invalid authorization token",
        }
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": self.message() })),
        )
            .into_response()
    }
}

fn check(state: &AppState, presented: Option<&str>) -> Result<(), AuthFailure> {
    let expected = state.api_token().ok_or(AuthFailure::NotConfigured)?;
    let presented = presented.ok_or(AuthFailure::Missing)?;
    if tokens_match(presented.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AuthFailure::Mismatch)
    }
}

/// Marker extractor: present in a handler's arguments only if the request
/// carried `Authorization: Bearer <token>` with the configured token.
pub struct AuthBearer;

impl FromRequestParts<Arc<AppState>> for AuthBearer {
    type Rejection = AuthFailure;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        check(state, bearer).map(|()| AuthBearer).map_err(|failure| {
            warn!(?failure, path = %parts.uri.path(), "protected request refused");
            failure
        })
    }
}

/// True when `token` equals the configured API token.
pub fn validate_token(state: &AppState, token: &str) -> bool {
    check(state, Some(token)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::tests::test_state;

    #[test]
    fn token_comparison() {
        assert!(tokens_match(b"abc123", b"abc123"));
        assert!(tokens_match(b"", b""));
        assert!(!tokens_match(b"abc123", b"abc124"));
        assert!(!tokens_match(b"abc", b"abc123"));
    }

    #[test]
    fn check_reports_each_failure() {
        assert_eq!(check(&test_state(None), Some("x")), Err(AuthFailure::NotConfigured));

        let state = test_state(Some("s3cret"));
        assert_eq!(check(&state, None), Err(AuthFailure::Missing));
        assert_eq!(check(&state, Some("s3cre")), Err(AuthFailure::Mismatch));
        assert_eq!(check(&state, Some("s3cret")), Ok(()));
    }

    #[test]
    fn websocket_token_needs_configuration() {
        assert!(!validate_token(&test_state(None), ""));
        assert!(validate_token(&test_state(Some("s3cret")), "s3cret"));
    }
}
