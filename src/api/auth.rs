use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::db::Session;
use crate::AppState;

use super::error::ApiError;

/// Extract the token from the Authorization header.
///
/// Accepts `Bearer <token>` and `Token <token>`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") && !scheme.eq_ignore_ascii_case("token") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Auth middleware that resolves the caller and stores the `User` as a
/// request extension for the handlers behind it
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided"))?;

    let user = Session::find_user(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_schemes() {
        assert_eq!(extract_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_token(&headers("Token abc123")), Some("abc123"));
        assert_eq!(extract_token(&headers("token abc123")), Some("abc123"));
    }

    #[test]
    fn test_extract_token_rejects_other_forms() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&headers("abc123")), None);
        assert_eq!(extract_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_token(&headers("Bearer ")), None);
    }
}
