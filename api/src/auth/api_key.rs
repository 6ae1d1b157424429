//! API key authentication middleware

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::app::hash_api_key;
use crate::error::AppError;
use crate::AppState;

/// Extract the API key from the Authorization header
fn extract_api_key(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Authentication middleware
///
/// Validates the API key and injects the `User` into request extensions.
/// Routes that require authentication should use this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = extract_api_key(&request).ok_or(AppError::Unauthorized)?;
    let key_hash = hash_api_key(api_key);

    let user = state
        .user_service
        .find_by_api_key(&key_hash)
        .await?
        .ok_or(AppError::Unauthorized)?;

    tracing::debug!(user_id = %user.id, "Authenticated request");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/me");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_key_is_extracted() {
        let request = request_with(Some("Bearer lp-abc"));
        assert_eq!(extract_api_key(&request), Some("lp-abc"));
    }

    #[test]
    fn missing_or_malformed_header_yields_none() {
        assert_eq!(extract_api_key(&request_with(None)), None);
        assert_eq!(extract_api_key(&request_with(Some("Basic abc"))), None);
        assert_eq!(extract_api_key(&request_with(Some("Bearer   "))), None);
    }
}
