//! API middleware
//!
//! Contains middleware for:
//! - Authentication (session token validation)
//! - Shared application state
//! - The uniform API error envelope

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::User;
use crate::services::engagement::EngagementService;
use crate::services::social::SocialService;
use crate::services::tweet::TweetService;
use crate::services::user::{UserService, UserServiceError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub tweet_service: Arc<TweetService>,
    pub social_service: Arc<SocialService>,
    pub engagement_service: Arc<EngagementService>,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn self_follow(message: impl Into<String>) -> Self {
        Self::new("SELF_FOLLOW", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" | "SELF_FOLLOW" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Extract the session token from request headers
///
/// Accepts `Authorization: Bearer <token>` or a `session` cookie.
pub(crate) fn extract_session_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
///
/// Validates the session token and stashes the logged-in user in request
/// extensions for handlers to extract.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| match e {
            UserServiceError::SessionNotFound | UserServiceError::SessionExpired => {
                ApiError::unauthorized("Invalid or expired session")
            }
            other => ApiError::internal_error(format!("Session validation failed: {}", other)),
        })?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Extractor for AuthenticatedUser from request extensions
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequestParts;
    use axum::http::HeaderMap;

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_token_from_bearer_header() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer abc123");

        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let headers = headers_with(header::COOKIE, "theme=dark; session=tok-42");

        assert_eq!(extract_session_token(&headers), Some("tok-42".to_string()));
    }

    #[test]
    fn test_extract_token_missing() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_bearer_takes_precedence_over_cookie() {
        let mut headers = headers_with(header::AUTHORIZATION, "Bearer header-token");
        headers.insert(header::COOKIE, "session=cookie-token".parse().unwrap());

        assert_eq!(
            extract_session_token(&headers),
            Some("header-token".to_string())
        );
    }

    #[tokio::test]
    async fn test_authenticated_user_extractor_reads_extension() {
        let user = User::new("extracted@example.com".to_string(), "hash".to_string());
        let request = Request::builder().body(Body::empty()).unwrap();
        let (mut parts, _body) = request.into_parts();
        parts.extensions.insert(AuthenticatedUser(user));

        let extracted = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .expect("Extension should yield the user");

        assert_eq!(extracted.0.email, "extracted@example.com");
    }

    #[tokio::test]
    async fn test_authenticated_user_extractor_rejects_without_extension() {
        let request = Request::builder().body(Body::empty()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let rejection = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .expect_err("No extension should reject");

        assert_eq!(rejection.error.code, "UNAUTHORIZED");
    }

    #[test]
    fn test_api_error_status_mapping() {
        let cases = [
            (ApiError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND),
            (ApiError::validation_error("x"), StatusCode::BAD_REQUEST),
            (ApiError::self_follow("x"), StatusCode::BAD_REQUEST),
            (ApiError::internal_error("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_api_error_serializes_envelope() {
        let error = ApiError::not_found("no such tweet");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "no such tweet");
        assert!(json["error"].get("details").is_none());
    }
}
