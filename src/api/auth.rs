//! Authentication API endpoints
//!
//! Handles HTTP requests for accounts and sessions:
//! - POST /api/v1/auth/signup - Create an account
//! - POST /api/v1/auth/login - Log in, returns a session token
//! - POST /api/v1/auth/logout - Invalidate the current session
//! - GET /api/v1/auth/profile - Current user's profile
//! - PATCH /api/v1/auth/profile - Partial profile update
//! - DELETE /api/v1/auth/profile - Delete the account and everything it owns

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{SignupInput, UpdateProfileInput};
use crate::services::user::UserServiceError;

/// Request body for signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for profile updates; absent fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Response for a newly created account
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: i64,
    pub email: String,
}

/// Response for successful login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: ProfileResponse,
    pub token: String,
}

/// Profile as returned to its owner
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl From<crate::models::User> for ProfileResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.handle().to_string(),
            email: user.email,
            bio: user.bio,
            avatar: user.avatar,
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route(
            "/profile",
            get(get_profile).patch(update_profile).delete(delete_account),
        )
}

/// POST /api/v1/auth/signup - Create an account
async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut input = SignupInput::new(body.email, body.password);
    input.bio = body.bio;
    input.avatar = body.avatar;

    let user = state.user_service.signup(input).await.map_err(|e| match e {
        UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        other => ApiError::internal_error(other.to_string()),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}

/// POST /api/v1/auth/login - Log in with email and password
///
/// Returns the token in the body and also sets it as an HttpOnly cookie so
/// browser clients work without storing the token in script-visible state.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state
        .user_service
        .login(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            other => ApiError::internal_error(other.to_string()),
        })?;

    // Cookie lifetime tracks the session so the two expire together
    let max_age = (session.expires_at - session.created_at).num_seconds();
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id, max_age
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(format!("Invalid cookie value: {}", e)))?,
    );

    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout - Invalidate the current session
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    // The middleware already validated the token; re-extract it to delete it
    let token = crate::api::middleware::extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state
        .user_service
        .logout(&token)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    // Expire the cookie
    let cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(cookie));

    Ok((response_headers, StatusCode::NO_CONTENT))
}

/// GET /api/v1/auth/profile - Current user's profile
async fn get_profile(user: AuthenticatedUser) -> Json<ProfileResponse> {
    Json(user.0.into())
}

/// PATCH /api/v1/auth/profile - Update the current user's profile
async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let input = UpdateProfileInput {
        email: body.email,
        password: body.password,
        bio: body.bio,
        avatar: body.avatar,
    };

    let updated = state
        .user_service
        .update_profile(user.0.id, input)
        .await
        .map_err(|e| match e {
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            other => ApiError::internal_error(other.to_string()),
        })?;

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/auth/profile - Delete the current user's account
async fn delete_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state
        .user_service
        .delete(user.0.id)
        .await
        .map_err(|e| match e {
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            other => ApiError::internal_error(other.to_string()),
        })?;

    Ok(StatusCode::NO_CONTENT)
}
