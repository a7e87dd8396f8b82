//! User graph API endpoints
//!
//! Handles HTTP requests for the follow graph and user discovery:
//! - POST /api/v1/users/{id}/follow - Toggle following a user
//! - GET /api/v1/users/followers-following - The caller's follow lists
//! - GET /api/v1/users/search?q= - Search users by email substring

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{
    FollowToggleResponse, FollowersFollowingResponse, SearchResponse, SearchResultItem,
    UserListItem,
};
use crate::services::social::SocialServiceError;

/// Query string for user search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Build the users router (all routes require auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/follow", post(toggle_follow))
        .route("/followers-following", get(followers_following))
        .route("/search", get(search_users))
}

/// POST /api/v1/users/{id}/follow - Toggle following a user
async fn toggle_follow(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(target_id): Path<i64>,
) -> Result<Json<FollowToggleResponse>, ApiError> {
    let follow_state = state
        .social_service
        .toggle_follow(user.0.id, target_id)
        .await
        .map_err(|e| match e {
            SocialServiceError::SelfFollow => {
                ApiError::self_follow("Users cannot follow themselves")
            }
            SocialServiceError::NotFound => ApiError::not_found("User not found"),
            other => ApiError::internal_error(other.to_string()),
        })?;

    Ok(Json(FollowToggleResponse::new(
        follow_state.is_following,
        follow_state.followers_count,
    )))
}

/// GET /api/v1/users/followers-following - The caller's follow lists
async fn followers_following(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<FollowersFollowingResponse>, ApiError> {
    let lists = state
        .social_service
        .followers_following(user.0.id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let followers: Vec<UserListItem> = lists.followers.iter().map(UserListItem::from).collect();
    let following: Vec<UserListItem> = lists.following.iter().map(UserListItem::from).collect();

    Ok(Json(FollowersFollowingResponse {
        followers_count: followers.len(),
        following_count: following.len(),
        followers,
        following,
    }))
}

/// GET /api/v1/users/search?q= - Search users by email substring
async fn search_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let hits = state
        .social_service
        .search_users(user.0.id, &query.q)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let results = hits
        .iter()
        .map(|hit| SearchResultItem {
            id: hit.user.id,
            email: hit.user.email.clone(),
            username: hit.user.handle().to_string(),
            bio: hit.user.bio.clone().unwrap_or_default(),
            is_following: hit.is_following,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}
