//! Tweet API endpoints
//!
//! Handles HTTP requests for tweets, likes, and comments:
//! - GET /api/v1/tweets - Timeline, newest first
//! - POST /api/v1/tweets - Post a tweet
//! - GET /api/v1/tweets/{id} - One tweet
//! - DELETE /api/v1/tweets/{id} - Delete own tweet
//! - POST /api/v1/tweets/{id}/like - Toggle a like
//! - GET /api/v1/tweets/{id}/comments - Comments, oldest first
//! - POST /api/v1/tweets/{id}/comments - Comment on a tweet
//!
//! Every tweet read renders through `TweetResponse::from_parts` with
//! engagement computed for the requesting user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{CommentResponse, TweetResponse};
use crate::models::{Tweet, User};
use crate::services::tweet::TweetServiceError;

/// Request body for posting a tweet
#[derive(Debug, Deserialize)]
pub struct CreateTweetRequest {
    pub content: String,
}

/// Request body for posting a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Result of a like toggle
#[derive(Debug, Serialize)]
pub struct LikeToggleResponse {
    /// "liked" or "unliked"
    pub status: &'static str,
    pub liked: bool,
    pub likes_count: i64,
}

/// Build the tweets router (all routes require auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tweets).post(create_tweet))
        .route("/{id}", get(get_tweet).delete(delete_tweet))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/comments", get(list_comments).post(create_comment))
}

/// Render one tweet for the given viewer
async fn render_tweet(
    state: &AppState,
    tweet: &Tweet,
    viewer: &User,
) -> Result<TweetResponse, ApiError> {
    let author = state
        .user_service
        .get_by_id(tweet.author_id)
        .await
        .map_err(|e| ApiError::internal_error(format!("Author lookup failed: {}", e)))?;

    let engagement = state
        .engagement_service
        .compute(tweet, Some(viewer.id))
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(TweetResponse::from_parts(tweet, &author, &engagement))
}

fn map_tweet_error(e: TweetServiceError) -> ApiError {
    match e {
        TweetServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        TweetServiceError::NotFound => ApiError::not_found("Tweet not found"),
        TweetServiceError::Forbidden => ApiError::forbidden("Only the author may do that"),
        other => ApiError::internal_error(other.to_string()),
    }
}

/// GET /api/v1/tweets - Timeline, newest first
async fn list_tweets(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<TweetResponse>>, ApiError> {
    let tweets = state.tweet_service.list().await.map_err(map_tweet_error)?;

    let mut responses = Vec::with_capacity(tweets.len());
    for tweet in &tweets {
        responses.push(render_tweet(&state, tweet, &user.0).await?);
    }

    Ok(Json(responses))
}

/// POST /api/v1/tweets - Post a tweet
async fn create_tweet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateTweetRequest>,
) -> Result<(StatusCode, Json<TweetResponse>), ApiError> {
    let tweet = state
        .tweet_service
        .create_tweet(user.0.id, &body.content)
        .await
        .map_err(map_tweet_error)?;

    let response = render_tweet(&state, &tweet, &user.0).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/tweets/{id} - One tweet
async fn get_tweet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<TweetResponse>, ApiError> {
    let tweet = state
        .tweet_service
        .get_by_id(id)
        .await
        .map_err(map_tweet_error)?;

    Ok(Json(render_tweet(&state, &tweet, &user.0).await?))
}

/// DELETE /api/v1/tweets/{id} - Delete own tweet
async fn delete_tweet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .tweet_service
        .delete(user.0.id, id)
        .await
        .map_err(map_tweet_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/tweets/{id}/like - Toggle a like
async fn toggle_like(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeToggleResponse>, ApiError> {
    let like_state = state
        .tweet_service
        .toggle_like(user.0.id, id)
        .await
        .map_err(map_tweet_error)?;

    Ok(Json(LikeToggleResponse {
        status: if like_state.liked { "liked" } else { "unliked" },
        liked: like_state.liked,
        likes_count: like_state.likes_count,
    }))
}

/// GET /api/v1/tweets/{id}/comments - Comments, oldest first
async fn list_comments(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let comments = state
        .tweet_service
        .list_comments(id)
        .await
        .map_err(map_tweet_error)?;

    Ok(Json(comments.iter().map(CommentResponse::from).collect()))
}

/// POST /api/v1/tweets/{id}/comments - Comment on a tweet
async fn create_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let comment = state
        .tweet_service
        .create_comment(user.0.id, id, &body.content)
        .await
        .map_err(map_tweet_error)?;

    let response = CommentResponse {
        id: comment.id,
        tweet: comment.tweet_id,
        author: comment.author_id,
        author_email: user.0.email.clone(),
        content: comment.content,
        created_at: comment.created_at.to_rfc3339(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}
