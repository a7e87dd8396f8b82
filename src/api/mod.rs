//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Chirp backend:
//! - Auth endpoints (signup, login, logout, profile)
//! - Tweet endpoints (timeline, posting, likes, comments)
//! - User graph endpoints (follow toggle, follow lists, search)
//!
//! Signup and login are public; everything else sits behind the session
//! auth middleware.

pub mod auth;
pub mod middleware;
pub mod responses;
pub mod tweets;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid session)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/tweets", tweets::router())
        .nest("/users", users::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxFollowRepository, SqlxSessionRepository, SqlxTweetRepository,
        SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::services::engagement::EngagementService;
    use crate::services::social::SocialService;
    use crate::services::tweet::TweetService;
    use crate::services::user::UserService;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn test_server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let tweet_repo = SqlxTweetRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());
        let follow_repo = SqlxFollowRepository::boxed(pool.clone());

        let state = AppState {
            pool: pool.clone(),
            user_service: Arc::new(UserService::new(user_repo.clone(), session_repo)),
            tweet_service: Arc::new(TweetService::new(tweet_repo.clone(), comment_repo.clone())),
            social_service: Arc::new(SocialService::new(user_repo, follow_repo.clone())),
            engagement_service: Arc::new(EngagementService::new(
                tweet_repo,
                comment_repo,
                follow_repo,
            )),
        };

        TestServer::new(build_router(state, "http://localhost:3000"))
            .expect("Failed to build test server")
    }

    /// Sign up and log in, returning (user id, session token)
    async fn signup_and_login(server: &TestServer, email: &str) -> (i64, String) {
        let signup = server
            .post("/api/v1/auth/signup")
            .json(&json!({"email": email, "password": "password123"}))
            .await;
        assert_eq!(signup.status_code(), StatusCode::CREATED);
        let id = signup.json::<Value>()["id"].as_i64().unwrap();

        let login = server
            .post("/api/v1/auth/login")
            .json(&json!({"email": email, "password": "password123"}))
            .await;
        assert_eq!(login.status_code(), StatusCode::OK);
        let token = login.json::<Value>()["token"].as_str().unwrap().to_string();

        (id, token)
    }

    #[tokio::test]
    async fn test_signup_and_login_flow() {
        let server = test_server().await;

        let (id, token) = signup_and_login(&server, "flow@example.com").await;
        assert!(id > 0);
        assert!(!token.is_empty());

        let profile = server
            .get("/api/v1/auth/profile")
            .authorization_bearer(&token)
            .await;
        assert_eq!(profile.status_code(), StatusCode::OK);
        let body = profile.json::<Value>();
        assert_eq!(body["email"], "flow@example.com");
        assert_eq!(body["username"], "flow");
    }

    #[tokio::test]
    async fn test_login_cookie_lifetime_matches_session() {
        let server = test_server().await;
        signup_and_login(&server, "cookie@example.com").await;

        let login = server
            .post("/api/v1/auth/login")
            .json(&json!({"email": "cookie@example.com", "password": "password123"}))
            .await;
        assert_eq!(login.status_code(), StatusCode::OK);

        let set_cookie = login
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .expect("Login should set the session cookie")
            .to_str()
            .expect("Cookie should be ASCII");

        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));
        // Seven days, the default session lifetime
        assert!(set_cookie.contains("Max-Age=604800"));
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_is_bad_request() {
        let server = test_server().await;
        signup_and_login(&server, "dup@example.com").await;

        let second = server
            .post("/api/v1/auth/signup")
            .json(&json!({"email": "dup@example.com", "password": "other"}))
            .await;

        assert_eq!(second.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(second.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_wrong_password_unauthorized() {
        let server = test_server().await;
        signup_and_login(&server, "locked@example.com").await;

        let login = server
            .post("/api/v1/auth/login")
            .json(&json!({"email": "locked@example.com", "password": "nope"}))
            .await;

        assert_eq!(login.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_requires_auth() {
        let server = test_server().await;

        let response = server.get("/api/v1/tweets").await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let server = test_server().await;
        let (_id, token) = signup_and_login(&server, "bye@example.com").await;

        let logout = server
            .post("/api/v1/auth/logout")
            .authorization_bearer(&token)
            .await;
        assert_eq!(logout.status_code(), StatusCode::NO_CONTENT);

        let profile = server
            .get("/api/v1/auth/profile")
            .authorization_bearer(&token)
            .await;
        assert_eq!(profile.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_tweet_create_and_timeline() {
        let server = test_server().await;
        let (id, token) = signup_and_login(&server, "poster@example.com").await;

        let created = server
            .post("/api/v1/tweets")
            .authorization_bearer(&token)
            .json(&json!({"content": "hello world"}))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);

        let body = created.json::<Value>();
        assert_eq!(body["content"], "hello world");
        assert_eq!(body["author_id"], id);
        assert_eq!(body["username"], "poster");
        assert_eq!(body["handle"], "poster");
        assert_eq!(body["likes_count"], 0);
        assert_eq!(body["liked_by_me"], false);
        assert_eq!(body["replies_count"], 0);
        assert_eq!(body["retweets_count"], 0);
        assert_eq!(body["is_following"], false);

        let timeline = server
            .get("/api/v1/tweets")
            .authorization_bearer(&token)
            .await;
        assert_eq!(timeline.status_code(), StatusCode::OK);
        assert_eq!(timeline.json::<Value>().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tweet_validation_errors() {
        let server = test_server().await;
        let (_id, token) = signup_and_login(&server, "strict@example.com").await;

        let blank = server
            .post("/api/v1/tweets")
            .authorization_bearer(&token)
            .json(&json!({"content": "   "}))
            .await;
        assert_eq!(blank.status_code(), StatusCode::BAD_REQUEST);

        let too_long = server
            .post("/api/v1/tweets")
            .authorization_bearer(&token)
            .json(&json!({"content": "x".repeat(281)}))
            .await;
        assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_like_toggle_endpoint() {
        let server = test_server().await;
        let (_id, token) = signup_and_login(&server, "liker@example.com").await;

        let created = server
            .post("/api/v1/tweets")
            .authorization_bearer(&token)
            .json(&json!({"content": "like me"}))
            .await;
        let tweet_id = created.json::<Value>()["id"].as_i64().unwrap();

        let like = server
            .post(&format!("/api/v1/tweets/{}/like", tweet_id))
            .authorization_bearer(&token)
            .await;
        assert_eq!(like.status_code(), StatusCode::OK);
        let body = like.json::<Value>();
        assert_eq!(body["status"], "liked");
        assert_eq!(body["liked"], true);
        assert_eq!(body["likes_count"], 1);

        let unlike = server
            .post(&format!("/api/v1/tweets/{}/like", tweet_id))
            .authorization_bearer(&token)
            .await;
        let body = unlike.json::<Value>();
        assert_eq!(body["status"], "unliked");
        assert_eq!(body["liked"], false);
        assert_eq!(body["likes_count"], 0);
    }

    #[tokio::test]
    async fn test_like_missing_tweet_not_found() {
        let server = test_server().await;
        let (_id, token) = signup_and_login(&server, "ghost@example.com").await;

        let like = server
            .post("/api/v1/tweets/999/like")
            .authorization_bearer(&token)
            .await;

        assert_eq!(like.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_tweet_author_only() {
        let server = test_server().await;
        let (_author_id, author_token) = signup_and_login(&server, "owner@example.com").await;
        let (_other_id, other_token) = signup_and_login(&server, "other@example.com").await;

        let created = server
            .post("/api/v1/tweets")
            .authorization_bearer(&author_token)
            .json(&json!({"content": "mine"}))
            .await;
        let tweet_id = created.json::<Value>()["id"].as_i64().unwrap();

        let forbidden = server
            .delete(&format!("/api/v1/tweets/{}", tweet_id))
            .authorization_bearer(&other_token)
            .await;
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let deleted = server
            .delete(&format!("/api/v1/tweets/{}", tweet_id))
            .authorization_bearer(&author_token)
            .await;
        assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

        let gone = server
            .get(&format!("/api/v1/tweets/{}", tweet_id))
            .authorization_bearer(&author_token)
            .await;
        assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comment_flow() {
        let server = test_server().await;
        let (_author_id, author_token) = signup_and_login(&server, "op@example.com").await;
        let (commenter_id, commenter_token) =
            signup_and_login(&server, "replier@example.com").await;

        let created = server
            .post("/api/v1/tweets")
            .authorization_bearer(&author_token)
            .json(&json!({"content": "discuss"}))
            .await;
        let tweet_id = created.json::<Value>()["id"].as_i64().unwrap();

        let comment = server
            .post(&format!("/api/v1/tweets/{}/comments", tweet_id))
            .authorization_bearer(&commenter_token)
            .json(&json!({"content": "interesting"}))
            .await;
        assert_eq!(comment.status_code(), StatusCode::CREATED);
        let body = comment.json::<Value>();
        assert_eq!(body["author"], commenter_id);
        assert_eq!(body["author_email"], "replier@example.com");

        let listing = server
            .get(&format!("/api/v1/tweets/{}/comments", tweet_id))
            .authorization_bearer(&author_token)
            .await;
        assert_eq!(listing.status_code(), StatusCode::OK);
        let comments = listing.json::<Value>();
        assert_eq!(comments.as_array().unwrap().len(), 1);
        assert_eq!(comments[0]["content"], "interesting");

        // The comment shows up in the tweet's replies_count
        let tweet = server
            .get(&format!("/api/v1/tweets/{}", tweet_id))
            .authorization_bearer(&author_token)
            .await;
        assert_eq!(tweet.json::<Value>()["replies_count"], 1);
    }

    #[tokio::test]
    async fn test_comment_author_ignores_payload_author() {
        let server = test_server().await;
        let (victim_id, victim_token) = signup_and_login(&server, "victim@example.com").await;
        let (spoofer_id, spoofer_token) = signup_and_login(&server, "spoofer@example.com").await;

        let created = server
            .post("/api/v1/tweets")
            .authorization_bearer(&victim_token)
            .json(&json!({"content": "target"}))
            .await;
        let tweet_id = created.json::<Value>()["id"].as_i64().unwrap();

        // A payload naming someone else as the author is ignored
        let comment = server
            .post(&format!("/api/v1/tweets/{}/comments", tweet_id))
            .authorization_bearer(&spoofer_token)
            .json(&json!({"content": "not yours", "author": victim_id}))
            .await;
        assert_eq!(comment.status_code(), StatusCode::CREATED);

        let body = comment.json::<Value>();
        assert_eq!(body["author"], spoofer_id);
        assert_eq!(body["author_email"], "spoofer@example.com");
    }

    #[tokio::test]
    async fn test_follow_toggle_endpoint() {
        let server = test_server().await;
        let (_a_id, a_token) = signup_and_login(&server, "a@example.com").await;
        let (b_id, _b_token) = signup_and_login(&server, "b@example.com").await;

        let follow = server
            .post(&format!("/api/v1/users/{}/follow", b_id))
            .authorization_bearer(&a_token)
            .await;
        assert_eq!(follow.status_code(), StatusCode::OK);
        let body = follow.json::<Value>();
        assert_eq!(body["status"], "followed");
        assert_eq!(body["is_following"], true);
        assert_eq!(body["followers_count"], 1);

        let unfollow = server
            .post(&format!("/api/v1/users/{}/follow", b_id))
            .authorization_bearer(&a_token)
            .await;
        let body = unfollow.json::<Value>();
        assert_eq!(body["status"], "unfollowed");
        assert_eq!(body["followers_count"], 0);
    }

    #[tokio::test]
    async fn test_self_follow_bad_request() {
        let server = test_server().await;
        let (id, token) = signup_and_login(&server, "narcissus@example.com").await;

        let response = server
            .post(&format!("/api/v1/users/{}/follow", id))
            .authorization_bearer(&token)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"]["code"], "SELF_FOLLOW");
    }

    #[tokio::test]
    async fn test_follow_missing_user_not_found() {
        let server = test_server().await;
        let (_id, token) = signup_and_login(&server, "alone@example.com").await;

        let response = server
            .post("/api/v1/users/999/follow")
            .authorization_bearer(&token)
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_followers_following_endpoint() {
        let server = test_server().await;
        let (_a_id, a_token) = signup_and_login(&server, "fan@example.com").await;
        let (b_id, b_token) = signup_and_login(&server, "star@example.com").await;

        server
            .post(&format!("/api/v1/users/{}/follow", b_id))
            .authorization_bearer(&a_token)
            .await;

        let lists = server
            .get("/api/v1/users/followers-following")
            .authorization_bearer(&b_token)
            .await;
        assert_eq!(lists.status_code(), StatusCode::OK);
        let body = lists.json::<Value>();
        assert_eq!(body["followers_count"], 1);
        assert_eq!(body["followers"][0]["email"], "fan@example.com");
        assert_eq!(body["followers"][0]["username"], "fan");
        assert_eq!(body["following_count"], 0);
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let server = test_server().await;
        let (_a_id, a_token) = signup_and_login(&server, "seeker@example.com").await;
        signup_and_login(&server, "findable@example.com").await;

        let hits = server
            .get("/api/v1/users/search?q=find")
            .authorization_bearer(&a_token)
            .await;
        assert_eq!(hits.status_code(), StatusCode::OK);
        let body = hits.json::<Value>();
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
        assert_eq!(body["results"][0]["email"], "findable@example.com");
        assert_eq!(body["results"][0]["is_following"], false);

        let empty = server
            .get("/api/v1/users/search?q=")
            .authorization_bearer(&a_token)
            .await;
        assert!(empty.json::<Value>()["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeline_reflects_follow_state() {
        let server = test_server().await;
        let (_a_id, a_token) = signup_and_login(&server, "reader@example.com").await;
        let (b_id, b_token) = signup_and_login(&server, "writer@example.com").await;

        server
            .post("/api/v1/tweets")
            .authorization_bearer(&b_token)
            .json(&json!({"content": "from the writer"}))
            .await;
        server
            .post(&format!("/api/v1/users/{}/follow", b_id))
            .authorization_bearer(&a_token)
            .await;

        let timeline = server
            .get("/api/v1/tweets")
            .authorization_bearer(&a_token)
            .await;
        let body = timeline.json::<Value>();
        assert_eq!(body[0]["is_following"], true);
        assert_eq!(body[0]["username"], "writer");
    }

    #[tokio::test]
    async fn test_profile_patch() {
        let server = test_server().await;
        let (_id, token) = signup_and_login(&server, "editor@example.com").await;

        let patched = server
            .patch("/api/v1/auth/profile")
            .authorization_bearer(&token)
            .json(&json!({"bio": "short bio"}))
            .await;
        assert_eq!(patched.status_code(), StatusCode::OK);
        let body = patched.json::<Value>();
        assert_eq!(body["bio"], "short bio");
        assert_eq!(body["email"], "editor@example.com");
    }

    #[tokio::test]
    async fn test_account_delete_cascades() {
        let server = test_server().await;
        let (_a_id, a_token) = signup_and_login(&server, "leaver@example.com").await;
        let (_b_id, b_token) = signup_and_login(&server, "stayer@example.com").await;

        let created = server
            .post("/api/v1/tweets")
            .authorization_bearer(&a_token)
            .json(&json!({"content": "soon gone"}))
            .await;
        let tweet_id = created.json::<Value>()["id"].as_i64().unwrap();

        let deleted = server
            .delete("/api/v1/auth/profile")
            .authorization_bearer(&a_token)
            .await;
        assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

        // The leaver's tweet disappears from the timeline
        let gone = server
            .get(&format!("/api/v1/tweets/{}", tweet_id))
            .authorization_bearer(&b_token)
            .await;
        assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);

        // The leaver's session no longer validates
        let profile = server
            .get("/api/v1/auth/profile")
            .authorization_bearer(&a_token)
            .await;
        assert_eq!(profile.status_code(), StatusCode::UNAUTHORIZED);
    }
}
