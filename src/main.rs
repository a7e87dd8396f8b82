//! Chirp - a small Twitter-style social backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chirp::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SessionRepository, SqlxCommentRepository, SqlxFollowRepository,
            SqlxSessionRepository, SqlxTweetRepository, SqlxUserRepository,
        },
    },
    services::{
        engagement::EngagementService, social::SocialService, tweet::TweetService,
        user::UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirp=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Chirp backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let tweet_repo = SqlxTweetRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());
    let follow_repo = SqlxFollowRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo.clone(), session_repo.clone()));
    let tweet_service = Arc::new(TweetService::new(tweet_repo.clone(), comment_repo.clone()));
    let social_service = Arc::new(SocialService::new(user_repo, follow_repo.clone()));
    let engagement_service = Arc::new(EngagementService::new(
        tweet_repo,
        comment_repo,
        follow_repo,
    ));

    // Bootstrap the admin account when configured
    if let (Some(email), Some(password)) = (&config.admin.email, &config.admin.password) {
        user_service.ensure_admin(email, password).await?;
    }

    // Sweep expired sessions once an hour
    {
        let session_repo = session_repo.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match session_repo.delete_expired().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Removed {} expired session(s)", n),
                    Err(e) => tracing::warn!("Session sweep failed: {}", e),
                }
            }
        });
    }

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        user_service,
        tweet_service,
        social_service,
        engagement_service,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
