use axum::{routing::get, Router};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rafflebox::api::{self, AppState};
use rafflebox::clock::Clock;
use rafflebox::config::Config;
use rafflebox::db;
use rafflebox::jobs::reward_expirer;
use rafflebox::services::encryption;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rafflebox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rafflebox server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Schedule the reward expiry sweep
    let scheduler = JobScheduler::new().await?;
    let job_pool = pool.clone();
    let retention_days = config.reward_retention_days;
    scheduler
        .add(Job::new_async(
            config.sweep_schedule.as_str(),
            move |_id, _scheduler| {
                let pool = job_pool.clone();
                Box::pin(async move {
                    if let Err(e) =
                        reward_expirer::run_reward_expiry_sweep(&pool, retention_days).await
                    {
                        tracing::error!(error = %e, "Reward expiry sweep failed");
                    }
                })
            },
        )?)
        .await?;
    scheduler.start().await?;
    tracing::info!(schedule = %config.sweep_schedule, "Reward expiry sweep scheduled");

    // Build application state
    let cipher_key = encryption::derive_key(config.credential_key.expose_secret());
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        clock: Clock::System,
        cipher_key,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(api::health::health_check))
        .merge(api::coupons::router())
        .merge(api::submissions::router())
        .merge(api::reward_accounts::router())
        .merge(api::rewards::router())
        .merge(api::statistics::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, cleaning up...");
}
