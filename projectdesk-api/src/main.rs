//! # ProjectDesk API Server
//!
//! Loads configuration, migrates the database, picks the login throttle
//! store and serves the router until Ctrl-C or SIGTERM.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/projectdesk \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p projectdesk-api
//! ```

use anyhow::Context;
use projectdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use projectdesk_shared::{
    auth::throttle::{AttemptStore, MemoryAttemptStore, RedisAttemptStore},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::{CreateRegisteredUser, RegisteredUser, Role},
    redis::{RedisClient, RedisConfig},
    validation::normalize_email,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.api.json_logs);

    tracing::info!(
        version = projectdesk_shared::VERSION,
        "ProjectDesk API server starting"
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database.url.clone())
            .with_max_connections(config.database.max_connections),
    )
    .await
    .context("Failed to connect to the database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    if let Some(email) = config.bootstrap_admin_email() {
        bootstrap_admin(&pool, email).await?;
    }

    let attempts = attempt_store(&config).await?;
    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, attempts));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "projectdesk_api=info,projectdesk_shared=info,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Redis when configured, otherwise per-process counters
async fn attempt_store(config: &Config) -> anyhow::Result<Arc<dyn AttemptStore>> {
    let policy = config.throttle_policy();

    match config.redis_url() {
        Some(url) => {
            let client = RedisClient::new(RedisConfig::new(url))
                .await
                .context("Failed to connect to Redis")?;
            Ok(Arc::new(RedisAttemptStore::new(client, policy)))
        }
        None => {
            tracing::warn!("REDIS_URL not set; login lockouts are kept in memory");
            Ok(Arc::new(MemoryAttemptStore::new(policy)))
        }
    }
}

/// Registers the first Admin when none exists
///
/// The account has no password; its owner completes sign-up like any other
/// registered user.
async fn bootstrap_admin(pool: &PgPool, email: &str) -> anyhow::Result<()> {
    if RegisteredUser::count_by_role(pool, Role::Admin).await? > 0 {
        return Ok(());
    }

    let email = normalize_email(email);
    if RegisteredUser::find_by_email(pool, &email).await?.is_some() {
        tracing::warn!(%email, "Bootstrap admin email is already registered with another role");
        return Ok(());
    }

    let admin = RegisteredUser::create(
        pool,
        CreateRegisteredUser {
            first_name: "system".to_string(),
            last_name: "admin".to_string(),
            email,
            role: Role::Admin,
        },
    )
    .await?;

    tracing::info!(reg_id = admin.reg_id, email = %admin.email, "Bootstrap admin registered");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
