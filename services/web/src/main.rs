use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;

use auth::{SessionRegistry, repositories::UserRepository, sweeper::SessionSweeper};
use common::database::{DatabaseConfig, init_pool};
use tokio::net::TcpListener;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting catalog service");

    let app_config = AppConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let users = UserRepository::new(pool.clone());
    users.migrate().await?;

    if let Some(admin) = app_config.admin_username.as_deref() {
        if users.find_by_username(admin).await?.is_some() {
            users.grant_role(admin, auth::models::ADMIN_ROLE).await?;
            info!("Granted admin role to {}", admin);
        } else {
            warn!("Admin user {} does not exist yet", admin);
        }
    }

    let sessions = SessionRegistry::new(Arc::new(users.clone()), app_config.session_config()?);

    let sweeper = match app_config.session_sweep_schedule.as_deref() {
        Some(schedule) => Some(SessionSweeper::start(sessions.clone(), schedule).await?),
        None => None,
    };

    let bind_address = app_config.bind_address.clone();
    let app_state = AppState::new(pool, users, sessions, app_config);

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Catalog service listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await?;
    }

    info!("Catalog service stopped");
    Ok(())
}
