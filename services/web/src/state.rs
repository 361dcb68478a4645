//! Application state shared across handlers

use auth::SessionRegistry;
use auth::repositories::UserRepository;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{config::AppConfig, repositories::CatalogRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub catalog: CatalogRepository,
    pub users: UserRepository,
    pub sessions: SessionRegistry,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        db_pool: SqlitePool,
        users: UserRepository,
        sessions: SessionRegistry,
        config: AppConfig,
    ) -> Self {
        Self {
            catalog: CatalogRepository::new(db_pool.clone()),
            db_pool,
            users,
            sessions,
            config: Arc::new(config),
        }
    }
}
