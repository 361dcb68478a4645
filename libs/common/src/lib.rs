//! Common library for the music catalog
//!
//! Shared database connectivity and error types used by the auth library
//! and the catalog web service.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
