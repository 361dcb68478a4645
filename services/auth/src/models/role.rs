//! Role grants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role granted to a user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRole {
    pub username: String,
    pub role: String,
    pub granted_at: DateTime<Utc>,
}

/// Role that unlocks catalog edits
pub const ADMIN_ROLE: &str = "admin";
