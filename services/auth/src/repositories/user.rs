//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::identity::{IdentityError, IdentityLookup};
use crate::models::{LoginCredentials, NewUser, User, UserRole};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the users and role tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_roles (
                username TEXT NOT NULL REFERENCES users(username),
                role TEXT NOT NULL,
                granted_at TEXT NOT NULL,
                PRIMARY KEY (username, role)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a new user.
    ///
    /// Returns `None` if the username is already taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<Option<User>> {
        info!("Creating new user: {}", new_user.username);

        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = Argon2::default()
            .hash_password(new_user.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        let user = User {
            username: new_user.username.clone(),
            password_hash,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Some(user)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                warn!("Username already taken: {}", new_user.username);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, password_hash, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check a username/password pair. Unknown users simply fail the check.
    pub async fn verify_credentials(&self, credentials: &LoginCredentials) -> Result<bool> {
        let Some(user) = self.find_by_username(&credentials.username).await? else {
            info!("Login attempt for unknown user: {}", credentials.username);
            return Ok(false);
        };

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        let result =
            Argon2::default().verify_password(credentials.password.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }

    /// Grant a role to an existing user. Granting twice is a no-op.
    pub async fn grant_role(&self, username: &str, role: &str) -> Result<()> {
        info!("Granting role {} to {}", role, username);

        sqlx::query(
            r#"
            INSERT INTO user_roles (username, role, granted_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (username, role) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Role grants of a user, ordered by role name
    pub async fn roles(&self, username: &str) -> Result<Vec<UserRole>, sqlx::Error> {
        sqlx::query_as::<_, UserRole>(
            r#"
            SELECT username, role, granted_at
            FROM user_roles
            WHERE username = ?1
            ORDER BY role
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl IdentityLookup for UserRepository {
    async fn roles_for_user(&self, username: &str) -> Result<Vec<String>, IdentityError> {
        let grants = self
            .roles(username)
            .await
            .map_err(|e| IdentityError::Unavailable(Box::new(e)))?;

        Ok(grants.into_iter().map(|grant| grant.role).collect())
    }
}
