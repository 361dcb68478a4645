//! Identity lookup: resolves a username to its authorization roles
//!
//! The session registry depends on this trait rather than on a concrete
//! store, so the roles source can be the users database in production and a
//! fixed map in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failure to reach the identity backing store
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The backing store could not be queried
    #[error("Identity store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Source of authorization roles for a user.
///
/// Unknown users and users without roles resolve to an empty list; only a
/// backend failure is an error.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Roles granted to `username`, in a stable order.
    async fn roles_for_user(&self, username: &str) -> Result<Vec<String>, IdentityError>;
}

/// Identity source held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentity {
    roles: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl InMemoryIdentity {
    /// Create an empty identity source
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roles of a user
    pub async fn set_roles<I, S>(&self, username: &str, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles = roles.into_iter().map(Into::into).collect();
        self.roles.write().await.insert(username.to_string(), roles);
    }

    /// Forget a user entirely
    pub async fn remove_user(&self, username: &str) {
        self.roles.write().await.remove(username);
    }
}

#[async_trait]
impl IdentityLookup for InMemoryIdentity {
    async fn roles_for_user(&self, username: &str) -> Result<Vec<String>, IdentityError> {
        Ok(self
            .roles
            .read()
            .await
            .get(username)
            .cloned()
            .unwrap_or_default())
    }
}
