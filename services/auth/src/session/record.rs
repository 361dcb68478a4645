use chrono::{DateTime, Utc};
use rand::{RngCore, rngs::OsRng};
use std::borrow::Borrow;
use std::fmt;

/// Number of random bytes behind a session id
const SESSION_ID_BYTES: usize = 32;

/// Opaque session identifier, 64 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Draw a fresh id from the operating system's CSPRNG
    pub(crate) fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        SessionId(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix that is safe to put in logs
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// A session as stored by the registry
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub username: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub(crate) fn new(
        id: SessionId,
        username: String,
        roles: Vec<String>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            roles: dedup_preserving_order(roles),
            created_at,
            expires_at,
        }
    }

    /// Whether the session may still authenticate at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

fn dedup_preserving_order(roles: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(roles.len());
    for role in roles {
        if !unique.contains(&role) {
            unique.push(role);
        }
    }
    unique
}
