use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::{SessionConfig, SessionError, SessionId, SessionRecord, SweepPolicy};
use crate::clock::{Clock, SystemClock};
use crate::identity::IdentityLookup;

/// Process-wide registry of live sessions.
///
/// Cloning is cheap and every clone shares the same map, so one registry is
/// built at startup and handed to each request handler.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    identity: Arc<dyn IdentityLookup>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    /// `None` when sweeps are driven externally
    next_cleanup: Mutex<Option<DateTime<Utc>>>,
    scheduled_sweeps: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry using the system clock
    pub fn new(identity: Arc<dyn IdentityLookup>, config: SessionConfig) -> Self {
        Self::with_clock(identity, Arc::new(SystemClock), config)
    }

    /// Create an empty registry reading time from `clock`
    pub fn with_clock(
        identity: Arc<dyn IdentityLookup>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let next_cleanup = match &config.sweep {
            SweepPolicy::OnCreate { interval, .. } => Some(clock.now() + *interval),
            SweepPolicy::External => None,
        };

        Self {
            inner: Arc::new(Inner {
                sessions: RwLock::new(HashMap::new()),
                identity,
                clock,
                config,
                next_cleanup: Mutex::new(next_cleanup),
                scheduled_sweeps: AtomicU64::new(0),
            }),
        }
    }

    /// Issue a new session for an already authenticated user.
    ///
    /// Roles are resolved once, now, and stay fixed for the life of the
    /// session. A lifetime of zero or less yields a session that is already
    /// expired. Calling this twice for the same user gives two unrelated
    /// sessions.
    pub async fn create_session(
        &self,
        username: &str,
        max_age_secs: i64,
    ) -> Result<SessionId, SessionError> {
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }

        let now = self.inner.clock.now();
        let expires_at = TimeDelta::try_seconds(max_age_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(SessionError::InvalidMaxAge(max_age_secs))?;

        let roles = self
            .inner
            .identity
            .roles_for_user(username)
            .await
            .map_err(|e| {
                error!("Failed to resolve roles for {}: {}", username, e);
                e
            })?;

        let id = {
            let mut sessions = self.inner.sessions.write().await;
            let id = loop {
                let candidate = SessionId::generate();
                if !sessions.contains_key(&candidate) {
                    break candidate;
                }
                warn!("Session id collision, drawing a new id");
            };

            let record = SessionRecord::new(
                id.clone(),
                username.to_string(),
                roles,
                now,
                expires_at,
            );
            sessions.insert(id.clone(), record);
            id
        };

        info!(
            "Created session {}… for user {} (expires {})",
            id.short(),
            username,
            expires_at
        );

        self.maybe_schedule_sweep().await;
        Ok(id)
    }

    /// Look up a session that can still authenticate.
    ///
    /// Unknown and expired ids both resolve to `None`, whether or not the
    /// expired record has been swept yet.
    pub async fn get_active_session(&self, id: &str) -> Option<SessionRecord> {
        let now = self.inner.clock.now();
        let sessions = self.inner.sessions.read().await;
        sessions
            .get(id)
            .filter(|record| record.is_active_at(now))
            .cloned()
    }

    /// Drop a session immediately. Returns whether anything was removed.
    pub async fn revoke_session(&self, id: &str) -> bool {
        let removed = self.inner.sessions.write().await.remove(id);
        match removed {
            Some(record) => {
                info!(
                    "Revoked session {}… for user {}",
                    record.id.short(),
                    record.username
                );
                true
            }
            None => false,
        }
    }

    /// Remove every record that is no longer active. Returns how many went.
    pub async fn sweep(&self) -> usize {
        let now = self.inner.clock.now();
        let mut sessions = self.inner.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.is_active_at(now));
        let removed = before - sessions.len();

        info!(
            "Session sweep removed {} expired sessions, {} remain",
            removed,
            sessions.len()
        );
        removed
    }

    /// Number of stored records, expired ones included until swept
    pub async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.sessions.read().await.is_empty()
    }

    /// When the next creation-driven cleanup check becomes due
    pub async fn next_cleanup_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.next_cleanup.lock().await
    }

    /// How many one-shot sweeps creation traffic has scheduled so far
    pub fn scheduled_sweeps(&self) -> u64 {
        self.inner.scheduled_sweeps.load(Ordering::Relaxed)
    }

    async fn maybe_schedule_sweep(&self) {
        let SweepPolicy::OnCreate { interval, delay } = &self.inner.config.sweep else {
            return;
        };

        let now = self.inner.clock.now();
        {
            let mut next_cleanup = self.inner.next_cleanup.lock().await;
            match *next_cleanup {
                Some(due) if now >= due => *next_cleanup = Some(now + *interval),
                _ => return,
            }
        }

        self.inner.scheduled_sweeps.fetch_add(1, Ordering::Relaxed);
        debug!("Session cleanup due, sweeping in {:?}", delay);

        let registry = self.clone();
        let delay = *delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.sweep().await;
        });
    }
}
