//! In-memory session registry
//!
//! Maps opaque session ids to the user and roles they were issued for.
//! Records expire lazily: lookups check the expiry timestamp, and a sweep
//! physically drops expired records from time to time.

mod record;
mod registry;

pub use record::{SessionId, SessionRecord};
pub use registry::SessionRegistry;

use chrono::TimeDelta;
use std::time::Duration;
use thiserror::Error;

use crate::identity::IdentityError;

/// When expired sessions get swept
#[derive(Debug, Clone, PartialEq)]
pub enum SweepPolicy {
    /// Checked on every session creation. Once `interval` has elapsed since
    /// the last check, a one-shot sweep is spawned to run after `delay`.
    OnCreate { interval: TimeDelta, delay: Duration },
    /// The registry never sweeps by itself; something else calls
    /// [`SessionRegistry::sweep`], e.g. a [`crate::sweeper::SessionSweeper`].
    External,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        SweepPolicy::OnCreate {
            interval: TimeDelta::hours(1),
            delay: Duration::from_secs(5),
        }
    }
}

/// Session registry configuration
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub sweep: SweepPolicy,
}

/// Errors raised while creating a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Session lifetime of {0} seconds is out of range")]
    InvalidMaxAge(i64),

    /// Roles could not be resolved, so no session was issued
    #[error("Failed to resolve roles: {0}")]
    Identity(#[from] IdentityError),
}
