//! Authentication for the music catalog
//!
//! The centrepiece is the [`session::SessionRegistry`], an in-memory map
//! from opaque session ids to the user and roles they were issued for.
//! Around it sit the user store (password hashes and role grants), input
//! validation and an optional cron-driven sweeper.

pub mod clock;
pub mod identity;
pub mod models;
pub mod repositories;
pub mod session;
pub mod sweeper;
pub mod validation;

pub use identity::{IdentityError, IdentityLookup, InMemoryIdentity};
pub use session::{
    SessionConfig, SessionError, SessionId, SessionRecord, SessionRegistry, SweepPolicy,
};
