//! Authentication models

pub mod role;
pub mod user;

// Re-export for convenience
pub use role::{ADMIN_ROLE, UserRole};
pub use user::{LoginCredentials, NewUser, User};
