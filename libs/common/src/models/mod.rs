//! Shared models for profiles and authentication sessions

pub mod profile;
pub mod role;
pub mod session;

// Re-export for convenience
pub use profile::{GraduationStatus, NewProfile, Profile, StatusUpdate};
pub use role::Role;
pub use session::{AuthSession, AuthUser, Credentials, SignUp};
