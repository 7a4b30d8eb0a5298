//! Backend abstraction for authentication and profile storage
//!
//! The portal never owns durable state: every read and write goes through
//! these traits to the hosted service. Access tokens are passed per call so
//! that the service can apply its row-level policies as the signed-in user.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BackendResult;
use crate::models::{
    AuthSession, AuthUser, Credentials, GraduationStatus, NewProfile, Profile, Role, SignUp,
};

/// Authentication operations offered by the hosted service
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange email and password for a session
    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<AuthSession>;

    /// Register a new account
    async fn sign_up(&self, credentials: &Credentials) -> BackendResult<SignUp>;

    /// Trade a refresh token for a fresh session
    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<AuthSession>;

    /// Look up the user behind an access token
    ///
    /// Returns `Ok(None)` when the token is no longer valid.
    async fn current_user(&self, access_token: &str) -> BackendResult<Option<AuthUser>>;

    /// Revoke the session behind an access token
    async fn sign_out(&self, access_token: &str) -> BackendResult<()>;
}

/// Operations on the `profiles` table
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch exactly one profile by id
    async fn get_by_id(&self, access_token: &str, id: Uuid) -> BackendResult<Profile>;

    /// Fetch every profile with the given role, ordered by `student_id` ascending
    async fn list_by_role(&self, access_token: &str, role: Role) -> BackendResult<Vec<Profile>>;

    /// Set the graduation status of one profile
    ///
    /// Fails with `NotFound` when no row was updated.
    async fn update_status(
        &self,
        access_token: &str,
        id: Uuid,
        status: GraduationStatus,
    ) -> BackendResult<()>;

    /// Insert a new profile; `access_token` is absent when the account is not signed in yet
    async fn insert(&self, access_token: Option<&str>, profile: &NewProfile) -> BackendResult<()>;
}
