//! In-memory backend
//!
//! Stands in for the hosted service in tests. Individual operations can be
//! made to fail so error paths can be exercised without a network.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::backend::{AuthBackend, ProfileStore};
use crate::error::{BackendError, BackendResult};
use crate::models::{
    AuthSession, AuthUser, Credentials, GraduationStatus, NewProfile, Profile, Role, SignUp,
};

/// Backend operations that can be forced to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SignIn,
    SignUp,
    RefreshSession,
    CurrentUser,
    SignOut,
    GetProfile,
    ListProfiles,
    UpdateStatus,
    InsertProfile,
}

#[derive(Debug)]
struct Account {
    id: Uuid,
    password: String,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, AuthUser>,
    refresh_tokens: HashMap<String, AuthUser>,
    profiles: HashMap<Uuid, Profile>,
    failing: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
    confirm_sign_ups: bool,
}

/// In-memory implementation of [`AuthBackend`] and [`ProfileStore`]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an account together with its profile row
    pub fn add_account(&self, password: &str, profile: Profile) {
        let mut inner = self.lock();
        inner.accounts.insert(
            profile.email.clone(),
            Account {
                id: profile.id,
                password: password.to_string(),
            },
        );
        inner.profiles.insert(profile.id, profile);
    }

    /// Insert a profile row without an account
    pub fn add_profile(&self, profile: Profile) {
        self.lock().profiles.insert(profile.id, profile);
    }

    /// Issue a valid access token for a user without going through sign-in
    pub fn issue_token(&self, user: AuthUser) -> String {
        let token = Uuid::new_v4().to_string();
        self.lock().tokens.insert(token.clone(), user);
        token
    }

    /// Invalidate a token, as a sign-out from another device would
    pub fn revoke_token(&self, token: &str) {
        self.lock().tokens.remove(token);
    }

    /// Expire every access token; refresh tokens stay valid
    pub fn expire_access_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Require email confirmation: sign-ups return no session
    pub fn require_email_confirmation(&self) {
        self.lock().confirm_sign_ups = true;
    }

    /// Make every future call of `operation` fail
    pub fn fail(&self, operation: Operation) {
        self.lock().failing.insert(operation);
    }

    /// Undo [`MemoryBackend::fail`]
    pub fn recover(&self, operation: Operation) {
        self.lock().failing.remove(&operation);
    }

    /// Number of calls made to `operation`, failed ones included
    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Current stored copy of a profile
    pub fn profile(&self, id: Uuid) -> Option<Profile> {
        self.lock().profiles.get(&id).cloned()
    }

    /// Record the call and return the guard, or fail if `operation` is failing
    fn enter(&self, operation: Operation) -> BackendResult<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        *inner.calls.entry(operation).or_default() += 1;
        if inner.failing.contains(&operation) {
            return Err(BackendError::Unavailable(format!(
                "{operation:?} failed"
            )));
        }
        Ok(inner)
    }
}

impl Inner {
    fn user_for(&self, token: &str) -> BackendResult<AuthUser> {
        self.tokens.get(token).cloned().ok_or(BackendError::Unauthorized)
    }

    fn open_session(&mut self, user: AuthUser) -> AuthSession {
        let access_token = Uuid::new_v4().to_string();
        let refresh_token = Uuid::new_v4().to_string();
        self.tokens.insert(access_token.clone(), user.clone());
        self.refresh_tokens.insert(refresh_token.clone(), user.clone());
        AuthSession {
            access_token,
            refresh_token: Some(refresh_token),
            expires_in: Some(3600),
            user,
        }
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<AuthSession> {
        let mut inner = self.enter(Operation::SignIn)?;
        let id = match inner.accounts.get(&credentials.email) {
            Some(account) if account.password == credentials.password => account.id,
            _ => {
                return Err(BackendError::Api {
                    status: 400,
                    message: "Invalid login credentials".to_string(),
                });
            }
        };

        Ok(inner.open_session(AuthUser {
            id,
            email: Some(credentials.email.clone()),
        }))
    }

    async fn sign_up(&self, credentials: &Credentials) -> BackendResult<SignUp> {
        let mut inner = self.enter(Operation::SignUp)?;
        if inner.accounts.contains_key(&credentials.email) {
            return Err(BackendError::Api {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(credentials.email.clone()),
        };
        inner.accounts.insert(
            credentials.email.clone(),
            Account {
                id: user.id,
                password: credentials.password.clone(),
            },
        );

        let session = if inner.confirm_sign_ups {
            None
        } else {
            Some(inner.open_session(user.clone()))
        };

        Ok(SignUp { user, session })
    }

    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<AuthSession> {
        let mut inner = self.enter(Operation::RefreshSession)?;
        // Refresh tokens are single use
        match inner.refresh_tokens.remove(refresh_token) {
            Some(user) => Ok(inner.open_session(user)),
            None => Err(BackendError::Api {
                status: 400,
                message: "Invalid Refresh Token".to_string(),
            }),
        }
    }

    async fn current_user(&self, access_token: &str) -> BackendResult<Option<AuthUser>> {
        let inner = self.enter(Operation::CurrentUser)?;
        Ok(inner.tokens.get(access_token).cloned())
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let mut inner = self.enter(Operation::SignOut)?;
        if let Some(user) = inner.tokens.remove(access_token) {
            inner.refresh_tokens.retain(|_, owner| owner.id != user.id);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn get_by_id(&self, access_token: &str, id: Uuid) -> BackendResult<Profile> {
        let inner = self.enter(Operation::GetProfile)?;
        inner.user_for(access_token)?;
        inner.profiles.get(&id).cloned().ok_or(BackendError::NotFound)
    }

    async fn list_by_role(&self, access_token: &str, role: Role) -> BackendResult<Vec<Profile>> {
        let inner = self.enter(Operation::ListProfiles)?;
        inner.user_for(access_token)?;

        let mut rows: Vec<Profile> = inner
            .profiles
            .values()
            .filter(|p| p.role == role)
            .cloned()
            .collect();
        // PostgREST sorts nulls last in ascending order
        rows.sort_by(|a, b| match (&a.student_id, &b.student_id) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(rows)
    }

    async fn update_status(
        &self,
        access_token: &str,
        id: Uuid,
        status: GraduationStatus,
    ) -> BackendResult<()> {
        let mut inner = self.enter(Operation::UpdateStatus)?;
        inner.user_for(access_token)?;
        let profile = inner.profiles.get_mut(&id).ok_or(BackendError::NotFound)?;
        profile.graduation_status = Some(status);
        Ok(())
    }

    async fn insert(&self, _access_token: Option<&str>, profile: &NewProfile) -> BackendResult<()> {
        let mut inner = self.enter(Operation::InsertProfile)?;
        if inner.profiles.contains_key(&profile.id) {
            return Err(BackendError::Api {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }

        inner.profiles.insert(
            profile.id,
            Profile {
                id: profile.id,
                email: profile.email.clone(),
                full_name: profile.full_name.clone(),
                role: profile.role,
                student_id: profile.student_id.clone(),
                graduation_status: Some(profile.graduation_status),
                created_at: Some(chrono::Utc::now()),
            },
        );
        Ok(())
    }
}
