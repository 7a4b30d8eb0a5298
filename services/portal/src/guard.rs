//! Page guards
//!
//! Authorization is two plain predicates: is someone signed in, and is
//! their profile an admin. Failing either is a silent redirect.

use common::backend::ProfileStore;
use common::models::{AuthUser, Role};
use tracing::{info, warn};

use crate::session::SessionState;

/// The three views of the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Admin,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Dashboard => "/dashboard",
            Route::Admin => "/admin",
        }
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The check is still in flight; render nothing
    Pending,
    /// Navigate elsewhere; render nothing
    Redirect(Route),
    Granted(AuthUser),
}

/// Require a signed-in user
pub fn check_session(state: &SessionState) -> Access {
    match state {
        SessionState::Unknown => Access::Pending,
        SessionState::SignedOut => Access::Redirect(Route::Login),
        SessionState::SignedIn(user) => Access::Granted(user.clone()),
    }
}

/// Where a non-admin is sent instead of the admin page
pub fn admin_redirect(role: Role) -> Option<Route> {
    if role.is_admin() {
        None
    } else {
        Some(Route::Dashboard)
    }
}

/// Require a signed-in admin
///
/// A failed role lookup is treated like a non-admin role.
pub async fn check_admin(
    state: &SessionState,
    profiles: &dyn ProfileStore,
    access_token: &str,
) -> Access {
    let user = match check_session(state) {
        Access::Granted(user) => user,
        other => return other,
    };

    let role = match profiles.get_by_id(access_token, user.id).await {
        Ok(profile) => profile.role,
        Err(e) => {
            warn!(user_id = %user.id, "Role lookup failed: {}", e);
            Role::Student
        }
    };

    match admin_redirect(role) {
        Some(route) => {
            info!(user_id = %user.id, "Non-admin redirected from admin page");
            Access::Redirect(route)
        }
        None => Access::Granted(user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::memory::{MemoryBackend, Operation};
    use common::models::Profile;
    use uuid::Uuid;

    fn profile(role: Role) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            full_name: "Someone".to_string(),
            role,
            student_id: None,
            graduation_status: None,
            created_at: None,
        }
    }

    fn signed_in(backend: &MemoryBackend, profile: &Profile) -> (SessionState, String) {
        let user = AuthUser {
            id: profile.id,
            email: Some(profile.email.clone()),
        };
        let token = backend.issue_token(user.clone());
        (SessionState::SignedIn(user), token)
    }

    #[test]
    fn test_check_session() {
        assert_eq!(check_session(&SessionState::Unknown), Access::Pending);
        assert_eq!(
            check_session(&SessionState::SignedOut),
            Access::Redirect(Route::Login)
        );
    }

    #[tokio::test]
    async fn test_check_admin_redirects_students() {
        let backend = MemoryBackend::new();
        let student = profile(Role::Student);
        backend.add_profile(student.clone());
        let (state, token) = signed_in(&backend, &student);

        assert_eq!(
            check_admin(&state, &backend, &token).await,
            Access::Redirect(Route::Dashboard)
        );
    }

    #[tokio::test]
    async fn test_check_admin_grants_admins() {
        let backend = MemoryBackend::new();
        let admin = profile(Role::Admin);
        backend.add_profile(admin.clone());
        let (state, token) = signed_in(&backend, &admin);

        assert!(matches!(
            check_admin(&state, &backend, &token).await,
            Access::Granted(user) if user.id == admin.id
        ));
    }

    #[tokio::test]
    async fn test_check_admin_treats_lookup_failure_as_non_admin() {
        let backend = MemoryBackend::new();
        let admin = profile(Role::Admin);
        backend.add_profile(admin.clone());
        let (state, token) = signed_in(&backend, &admin);
        backend.fail(Operation::GetProfile);

        assert_eq!(
            check_admin(&state, &backend, &token).await,
            Access::Redirect(Route::Dashboard)
        );
    }

    #[tokio::test]
    async fn test_check_admin_without_session_goes_to_login() {
        let backend = MemoryBackend::new();
        assert_eq!(
            check_admin(&SessionState::SignedOut, &backend, "").await,
            Access::Redirect(Route::Login)
        );
        assert_eq!(backend.calls(Operation::GetProfile), 0);
    }
}
