//! Student dashboard

use common::backend::ProfileStore;
use common::models::{AuthUser, GraduationStatus, Profile};
use tokio::sync::watch;
use tracing::{error, info};

use super::{Mounted, session_redirect};
use crate::action::ActionState;
use crate::guard::{Access, Route, check_session};
use crate::session::{SessionContext, SessionState};

pub const PROFILE_LOAD_ERROR: &str = "Unable to load your profile. Please try again later.";
pub const CONFIRM_ERROR: &str = "Unable to confirm your attendance. Please try again.";

/// One visit of the student dashboard
#[derive(Debug)]
pub struct StudentDashboard {
    user: AuthUser,
    session: watch::Receiver<SessionState>,
    profile: Option<Profile>,
    status: GraduationStatus,
    load: ActionState,
    confirm: ActionState,
}

impl StudentDashboard {
    /// Guard the page and load the profile
    ///
    /// When `previous` belongs to the same user its state is kept, so a
    /// failed reload still shows what was loaded before.
    pub async fn mount(
        session: &SessionContext,
        profiles: &dyn ProfileStore,
        previous: Option<Self>,
    ) -> Mounted<Self> {
        let user = match check_session(&session.current()) {
            Access::Granted(user) => user,
            Access::Pending => return Mounted::Pending,
            Access::Redirect(route) => return Mounted::Redirect(route),
        };

        let mut page = match previous {
            Some(mut page) if page.user.id == user.id => {
                page.session = session.subscribe();
                page.confirm = ActionState::Idle;
                page
            }
            _ => Self {
                user,
                session: session.subscribe(),
                profile: None,
                status: GraduationStatus::default(),
                load: ActionState::Idle,
                confirm: ActionState::Idle,
            },
        };

        page.load_profile(profiles, session.access_token().unwrap_or_default())
            .await;
        Mounted::Ready(page)
    }

    /// Fetch the signed-in user's profile row
    pub async fn load_profile(&mut self, profiles: &dyn ProfileStore, access_token: &str) {
        self.load = ActionState::Loading;
        let result = profiles.get_by_id(access_token, self.user.id).await;
        self.load.settle(&result, PROFILE_LOAD_ERROR);

        match result {
            Ok(profile) => {
                self.status = profile.status();
                self.profile = Some(profile);
            }
            Err(e) => error!(user_id = %self.user.id, "Error fetching profile: {}", e),
        }
    }

    /// Confirm graduation attendance
    ///
    /// Does nothing unless the status is pending and no confirmation is
    /// outstanding. Returns the redirect when the session changed underneath.
    pub async fn confirm_attendance(
        &mut self,
        profiles: &dyn ProfileStore,
        access_token: &str,
    ) -> Result<(), Route> {
        if let Some(route) = session_redirect(&mut self.session, self.user.id) {
            return Err(route);
        }

        if !self.can_confirm() {
            return Ok(());
        }

        self.confirm = ActionState::Loading;
        let result = profiles
            .update_status(access_token, self.user.id, GraduationStatus::Confirmed)
            .await;
        self.confirm.settle(&result, CONFIRM_ERROR);

        match result {
            Ok(()) => {
                info!(user_id = %self.user.id, "Graduation attendance confirmed");
                self.status = GraduationStatus::Confirmed;
                if let Some(profile) = self.profile.as_mut() {
                    profile.graduation_status = Some(GraduationStatus::Confirmed);
                }
            }
            Err(e) => error!(user_id = %self.user.id, "Error confirming attendance: {}", e),
        }

        Ok(())
    }

    pub fn can_confirm(&self) -> bool {
        self.profile.is_some()
            && self.status == GraduationStatus::Pending
            && !self.confirm.is_busy()
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn status(&self) -> GraduationStatus {
        self.status
    }

    pub fn confirm_state(&self) -> &ActionState {
        &self.confirm
    }

    /// Banner message, if the last action failed
    pub fn error(&self) -> Option<&str> {
        self.confirm.error().or(self.load.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::memory::{MemoryBackend, Operation};
    use common::models::{AuthSession, Role};
    use uuid::Uuid;

    fn setup(status: Option<GraduationStatus>) -> (MemoryBackend, SessionContext, Uuid) {
        let backend = MemoryBackend::new();
        let id = Uuid::new_v4();
        backend.add_profile(Profile {
            id,
            email: "s1@example.com".to_string(),
            full_name: "Student One".to_string(),
            role: Role::Student,
            student_id: Some("S1".to_string()),
            graduation_status: status,
            created_at: None,
        });

        let user = AuthUser {
            id,
            email: Some("s1@example.com".to_string()),
        };
        let access_token = backend.issue_token(user.clone());
        let context = SessionContext::signed_in(AuthSession {
            access_token,
            refresh_token: None,
            expires_in: None,
            user,
        });
        (backend, context, id)
    }

    async fn mounted(backend: &MemoryBackend, context: &SessionContext) -> StudentDashboard {
        match StudentDashboard::mount(context, backend, None).await {
            Mounted::Ready(page) => page,
            other => panic!("page not mounted: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mount_without_session_redirects_to_login() {
        let backend = MemoryBackend::new();
        let context = SessionContext::new();
        context.apply(crate::session::SessionEvent::SignedOut);

        assert!(matches!(
            StudentDashboard::mount(&context, &backend, None).await,
            Mounted::Redirect(Route::Login)
        ));
        assert_eq!(backend.calls(Operation::GetProfile), 0);
    }

    #[tokio::test]
    async fn test_mount_while_unknown_renders_nothing() {
        let backend = MemoryBackend::new();
        let context = SessionContext::new();

        assert!(matches!(
            StudentDashboard::mount(&context, &backend, None).await,
            Mounted::Pending
        ));
    }

    #[tokio::test]
    async fn test_absent_status_defaults_to_pending() {
        let (backend, context, _) = setup(None);
        let page = mounted(&backend, &context).await;

        assert_eq!(page.status(), GraduationStatus::Pending);
        assert!(page.can_confirm());
    }

    #[tokio::test]
    async fn test_confirm_sets_confirmed_without_refetch() {
        let (backend, context, id) = setup(Some(GraduationStatus::Pending));
        let mut page = mounted(&backend, &context).await;
        let token = context.access_token().unwrap().to_string();

        page.confirm_attendance(&backend, &token).await.unwrap();

        assert_eq!(page.status(), GraduationStatus::Confirmed);
        assert!(!page.can_confirm());
        assert_eq!(backend.calls(Operation::GetProfile), 1);
        assert_eq!(
            backend.profile(id).unwrap().graduation_status,
            Some(GraduationStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent_after_success() {
        let (backend, context, _) = setup(Some(GraduationStatus::Pending));
        let mut page = mounted(&backend, &context).await;
        let token = context.access_token().unwrap().to_string();

        page.confirm_attendance(&backend, &token).await.unwrap();
        page.confirm_attendance(&backend, &token).await.unwrap();
        page.confirm_attendance(&backend, &token).await.unwrap();

        assert_eq!(page.status(), GraduationStatus::Confirmed);
        assert!(!page.can_confirm());
        assert_eq!(backend.calls(Operation::UpdateStatus), 1);
    }

    #[tokio::test]
    async fn test_confirm_failure_keeps_status_and_stays_retryable() {
        let (backend, context, _) = setup(Some(GraduationStatus::Pending));
        let mut page = mounted(&backend, &context).await;
        let token = context.access_token().unwrap().to_string();

        backend.fail(Operation::UpdateStatus);
        page.confirm_attendance(&backend, &token).await.unwrap();

        assert_eq!(page.status(), GraduationStatus::Pending);
        assert_eq!(page.error(), Some(CONFIRM_ERROR));
        assert!(page.can_confirm());

        backend.recover(Operation::UpdateStatus);
        page.confirm_attendance(&backend, &token).await.unwrap();
        assert_eq!(page.status(), GraduationStatus::Confirmed);
        assert_eq!(page.error(), None);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_profile() {
        let (backend, context, _) = setup(Some(GraduationStatus::Confirmed));
        let page = mounted(&backend, &context).await;

        backend.fail(Operation::GetProfile);
        let page = match StudentDashboard::mount(&context, &backend, Some(page)).await {
            Mounted::Ready(page) => page,
            other => panic!("page not mounted: {other:?}"),
        };

        assert_eq!(page.error(), Some(PROFILE_LOAD_ERROR));
        assert!(page.profile().is_some());
        assert_eq!(page.status(), GraduationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_failed_first_load_shows_error_and_no_control() {
        let (backend, context, _) = setup(None);
        backend.fail(Operation::GetProfile);

        let page = mounted(&backend, &context).await;
        assert_eq!(page.error(), Some(PROFILE_LOAD_ERROR));
        assert!(page.profile().is_none());
        assert!(!page.can_confirm());
    }

    #[tokio::test]
    async fn test_session_change_redirects_action() {
        let (backend, mut context, _) = setup(None);
        let mut page = mounted(&backend, &context).await;
        let token = context.access_token().unwrap().to_string();

        context.clear();

        assert_eq!(
            page.confirm_attendance(&backend, &token).await,
            Err(Route::Login)
        );
        assert_eq!(backend.calls(Operation::UpdateStatus), 0);
    }
}
