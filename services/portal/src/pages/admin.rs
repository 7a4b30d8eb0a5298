//! Admin dashboard

use common::backend::ProfileStore;
use common::models::{AuthUser, GraduationStatus, Profile, Role};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

use super::{Mounted, session_redirect};
use crate::action::ActionState;
use crate::guard::{Access, Route, check_admin};
use crate::session::{SessionContext, SessionState};

pub const ROSTER_LOAD_ERROR: &str = "Unable to load students. Please try again later.";
pub const TOGGLE_ERROR: &str = "Unable to update graduation status. Please try again.";
pub const STUDENT_NOT_FOUND: &str = "Student not found.";

/// Toggle form fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToggleForm {
    /// Status the admin saw when submitting
    pub from: Option<GraduationStatus>,
}

/// Semantic color of a status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Positive,
    Warning,
}

/// One student in the roster table
#[derive(Debug, Clone)]
pub struct StudentRow {
    profile: Profile,
    status: GraduationStatus,
    toggle: ActionState,
}

impl StudentRow {
    fn new(profile: Profile) -> Self {
        Self {
            status: profile.status(),
            profile,
            toggle: ActionState::Idle,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn status(&self) -> GraduationStatus {
        self.status
    }

    pub fn badge(&self) -> Badge {
        match self.status {
            GraduationStatus::Confirmed => Badge::Positive,
            GraduationStatus::Pending => Badge::Warning,
        }
    }

    /// Label of the action button: the complement of the current status
    pub fn action_label(&self) -> &'static str {
        match self.status {
            GraduationStatus::Pending => "Confirm",
            GraduationStatus::Confirmed => "Set Pending",
        }
    }

    pub fn toggle_state(&self) -> &ActionState {
        &self.toggle
    }

    pub fn is_busy(&self) -> bool {
        self.toggle.is_busy()
    }
}

/// One visit of the admin dashboard
#[derive(Debug)]
pub struct AdminDashboard {
    admin: AuthUser,
    session: watch::Receiver<SessionState>,
    rows: Vec<StudentRow>,
    banner: Option<String>,
}

impl AdminDashboard {
    /// Guard the page on the admin role and load the roster
    pub async fn mount(session: &SessionContext, profiles: &dyn ProfileStore) -> Mounted<Self> {
        let access_token = session.access_token().unwrap_or_default();

        let admin = match check_admin(&session.current(), profiles, access_token).await {
            Access::Granted(user) => user,
            Access::Pending => return Mounted::Pending,
            Access::Redirect(route) => return Mounted::Redirect(route),
        };

        let mut page = Self {
            admin,
            session: session.subscribe(),
            rows: Vec::new(),
            banner: None,
        };
        page.load_roster(profiles, access_token).await;
        Mounted::Ready(page)
    }

    /// Fetch every student, ordered by student id
    pub async fn load_roster(&mut self, profiles: &dyn ProfileStore, access_token: &str) {
        self.banner = None;
        match profiles.list_by_role(access_token, Role::Student).await {
            Ok(students) => {
                info!(admin_id = %self.admin.id, count = students.len(), "Loaded roster");
                self.rows = students.into_iter().map(StudentRow::new).collect();
            }
            Err(e) => {
                error!("Error fetching students: {}", e);
                self.rows.clear();
                self.banner = Some(ROSTER_LOAD_ERROR.to_string());
            }
        }
    }

    /// Flip one student's status between pending and confirmed
    ///
    /// Only that row changes locally, and only once the backend accepted
    /// the update. `seen` is the status the admin was shown; a request made
    /// from a stale view (a resubmitted form) changes nothing. Returns the
    /// redirect when the session changed underneath.
    pub async fn toggle_status(
        &mut self,
        profiles: &dyn ProfileStore,
        access_token: &str,
        student: Uuid,
        seen: Option<GraduationStatus>,
    ) -> Result<(), Route> {
        if let Some(route) = session_redirect(&mut self.session, self.admin.id) {
            return Err(route);
        }

        self.banner = None;
        let Some(row) = self.rows.iter_mut().find(|row| row.profile.id == student) else {
            self.banner = Some(STUDENT_NOT_FOUND.to_string());
            return Ok(());
        };

        if row.toggle.is_busy() {
            return Ok(());
        }

        if seen.is_some_and(|seen| seen != row.status) {
            info!(student_id = %student, status = %row.status, "Ignored toggle from a stale view");
            return Ok(());
        }

        let next = row.status.toggled();
        row.toggle = ActionState::Loading;
        let result = profiles.update_status(access_token, student, next).await;
        row.toggle.settle(&result, TOGGLE_ERROR);

        match result {
            Ok(()) => {
                info!(student_id = %student, status = %next, "Graduation status updated");
                row.status = next;
                row.profile.graduation_status = Some(next);
            }
            Err(e) => {
                error!(student_id = %student, "Error updating status: {}", e);
                self.banner = Some(TOGGLE_ERROR.to_string());
            }
        }

        Ok(())
    }

    pub fn rows(&self) -> &[StudentRow] {
        &self.rows
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }
}
