//! HTML views rendered with askama

use askama::Template;
use axum::response::Html;
use common::models::GraduationStatus;

use crate::action::ActionState;
use crate::error::PortalError;
use crate::pages::admin::{AdminDashboard, Badge, StudentRow};
use crate::pages::student::StudentDashboard;

/// Render a template into an HTML response body
pub fn render<T: Template>(template: &T) -> Result<Html<String>, PortalError> {
    Ok(Html(template.render()?))
}

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template, Default)]
#[template(path = "signup.html")]
pub struct SignUpTemplate {
    pub email: String,
    pub full_name: String,
    pub student_id: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub loaded: bool,
    pub full_name: String,
    pub email: String,
    pub student_id: String,
    pub status: &'static str,
    pub confirm: Option<ConfirmControl>,
    /// Label swapped in by the browser while the confirmation is submitted
    pub busy_label: &'static str,
    pub error: Option<String>,
}

/// Label of a row button while its toggle is submitted
pub const UPDATING_LABEL: &str = "Updating...";

/// The confirm button, present only while the status is pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmControl {
    pub label: &'static str,
    pub disabled: bool,
}

/// Label of the confirm button while a confirmation is outstanding
pub fn confirm_busy_label() -> &'static str {
    confirm_control(GraduationStatus::Pending, &ActionState::Loading)
        .map(|control| control.label)
        .unwrap_or_default()
}

pub fn confirm_control(status: GraduationStatus, state: &ActionState) -> Option<ConfirmControl> {
    match status {
        GraduationStatus::Confirmed => None,
        GraduationStatus::Pending if state.is_busy() => Some(ConfirmControl {
            label: "Confirming...",
            disabled: true,
        }),
        GraduationStatus::Pending => Some(ConfirmControl {
            label: "Confirm Graduation Attendance",
            disabled: false,
        }),
    }
}

impl From<&StudentDashboard> for DashboardTemplate {
    fn from(page: &StudentDashboard) -> Self {
        let profile = page.profile();
        Self {
            loaded: profile.is_some(),
            full_name: profile.map(|p| p.full_name.clone()).unwrap_or_default(),
            email: page
                .user()
                .email
                .clone()
                .or_else(|| profile.map(|p| p.email.clone()))
                .unwrap_or_default(),
            student_id: profile
                .and_then(|p| p.student_id.clone())
                .unwrap_or_default(),
            status: page.status().as_str(),
            confirm: profile.and_then(|_| confirm_control(page.status(), page.confirm_state())),
            busy_label: confirm_busy_label(),
            error: page.error().map(str::to_string),
        }
    }
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub rows: Vec<RowView>,
    pub banner: Option<String>,
}

/// One rendered roster row
#[derive(Debug, Clone)]
pub struct RowView {
    pub id: String,
    pub full_name: String,
    pub student_id: String,
    pub email: String,
    pub status: &'static str,
    pub badge_class: &'static str,
    pub action_label: &'static str,
    pub busy_label: &'static str,
    pub disabled: bool,
}

impl From<&StudentRow> for RowView {
    fn from(row: &StudentRow) -> Self {
        let profile = row.profile();
        Self {
            id: profile.id.to_string(),
            full_name: profile.full_name.clone(),
            student_id: profile.student_id.clone().unwrap_or_default(),
            email: profile.email.clone(),
            status: row.status().as_str(),
            badge_class: match row.badge() {
                Badge::Positive => "badge badge-positive",
                Badge::Warning => "badge badge-warning",
            },
            action_label: if row.toggle_state().is_busy() {
                UPDATING_LABEL
            } else {
                row.action_label()
            },
            busy_label: UPDATING_LABEL,
            disabled: row.is_busy(),
        }
    }
}

impl From<&AdminDashboard> for AdminTemplate {
    fn from(page: &AdminDashboard) -> Self {
        Self {
            rows: page.rows().iter().map(RowView::from).collect(),
            banner: page.banner().map(str::to_string),
        }
    }
}
