//! Profile model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Role;

/// Graduation attendance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraduationStatus {
    #[default]
    Pending,
    Confirmed,
}

impl GraduationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GraduationStatus::Pending => "pending",
            GraduationStatus::Confirmed => "confirmed",
        }
    }

    /// The opposite status, as applied by an admin toggle
    pub fn toggled(self) -> Self {
        match self {
            GraduationStatus::Pending => GraduationStatus::Confirmed,
            GraduationStatus::Confirmed => GraduationStatus::Pending,
        }
    }

    pub fn is_confirmed(self) -> bool {
        self == GraduationStatus::Confirmed
    }
}

impl fmt::Display for GraduationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraduationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GraduationStatus::Pending),
            "confirmed" => Ok(GraduationStatus::Confirmed),
            other => Err(format!("unknown graduation status: {other}")),
        }
    }
}

/// Profile row, one per authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub graduation_status: Option<GraduationStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Displayed status; a missing value counts as pending
    pub fn status(&self) -> GraduationStatus {
        self.graduation_status.unwrap_or_default()
    }
}

/// New profile insert payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub graduation_status: GraduationStatus,
}

impl NewProfile {
    /// Profile for a freshly registered student
    pub fn student(
        id: Uuid,
        email: impl Into<String>,
        full_name: impl Into<String>,
        student_id: Option<String>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: full_name.into(),
            role: Role::Student,
            student_id,
            graduation_status: GraduationStatus::Pending,
        }
    }
}

/// Status update payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub graduation_status: GraduationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_status_displays_pending() {
        let profile: Profile = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "email": "ada@example.com",
            "full_name": "Ada Lovelace",
            "role": "student",
            "student_id": "A2",
            "graduation_status": null,
        }))
        .unwrap();

        assert_eq!(profile.graduation_status, None);
        assert_eq!(profile.status(), GraduationStatus::Pending);
    }

    #[test]
    fn test_profile_defaults_when_fields_absent() {
        let profile: Profile = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "email": "grace@example.com",
            "full_name": "Grace Hopper",
            "created_at": "2024-05-01T10:00:00+00:00",
        }))
        .unwrap();

        assert_eq!(profile.role, Role::Student);
        assert_eq!(profile.student_id, None);
        assert_eq!(profile.status(), GraduationStatus::Pending);
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn test_toggle_is_an_involution() {
        for status in [GraduationStatus::Pending, GraduationStatus::Confirmed] {
            assert_ne!(status.toggled(), status);
            assert_eq!(status.toggled().toggled(), status);
        }
    }

    #[test]
    fn test_new_student_profile_starts_pending() {
        let profile = NewProfile::student(
            Uuid::new_v4(),
            "alan@example.com",
            "Alan Turing",
            Some("A3".to_string()),
        );
        assert_eq!(profile.role, Role::Student);
        assert_eq!(profile.graduation_status, GraduationStatus::Pending);

        let body = serde_json::to_value(&profile).unwrap();
        assert_eq!(body["graduation_status"], "pending");
        assert_eq!(body["role"], "student");
    }
}
