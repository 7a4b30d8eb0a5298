//! Sign-in, sign-up and sign-out

use common::backend::{AuthBackend, ProfileStore};
use common::error::BackendError;
use common::models::{AuthSession, Credentials, NewProfile};
use common::validation::{
    validate_email, validate_full_name, validate_password, validate_student_id,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::guard::Route;
use crate::rate_limiter::RateLimiter;
use crate::session::SessionContext;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const SIGN_IN_UNAVAILABLE: &str = "Unable to sign in right now. Please try again later.";
pub const TOO_MANY_ATTEMPTS: &str = "Too many sign-in attempts. Please wait and try again.";
pub const SIGN_UP_FAILED: &str = "Unable to create your account.";
pub const PROFILE_INSERT_FAILED: &str =
    "Your account was created but your profile could not be saved. Please contact an administrator.";

/// Login form fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-up form fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub student_id: String,
}

/// Messages shown on the login page after a redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SignOutUnconfirmed,
    CheckEmail,
}

impl Notice {
    pub fn as_query(self) -> &'static str {
        match self {
            Notice::SignOutUnconfirmed => "signout_failed",
            Notice::CheckEmail => "check_email",
        }
    }

    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "signout_failed" => Some(Notice::SignOutUnconfirmed),
            "check_email" => Some(Notice::CheckEmail),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::SignOutUnconfirmed => {
                "You have been signed out of this device, but the server could not confirm it."
            }
            Notice::CheckEmail => "Account created. Check your email to confirm it, then sign in.",
        }
    }

    /// Login page URL carrying this notice
    pub fn location(self) -> String {
        format!("{}?notice={}", Route::Login.path(), self.as_query())
    }
}

#[derive(Debug)]
pub enum SignInOutcome {
    SignedIn { session: AuthSession, landing: Route },
    Rejected(String),
}

#[derive(Debug)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    /// The account exists but must be confirmed by email first
    ConfirmEmail,
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignOutOutcome {
    pub route: Route,
    /// Whether the backend acknowledged the sign-out
    pub confirmed: bool,
}

/// Authenticate with email and password
pub async fn sign_in(
    auth: &dyn AuthBackend,
    profiles: &dyn ProfileStore,
    limiter: &RateLimiter,
    form: &LoginForm,
) -> SignInOutcome {
    let email = form.email.trim().to_lowercase();

    if let Err(message) = validate_email(&email) {
        return SignInOutcome::Rejected(message);
    }
    if form.password.is_empty() {
        return SignInOutcome::Rejected("Password is required".to_string());
    }
    if !limiter.is_allowed(&email).await {
        return SignInOutcome::Rejected(TOO_MANY_ATTEMPTS.to_string());
    }

    match auth.sign_in(&Credentials::new(&email, &form.password)).await {
        Ok(session) => {
            limiter.reset(&email).await;
            let landing = landing_for(profiles, &session).await;
            SignInOutcome::SignedIn { session, landing }
        }
        Err(BackendError::Unauthorized)
        | Err(BackendError::Api {
            status: 400 | 401, ..
        }) => {
            info!("Rejected sign-in for {}", email);
            SignInOutcome::Rejected(INVALID_CREDENTIALS.to_string())
        }
        Err(e) => {
            error!("Sign-in failed: {}", e);
            SignInOutcome::Rejected(SIGN_IN_UNAVAILABLE.to_string())
        }
    }
}

/// Admins land on the admin page, everyone else on the dashboard
async fn landing_for(profiles: &dyn ProfileStore, session: &AuthSession) -> Route {
    match profiles
        .get_by_id(&session.access_token, session.user.id)
        .await
    {
        Ok(profile) if profile.role.is_admin() => Route::Admin,
        Ok(_) => Route::Dashboard,
        Err(e) => {
            warn!(user_id = %session.user.id, "Role lookup after sign-in failed: {}", e);
            Route::Dashboard
        }
    }
}

/// Register an account and create its student profile
pub async fn sign_up(
    auth: &dyn AuthBackend,
    profiles: &dyn ProfileStore,
    form: &SignUpForm,
) -> SignUpOutcome {
    let email = form.email.trim().to_lowercase();
    let full_name = form.full_name.trim();
    let student_id = form.student_id.trim();

    let checks = [
        validate_email(&email),
        validate_password(&form.password),
        validate_full_name(full_name),
        validate_student_id(student_id),
    ];
    if let Some(Err(message)) = checks.into_iter().find(Result::is_err) {
        return SignUpOutcome::Rejected(message);
    }

    let sign_up = match auth
        .sign_up(&Credentials::new(&email, &form.password))
        .await
    {
        Ok(sign_up) => sign_up,
        Err(BackendError::Api { message, .. }) => {
            error!("Sign-up rejected: {}", message);
            return SignUpOutcome::Rejected(format!("{SIGN_UP_FAILED} {message}."));
        }
        Err(e) => {
            error!("Sign-up failed: {}", e);
            return SignUpOutcome::Rejected(SIGN_UP_FAILED.to_string());
        }
    };

    let profile = NewProfile::student(
        sign_up.user.id,
        &email,
        full_name,
        Some(student_id.to_string()),
    );
    let access_token = sign_up.session.as_ref().map(|s| s.access_token.as_str());

    if let Err(e) = profiles.insert(access_token, &profile).await {
        error!(user_id = %sign_up.user.id, "Error creating profile: {}", e);
        return SignUpOutcome::Rejected(PROFILE_INSERT_FAILED.to_string());
    }

    info!(user_id = %sign_up.user.id, "Registered student {}", student_id);
    match sign_up.session {
        Some(session) => SignUpOutcome::SignedIn(session),
        None => SignUpOutcome::ConfirmEmail,
    }
}

/// Sign out, then always clear the local session
pub async fn sign_out(auth: &dyn AuthBackend, context: &mut SessionContext) -> SignOutOutcome {
    let confirmed = match context.access_token() {
        None => true,
        Some(token) => match auth.sign_out(token).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Sign-out failed: {}", e);
                false
            }
        },
    };

    context.clear();
    SignOutOutcome {
        route: Route::Login,
        confirmed,
    }
}
