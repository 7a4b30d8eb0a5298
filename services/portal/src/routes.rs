//! Portal routes

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::models::AuthSession;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{PortalError, PortalResult},
    guard::Route,
    pages::{
        Mounted,
        account::{self, LoginForm, Notice, SignInOutcome, SignUpForm, SignUpOutcome},
        admin::{AdminDashboard, ToggleForm},
        student::StudentDashboard,
    },
    session::{BrowserSession, SESSION_COOKIE, SessionContext, session_ttl},
    views::{AdminTemplate, DashboardTemplate, LoginTemplate, SignUpTemplate, render},
};

/// Create the router for the portal
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(login_page))
        .route("/login", post(login))
        .route("/signup", get(signup_page).post(signup))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/confirm", post(confirm_attendance))
        .route("/admin", get(admin))
        .route("/admin/students/:id/toggle", post(toggle_status))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "portal"
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub notice: Option<String>,
}

/// Login page; signed-in visitors go straight to the dashboard
pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> PortalResult<Response> {
    if let Some((_, session)) = browser_session(&state, &jar).await {
        let mut session = session.lock().await;
        if session.context.refresh(state.auth.as_ref()).await.user().is_some() {
            return Ok(redirect(Route::Dashboard));
        }
    }

    let notice = query
        .notice
        .as_deref()
        .and_then(Notice::from_query)
        .map(|notice| notice.message().to_string());

    Ok(render(&LoginTemplate {
        notice,
        ..LoginTemplate::default()
    })?
    .into_response())
}

/// Sign in with email and password
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> PortalResult<Response> {
    let outcome = account::sign_in(
        state.auth.as_ref(),
        state.profiles.as_ref(),
        &state.rate_limiter,
        &form,
    )
    .await;

    match outcome {
        SignInOutcome::SignedIn { session, landing } => {
            info!(user_id = %session.user.id, "User signed in");
            let jar = start_session(&state, jar, session).await;
            Ok((jar, redirect(landing)).into_response())
        }
        SignInOutcome::Rejected(message) => {
            let page = render(&LoginTemplate {
                email: form.email,
                error: Some(message),
                notice: None,
            })?;
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
    }
}

pub async fn signup_page() -> PortalResult<Html<String>> {
    render(&SignUpTemplate::default())
}

/// Register a student account
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignUpForm>,
) -> PortalResult<Response> {
    match account::sign_up(state.auth.as_ref(), state.profiles.as_ref(), &form).await {
        SignUpOutcome::SignedIn(session) => {
            let jar = start_session(&state, jar, session).await;
            Ok((jar, redirect(Route::Dashboard)).into_response())
        }
        SignUpOutcome::ConfirmEmail => {
            Ok(Redirect::to(&Notice::CheckEmail.location()).into_response())
        }
        SignUpOutcome::Rejected(message) => {
            let page = render(&SignUpTemplate {
                email: form.email,
                full_name: form.full_name,
                student_id: form.student_id,
                error: Some(message),
            })?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Sign out and drop everything kept for this browser
///
/// The local session is cleared even when the backend call fails; the login
/// page then says so.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> PortalResult<Response> {
    let browser = browser_session(&state, &jar).await;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));

    let Some((id, session)) = browser else {
        return Ok((jar, redirect(Route::Login)).into_response());
    };

    let outcome = {
        let mut session = session.lock().await;
        let outcome = account::sign_out(state.auth.as_ref(), &mut session.context).await;
        session.student = None;
        session.admin = None;
        outcome
    };
    state.sessions.remove(id).await;

    let location = if outcome.confirmed {
        outcome.route.path().to_string()
    } else {
        Notice::SignOutUnconfirmed.location()
    };
    Ok((jar, Redirect::to(&location)).into_response())
}

/// Student dashboard
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> PortalResult<Response> {
    let Some((_, session)) = browser_session(&state, &jar).await else {
        return Ok(redirect(Route::Login));
    };
    let mut guard = session.lock().await;
    let session = &mut *guard;

    session.context.refresh(state.auth.as_ref()).await;
    if let Some(response) = mount_student(&state, session).await {
        return Ok(response);
    }

    let page = session
        .student
        .as_ref()
        .ok_or_else(|| PortalError::Internal("student page missing after mount".to_string()))?;
    Ok(render(&DashboardTemplate::from(page))?.into_response())
}

/// Confirm attendance on the current dashboard visit
pub async fn confirm_attendance(
    State(state): State<AppState>,
    jar: CookieJar,
) -> PortalResult<Response> {
    let Some((_, session)) = browser_session(&state, &jar).await else {
        return Ok(redirect(Route::Login));
    };
    let mut guard = session.lock().await;
    let session = &mut *guard;

    session.context.refresh(state.auth.as_ref()).await;
    if session.student.is_none() {
        if let Some(response) = mount_student(&state, session).await {
            return Ok(response);
        }
    }

    let access_token = session.context.access_token().unwrap_or_default();
    let page = session
        .student
        .as_mut()
        .ok_or_else(|| PortalError::Internal("student page missing after mount".to_string()))?;

    let result = page
        .confirm_attendance(state.profiles.as_ref(), access_token)
        .await;
    if let Err(route) = result {
        session.student = None;
        return Ok(redirect(route));
    }

    Ok(render(&DashboardTemplate::from(&*page))?.into_response())
}

/// Admin dashboard; always loads a fresh roster
pub async fn admin(State(state): State<AppState>, jar: CookieJar) -> PortalResult<Response> {
    let Some((_, session)) = browser_session(&state, &jar).await else {
        return Ok(redirect(Route::Login));
    };
    let mut guard = session.lock().await;
    let session = &mut *guard;

    session.context.refresh(state.auth.as_ref()).await;
    if let Some(response) = mount_admin(&state, session).await {
        return Ok(response);
    }

    let page = session
        .admin
        .as_ref()
        .ok_or_else(|| PortalError::Internal("admin page missing after mount".to_string()))?;
    Ok(render(&AdminTemplate::from(page))?.into_response())
}

/// Toggle one student's graduation status
pub async fn toggle_status(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(student): Path<Uuid>,
    Form(form): Form<ToggleForm>,
) -> PortalResult<Response> {
    let Some((_, session)) = browser_session(&state, &jar).await else {
        return Ok(redirect(Route::Login));
    };
    let mut guard = session.lock().await;
    let session = &mut *guard;

    session.context.refresh(state.auth.as_ref()).await;
    if session.admin.is_none() {
        if let Some(response) = mount_admin(&state, session).await {
            return Ok(response);
        }
    }

    let access_token = session.context.access_token().unwrap_or_default();
    let page = session
        .admin
        .as_mut()
        .ok_or_else(|| PortalError::Internal("admin page missing after mount".to_string()))?;

    let result = page
        .toggle_status(state.profiles.as_ref(), access_token, student, form.from)
        .await;
    if let Err(route) = result {
        session.admin = None;
        return Ok(redirect(route));
    }

    Ok(render(&AdminTemplate::from(&*page))?.into_response())
}

fn redirect(route: Route) -> Response {
    Redirect::to(route.path()).into_response()
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)?.value().parse().ok()
}

/// Resolve the session cookie to a live browser session
async fn browser_session(
    state: &AppState,
    jar: &CookieJar,
) -> Option<(Uuid, Arc<Mutex<BrowserSession>>)> {
    let id = session_id(jar)?;
    let session = state.sessions.get(id).await?;
    Some((id, session))
}

/// Register a signed-in browser session and set its cookie
async fn start_session(state: &AppState, jar: CookieJar, session: AuthSession) -> CookieJar {
    if let Some(previous) = session_id(&jar) {
        state.sessions.remove(previous).await;
    }

    let ttl = session_ttl(&session);
    let id = state
        .sessions
        .create(BrowserSession::new(SessionContext::signed_in(session)), ttl)
        .await;

    jar.add(
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(state.secure_cookies),
    )
}

/// Mount the student page into the browser session, or say where to go instead
async fn mount_student(state: &AppState, session: &mut BrowserSession) -> Option<Response> {
    let previous = session.student.take();
    match StudentDashboard::mount(&session.context, state.profiles.as_ref(), previous).await {
        Mounted::Ready(page) => {
            session.student = Some(page);
            None
        }
        Mounted::Pending => Some(Html(String::new()).into_response()),
        Mounted::Redirect(route) => Some(redirect(route)),
    }
}

async fn mount_admin(state: &AppState, session: &mut BrowserSession) -> Option<Response> {
    match AdminDashboard::mount(&session.context, state.profiles.as_ref()).await {
        Mounted::Ready(page) => {
            session.admin = Some(page);
            None
        }
        Mounted::Pending => Some(Html(String::new()).into_response()),
        Mounted::Redirect(route) => {
            session.admin = None;
            Some(redirect(route))
        }
    }
}
