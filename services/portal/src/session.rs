//! Session context and the per-browser session registry
//!
//! A [`SessionContext`] is the observable "who is signed in" store for one
//! browser. Its value only ever changes through [`transition`], and pages
//! subscribe to it to notice a sign-out made elsewhere. The
//! [`SessionStore`] maps the session cookie to that browser's context and
//! its live page instances.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::backend::AuthBackend;
use common::models::{AuthSession, AuthUser};
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::pages::{admin::AdminDashboard, student::StudentDashboard};

/// Name of the cookie carrying the browser session id
pub const SESSION_COOKIE: &str = "portal_session";

/// Who is signed in, as far as this browser knows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The backend has not been asked yet
    #[default]
    Unknown,
    SignedOut,
    SignedIn(AuthUser),
}

impl SessionState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// Events reported by the auth service
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Result of a current-session lookup
    Restored(Option<AuthUser>),
    SignedIn(AuthUser),
    SignedOut,
    /// The lookup itself failed
    LookupFailed,
}

/// The single transition function of the session store
pub fn transition(_current: &SessionState, event: SessionEvent) -> SessionState {
    match event {
        SessionEvent::Restored(Some(user)) | SessionEvent::SignedIn(user) => {
            SessionState::SignedIn(user)
        }
        SessionEvent::Restored(None) | SessionEvent::SignedOut | SessionEvent::LookupFailed => {
            SessionState::SignedOut
        }
    }
}

/// Observable session state plus the tokens behind it
#[derive(Debug)]
pub struct SessionContext {
    access_token: Option<String>,
    refresh_token: Option<String>,
    state: watch::Sender<SessionState>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Create a context in the `Unknown` state
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            access_token: None,
            refresh_token: None,
            state,
        }
    }

    /// Create a context for a freshly signed-in session
    pub fn signed_in(session: AuthSession) -> Self {
        let mut context = Self::new();
        context.access_token = Some(session.access_token);
        context.refresh_token = session.refresh_token;
        context.apply(SessionEvent::SignedIn(session.user));
        context
    }

    /// Apply an event; returns whether the observable value changed
    pub fn apply(&self, event: SessionEvent) -> bool {
        self.state.send_if_modified(|state| {
            let next = transition(state, event);
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    /// Ask the backend who owns the stored token
    ///
    /// An expired access token is renewed with the refresh token when one
    /// is held. A failed lookup is treated as "no user".
    pub async fn refresh(&mut self, auth: &dyn AuthBackend) -> SessionState {
        let event = match self.access_token.clone() {
            None => SessionEvent::Restored(None),
            Some(token) => match auth.current_user(&token).await {
                Ok(Some(user)) => SessionEvent::Restored(Some(user)),
                Ok(None) => self.renew(auth).await,
                Err(e) => {
                    warn!("Session lookup failed: {}", e);
                    SessionEvent::LookupFailed
                }
            },
        };

        if self.apply(event) {
            info!("Session changed: {:?}", self.current());
        }
        self.current()
    }

    /// Trade the refresh token for a new access token
    async fn renew(&mut self, auth: &dyn AuthBackend) -> SessionEvent {
        let Some(refresh_token) = self.refresh_token.take() else {
            return SessionEvent::Restored(None);
        };

        match auth.refresh_session(&refresh_token).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "Access token renewed");
                self.access_token = Some(session.access_token);
                self.refresh_token = session.refresh_token;
                SessionEvent::Restored(Some(session.user))
            }
            Err(e) => {
                warn!("Session renewal failed: {}", e);
                self.access_token = None;
                SessionEvent::Restored(None)
            }
        }
    }

    /// Drop the tokens and mark the session signed out
    pub fn clear(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.apply(SessionEvent::SignedOut);
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.current().user().cloned()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

/// How long the server keeps a browser session for `session`
///
/// A session holding a refresh token lives until sign-out; otherwise it ends
/// with its access token.
pub fn session_ttl(session: &AuthSession) -> Option<Duration> {
    match session.refresh_token {
        Some(_) => None,
        None => session.expires_in.map(Duration::from_secs),
    }
}

/// Everything the server keeps for one browser
#[derive(Debug, Default)]
pub struct BrowserSession {
    pub context: SessionContext,
    pub student: Option<StudentDashboard>,
    pub admin: Option<AdminDashboard>,
}

impl BrowserSession {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            student: None,
            admin: None,
        }
    }
}

struct Entry {
    session: Arc<Mutex<BrowserSession>>,
    expires_at: Option<Instant>,
}

/// Registry of browser sessions keyed by cookie value
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a browser session and return its cookie value
    pub async fn create(&self, session: BrowserSession, ttl: Option<Duration>) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.expires_at.is_none_or(|at| at > now));
        sessions.insert(
            id,
            Entry {
                session: Arc::new(Mutex::new(session)),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );

        info!("Created browser session, {} active", sessions.len());
        id
    }

    /// Look up a live browser session
    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<BrowserSession>>> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id)?;
        match entry.expires_at {
            Some(at) if at <= Instant::now() => None,
            _ => Some(entry.session.clone()),
        }
    }

    pub async fn remove(&self, id: Uuid) {
        self.sessions.write().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
