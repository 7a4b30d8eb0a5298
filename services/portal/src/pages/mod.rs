//! Page controllers
//!
//! Each controller is one page visit: it is mounted behind its guard, keeps
//! the rows it fetched, and applies the results of its own actions locally
//! without fetching again.

use tokio::sync::watch;
use uuid::Uuid;

use crate::guard::Route;
use crate::session::SessionState;

pub mod account;
pub mod admin;
pub mod student;

/// Result of mounting a protected page
#[derive(Debug)]
pub enum Mounted<P> {
    /// Authorization still in flight; render nothing
    Pending,
    Redirect(Route),
    Ready(P),
}

/// Re-run the session guard if the session changed since the page last looked
fn session_redirect(session: &mut watch::Receiver<SessionState>, owner: Uuid) -> Option<Route> {
    if !session.has_changed().unwrap_or(true) {
        return None;
    }

    match session.borrow_and_update().user() {
        Some(user) if user.id == owner => None,
        _ => Some(Route::Login),
    }
}
