//! Application state shared across handlers

use std::sync::Arc;

use common::backend::{AuthBackend, ProfileStore};

use crate::config::PortalConfig;
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
use crate::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthBackend>,
    pub profiles: Arc<dyn ProfileStore>,
    pub sessions: SessionStore,
    pub rate_limiter: RateLimiter,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        profiles: Arc<dyn ProfileStore>,
        config: &PortalConfig,
    ) -> Self {
        Self {
            auth,
            profiles,
            sessions: SessionStore::new(),
            rate_limiter: RateLimiter::new(RateLimiterConfig::from(config)),
            secure_cookies: config.secure_cookies,
        }
    }
}
