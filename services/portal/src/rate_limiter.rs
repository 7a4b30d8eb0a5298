//! Rate limiter for sign-in attempts

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::PortalConfig;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,       // 5 minutes
            ban_duration_seconds: 900, // 15 minutes
        }
    }
}

impl From<&PortalConfig> for RateLimiterConfig {
    fn from(config: &PortalConfig) -> Self {
        Self {
            max_attempts: config.login_max_attempts,
            window_seconds: config.login_window_seconds,
            ban_duration_seconds: config.login_ban_seconds,
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    attempts: u32,
    window_start: Instant,
    ban_expires: Option<Instant>,
}

impl RateLimiterEntry {
    /// Whether the entry still restricts its key
    fn is_live(&self, now: Instant, window: Duration) -> bool {
        match self.ban_expires {
            Some(ban_expires) => now < ban_expires,
            None => now.duration_since(self.window_start) < window,
        }
    }
}

/// Rate limiter keyed by normalized email
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and report whether it may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);
        entries.retain(|_, entry| entry.is_live(now, window));

        let entry = entries
            .entry(key.to_string())
            .or_insert(RateLimiterEntry {
                attempts: 0,
                window_start: now,
                ban_expires: None,
            });

        if let Some(ban_expires) = entry.ban_expires {
            if now < ban_expires {
                return false;
            }
            entry.attempts = 0;
            entry.ban_expires = None;
            entry.window_start = now;
        }

        if now.duration_since(entry.window_start) >= window {
            entry.attempts = 0;
            entry.window_start = now;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Blocked sign-in for {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        true
    }

    /// Forget the attempts for `key` after a successful sign-in
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 60,
            ban_duration_seconds: 60,
        })
    }

    #[tokio::test]
    async fn test_blocks_after_max_attempts() {
        let limiter = limiter(2);

        assert!(limiter.is_allowed("ada@example.com").await);
        assert!(limiter.is_allowed("ada@example.com").await);
        assert!(!limiter.is_allowed("ada@example.com").await);
        assert!(!limiter.is_allowed("ada@example.com").await);

        // Other keys are unaffected
        assert!(limiter.is_allowed("grace@example.com").await);
    }

    #[tokio::test]
    async fn test_reset_clears_attempts() {
        let limiter = limiter(1);

        assert!(limiter.is_allowed("ada@example.com").await);
        limiter.reset("ada@example.com").await;
        assert!(limiter.is_allowed("ada@example.com").await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 5,
            window_seconds: 0,
            ban_duration_seconds: 0,
        });

        for n in 0..1000 {
            limiter.is_allowed(&format!("user{n}@example.com")).await;
        }

        assert!(limiter.entries.lock().await.len() <= 1);
    }

    #[tokio::test]
    async fn test_live_bans_survive_cleanup() {
        let limiter = limiter(1);

        assert!(limiter.is_allowed("ada@example.com").await);
        assert!(!limiter.is_allowed("ada@example.com").await);
        for n in 0..10 {
            limiter.is_allowed(&format!("user{n}@example.com")).await;
        }

        assert!(!limiter.is_allowed("ada@example.com").await);
        assert_eq!(limiter.entries.lock().await.len(), 11);
    }

    #[tokio::test]
    async fn test_ban_expires() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 1,
            window_seconds: 60,
            ban_duration_seconds: 0,
        });

        assert!(limiter.is_allowed("ada@example.com").await);
        assert!(!limiter.is_allowed("ada@example.com").await);
        assert!(limiter.is_allowed("ada@example.com").await);
    }
}
