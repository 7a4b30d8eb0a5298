//! Portal service configuration
//!
//! Values come from `PORTAL_*` environment variables; every field has a
//! default so a bare environment still starts the service.

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Portal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Socket address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Mark the session cookie `Secure`
    #[serde(default)]
    pub secure_cookies: bool,
    /// Sign-in attempts allowed per email within the window
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,
    /// Rate limiter window in seconds
    #[serde(default = "default_login_window_seconds")]
    pub login_window_seconds: u64,
    /// Ban duration in seconds once the limit is hit
    #[serde(default = "default_login_ban_seconds")]
    pub login_ban_seconds: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_login_max_attempts() -> u32 {
    5
}

fn default_login_window_seconds() -> u64 {
    300
}

fn default_login_ban_seconds() -> u64 {
    900
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            secure_cookies: false,
            login_max_attempts: default_login_max_attempts(),
            login_window_seconds: default_login_window_seconds(),
            login_ban_seconds: default_login_ban_seconds(),
        }
    }
}

impl PortalConfig {
    /// Create a new PortalConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PORTAL_BIND_ADDR`: Listen address (default: "0.0.0.0:3000")
    /// - `PORTAL_SECURE_COOKIES`: Secure session cookie (default: false)
    /// - `PORTAL_LOGIN_MAX_ATTEMPTS`: Sign-in attempts per window (default: 5)
    /// - `PORTAL_LOGIN_WINDOW_SECONDS`: Rate limiter window (default: 300)
    /// - `PORTAL_LOGIN_BAN_SECONDS`: Ban duration (default: 900)
    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("PORTAL").try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "PORTAL_BIND_ADDR",
        "PORTAL_SECURE_COOKIES",
        "PORTAL_LOGIN_MAX_ATTEMPTS",
        "PORTAL_LOGIN_WINDOW_SECONDS",
        "PORTAL_LOGIN_BAN_SECONDS",
    ];

    fn clear() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_portal_config_defaults() {
        clear();

        let config = PortalConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(!config.secure_cookies);
        assert_eq!(config.login_max_attempts, 5);
        assert_eq!(config.login_window_seconds, 300);
        assert_eq!(config.login_ban_seconds, 900);
    }

    #[test]
    #[serial]
    fn test_portal_config_from_env_with_custom_values() {
        clear();
        unsafe {
            std::env::set_var("PORTAL_BIND_ADDR", "127.0.0.1:8080");
            std::env::set_var("PORTAL_SECURE_COOKIES", "true");
            std::env::set_var("PORTAL_LOGIN_MAX_ATTEMPTS", "3");
        }

        let config = PortalConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert!(config.secure_cookies);
        assert_eq!(config.login_max_attempts, 3);
        assert_eq!(config.login_window_seconds, 300);

        clear();
    }
}
