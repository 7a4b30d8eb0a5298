//! Configuration for the hosted backend connection
//!
//! The portal talks to a single Supabase project. Only the project URL and
//! its public (anon) key are needed; row-level security on the project
//! decides what each signed-in user may read or update.

use crate::error::{BackendError, BackendResult};
use std::env;

/// Backend connection configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`
    pub url: String,
    /// Public API key sent with every request
    pub api_key: String,
    /// Optional request timeout in seconds; requests never time out when unset
    pub request_timeout: Option<u64>,
}

impl BackendConfig {
    /// Create a new BackendConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SUPABASE_URL`: Project URL (required)
    /// - `SUPABASE_ANON_KEY`: Public API key (required)
    /// - `SUPABASE_REQUEST_TIMEOUT`: Request timeout in seconds (optional)
    pub fn from_env() -> BackendResult<Self> {
        let url = env::var("SUPABASE_URL").map_err(|_| {
            BackendError::Configuration("SUPABASE_URL environment variable not set".to_string())
        })?;

        let api_key = env::var("SUPABASE_ANON_KEY").map_err(|_| {
            BackendError::Configuration(
                "SUPABASE_ANON_KEY environment variable not set".to_string(),
            )
        })?;

        let request_timeout = env::var("SUPABASE_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok());

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key,
            request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_backend_config_from_env() {
        unsafe {
            env::set_var("SUPABASE_URL", "https://example.supabase.co/");
            env::set_var("SUPABASE_ANON_KEY", "anon-key");
            env::remove_var("SUPABASE_REQUEST_TIMEOUT");
        }

        let config = BackendConfig::from_env().unwrap();
        assert_eq!(config.url, "https://example.supabase.co");
        assert_eq!(config.api_key, "anon-key");
        assert_eq!(config.request_timeout, None);

        unsafe {
            env::set_var("SUPABASE_REQUEST_TIMEOUT", "15");
        }
        let config = BackendConfig::from_env().unwrap();
        assert_eq!(config.request_timeout, Some(15));

        // Clean up
        unsafe {
            env::remove_var("SUPABASE_URL");
            env::remove_var("SUPABASE_ANON_KEY");
            env::remove_var("SUPABASE_REQUEST_TIMEOUT");
        }
    }

    #[test]
    #[serial]
    fn test_backend_config_requires_key() {
        unsafe {
            env::set_var("SUPABASE_URL", "https://example.supabase.co");
            env::remove_var("SUPABASE_ANON_KEY");
        }

        let err = BackendConfig::from_env().unwrap_err();
        assert!(matches!(err, BackendError::Configuration(_)));

        unsafe {
            env::remove_var("SUPABASE_URL");
        }
    }
}
