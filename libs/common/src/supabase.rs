//! HTTP client for the hosted Supabase project
//!
//! Authentication goes through the GoTrue endpoints under `/auth/v1` and the
//! `profiles` table through the PostgREST endpoints under `/rest/v1`. Every
//! request carries the project's API key; requests made on behalf of a user
//! also carry that user's access token so row-level policies apply.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use crate::backend::{AuthBackend, ProfileStore};
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};
use crate::models::{
    AuthSession, AuthUser, Credentials, GraduationStatus, NewProfile, Profile, Role, SignUp,
    StatusUpdate,
};

const PROFILES_TABLE: &str = "profiles";

/// Supabase client implementing both backend traits
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    api_key: String,
}

/// Body of `/auth/v1/signup`, which is either a session or a bare user
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseClient {
    /// Create a new client for the configured project
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let http = builder.build()?;

        info!("Supabase client initialized with URL: {}", config.url);

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, PROFILES_TABLE)
    }

    fn request(&self, method: Method, url: String, access_token: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token.unwrap_or(&self.api_key))
    }
}

/// Turn a non-success response into `BackendError::Api`
async fn ensure_success(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

/// GoTrue and PostgREST disagree on where the message lives
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> BackendResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<AuthSession> {
        info!("Signing in user: {}", credentials.email);

        let response = self
            .request(Method::POST, self.auth_url("token"), None)
            .query(&[("grant_type", "password")])
            .json(credentials)
            .send()
            .await?;

        let session: AuthSession = decode(ensure_success(response).await?).await?;
        info!(user_id = %session.user.id, "User signed in");
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> BackendResult<SignUp> {
        info!("Registering user: {}", credentials.email);

        let response = self
            .request(Method::POST, self.auth_url("signup"), None)
            .json(credentials)
            .send()
            .await?;

        let body: SignUpResponse = decode(ensure_success(response).await?).await?;

        let user = match (body.user, body.id) {
            (Some(user), _) => user,
            (None, Some(id)) => AuthUser {
                id,
                email: body.email,
            },
            (None, None) => {
                error!("Sign-up response carried no user");
                return Err(BackendError::Decode(
                    "sign-up response carried no user".to_string(),
                ));
            }
        };

        let session = body.access_token.map(|access_token| AuthSession {
            access_token,
            refresh_token: body.refresh_token,
            expires_in: body.expires_in,
            user: user.clone(),
        });

        Ok(SignUp { user, session })
    }

    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<AuthSession> {
        let response = self
            .request(Method::POST, self.auth_url("token"), None)
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let session: AuthSession = decode(ensure_success(response).await?).await?;
        info!(user_id = %session.user.id, "Session refreshed");
        Ok(session)
    }

    async fn current_user(&self, access_token: &str) -> BackendResult<Option<AuthUser>> {
        let response = self
            .request(Method::GET, self.auth_url("user"), Some(access_token))
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Ok(None),
            _ => {
                let user: AuthUser = decode(ensure_success(response).await?).await?;
                Ok(Some(user))
            }
        }
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let response = self
            .request(Method::POST, self.auth_url("logout"), Some(access_token))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn get_by_id(&self, access_token: &str, id: Uuid) -> BackendResult<Profile> {
        let response = self
            .request(Method::GET, self.table_url(), Some(access_token))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
            .send()
            .await?;

        let rows: Vec<Profile> = decode(ensure_success(response).await?).await?;
        rows.into_iter().next().ok_or(BackendError::NotFound)
    }

    async fn list_by_role(&self, access_token: &str, role: Role) -> BackendResult<Vec<Profile>> {
        let response = self
            .request(Method::GET, self.table_url(), Some(access_token))
            .query(&[
                ("select", "*".to_string()),
                ("role", format!("eq.{role}")),
                ("order", "student_id.asc".to_string()),
            ])
            .send()
            .await?;

        let rows: Vec<Profile> = decode(ensure_success(response).await?).await?;
        info!(role = %role, count = rows.len(), "Listed profiles");
        Ok(rows)
    }

    async fn update_status(
        &self,
        access_token: &str,
        id: Uuid,
        status: GraduationStatus,
    ) -> BackendResult<()> {
        info!(profile_id = %id, status = %status, "Updating graduation status");

        let response = self
            .request(Method::PATCH, self.table_url(), Some(access_token))
            .query(&[("id", format!("eq.{id}")), ("select", "id".to_string())])
            .header("Prefer", "return=representation")
            .json(&StatusUpdate {
                graduation_status: status,
            })
            .send()
            .await?;

        // Row-level security filters silently: zero rows back means nothing changed
        let rows: Vec<serde_json::Value> = decode(ensure_success(response).await?).await?;
        if rows.is_empty() {
            error!(profile_id = %id, "Status update matched no row");
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    async fn insert(&self, access_token: Option<&str>, profile: &NewProfile) -> BackendResult<()> {
        info!(profile_id = %profile.id, "Inserting profile");

        let response = self
            .request(Method::POST, self.table_url(), access_token)
            .header("Prefer", "return=minimal")
            .json(std::slice::from_ref(profile))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_field_lookup() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            Some("Invalid login credentials".to_string())
        );
        assert_eq!(
            error_message(r#"{"code":"42501","message":"permission denied"}"#),
            Some("permission denied".to_string())
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = SupabaseClient::new(&BackendConfig {
            url: "https://example.supabase.co/".to_string(),
            api_key: "anon".to_string(),
            request_timeout: Some(5),
        })
        .unwrap();

        assert_eq!(client.auth_url("user"), "https://example.supabase.co/auth/v1/user");
        assert_eq!(client.table_url(), "https://example.supabase.co/rest/v1/profiles");
    }
}
