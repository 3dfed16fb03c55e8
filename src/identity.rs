//! Identity provider port and the Supabase GoTrue client behind it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::error::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: IdentityUser,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("email already exists")]
    AlreadyRegistered,

    #[error("{0}")]
    Rejected(String),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                AppError::Authentication(err.to_string())
            }
            IdentityError::EmailNotConfirmed => AppError::EmailNotConfirmed,
            IdentityError::AlreadyRegistered | IdentityError::Rejected(_) => {
                AppError::Validation(err.to_string())
            }
            IdentityError::Unavailable(_) => AppError::Upstream(err.to_string()),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, IdentityError>;

    /// `metadata` is stored on the provider side as user data.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<IdentityUser, IdentityError>;

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError>;

    async fn confirm_email(&self, auth_id: &str) -> Result<(), IdentityError>;

    async fn resend_confirmation(&self, email: &str) -> Result<(), IdentityError>;
}

/// Error payloads differ between GoTrue versions; keep every field either
/// version may send.
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl GoTrueError {
    fn code(&self) -> &str {
        self.error_code
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or_default()
    }

    fn description(&self) -> String {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("request rejected")
            .to_string()
    }

    fn mentions(&self, needle: &str) -> bool {
        self.code().contains(needle) || self.description().to_lowercase().contains(needle)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    WithSession { user: IdentityUser },
    User(IdentityUser),
}

pub struct SupabaseAuth {
    client: Client,
    base_url: Url,
    anon_key: String,
    service_role_key: Option<String>,
}

impl SupabaseAuth {
    pub fn new(config: &Config) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        let mut base_url = config.supabase_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(SupabaseAuth {
            client,
            base_url,
            anon_key: config.supabase_anon_key.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|e| IdentityError::Unavailable(format!("bad endpoint {path}: {e}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, IdentityError> {
        request
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }

    async fn rejection(response: Response) -> (StatusCode, GoTrueError) {
        let status = response.status();
        let body = response.json::<GoTrueError>().await.unwrap_or_default();
        debug!("Identity provider answered {}: {:?}", status, body);
        (status, body)
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, IdentityError> {
        response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("unexpected response: {e}")))
    }
}

fn unavailable(status: StatusCode, body: &GoTrueError) -> IdentityError {
    IdentityError::Unavailable(format!("{status}: {}", body.description()))
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.set_query(Some("grant_type=password"));
        let request = self
            .client
            .post(url)
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request).await?;
        if response.status().is_success() {
            return Self::parse(response).await;
        }

        let (status, body) = Self::rejection(response).await;
        if body.mentions("not_confirmed") || body.mentions("not confirmed") {
            Err(IdentityError::EmailNotConfirmed)
        } else if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            Err(IdentityError::InvalidCredentials)
        } else {
            Err(unavailable(status, &body))
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<IdentityUser, IdentityError> {
        let request = self.client.post(self.endpoint("auth/v1/signup")?).json(&json!({
            "email": email,
            "password": password,
            "data": metadata,
        }));
        let response = self.send(request).await?;
        if response.status().is_success() {
            return match Self::parse::<SignUpResponse>(response).await? {
                SignUpResponse::WithSession { user } | SignUpResponse::User(user) => Ok(user),
            };
        }

        let (status, body) = Self::rejection(response).await;
        if body.mentions("already") {
            Err(IdentityError::AlreadyRegistered)
        } else if status.is_client_error() {
            Err(IdentityError::Rejected(body.description()))
        } else {
            Err(unavailable(status, &body))
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let request = self
            .client
            .get(self.endpoint("auth/v1/user")?)
            .bearer_auth(access_token);
        let response = self.send(request).await?;
        if response.status().is_success() {
            return Self::parse(response).await;
        }

        let (status, body) = Self::rejection(response).await;
        if status.is_client_error() {
            Err(IdentityError::InvalidToken)
        } else {
            Err(unavailable(status, &body))
        }
    }

    async fn confirm_email(&self, auth_id: &str) -> Result<(), IdentityError> {
        let Some(service_key) = self.service_role_key.as_deref() else {
            warn!("Manual confirmation requested without SUPABASE_SERVICE_ROLE_KEY");
            return Err(IdentityError::Unavailable(
                "SUPABASE_SERVICE_ROLE_KEY is not configured".to_string(),
            ));
        };
        let request = self
            .client
            .put(self.endpoint(&format!("auth/v1/admin/users/{auth_id}"))?)
            .bearer_auth(service_key)
            .json(&json!({ "email_confirm": true }));
        let response = request
            .header("apikey", service_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        if response.status().is_success() {
            return Ok(());
        }

        let (status, body) = Self::rejection(response).await;
        if status == StatusCode::NOT_FOUND {
            Err(IdentityError::Rejected(body.description()))
        } else {
            Err(unavailable(status, &body))
        }
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), IdentityError> {
        let request = self
            .client
            .post(self.endpoint("auth/v1/resend")?)
            .json(&json!({ "type": "signup", "email": email }));
        let response = self.send(request).await?;
        if response.status().is_success() {
            return Ok(());
        }

        let (status, body) = Self::rejection(response).await;
        if status.is_client_error() {
            Err(IdentityError::Rejected(body.description()))
        } else {
            Err(unavailable(status, &body))
        }
    }
}
