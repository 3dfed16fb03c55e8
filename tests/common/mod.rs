#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use photomarket::db::MemoryStore;
use photomarket::identity::{IdentityError, IdentityProvider, IdentitySession, IdentityUser};
use photomarket::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "segredo123";

struct FakeAccount {
    id: String,
    password: String,
    confirmed: bool,
}

/// In-process stand-in for the hosted identity provider. Tokens are
/// `token-<email>`.
#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, FakeAccount>>,
    require_confirmation: bool,
}

impl FakeIdentity {
    pub fn requiring_confirmation() -> Self {
        FakeIdentity {
            require_confirmation: true,
            ..Default::default()
        }
    }

    fn user(email: &str, account: &FakeAccount) -> IdentityUser {
        IdentityUser {
            id: account.id.clone(),
            email: email.to_string(),
            email_confirmed_at: None,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get(email)
            .filter(|a| a.password == password)
            .ok_or(IdentityError::InvalidCredentials)?;
        if !account.confirmed {
            return Err(IdentityError::EmailNotConfirmed);
        }
        Ok(IdentitySession {
            access_token: format!("token-{email}"),
            refresh_token: format!("refresh-{email}"),
            expires_in: 3600,
            user: Self::user(email, account),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _metadata: Value,
    ) -> Result<IdentityUser, IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(IdentityError::AlreadyRegistered);
        }
        let account = FakeAccount {
            id: format!("auth-{}", accounts.len() + 1),
            password: password.to_string(),
            confirmed: !self.require_confirmation,
        };
        let user = Self::user(email, &account);
        accounts.insert(email.to_string(), account);
        Ok(user)
    }

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let email = access_token
            .strip_prefix("token-")
            .ok_or(IdentityError::InvalidToken)?;
        let accounts = self.accounts.lock().unwrap();
        accounts
            .get(email)
            .map(|account| Self::user(email, account))
            .ok_or(IdentityError::InvalidToken)
    }

    async fn confirm_email(&self, auth_id: &str) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .values_mut()
            .find(|a| a.id == auth_id)
            .ok_or_else(|| IdentityError::Rejected("User not found".to_string()))?;
        account.confirmed = true;
        Ok(())
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), IdentityError> {
        if self.accounts.lock().unwrap().contains_key(email) {
            Ok(())
        } else {
            Err(IdentityError::Rejected("User not found".to_string()))
        }
    }
}

pub struct TestApp {
    router: Router,
}

pub struct Account {
    pub id: i64,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_identity(FakeIdentity::default())
    }

    pub fn with_identity(identity: FakeIdentity) -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(identity));
        TestApp {
            router: router(state),
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Registers through the API and logs in, returning the user id and token.
    pub async fn sign_up(&self, email: &str, name: &str, role: &str) -> Account {
        let (status, user) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "email": email, "password": PASSWORD, "name": name, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{user}");

        let (status, login) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{login}");

        Account {
            id: user["id"].as_i64().unwrap(),
            token: login["accessToken"].as_str().unwrap().to_string(),
        }
    }

    pub async fn photographer(&self, email: &str) -> Account {
        self.sign_up(email, "Fotógrafa", "photographer").await
    }

    pub async fn client(&self, email: &str) -> Account {
        self.sign_up(email, "Cliente", "client").await
    }
}
