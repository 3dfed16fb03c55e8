use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Serialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::identity::IdentityError;
use crate::models::{LoginRequest, NewUser, RegisterRequest, Role, User};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: User,
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid {
        return Err(AppError::validation("email is not a valid address"));
    }
    Ok(email)
}

pub async fn register(state: &AppState, request: RegisterRequest) -> AppResult<User> {
    let email = normalize_email(&request.email)?;
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::validation("email already exists"));
    }

    let identity = state
        .identity
        .sign_up(
            &email,
            &request.password,
            json!({ "name": name, "role": request.role }),
        )
        .await?;

    let new_user = NewUser {
        email,
        name,
        role: request.role,
        phone: request.phone.filter(|p| !p.trim().is_empty()),
        location: request.location.filter(|l| !l.trim().is_empty()),
        auth_id: Some(identity.id.clone()),
    };
    let created = match request.role {
        Role::Photographer => state.store.create_photographer(new_user).await.map(|(user, _)| user),
        Role::Client => state.store.create_user(new_user).await,
    };
    let user = created.map_err(|e| {
        // The provider account already exists at this point and is not rolled back.
        error!(
            "Identity account {} created but user row failed: {}",
            identity.id, e
        );
        AppError::from(e)
    })?;

    info!("Registered {:?} user {} ({})", user.role, user.id, user.email);
    Ok(user)
}

pub async fn login(state: &AppState, request: LoginRequest) -> AppResult<LoginResponse> {
    let email = normalize_email(&request.email)?;
    let session = state
        .identity
        .sign_in_with_password(&email, &request.password)
        .await?;
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::authentication("No account registered for this email"))?;

    info!("User {} logged in", user.id);
    Ok(LoginResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        expires_in: session.expires_in,
        user,
    })
}

/// Manual confirmation for users whose confirmation email never arrived.
/// The password must check out first; only then is the admin API used.
pub async fn confirm_email(state: &AppState, request: LoginRequest) -> AppResult<()> {
    let email = normalize_email(&request.email)?;
    match state
        .identity
        .sign_in_with_password(&email, &request.password)
        .await
    {
        Ok(_) => {
            debug!("Email {} is already confirmed", email);
            return Ok(());
        }
        Err(IdentityError::EmailNotConfirmed) => {}
        Err(e) => return Err(e.into()),
    }
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::validation("No account registered for this email"))?;
    let auth_id = user
        .auth_id
        .as_deref()
        .ok_or_else(|| AppError::validation("Account has no identity record"))?;
    state.identity.confirm_email(auth_id).await?;
    info!("Confirmed email for user {}", user.id);
    Ok(())
}

pub async fn resend_confirmation(state: &AppState, email: &str) -> AppResult<()> {
    let email = normalize_email(email)?;
    state.identity.resend_confirmation(&email).await?;
    info!("Resent confirmation email to {}", email);
    Ok(())
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

async fn resolve_user(state: &AppState, token: &str) -> AppResult<User> {
    let identity = state.identity.get_user(token).await?;
    state
        .store
        .find_user_by_email(&identity.email)
        .await?
        .ok_or_else(|| AppError::authentication("No account registered for this token"))
}

pub fn require_photographer(user: &User) -> AppResult<()> {
    if user.is_photographer() {
        Ok(())
    } else {
        Err(AppError::permission("Only photographers can do this"))
    }
}

pub fn require_client(user: &User) -> AppResult<()> {
    if user.role == Role::Client {
        Ok(())
    } else {
        Err(AppError::permission("Only clients can do this"))
    }
}

/// Authenticated requester. Rejects with 401 when the token is missing,
/// invalid, or does not match a user row.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::authentication("Missing bearer token"))?;
        resolve_user(state, &token).await.map(AuthUser)
    }
}

/// Requester if one can be resolved, `None` otherwise. Never rejects on
/// authentication problems.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeUser(None));
        };
        match resolve_user(state, &token).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Authentication(reason)) => {
                debug!("Ignoring bearer token: {}", reason);
                Ok(MaybeUser(None))
            }
            Err(other) => Err(other),
        }
    }
}
