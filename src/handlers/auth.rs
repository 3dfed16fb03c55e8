use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use super::ValidJson;
use crate::auth::{self as flows, LoginResponse, MaybeUser};
use crate::error::AppResult;
use crate::models::{EmailRequest, LoginRequest, RegisterRequest, User};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = flows::register(&state, body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    Ok(Json(flows::login(&state, body).await?))
}

pub async fn confirm(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> AppResult<Json<Value>> {
    flows::confirm_email(&state, body).await?;
    Ok(Json(json!({ "message": "Email confirmed" })))
}

pub async fn resend(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<EmailRequest>,
) -> AppResult<Json<Value>> {
    flows::resend_confirmation(&state, &body.email).await?;
    Ok(Json(json!({ "message": "Confirmation email sent" })))
}

/// `null` when nobody is logged in.
pub async fn me(MaybeUser(user): MaybeUser) -> Json<Option<User>> {
    Json(user)
}
