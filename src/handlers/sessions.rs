use axum::{extract::State, http::StatusCode, Json};

use super::{ValidJson, ValidPath, ValidQuery};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{NewSessionRequest, Session, SessionPatchRequest};
use crate::sessions::{self as lifecycle, SessionFilter};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(filter): ValidQuery<SessionFilter>,
) -> AppResult<Json<Vec<Session>>> {
    Ok(Json(lifecycle::list_sessions(state.store.as_ref(), &user, &filter).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(body): ValidJson<NewSessionRequest>,
) -> AppResult<(StatusCode, Json<Session>)> {
    let session = lifecycle::create_session(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<Session>> {
    Ok(Json(lifecycle::get_session(state.store.as_ref(), &user, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(body): ValidJson<SessionPatchRequest>,
) -> AppResult<Json<Session>> {
    Ok(Json(lifecycle::update_session(state.store.as_ref(), &user, id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<StatusCode> {
    lifecycle::delete_session(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
