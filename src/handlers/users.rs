use axum::{extract::State, Json};

use super::{ValidJson, ValidPath};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{User, UserChanges};
use crate::profiles;
use crate::state::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(profiles::public_user(state.store.as_ref(), id).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(body): ValidJson<UserChanges>,
) -> AppResult<Json<User>> {
    Ok(Json(profiles::update_me(state.store.as_ref(), &user, body).await?))
}
