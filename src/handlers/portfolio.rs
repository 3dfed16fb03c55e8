use axum::{extract::State, http::StatusCode, Json};

use super::{ValidJson, ValidPath};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{NewPortfolioItemRequest, PortfolioChanges, PortfolioItem};
use crate::portfolio as items;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(body): ValidJson<NewPortfolioItemRequest>,
) -> AppResult<(StatusCode, Json<PortfolioItem>)> {
    let item = items::add_item(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(body): ValidJson<PortfolioChanges>,
) -> AppResult<Json<PortfolioItem>> {
    Ok(Json(items::update_item(state.store.as_ref(), &user, id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<StatusCode> {
    items::delete_item(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
