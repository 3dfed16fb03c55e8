use axum::{extract::State, http::StatusCode, Json};

use super::{ValidJson, ValidPath};
use crate::auth::AuthUser;
use crate::catalog;
use crate::error::AppResult;
use crate::models::{NewServiceRequest, Service, ServicePatchRequest};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(body): ValidJson<NewServiceRequest>,
) -> AppResult<(StatusCode, Json<Service>)> {
    let service = catalog::create_service(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Service>>> {
    Ok(Json(catalog::own_services(state.store.as_ref(), &user).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(body): ValidJson<ServicePatchRequest>,
) -> AppResult<Json<Service>> {
    Ok(Json(catalog::update_service(state.store.as_ref(), &user, id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<StatusCode> {
    catalog::delete_service(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
