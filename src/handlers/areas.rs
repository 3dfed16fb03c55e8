use axum::{extract::State, http::StatusCode, Json};

use super::{ValidJson, ValidPath};
use crate::areas as service_areas;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{NewServiceArea, ServiceArea, ServiceAreaChanges};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(body): ValidJson<NewServiceArea>,
) -> AppResult<(StatusCode, Json<ServiceArea>)> {
    let area = service_areas::add_area(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(area)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(body): ValidJson<ServiceAreaChanges>,
) -> AppResult<Json<ServiceArea>> {
    Ok(Json(service_areas::update_area(state.store.as_ref(), &user, id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<StatusCode> {
    service_areas::delete_area(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
