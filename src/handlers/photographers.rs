use axum::{extract::State, Json};

use super::{ValidJson, ValidPath, ValidQuery};
use crate::areas as service_areas;
use crate::auth::AuthUser;
use crate::catalog;
use crate::error::AppResult;
use crate::models::{PhotographerProfile, PortfolioItem, ProfileChanges, Service, ServiceArea};
use crate::portfolio as items;
use crate::profiles::{self, PhotographerDetails};
use crate::reviews::{self as ratings, PhotographerReviews};
use crate::search::{self as finder, SearchHit, SearchQuery};
use crate::state::AppState;

pub async fn search(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> AppResult<Json<Vec<SearchHit>>> {
    Ok(Json(finder::search_photographers(state.store.as_ref(), &query).await?))
}

pub async fn details(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<PhotographerDetails>> {
    Ok(Json(profiles::photographer_details(state.store.as_ref(), id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(body): ValidJson<ProfileChanges>,
) -> AppResult<Json<PhotographerProfile>> {
    Ok(Json(profiles::update_profile(state.store.as_ref(), &user, body).await?))
}

pub async fn services(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<Vec<Service>>> {
    let store = state.store.as_ref();
    profiles::find_photographer(store, id).await?;
    Ok(Json(catalog::public_services(store, id).await?))
}

pub async fn reviews(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<PhotographerReviews>> {
    let store = state.store.as_ref();
    profiles::find_photographer(store, id).await?;
    Ok(Json(ratings::photographer_reviews(store, id).await?))
}

pub async fn portfolio(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<Vec<PortfolioItem>>> {
    let store = state.store.as_ref();
    profiles::find_photographer(store, id).await?;
    Ok(Json(items::list_items(store, id).await?))
}

pub async fn areas(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<Json<Vec<ServiceArea>>> {
    let store = state.store.as_ref();
    profiles::find_photographer(store, id).await?;
    Ok(Json(service_areas::list_areas(store, id).await?))
}
