use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

mod areas;
mod auth;
mod finance;
mod photographers;
mod portfolio;
mod reviews;
mod services;
mod sessions;
mod transactions;
mod users;

/// JSON body whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ValidQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ValidPath<T>(pub T);

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/confirm", post(auth::confirm))
        .route("/auth/resend", post(auth::resend))
        .route("/auth/me", get(auth::me))
        .route("/users/me", patch(users::update_me))
        .route("/users/{id}", get(users::get_user))
        .route("/photographers", get(photographers::search))
        .route("/photographers/me/profile", patch(photographers::update_profile))
        .route("/photographers/{id}", get(photographers::details))
        .route("/photographers/{id}/services", get(photographers::services))
        .route("/photographers/{id}/reviews", get(photographers::reviews))
        .route("/photographers/{id}/portfolio", get(photographers::portfolio))
        .route("/photographers/{id}/areas", get(photographers::areas))
        .route("/services", post(services::create).get(services::list))
        .route("/services/{id}", patch(services::update).delete(services::delete))
        .route("/sessions", post(sessions::create).get(sessions::list))
        .route(
            "/sessions/{id}",
            get(sessions::get).patch(sessions::update).delete(sessions::delete),
        )
        .route("/transactions", post(transactions::create).get(transactions::list))
        .route(
            "/transactions/{id}",
            patch(transactions::update).delete(transactions::delete),
        )
        .route("/reviews", post(reviews::create))
        .route("/portfolio", post(portfolio::create))
        .route("/portfolio/{id}", patch(portfolio::update).delete(portfolio::delete))
        .route("/service-areas", post(areas::create))
        .route("/service-areas/{id}", patch(areas::update).delete(areas::delete))
        .route("/finance/summary", get(finance::summary))
        .route("/finance/compare", get(finance::compare))
        .route("/finance/breakdown", get(finance::breakdown))
        .route("/finance/projection", get(finance::projection))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(health))
        .with_state(state)
}
