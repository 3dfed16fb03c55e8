use axum::{extract::State, http::StatusCode, Json};

use super::ValidJson;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{NewReviewRequest, Review};
use crate::reviews as ratings;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(body): ValidJson<NewReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = ratings::create_review(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
