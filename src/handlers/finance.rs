use axum::{extract::State, Json};
use chrono::Utc;

use super::ValidQuery;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::finance::{
    self as reports, BucketSummary, CompareQuery, Comparison, FinancialSummary, ProjectionQuery,
    RangeQuery, YearProjection,
};
use crate::state::AppState;

pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(query): ValidQuery<RangeQuery>,
) -> AppResult<Json<FinancialSummary>> {
    Ok(Json(reports::summary_report(state.store.as_ref(), &user, &query).await?))
}

pub async fn compare(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(query): ValidQuery<CompareQuery>,
) -> AppResult<Json<Comparison>> {
    let comparison = reports::compare_report(state.store.as_ref(), &user, &query, Utc::now()).await?;
    Ok(Json(comparison))
}

pub async fn breakdown(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(query): ValidQuery<RangeQuery>,
) -> AppResult<Json<Vec<BucketSummary>>> {
    let buckets = reports::breakdown_report(state.store.as_ref(), &user, &query, Utc::now()).await?;
    Ok(Json(buckets))
}

pub async fn projection(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(query): ValidQuery<ProjectionQuery>,
) -> AppResult<Json<YearProjection>> {
    let projection =
        reports::projection_report(state.store.as_ref(), &user, &query, Utc::now()).await?;
    Ok(Json(projection))
}
