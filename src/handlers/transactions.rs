use axum::{extract::State, http::StatusCode, Json};

use super::{ValidJson, ValidPath};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::ledger;
use crate::models::{NewTransactionRequest, Transaction, TransactionPatchRequest};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Transaction>>> {
    Ok(Json(ledger::list_transactions(state.store.as_ref(), &user).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(body): ValidJson<NewTransactionRequest>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let transaction = ledger::create_transaction(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(body): ValidJson<TransactionPatchRequest>,
) -> AppResult<Json<Transaction>> {
    Ok(Json(ledger::update_transaction(state.store.as_ref(), &user, id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> AppResult<StatusCode> {
    ledger::delete_transaction(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
