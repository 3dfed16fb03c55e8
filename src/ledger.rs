use chrono::Utc;

use crate::auth::require_photographer;
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::input::required_text;
use crate::models::{
    NewTransaction, NewTransactionRequest, Transaction, TransactionChanges, TransactionPatchRequest,
    User,
};
use crate::money::MAX_MINOR_UNITS;

/// Stored amounts are unsigned; the transaction type says which way the money went.
fn magnitude(amount: i64) -> AppResult<i64> {
    match amount.checked_abs() {
        Some(0) => Err(AppError::validation("amount cannot be zero")),
        Some(value) if value <= MAX_MINOR_UNITS => Ok(value),
        _ => Err(AppError::validation(format!(
            "amount cannot exceed {MAX_MINOR_UNITS} cents"
        ))),
    }
}

/// A linked session must be one the requester photographs.
async fn check_session_link(store: &dyn Store, owner: &User, session_id: Option<i64>) -> AppResult<()> {
    let Some(session_id) = session_id else {
        return Ok(());
    };
    let session = store
        .find_session(session_id)
        .await?
        .ok_or_else(|| AppError::not_found("session", session_id))?;
    if session.photographer_id != owner.id {
        return Err(AppError::permission(
            "Transactions can only be linked to your own sessions",
        ));
    }
    Ok(())
}

async fn owned_transaction(store: &dyn Store, owner: &User, id: i64) -> AppResult<Transaction> {
    let transaction = store
        .find_transaction(id)
        .await?
        .ok_or_else(|| AppError::not_found("transaction", id))?;
    if transaction.user_id != owner.id {
        return Err(AppError::permission("You can only manage your own transactions"));
    }
    Ok(transaction)
}

pub async fn create_transaction(
    store: &dyn Store,
    requester: &User,
    request: NewTransactionRequest,
) -> AppResult<Transaction> {
    require_photographer(requester)?;
    let amount = magnitude(request.amount)?;
    let description = required_text("description", request.description)?;
    check_session_link(store, requester, request.session_id).await?;

    let transaction = store
        .create_transaction(NewTransaction {
            user_id: requester.id,
            amount,
            description,
            category: request.category.filter(|c| !c.trim().is_empty()),
            date: request.date.unwrap_or_else(Utc::now),
            kind: request.kind,
            session_id: request.session_id,
        })
        .await?;
    info!(
        "Photographer {} recorded {:?} transaction {} of {}",
        requester.id, transaction.kind, transaction.id, transaction.amount
    );
    Ok(transaction)
}

pub async fn update_transaction(
    store: &dyn Store,
    requester: &User,
    id: i64,
    patch: TransactionPatchRequest,
) -> AppResult<Transaction> {
    require_photographer(requester)?;
    owned_transaction(store, requester, id).await?;
    check_session_link(store, requester, patch.session_id).await?;

    let description = match patch.description {
        Some(text) => Some(required_text("description", Some(text))?),
        None => None,
    };
    let changes = TransactionChanges {
        amount: patch.amount.map(magnitude).transpose()?,
        description,
        category: patch.category,
        date: patch.date,
        kind: patch.kind,
        session_id: patch.session_id,
    };
    let transaction = store.update_transaction(id, changes).await?;
    info!("Photographer {} updated transaction {}", requester.id, id);
    Ok(transaction)
}

pub async fn delete_transaction(store: &dyn Store, requester: &User, id: i64) -> AppResult<()> {
    require_photographer(requester)?;
    owned_transaction(store, requester, id).await?;
    store.delete_transaction(id).await?;
    info!("Photographer {} deleted transaction {}", requester.id, id);
    Ok(())
}

pub async fn list_transactions(store: &dyn Store, requester: &User) -> AppResult<Vec<Transaction>> {
    require_photographer(requester)?;
    Ok(store.list_transactions(requester.id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewUser, Role, TransactionType};

    async fn user(store: &MemoryStore, email: &str, role: Role) -> User {
        let new_user = NewUser {
            email: email.to_string(),
            name: email.to_string(),
            role,
            phone: None,
            location: None,
            auth_id: None,
        };
        match role {
            Role::Photographer => store.create_photographer(new_user).await.unwrap().0,
            Role::Client => store.create_user(new_user).await.unwrap(),
        }
    }

    fn expense(amount: i64) -> NewTransactionRequest {
        NewTransactionRequest {
            amount,
            kind: TransactionType::Expense,
            description: Some("Lente 50mm".to_string()),
            category: Some("equipment".to_string()),
            date: None,
            session_id: None,
        }
    }

    #[tokio::test]
    async fn negative_expenses_are_stored_as_magnitudes() {
        let store = MemoryStore::new();
        let owner = user(&store, "p@example.com", Role::Photographer).await;

        let negative = create_transaction(&store, &owner, expense(-20000)).await.unwrap();
        let positive = create_transaction(&store, &owner, expense(20000)).await.unwrap();
        assert_eq!(negative.amount, 20000);
        assert_eq!(positive.amount, 20000);
    }

    #[tokio::test]
    async fn rejects_zero_and_missing_description() {
        let store = MemoryStore::new();
        let owner = user(&store, "p@example.com", Role::Photographer).await;

        assert!(create_transaction(&store, &owner, expense(0)).await.is_err());
        assert!(matches!(
            create_transaction(&store, &owner, expense(i64::MAX)).await,
            Err(AppError::Validation(_))
        ));
        assert!(create_transaction(&store, &owner, expense(i64::MIN)).await.is_err());
        assert!(create_transaction(&store, &owner, expense(MAX_MINOR_UNITS + 1)).await.is_err());
        assert_eq!(
            create_transaction(&store, &owner, expense(-MAX_MINOR_UNITS)).await.unwrap().amount,
            MAX_MINOR_UNITS
        );
        let mut blank = expense(100);
        blank.description = None;
        assert!(create_transaction(&store, &owner, blank).await.is_err());
    }

    #[tokio::test]
    async fn photographer_only_and_owner_only() {
        let store = MemoryStore::new();
        let owner = user(&store, "p@example.com", Role::Photographer).await;
        let other = user(&store, "q@example.com", Role::Photographer).await;
        let client = user(&store, "c@example.com", Role::Client).await;

        assert!(matches!(
            create_transaction(&store, &client, expense(100)).await,
            Err(AppError::Permission(_))
        ));
        assert!(matches!(
            list_transactions(&store, &client).await,
            Err(AppError::Permission(_))
        ));

        let transaction = create_transaction(&store, &owner, expense(100)).await.unwrap();
        assert!(matches!(
            delete_transaction(&store, &other, transaction.id).await,
            Err(AppError::Permission(_))
        ));

        let updated = update_transaction(
            &store,
            &owner,
            transaction.id,
            TransactionPatchRequest {
                amount: Some(-300),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.amount, 300);

        delete_transaction(&store, &owner, transaction.id).await.unwrap();
        assert!(list_transactions(&store, &owner).await.unwrap().is_empty());
    }
}
