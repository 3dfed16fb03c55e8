use crate::auth::require_photographer;
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::input::http_url;
use crate::models::{NewPortfolioItem, NewPortfolioItemRequest, PortfolioChanges, PortfolioItem, User};

async fn owned_item(store: &dyn Store, owner: &User, id: i64) -> AppResult<PortfolioItem> {
    let item = store
        .find_portfolio_item(id)
        .await?
        .ok_or_else(|| AppError::not_found("portfolio item", id))?;
    if item.user_id != owner.id {
        return Err(AppError::permission("You can only manage your own portfolio"));
    }
    Ok(item)
}

pub async fn add_item(
    store: &dyn Store,
    requester: &User,
    request: NewPortfolioItemRequest,
) -> AppResult<PortfolioItem> {
    require_photographer(requester)?;
    let item = store
        .create_portfolio_item(NewPortfolioItem {
            user_id: requester.id,
            image_url: http_url("imageUrl", &request.image_url)?,
            title: request.title,
            description: request.description,
            category: request.category,
        })
        .await?;
    info!("Photographer {} added portfolio item {}", requester.id, item.id);
    Ok(item)
}

pub async fn update_item(
    store: &dyn Store,
    requester: &User,
    id: i64,
    mut changes: PortfolioChanges,
) -> AppResult<PortfolioItem> {
    owned_item(store, requester, id).await?;
    if let Some(url) = changes.image_url.take() {
        changes.image_url = Some(http_url("imageUrl", &url)?);
    }
    let item = store.update_portfolio_item(id, changes).await?;
    info!("Photographer {} updated portfolio item {}", requester.id, id);
    Ok(item)
}

pub async fn delete_item(store: &dyn Store, requester: &User, id: i64) -> AppResult<()> {
    owned_item(store, requester, id).await?;
    store.delete_portfolio_item(id).await?;
    info!("Photographer {} deleted portfolio item {}", requester.id, id);
    Ok(())
}

pub async fn list_items(store: &dyn Store, user_id: i64) -> AppResult<Vec<PortfolioItem>> {
    Ok(store.list_portfolio(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewUser, Role};

    async fn photographer(store: &MemoryStore, email: &str) -> User {
        store
            .create_photographer(NewUser {
                email: email.to_string(),
                name: email.to_string(),
                role: Role::Photographer,
                phone: None,
                location: None,
                auth_id: None,
            })
            .await
            .unwrap()
            .0
    }

    fn item(url: &str) -> NewPortfolioItemRequest {
        NewPortfolioItemRequest {
            image_url: url.to_string(),
            title: Some("Pôr do sol".to_string()),
            description: None,
            category: Some("paisagem".to_string()),
        }
    }

    #[tokio::test]
    async fn image_urls_must_be_http() {
        let store = MemoryStore::new();
        let owner = photographer(&store, "p@example.com").await;

        assert!(add_item(&store, &owner, item("ftp://host/a.jpg")).await.is_err());
        assert!(add_item(&store, &owner, item("not a url")).await.is_err());
        let added = add_item(&store, &owner, item("https://cdn.example.com/a.jpg"))
            .await
            .unwrap();
        assert_eq!(added.image_url, "https://cdn.example.com/a.jpg");
    }

    #[tokio::test]
    async fn only_the_owner_edits() {
        let store = MemoryStore::new();
        let owner = photographer(&store, "p@example.com").await;
        let other = photographer(&store, "q@example.com").await;
        let added = add_item(&store, &owner, item("https://cdn.example.com/a.jpg"))
            .await
            .unwrap();

        assert!(matches!(
            update_item(&store, &other, added.id, PortfolioChanges::default()).await,
            Err(AppError::Permission(_))
        ));

        let updated = update_item(
            &store,
            &owner,
            added.id,
            PortfolioChanges {
                title: Some("Novo título".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title.as_deref(), Some("Novo título"));

        delete_item(&store, &owner, added.id).await.unwrap();
        assert!(list_items(&store, owner.id).await.unwrap().is_empty());
    }
}
