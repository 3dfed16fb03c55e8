use crate::auth::require_photographer;
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::input::required_text;
use crate::models::{NewService, NewServiceRequest, Service, ServiceChanges, ServicePatchRequest, User};
use crate::money::optional_cents;

fn check_duration(duration: Option<i32>) -> AppResult<()> {
    match duration {
        Some(minutes) if minutes <= 0 => Err(AppError::validation("duration must be positive")),
        _ => Ok(()),
    }
}

fn check_photo_count(max_photos: Option<i32>) -> AppResult<()> {
    match max_photos {
        Some(count) if count < 0 => Err(AppError::validation("maxPhotos cannot be negative")),
        _ => Ok(()),
    }
}

/// Loads a service and checks it belongs to `owner`.
pub async fn owned_service(store: &dyn Store, owner: &User, id: i64) -> AppResult<Service> {
    let service = store
        .find_service(id)
        .await?
        .ok_or_else(|| AppError::not_found("service", id))?;
    if service.photographer_id != owner.id {
        return Err(AppError::permission("You can only manage your own services"));
    }
    Ok(service)
}

pub async fn create_service(
    store: &dyn Store,
    requester: &User,
    request: NewServiceRequest,
) -> AppResult<Service> {
    require_photographer(requester)?;
    let name = required_text("name", request.name)?;
    check_duration(request.duration)?;
    check_photo_count(request.max_photos)?;
    let price = optional_cents("price", request.price)?
        .ok_or_else(|| AppError::validation("price is required"))?;

    let service = store
        .create_service(NewService {
            photographer_id: requester.id,
            name,
            description: request.description,
            price,
            duration: request.duration.unwrap_or(60),
            max_photos: request.max_photos,
            additional_photo_price: optional_cents(
                "additionalPhotoPrice",
                request.additional_photo_price,
            )?,
            active: request.active.unwrap_or(true),
        })
        .await?;
    info!("Photographer {} created service {}", requester.id, service.id);
    Ok(service)
}

pub async fn update_service(
    store: &dyn Store,
    requester: &User,
    id: i64,
    patch: ServicePatchRequest,
) -> AppResult<Service> {
    require_photographer(requester)?;
    owned_service(store, requester, id).await?;
    check_duration(patch.duration)?;
    check_photo_count(patch.max_photos)?;
    let name = match patch.name {
        Some(name) => Some(required_text("name", Some(name))?),
        None => None,
    };

    let changes = ServiceChanges {
        name,
        description: patch.description,
        price: optional_cents("price", patch.price)?,
        duration: patch.duration,
        max_photos: patch.max_photos,
        additional_photo_price: optional_cents("additionalPhotoPrice", patch.additional_photo_price)?,
        active: patch.active,
    };
    let service = store.update_service(id, changes).await?;
    info!("Photographer {} updated service {}", requester.id, id);
    Ok(service)
}

/// Sessions booked against the service keep their data and lose the link.
pub async fn delete_service(store: &dyn Store, requester: &User, id: i64) -> AppResult<()> {
    require_photographer(requester)?;
    owned_service(store, requester, id).await?;
    store.delete_service(id).await?;
    info!("Photographer {} deleted service {}", requester.id, id);
    Ok(())
}

pub async fn own_services(store: &dyn Store, requester: &User) -> AppResult<Vec<Service>> {
    require_photographer(requester)?;
    Ok(store.list_services(requester.id).await?)
}

pub async fn public_services(store: &dyn Store, photographer_id: i64) -> AppResult<Vec<Service>> {
    let services = store.list_services(photographer_id).await?;
    Ok(services.into_iter().filter(|s| s.active).collect())
}
