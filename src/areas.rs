use crate::auth::require_photographer;
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::models::{NewServiceArea, ServiceArea, ServiceAreaChanges, User};

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Shared by create and update: the resulting area must be locatable.
fn check_area(
    city: &Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_km: Option<f64>,
) -> AppResult<()> {
    if latitude.is_some() != longitude.is_some() {
        return Err(AppError::validation("latitude and longitude must be given together"));
    }
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::validation("latitude must be between -90 and 90"));
        }
    }
    if let Some(lng) = longitude {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::validation("longitude must be between -180 and 180"));
        }
    }
    if !has_text(city) && latitude.is_none() {
        return Err(AppError::validation(
            "A service area needs a city or a latitude/longitude pair",
        ));
    }
    if let Some(radius) = radius_km {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(AppError::validation("radiusKm must be positive"));
        }
    }
    Ok(())
}

async fn owned_area(store: &dyn Store, owner: &User, id: i64) -> AppResult<ServiceArea> {
    let area = store
        .find_service_area(id)
        .await?
        .ok_or_else(|| AppError::not_found("service area", id))?;
    if area.user_id != owner.id {
        return Err(AppError::permission("You can only manage your own service areas"));
    }
    Ok(area)
}

pub async fn add_area(store: &dyn Store, requester: &User, mut area: NewServiceArea) -> AppResult<ServiceArea> {
    require_photographer(requester)?;
    check_area(&area.city, area.latitude, area.longitude, area.radius_km)?;
    area.user_id = requester.id;
    let area = store.create_service_area(area).await?;
    info!("Photographer {} added service area {}", requester.id, area.id);
    Ok(area)
}

pub async fn update_area(
    store: &dyn Store,
    requester: &User,
    id: i64,
    changes: ServiceAreaChanges,
) -> AppResult<ServiceArea> {
    let current = owned_area(store, requester, id).await?;
    let city = changes.city.clone().or(current.city);
    check_area(
        &city,
        changes.latitude.or(current.latitude),
        changes.longitude.or(current.longitude),
        changes.radius_km.or(current.radius_km),
    )?;
    let area = store.update_service_area(id, changes).await?;
    info!("Photographer {} updated service area {}", requester.id, id);
    Ok(area)
}

pub async fn delete_area(store: &dyn Store, requester: &User, id: i64) -> AppResult<()> {
    owned_area(store, requester, id).await?;
    store.delete_service_area(id).await?;
    info!("Photographer {} deleted service area {}", requester.id, id);
    Ok(())
}

pub async fn list_areas(store: &dyn Store, user_id: i64) -> AppResult<Vec<ServiceArea>> {
    Ok(store.list_service_areas(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_a_city_or_coordinates() {
        assert!(check_area(&None, None, None, None).is_err());
        assert!(check_area(&Some("  ".into()), None, None, None).is_err());
        assert!(check_area(&Some("Curitiba".into()), None, None, None).is_ok());
        assert!(check_area(&None, Some(-25.4), Some(-49.3), Some(30.0)).is_ok());
    }

    #[test]
    fn rejects_half_coordinates_and_bad_radius() {
        assert!(check_area(&None, Some(-25.4), None, None).is_err());
        assert!(check_area(&None, Some(-95.0), Some(0.0), None).is_err());
        assert!(check_area(&Some("Curitiba".into()), None, None, Some(0.0)).is_err());
        assert!(check_area(&Some("Curitiba".into()), None, None, Some(-3.0)).is_err());
    }
}
