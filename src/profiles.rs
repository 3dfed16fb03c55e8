use serde::Serialize;

use crate::auth::require_photographer;
use crate::catalog;
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::input::{http_url, required_text};
use crate::models::{
    PhotographerProfile, PortfolioItem, ProfileChanges, Service, ServiceArea, User, UserChanges,
};
use crate::reviews::RatingSummary;

const MAX_YEARS_OF_EXPERIENCE: i32 = 80;

/// Everything the public photographer page shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotographerDetails {
    pub user: User,
    pub profile: Option<PhotographerProfile>,
    pub services: Vec<Service>,
    pub portfolio: Vec<PortfolioItem>,
    pub service_areas: Vec<ServiceArea>,
    pub rating: RatingSummary,
}

pub async fn public_user(store: &dyn Store, id: i64) -> AppResult<User> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("user", id))
}

pub async fn find_photographer(store: &dyn Store, id: i64) -> AppResult<User> {
    store
        .find_user(id)
        .await?
        .filter(User::is_photographer)
        .ok_or_else(|| AppError::not_found("photographer", id))
}

pub async fn update_me(store: &dyn Store, requester: &User, mut changes: UserChanges) -> AppResult<User> {
    if let Some(name) = changes.name.take() {
        changes.name = Some(required_text("name", Some(name))?);
    }
    if let Some(avatar) = changes.avatar.take() {
        changes.avatar = Some(http_url("avatar", &avatar)?);
    }
    if changes.latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
        return Err(AppError::validation("latitude must be between -90 and 90"));
    }
    if changes.longitude.is_some_and(|lng| !(-180.0..=180.0).contains(&lng)) {
        return Err(AppError::validation("longitude must be between -180 and 180"));
    }

    let user = store.update_user(requester.id, changes).await?;
    info!("User {} updated their account", user.id);
    Ok(user)
}

fn clean_specialties(raw: Vec<String>) -> Vec<String> {
    let mut specialties: Vec<String> = Vec::with_capacity(raw.len());
    for specialty in raw {
        let specialty = specialty.trim();
        if !specialty.is_empty() && !specialties.iter().any(|s| s.eq_ignore_ascii_case(specialty)) {
            specialties.push(specialty.to_string());
        }
    }
    specialties
}

pub async fn update_profile(
    store: &dyn Store,
    requester: &User,
    mut changes: ProfileChanges,
) -> AppResult<PhotographerProfile> {
    require_photographer(requester)?;
    if let Some(years) = changes.years_of_experience {
        if !(0..=MAX_YEARS_OF_EXPERIENCE).contains(&years) {
            return Err(AppError::validation(format!(
                "yearsOfExperience must be between 0 and {MAX_YEARS_OF_EXPERIENCE}"
            )));
        }
    }
    changes.specialties = changes.specialties.map(clean_specialties);
    if let Some(images) = changes.portfolio_images.take() {
        let images = images
            .iter()
            .map(|url| http_url("portfolioImages", url))
            .collect::<AppResult<Vec<_>>>()?;
        changes.portfolio_images = Some(images);
    }

    let profile = store.update_profile(requester.id, changes).await?;
    info!("Photographer {} updated their profile", requester.id);
    Ok(profile)
}

pub async fn photographer_details(store: &dyn Store, id: i64) -> AppResult<PhotographerDetails> {
    let user = find_photographer(store, id).await?;
    let reviews = store.list_reviews(id).await?;
    Ok(PhotographerDetails {
        profile: store.find_profile(id).await?,
        services: catalog::public_services(store, id).await?,
        portfolio: store.list_portfolio(id).await?,
        service_areas: store.list_service_areas(id).await?,
        rating: RatingSummary::from_reviews(&reviews),
        user,
    })
}
