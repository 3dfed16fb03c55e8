use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::models::{PhotographerProfile, ServiceArea, User};
use crate::reviews::RatingSummary;

const EARTH_RADIUS_KM: f64 = 6371.0;
const DEFAULT_AREA_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub user: User,
    pub specialties: Vec<String>,
    pub rating: RatingSummary,
}

pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

struct Candidate<'a> {
    user: &'a User,
    profile: Option<&'a PhotographerProfile>,
    areas: &'a [&'a ServiceArea],
}

impl SearchQuery {
    fn point(&self) -> AppResult<Option<(f64, f64)>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Ok(Some((lat, lng))),
            (None, None) => Ok(None),
            _ => Err(AppError::validation("lat and lng must be given together")),
        }
    }

    fn matches(&self, candidate: &Candidate<'_>, point: Option<(f64, f64)>) -> bool {
        let user = candidate.user;
        if let Some(q) = normalized(&self.q) {
            if !contains_ci(Some(&user.name), &q) && !contains_ci(user.bio.as_deref(), &q) {
                return false;
            }
        }

        if let Some(specialty) = normalized(&self.specialty) {
            let offered = candidate
                .profile
                .is_some_and(|p| p.specialties.iter().any(|s| s.to_lowercase().contains(&specialty)));
            if !offered {
                return false;
            }
        }

        if let Some(city) = normalized(&self.city) {
            let served = contains_ci(user.location.as_deref(), &city)
                || candidate
                    .areas
                    .iter()
                    .any(|a| contains_ci(a.city.as_deref(), &city));
            if !served {
                return false;
            }
        }

        if let Some(state) = normalized(&self.state) {
            let served = contains_ci(user.location.as_deref(), &state)
                || candidate
                    .areas
                    .iter()
                    .any(|a| contains_ci(a.state.as_deref(), &state));
            if !served {
                return false;
            }
        }

        if let Some((lat, lng)) = point {
            let in_area = candidate.areas.iter().any(|a| match (a.latitude, a.longitude) {
                (Some(a_lat), Some(a_lng)) => {
                    haversine_km(lat, lng, a_lat, a_lng)
                        <= a.radius_km.unwrap_or(DEFAULT_AREA_RADIUS_KM)
                }
                _ => false,
            });
            let near_home = match (user.latitude, user.longitude) {
                (Some(u_lat), Some(u_lng)) => {
                    haversine_km(lat, lng, u_lat, u_lng)
                        <= self.radius_km.unwrap_or(DEFAULT_AREA_RADIUS_KM)
                }
                _ => false,
            };
            if !in_area && !near_home {
                return false;
            }
        }

        true
    }
}

pub async fn search_photographers(store: &dyn Store, query: &SearchQuery) -> AppResult<Vec<SearchHit>> {
    let point = query.point()?;
    if query.radius_km.is_some_and(|r| !(r.is_finite() && r > 0.0)) {
        return Err(AppError::validation("radiusKm must be positive"));
    }

    let photographers = store.list_photographers().await?;
    let all_areas = store.list_all_service_areas().await?;
    let mut areas_by_user: HashMap<i64, Vec<&ServiceArea>> = HashMap::new();
    for area in &all_areas {
        areas_by_user.entry(area.user_id).or_default().push(area);
    }

    let mut hits = Vec::new();
    for user in &photographers {
        let profile = store.find_profile(user.id).await?;
        let areas = areas_by_user.get(&user.id).map(Vec::as_slice).unwrap_or_default();
        let candidate = Candidate {
            user,
            profile: profile.as_ref(),
            areas,
        };
        if !query.matches(&candidate, point) {
            continue;
        }
        let reviews = store.list_reviews(user.id).await?;
        hits.push(SearchHit {
            user: user.clone(),
            specialties: profile.map(|p| p.specialties).unwrap_or_default(),
            rating: RatingSummary::from_reviews(&reviews),
        });
    }

    hits.sort_by(|a, b| {
        b.rating
            .average
            .total_cmp(&a.rating.average)
            .then_with(|| a.user.name.to_lowercase().cmp(&b.user.name.to_lowercase()))
    });
    Ok(hits)
}
