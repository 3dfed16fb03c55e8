use serde::Serialize;

use crate::auth::require_client;
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::models::{NewReview, NewReviewRequest, Review, SessionStatus, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub count: usize,
    pub average: f64,
    pub quality: f64,
    pub professionalism: f64,
}

impl RatingSummary {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return RatingSummary::default();
        }
        let count = reviews.len();
        let mean = |pick: fn(&Review) -> i32| {
            let total: i64 = reviews.iter().map(|r| i64::from(pick(r))).sum();
            total as f64 / count as f64
        };
        RatingSummary {
            count,
            average: mean(|r| r.rating),
            quality: mean(|r| r.quality_rating),
            professionalism: mean(|r| r.professionalism_rating),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotographerReviews {
    pub summary: RatingSummary,
    pub reviews: Vec<Review>,
}

fn check_rating(field: &str, value: i32) -> AppResult<i32> {
    if (1..=5).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::validation(format!("{field} must be between 1 and 5")))
    }
}

/// Only the session's client may review it, once, after it is completed.
pub async fn create_review(
    store: &dyn Store,
    requester: &User,
    request: NewReviewRequest,
) -> AppResult<Review> {
    require_client(requester)?;
    let session = store
        .find_session(request.session_id)
        .await?
        .ok_or_else(|| AppError::not_found("session", request.session_id))?;
    if session.client_id != requester.id {
        return Err(AppError::permission("You can only review your own sessions"));
    }
    if session.status != SessionStatus::Completed {
        return Err(AppError::validation(format!(
            "Only completed sessions can be reviewed (session is {})",
            session.status
        )));
    }

    let review = NewReview {
        session_id: session.id,
        client_id: requester.id,
        photographer_id: session.photographer_id,
        rating: check_rating("rating", request.rating)?,
        quality_rating: check_rating("qualityRating", request.quality_rating)?,
        professionalism_rating: check_rating("professionalismRating", request.professionalism_rating)?,
        comment: request.comment.filter(|c| !c.trim().is_empty()),
    };
    if store.find_review_by_session(session.id).await?.is_some() {
        return Err(AppError::validation("This session has already been reviewed"));
    }

    let review = store.create_review(review).await?;
    info!(
        "Client {} reviewed session {} (review {})",
        requester.id, session.id, review.id
    );
    Ok(review)
}

pub async fn photographer_reviews(store: &dyn Store, photographer_id: i64) -> AppResult<PhotographerReviews> {
    let reviews = store.list_reviews(photographer_id).await?;
    Ok(PhotographerReviews {
        summary: RatingSummary::from_reviews(&reviews),
        reviews,
    })
}
