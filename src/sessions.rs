use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::input::{self, required_text};
use crate::models::{
    NewSession, NewSessionRequest, PaymentStatus, Role, Service, Session, SessionChanges,
    SessionPatchRequest, SessionStatus, User,
};
use crate::money::optional_cents;

const DEFAULT_DURATION_MINUTES: i32 = 60;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFilter {
    pub status: Option<SessionStatus>,
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub to: Option<DateTime<Utc>>,
}

impl SessionFilter {
    fn matches(&self, session: &Session) -> bool {
        self.status.map_or(true, |status| session.status == status)
            && self.from.map_or(true, |from| session.date >= from)
            && self.to.map_or(true, |to| session.date < to)
    }
}

fn positive_minutes(duration: Option<i32>) -> AppResult<Option<i32>> {
    match duration {
        Some(minutes) if minutes <= 0 => Err(AppError::validation("duration must be positive")),
        other => Ok(other),
    }
}

fn photo_count(field: &str, value: Option<i32>) -> AppResult<Option<i32>> {
    match value {
        Some(count) if count < 0 => Err(AppError::validation(format!("{field} cannot be negative"))),
        other => Ok(other),
    }
}

async fn find_role(store: &dyn Store, id: i64, role: Role) -> AppResult<User> {
    let entity = match role {
        Role::Photographer => "photographer",
        Role::Client => "client",
    };
    store
        .find_user(id)
        .await?
        .filter(|user| user.role == role)
        .ok_or_else(|| AppError::not_found(entity, id))
}

/// The service must exist and be offered by the session's photographer.
async fn service_for(store: &dyn Store, photographer_id: i64, service_id: i64) -> AppResult<Service> {
    let service = store
        .find_service(service_id)
        .await?
        .ok_or_else(|| AppError::not_found("service", service_id))?;
    if service.photographer_id != photographer_id {
        return Err(AppError::validation(
            "serviceId does not belong to the session's photographer",
        ));
    }
    Ok(service)
}

pub async fn create_session(
    store: &dyn Store,
    requester: &User,
    request: NewSessionRequest,
) -> AppResult<Session> {
    let (photographer_id, client_id, default_status) = match requester.role {
        Role::Client => {
            let photographer_id = request
                .photographer_id
                .ok_or_else(|| AppError::validation("photographerId is required"))?;
            let photographer = find_role(store, photographer_id, Role::Photographer).await?;
            (photographer.id, requester.id, SessionStatus::Pending)
        }
        Role::Photographer => {
            if let Some(named) = request.photographer_id {
                if named != requester.id {
                    return Err(AppError::permission(
                        "Photographers can only create sessions for themselves",
                    ));
                }
            }
            let client_id = request
                .client_id
                .ok_or_else(|| AppError::validation("clientId is required"))?;
            let client = find_role(store, client_id, Role::Client).await?;
            (requester.id, client.id, SessionStatus::Confirmed)
        }
    };

    let service = match request.service_id {
        Some(id) => Some(service_for(store, photographer_id, id).await?),
        None => None,
    };

    let title = required_text(
        "title",
        request
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| service.as_ref().map(|s| s.name.clone())),
    )?;
    let date = request
        .date
        .ok_or_else(|| AppError::validation("date is required"))?;
    let duration = positive_minutes(request.duration)?
        .or_else(|| service.as_ref().map(|s| s.duration))
        .unwrap_or(DEFAULT_DURATION_MINUTES);
    let total_price = optional_cents("totalPrice", request.total_price)?
        .or_else(|| service.as_ref().map(|s| s.price))
        .unwrap_or(0);
    let additional_photo_price = optional_cents("additionalPhotoPrice", request.additional_photo_price)?
        .or_else(|| service.as_ref().and_then(|s| s.additional_photo_price));

    let session = store
        .create_session(NewSession {
            title,
            description: request.description,
            photographer_id,
            client_id,
            service_id: service.as_ref().map(|s| s.id),
            date,
            duration,
            location: request.location,
            location_lat: request.location_lat,
            location_lng: request.location_lng,
            status: request.status.unwrap_or(default_status),
            total_price,
            photos_included: photo_count("photosIncluded", request.photos_included)?
                .or_else(|| service.as_ref().and_then(|s| s.max_photos)),
            photos_delivered: photo_count("photosDelivered", request.photos_delivered)?,
            additional_photos: photo_count("additionalPhotos", request.additional_photos)?,
            additional_photo_price,
            payment_status: request.payment_status.unwrap_or(PaymentStatus::Pending),
            amount_paid: optional_cents("amountPaid", request.amount_paid)?.unwrap_or(0),
        })
        .await?;

    info!(
        "User {} ({:?}) created session {} with status {}",
        requester.id, requester.role, session.id, session.status
    );
    Ok(session)
}

fn has_photographer_only_fields(patch: &SessionPatchRequest) -> bool {
    patch.title.is_some()
        || patch.description.is_some()
        || patch.service_id.is_some()
        || patch.date.is_some()
        || patch.duration.is_some()
        || patch.location.is_some()
        || patch.location_lat.is_some()
        || patch.location_lng.is_some()
        || patch.status.is_some()
        || patch.total_price.is_some()
        || patch.photos_included.is_some()
        || patch.photos_delivered.is_some()
        || patch.additional_photos.is_some()
        || patch.additional_photo_price.is_some()
}

fn client_changes(session: &Session, patch: SessionPatchRequest) -> AppResult<SessionChanges> {
    if has_photographer_only_fields(&patch) {
        debug!(
            "Dropping photographer-only fields from client patch on session {}",
            session.id
        );
    }
    Ok(SessionChanges {
        payment_status: patch.payment_status,
        amount_paid: optional_cents("amountPaid", patch.amount_paid)?,
        ..Default::default()
    })
}

async fn photographer_changes(
    store: &dyn Store,
    session: &Session,
    patch: SessionPatchRequest,
) -> AppResult<SessionChanges> {
    if let Some(next) = patch.status {
        if !session.status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "Cannot change session status from {} to {}",
                session.status, next
            )));
        }
    }
    if let Some(service_id) = patch.service_id {
        service_for(store, session.photographer_id, service_id).await?;
    }
    let title = match patch.title {
        Some(title) => Some(required_text("title", Some(title))?),
        None => None,
    };

    Ok(SessionChanges {
        title,
        description: patch.description,
        service_id: patch.service_id,
        date: patch.date,
        duration: positive_minutes(patch.duration)?,
        location: patch.location,
        location_lat: patch.location_lat,
        location_lng: patch.location_lng,
        status: patch.status,
        total_price: optional_cents("totalPrice", patch.total_price)?,
        photos_included: photo_count("photosIncluded", patch.photos_included)?,
        photos_delivered: photo_count("photosDelivered", patch.photos_delivered)?,
        additional_photos: photo_count("additionalPhotos", patch.additional_photos)?,
        additional_photo_price: optional_cents("additionalPhotoPrice", patch.additional_photo_price)?,
        payment_status: patch.payment_status,
        amount_paid: optional_cents("amountPaid", patch.amount_paid)?,
    })
}

async fn party_session(store: &dyn Store, requester: &User, id: i64) -> AppResult<Session> {
    let session = store
        .find_session(id)
        .await?
        .ok_or_else(|| AppError::not_found("session", id))?;
    if requester.id != session.photographer_id && requester.id != session.client_id {
        return Err(AppError::permission("You are not a party to this session"));
    }
    Ok(session)
}

/// Photographers may change every field; clients only the payment fields.
/// Anything else a client sends is ignored.
pub async fn update_session(
    store: &dyn Store,
    requester: &User,
    id: i64,
    patch: SessionPatchRequest,
) -> AppResult<Session> {
    let session = party_session(store, requester, id).await?;
    let changes = if requester.id == session.photographer_id {
        photographer_changes(store, &session, patch).await?
    } else {
        client_changes(&session, patch)?
    };

    let updated = store.update_session(id, changes).await?;
    info!("User {} updated session {}", requester.id, id);
    Ok(updated)
}

pub async fn get_session(store: &dyn Store, requester: &User, id: i64) -> AppResult<Session> {
    party_session(store, requester, id).await
}

/// Reviewed sessions are kept; linked transactions stay and lose the link.
pub async fn delete_session(store: &dyn Store, requester: &User, id: i64) -> AppResult<()> {
    let session = party_session(store, requester, id).await?;
    if requester.id != session.photographer_id {
        return Err(AppError::permission("Only the photographer can delete a session"));
    }
    if store.find_review_by_session(id).await?.is_some() {
        return Err(AppError::validation("A reviewed session cannot be deleted"));
    }
    store.delete_session(id).await?;
    info!("Photographer {} deleted session {}", requester.id, id);
    Ok(())
}

pub async fn list_sessions(
    store: &dyn Store,
    requester: &User,
    filter: &SessionFilter,
) -> AppResult<Vec<Session>> {
    let sessions = match requester.role {
        Role::Photographer => store.list_sessions_by_photographer(requester.id).await?,
        Role::Client => store.list_sessions_by_client(requester.id).await?,
    };
    Ok(sessions.into_iter().filter(|s| filter.matches(s)).collect())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewService, NewUser};
    use crate::money::{MoneyInput, MoneyUnit};

    struct Fixture {
        store: MemoryStore,
        photographer: User,
        client: User,
        outsider: User,
    }

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

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let photographer = user(&store, "p@example.com", Role::Photographer).await;
        let client = user(&store, "c@example.com", Role::Client).await;
        let outsider = user(&store, "o@example.com", Role::Client).await;
        Fixture {
            store,
            photographer,
            client,
            outsider,
        }
    }

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 3, 14, 0, 0).unwrap()
    }

    fn client_request(photographer_id: i64) -> NewSessionRequest {
        NewSessionRequest {
            title: Some("Ensaio de família".to_string()),
            photographer_id: Some(photographer_id),
            date: Some(when()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn default_status_depends_on_who_books() {
        let f = fixture().await;

        let by_client = create_session(&f.store, &f.client, client_request(f.photographer.id))
            .await
            .unwrap();
        assert_eq!(by_client.status, SessionStatus::Pending);
        assert_eq!(by_client.client_id, f.client.id);
        assert_eq!(by_client.duration, 60);

        let by_photographer = create_session(
            &f.store,
            &f.photographer,
            NewSessionRequest {
                title: Some("Casamento".to_string()),
                client_id: Some(f.client.id),
                date: Some(when()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_photographer.status, SessionStatus::Confirmed);
        assert_eq!(by_photographer.photographer_id, f.photographer.id);
    }

    #[tokio::test]
    async fn photographers_cannot_book_for_someone_else() {
        let f = fixture().await;
        let other = user(&f.store, "q@example.com", Role::Photographer).await;
        let err = create_session(
            &f.store,
            &f.photographer,
            NewSessionRequest {
                title: Some("Casamento".to_string()),
                photographer_id: Some(other.id),
                client_id: Some(f.client.id),
                date: Some(when()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Permission(_)));
    }

    #[tokio::test]
    async fn clients_must_name_a_photographer() {
        let f = fixture().await;
        let mut request = client_request(f.photographer.id);
        request.photographer_id = None;
        assert!(matches!(
            create_session(&f.store, &f.client, request).await,
            Err(AppError::Validation(_))
        ));

        assert!(matches!(
            create_session(&f.store, &f.client, client_request(f.outsider.id)).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn service_fills_missing_fields() {
        let f = fixture().await;
        let service = f
            .store
            .create_service(NewService {
                photographer_id: f.photographer.id,
                name: "Ensaio externo".to_string(),
                description: None,
                price: 15000,
                duration: 90,
                max_photos: Some(30),
                additional_photo_price: Some(1500),
                active: true,
            })
            .await
            .unwrap();

        let session = create_session(
            &f.store,
            &f.client,
            NewSessionRequest {
                photographer_id: Some(f.photographer.id),
                service_id: Some(service.id),
                date: Some(when()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(session.title, "Ensaio externo");
        assert_eq!(session.total_price, 15000);
        assert_eq!(session.duration, 90);
        assert_eq!(session.photos_included, Some(30));
        assert_eq!(session.additional_photo_price, Some(1500));
    }

    #[tokio::test]
    async fn explicit_major_units_become_cents() {
        let f = fixture().await;
        let mut request = client_request(f.photographer.id);
        request.total_price = Some(MoneyInput::Tagged {
            amount: 150.0,
            unit: MoneyUnit::Major,
        });
        let session = create_session(&f.store, &f.client, request).await.unwrap();
        assert_eq!(session.total_price, 15000);
    }

    #[tokio::test]
    async fn clients_only_touch_payment_fields() {
        let f = fixture().await;
        let session = create_session(&f.store, &f.client, client_request(f.photographer.id))
            .await
            .unwrap();

        let updated = update_session(
            &f.store,
            &f.client,
            session.id,
            SessionPatchRequest {
                title: Some("Renamed".to_string()),
                status: Some(SessionStatus::Confirmed),
                payment_status: Some(PaymentStatus::Partial),
                amount_paid: Some(MoneyInput::Bare(5000.0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.title, session.title);
        assert_eq!(updated.status, SessionStatus::Pending);
        assert_eq!(updated.payment_status, PaymentStatus::Partial);
        assert_eq!(updated.amount_paid, 5000);
    }

    #[tokio::test]
    async fn outsiders_are_rejected() {
        let f = fixture().await;
        let session = create_session(&f.store, &f.client, client_request(f.photographer.id))
            .await
            .unwrap();

        let err = update_session(&f.store, &f.outsider, session.id, SessionPatchRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Permission(_)));
        assert!(matches!(
            get_session(&f.store, &f.outsider, session.id).await,
            Err(AppError::Permission(_))
        ));
        assert!(matches!(
            update_session(&f.store, &f.client, 999, SessionPatchRequest::default()).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn status_follows_the_lifecycle() {
        let f = fixture().await;
        let session = create_session(&f.store, &f.client, client_request(f.photographer.id))
            .await
            .unwrap();
        let set = |status| SessionPatchRequest {
            status: Some(status),
            ..Default::default()
        };

        let err = update_session(&f.store, &f.photographer, session.id, set(SessionStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        for status in [SessionStatus::Confirmed, SessionStatus::Completed] {
            let updated = update_session(&f.store, &f.photographer, session.id, set(status))
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }

        let err = update_session(&f.store, &f.photographer, session.id, set(SessionStatus::Canceled))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn lists_are_scoped_and_filtered() {
        let f = fixture().await;
        create_session(&f.store, &f.client, client_request(f.photographer.id))
            .await
            .unwrap();
        let mut later = client_request(f.photographer.id);
        later.date = Some(Utc.with_ymd_and_hms(2026, 12, 20, 10, 0, 0).unwrap());
        create_session(&f.store, &f.client, later).await.unwrap();

        let everything = SessionFilter::default();
        assert_eq!(list_sessions(&f.store, &f.client, &everything).await.unwrap().len(), 2);
        assert_eq!(
            list_sessions(&f.store, &f.photographer, &everything).await.unwrap().len(),
            2
        );
        assert!(list_sessions(&f.store, &f.outsider, &everything).await.unwrap().is_empty());

        let december = SessionFilter {
            from: Some(Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(list_sessions(&f.store, &f.client, &december).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_the_photographer_deletes() {
        let f = fixture().await;
        let session = create_session(&f.store, &f.client, client_request(f.photographer.id))
            .await
            .unwrap();

        assert!(matches!(
            delete_session(&f.store, &f.client, session.id).await,
            Err(AppError::Permission(_))
        ));
        delete_session(&f.store, &f.photographer, session.id).await.unwrap();
        assert!(f.store.find_session(session.id).await.unwrap().is_none());
    }
}
