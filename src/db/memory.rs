use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    NewPortfolioItem, NewReview, NewService, NewServiceArea, NewSession, NewTransaction, NewUser,
    PhotographerProfile, PortfolioChanges, PortfolioItem, ProfileChanges, Review, Role, Service,
    ServiceArea, ServiceAreaChanges, ServiceChanges, Session, SessionChanges, Transaction,
    TransactionChanges, User, UserChanges,
};

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: Vec<User>,
    profiles: Vec<PhotographerProfile>,
    services: Vec<Service>,
    sessions: Vec<Session>,
    transactions: Vec<Transaction>,
    reviews: Vec<Review>,
    portfolio: Vec<PortfolioItem>,
    areas: Vec<ServiceArea>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn require_user(&self, field: &str, id: i64) -> StoreResult<()> {
        if self.users.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference {
                field: field.to_string(),
            })
        }
    }

    fn require_session(&self, id: Option<i64>) -> StoreResult<()> {
        match id {
            Some(id) if !self.sessions.iter().any(|s| s.id == id) => {
                Err(StoreError::MissingReference {
                    field: "sessionId".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn insert_user(&mut self, user: NewUser) -> StoreResult<User> {
        if self
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate {
                field: "email".to_string(),
            });
        }
        let row = User {
            id: self.next_id(),
            email: user.email,
            name: user.name,
            role: user.role,
            phone: user.phone,
            bio: None,
            location: user.location,
            avatar: None,
            latitude: None,
            longitude: None,
            auth_id: user.auth_id,
            created_at: Utc::now(),
        };
        self.users.push(row.clone());
        Ok(row)
    }
}

fn not_found(entity: &'static str, id: i64) -> StoreError {
    StoreError::NotFound { entity, id }
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: i64, row_id: impl Fn(&T) -> i64, entity: &'static str) -> StoreResult<()> {
    let before = rows.len();
    rows.retain(|row| row_id(row) != id);
    if rows.len() == before {
        return Err(not_found(entity, id));
    }
    Ok(())
}

/// Keeps every table behind one async mutex. Enforces the same uniqueness
/// and reference rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.tables.lock().await.insert_user(user)
    }

    async fn create_photographer(&self, user: NewUser) -> StoreResult<(User, PhotographerProfile)> {
        let mut tables = self.tables.lock().await;
        let user = tables.insert_user(user)?;
        let profile = PhotographerProfile {
            id: tables.next_id(),
            user_id: user.id,
            specialties: Vec::new(),
            years_of_experience: None,
            equipment: None,
            portfolio_images: Vec::new(),
            available_times: None,
            updated_at: Utc::now(),
        };
        tables.profiles.push(profile.clone());
        Ok((user, profile))
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found("user", id))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if changes.phone.is_some() {
            user.phone = changes.phone;
        }
        if changes.bio.is_some() {
            user.bio = changes.bio;
        }
        if changes.location.is_some() {
            user.location = changes.location;
        }
        if changes.avatar.is_some() {
            user.avatar = changes.avatar;
        }
        if changes.latitude.is_some() {
            user.latitude = changes.latitude;
        }
        if changes.longitude.is_some() {
            user.longitude = changes.longitude;
        }
        Ok(user.clone())
    }

    async fn list_photographers(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut photographers: Vec<User> = tables
            .users
            .iter()
            .filter(|u| u.role == Role::Photographer)
            .cloned()
            .collect();
        photographers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(photographers)
    }

    async fn find_profile(&self, user_id: i64) -> StoreResult<Option<PhotographerProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: i64,
        changes: ProfileChanges,
    ) -> StoreResult<PhotographerProfile> {
        let mut tables = self.tables.lock().await;
        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or_else(|| not_found("photographer profile", user_id))?;
        if let Some(specialties) = changes.specialties {
            profile.specialties = specialties;
        }
        if changes.years_of_experience.is_some() {
            profile.years_of_experience = changes.years_of_experience;
        }
        if changes.equipment.is_some() {
            profile.equipment = changes.equipment;
        }
        if let Some(images) = changes.portfolio_images {
            profile.portfolio_images = images;
        }
        if changes.available_times.is_some() {
            profile.available_times = changes.available_times;
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn create_service(&self, service: NewService) -> StoreResult<Service> {
        let mut tables = self.tables.lock().await;
        tables.require_user("photographerId", service.photographer_id)?;
        let row = Service {
            id: tables.next_id(),
            photographer_id: service.photographer_id,
            name: service.name,
            description: service.description,
            price: service.price,
            duration: service.duration,
            max_photos: service.max_photos,
            additional_photo_price: service.additional_photo_price,
            active: service.active,
            created_at: Utc::now(),
        };
        tables.services.push(row.clone());
        Ok(row)
    }

    async fn find_service(&self, id: i64) -> StoreResult<Option<Service>> {
        let tables = self.tables.lock().await;
        Ok(tables.services.iter().find(|s| s.id == id).cloned())
    }

    async fn update_service(&self, id: i64, changes: ServiceChanges) -> StoreResult<Service> {
        let mut tables = self.tables.lock().await;
        let service = tables
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("service", id))?;
        if let Some(name) = changes.name {
            service.name = name;
        }
        if changes.description.is_some() {
            service.description = changes.description;
        }
        if let Some(price) = changes.price {
            service.price = price;
        }
        if let Some(duration) = changes.duration {
            service.duration = duration;
        }
        if changes.max_photos.is_some() {
            service.max_photos = changes.max_photos;
        }
        if changes.additional_photo_price.is_some() {
            service.additional_photo_price = changes.additional_photo_price;
        }
        if let Some(active) = changes.active {
            service.active = active;
        }
        Ok(service.clone())
    }

    async fn delete_service(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        remove_by_id(&mut tables.services, id, |s| s.id, "service")?;
        for session in tables.sessions.iter_mut().filter(|s| s.service_id == Some(id)) {
            session.service_id = None;
        }
        Ok(())
    }

    async fn list_services(&self, photographer_id: i64) -> StoreResult<Vec<Service>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .services
            .iter()
            .filter(|s| s.photographer_id == photographer_id)
            .cloned()
            .collect())
    }

    async fn create_session(&self, session: NewSession) -> StoreResult<Session> {
        let mut tables = self.tables.lock().await;
        tables.require_user("photographerId", session.photographer_id)?;
        tables.require_user("clientId", session.client_id)?;
        if let Some(service_id) = session.service_id {
            if !tables.services.iter().any(|s| s.id == service_id) {
                return Err(StoreError::MissingReference {
                    field: "serviceId".to_string(),
                });
            }
        }
        let row = Session {
            id: tables.next_id(),
            title: session.title,
            description: session.description,
            photographer_id: session.photographer_id,
            client_id: session.client_id,
            service_id: session.service_id,
            date: session.date,
            duration: session.duration,
            location: session.location,
            location_lat: session.location_lat,
            location_lng: session.location_lng,
            status: session.status,
            total_price: session.total_price,
            photos_included: session.photos_included,
            photos_delivered: session.photos_delivered,
            additional_photos: session.additional_photos,
            additional_photo_price: session.additional_photo_price,
            payment_status: session.payment_status,
            amount_paid: session.amount_paid,
            created_at: Utc::now(),
        };
        tables.sessions.push(row.clone());
        Ok(row)
    }

    async fn find_session(&self, id: i64) -> StoreResult<Option<Session>> {
        let tables = self.tables.lock().await;
        Ok(tables.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn update_session(&self, id: i64, changes: SessionChanges) -> StoreResult<Session> {
        let mut tables = self.tables.lock().await;
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("session", id))?;
        if let Some(title) = changes.title {
            session.title = title;
        }
        if changes.description.is_some() {
            session.description = changes.description;
        }
        if changes.service_id.is_some() {
            session.service_id = changes.service_id;
        }
        if let Some(date) = changes.date {
            session.date = date;
        }
        if let Some(duration) = changes.duration {
            session.duration = duration;
        }
        if changes.location.is_some() {
            session.location = changes.location;
        }
        if changes.location_lat.is_some() {
            session.location_lat = changes.location_lat;
        }
        if changes.location_lng.is_some() {
            session.location_lng = changes.location_lng;
        }
        if let Some(status) = changes.status {
            session.status = status;
        }
        if let Some(total_price) = changes.total_price {
            session.total_price = total_price;
        }
        if changes.photos_included.is_some() {
            session.photos_included = changes.photos_included;
        }
        if changes.photos_delivered.is_some() {
            session.photos_delivered = changes.photos_delivered;
        }
        if changes.additional_photos.is_some() {
            session.additional_photos = changes.additional_photos;
        }
        if changes.additional_photo_price.is_some() {
            session.additional_photo_price = changes.additional_photo_price;
        }
        if let Some(payment_status) = changes.payment_status {
            session.payment_status = payment_status;
        }
        if let Some(amount_paid) = changes.amount_paid {
            session.amount_paid = amount_paid;
        }
        Ok(session.clone())
    }

    async fn delete_session(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.reviews.iter().any(|r| r.session_id == id) {
            return Err(StoreError::MissingReference {
                field: "sessionId".to_string(),
            });
        }
        remove_by_id(&mut tables.sessions, id, |s| s.id, "session")?;
        for transaction in tables
            .transactions
            .iter_mut()
            .filter(|t| t.session_id == Some(id))
        {
            transaction.session_id = None;
        }
        Ok(())
    }

    async fn list_sessions_by_photographer(&self, photographer_id: i64) -> StoreResult<Vec<Session>> {
        let tables = self.tables.lock().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .iter()
            .filter(|s| s.photographer_id == photographer_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    async fn list_sessions_by_client(&self, client_id: i64) -> StoreResult<Vec<Session>> {
        let tables = self.tables.lock().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .iter()
            .filter(|s| s.client_id == client_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let mut tables = self.tables.lock().await;
        tables.require_user("userId", transaction.user_id)?;
        tables.require_session(transaction.session_id)?;
        if transaction.amount < 0 {
            return Err(StoreError::OutOfRange {
                field: "amount".to_string(),
            });
        }
        let row = Transaction {
            id: tables.next_id(),
            user_id: transaction.user_id,
            amount: transaction.amount,
            description: transaction.description,
            category: transaction.category,
            date: transaction.date,
            kind: transaction.kind,
            session_id: transaction.session_id,
            created_at: Utc::now(),
        };
        tables.transactions.push(row.clone());
        Ok(row)
    }

    async fn find_transaction(&self, id: i64) -> StoreResult<Option<Transaction>> {
        let tables = self.tables.lock().await;
        Ok(tables.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn update_transaction(
        &self,
        id: i64,
        changes: TransactionChanges,
    ) -> StoreResult<Transaction> {
        let mut tables = self.tables.lock().await;
        tables.require_session(changes.session_id)?;
        let transaction = tables
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("transaction", id))?;
        if let Some(amount) = changes.amount {
            transaction.amount = amount;
        }
        if let Some(description) = changes.description {
            transaction.description = description;
        }
        if changes.category.is_some() {
            transaction.category = changes.category;
        }
        if let Some(date) = changes.date {
            transaction.date = date;
        }
        if let Some(kind) = changes.kind {
            transaction.kind = kind;
        }
        if changes.session_id.is_some() {
            transaction.session_id = changes.session_id;
        }
        Ok(transaction.clone())
    }

    async fn delete_transaction(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        remove_by_id(&mut tables.transactions, id, |t| t.id, "transaction")
    }

    async fn list_transactions(&self, user_id: i64) -> StoreResult<Vec<Transaction>> {
        let tables = self.tables.lock().await;
        let mut transactions: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    async fn create_review(&self, review: NewReview) -> StoreResult<Review> {
        let mut tables = self.tables.lock().await;
        tables.require_session(Some(review.session_id))?;
        if tables.reviews.iter().any(|r| r.session_id == review.session_id) {
            return Err(StoreError::Duplicate {
                field: "sessionId".to_string(),
            });
        }
        let row = Review {
            id: tables.next_id(),
            session_id: review.session_id,
            client_id: review.client_id,
            photographer_id: review.photographer_id,
            rating: review.rating,
            quality_rating: review.quality_rating,
            professionalism_rating: review.professionalism_rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        tables.reviews.push(row.clone());
        Ok(row)
    }

    async fn find_review_by_session(&self, session_id: i64) -> StoreResult<Option<Review>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned())
    }

    async fn list_reviews(&self, photographer_id: i64) -> StoreResult<Vec<Review>> {
        let tables = self.tables.lock().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.photographer_id == photographer_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn create_portfolio_item(&self, item: NewPortfolioItem) -> StoreResult<PortfolioItem> {
        let mut tables = self.tables.lock().await;
        tables.require_user("userId", item.user_id)?;
        let row = PortfolioItem {
            id: tables.next_id(),
            user_id: item.user_id,
            image_url: item.image_url,
            title: item.title,
            description: item.description,
            category: item.category,
            created_at: Utc::now(),
        };
        tables.portfolio.push(row.clone());
        Ok(row)
    }

    async fn find_portfolio_item(&self, id: i64) -> StoreResult<Option<PortfolioItem>> {
        let tables = self.tables.lock().await;
        Ok(tables.portfolio.iter().find(|p| p.id == id).cloned())
    }

    async fn update_portfolio_item(
        &self,
        id: i64,
        changes: PortfolioChanges,
    ) -> StoreResult<PortfolioItem> {
        let mut tables = self.tables.lock().await;
        let item = tables
            .portfolio
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("portfolio item", id))?;
        if let Some(image_url) = changes.image_url {
            item.image_url = image_url;
        }
        if changes.title.is_some() {
            item.title = changes.title;
        }
        if changes.description.is_some() {
            item.description = changes.description;
        }
        if changes.category.is_some() {
            item.category = changes.category;
        }
        Ok(item.clone())
    }

    async fn delete_portfolio_item(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        remove_by_id(&mut tables.portfolio, id, |p| p.id, "portfolio item")
    }

    async fn list_portfolio(&self, user_id: i64) -> StoreResult<Vec<PortfolioItem>> {
        let tables = self.tables.lock().await;
        let mut items: Vec<PortfolioItem> = tables
            .portfolio
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn create_service_area(&self, area: NewServiceArea) -> StoreResult<ServiceArea> {
        let mut tables = self.tables.lock().await;
        tables.require_user("userId", area.user_id)?;
        let row = ServiceArea {
            id: tables.next_id(),
            user_id: area.user_id,
            city: area.city,
            state: area.state,
            country: area.country,
            latitude: area.latitude,
            longitude: area.longitude,
            radius_km: area.radius_km,
            created_at: Utc::now(),
        };
        tables.areas.push(row.clone());
        Ok(row)
    }

    async fn find_service_area(&self, id: i64) -> StoreResult<Option<ServiceArea>> {
        let tables = self.tables.lock().await;
        Ok(tables.areas.iter().find(|a| a.id == id).cloned())
    }

    async fn update_service_area(
        &self,
        id: i64,
        changes: ServiceAreaChanges,
    ) -> StoreResult<ServiceArea> {
        let mut tables = self.tables.lock().await;
        let area = tables
            .areas
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found("service area", id))?;
        if changes.city.is_some() {
            area.city = changes.city;
        }
        if changes.state.is_some() {
            area.state = changes.state;
        }
        if changes.country.is_some() {
            area.country = changes.country;
        }
        if changes.latitude.is_some() {
            area.latitude = changes.latitude;
        }
        if changes.longitude.is_some() {
            area.longitude = changes.longitude;
        }
        if changes.radius_km.is_some() {
            area.radius_km = changes.radius_km;
        }
        Ok(area.clone())
    }

    async fn delete_service_area(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        remove_by_id(&mut tables.areas, id, |a| a.id, "service area")
    }

    async fn list_service_areas(&self, user_id: i64) -> StoreResult<Vec<ServiceArea>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .areas
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_service_areas(&self) -> StoreResult<Vec<ServiceArea>> {
        let tables = self.tables.lock().await;
        Ok(tables.areas.clone())
    }
}
