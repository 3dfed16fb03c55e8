use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgDatabaseError, PgRow};
use sqlx::{Encode, FromRow, PgPool, Postgres, QueryBuilder, Type};

use super::{Store, StoreError, StoreResult};
use crate::fields::Entity;
use crate::models::{
    NewPortfolioItem, NewReview, NewService, NewServiceArea, NewSession, NewTransaction, NewUser,
    PhotographerProfile, PortfolioChanges, PortfolioItem, ProfileChanges, Review, Service,
    ServiceArea, ServiceAreaChanges, ServiceChanges, Session, SessionChanges, Transaction,
    TransactionChanges, User, UserChanges,
};

const INSERT_USER: &str = "INSERT INTO users (email, name, role, phone, location, auth_id)
     VALUES ($1, $2, $3, $4, $5, $6)
     RETURNING *";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Turns constraint violations into field-level errors named the way the API
/// names them.
fn classify(entity: Entity, err: sqlx::Error) -> StoreError {
    let sqlx::Error::Database(db_err) = &err else {
        return StoreError::Database(err);
    };
    let kind = db_err.kind();
    let field = db_err
        .try_downcast_ref::<PgDatabaseError>()
        .and_then(|pg| pg.column())
        .and_then(|column| entity.field(column))
        .or_else(|| {
            db_err
                .constraint()
                .and_then(|constraint| entity.field_from_constraint(constraint))
        })
        .unwrap_or(entity.name())
        .to_string();

    match kind {
        ErrorKind::UniqueViolation => StoreError::Duplicate { field },
        ErrorKind::NotNullViolation => StoreError::MissingField { field },
        ErrorKind::ForeignKeyViolation => StoreError::MissingReference { field },
        ErrorKind::CheckViolation => StoreError::OutOfRange { field },
        _ => StoreError::Database(err),
    }
}

async fn fetch_by_id<T>(pool: &PgPool, entity: Entity, id: i64) -> StoreResult<Option<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {} WHERE id = $1", entity.table());
    Ok(sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(pool).await?)
}

async fn delete_by_id(pool: &PgPool, entity: Entity, id: i64) -> StoreResult<()> {
    let sql = format!("DELETE FROM {} WHERE id = $1", entity.table());
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| classify(entity, e))?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: entity.name(),
            id,
        });
    }
    Ok(())
}

/// `UPDATE <table> SET ...` built from camelCase field names.
struct Assignments<'a> {
    entity: Entity,
    builder: QueryBuilder<'a, Postgres>,
    dirty: bool,
}

impl<'a> Assignments<'a> {
    fn new(entity: Entity) -> Self {
        let mut builder = QueryBuilder::new("UPDATE ");
        builder.push(entity.table()).push(" SET ");
        Self {
            entity,
            builder,
            dirty: false,
        }
    }

    fn column(&self, field: &str) -> StoreResult<&'static str> {
        self.entity
            .column(field)
            .ok_or_else(|| StoreError::UnmappedField {
                entity: self.entity.name(),
                field: field.to_string(),
            })
    }

    fn separator(&mut self) {
        if self.dirty {
            self.builder.push(", ");
        }
        self.dirty = true;
    }

    fn set<T>(&mut self, field: &str, value: Option<T>) -> StoreResult<&mut Self>
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            let column = self.column(field)?;
            self.separator();
            self.builder.push(column).push(" = ").push_bind(value);
        }
        Ok(self)
    }

    fn touch(&mut self, field: &str) -> StoreResult<&mut Self> {
        let column = self.column(field)?;
        self.separator();
        self.builder.push(column).push(" = now()");
        Ok(self)
    }

    async fn apply<T>(mut self, pool: &PgPool, key_field: &str, key: i64) -> StoreResult<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let entity = self.entity;
        let key_column = self.column(key_field)?;
        let row = if self.dirty {
            self.builder
                .push(" WHERE ")
                .push(key_column)
                .push(" = ")
                .push_bind(key)
                .push(" RETURNING *");
            self.builder
                .build_query_as::<T>()
                .fetch_optional(pool)
                .await
                .map_err(|e| classify(entity, e))?
        } else {
            let sql = format!("SELECT * FROM {} WHERE {} = $1", entity.table(), key_column);
            sqlx::query_as::<_, T>(&sql)
                .bind(key)
                .fetch_optional(pool)
                .await?
        };
        row.ok_or(StoreError::NotFound {
            entity: entity.name(),
            id: key,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(INSERT_USER)
            .bind(user.email)
            .bind(user.name)
            .bind(user.role)
            .bind(user.phone)
            .bind(user.location)
            .bind(user.auth_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(Entity::User, e))
    }

    async fn create_photographer(&self, user: NewUser) -> StoreResult<(User, PhotographerProfile)> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(INSERT_USER)
            .bind(user.email)
            .bind(user.name)
            .bind(user.role)
            .bind(user.phone)
            .bind(user.location)
            .bind(user.auth_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(Entity::User, e))?;

        let profile = sqlx::query_as::<_, PhotographerProfile>(
            "INSERT INTO photographer_profiles (user_id) VALUES ($1) RETURNING *",
        )
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(Entity::PhotographerProfile, e))?;

        tx.commit().await?;
        Ok((user, profile))
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        fetch_by_id(&self.pool, Entity::User, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User> {
        let mut update = Assignments::new(Entity::User);
        update
            .set("name", changes.name)?
            .set("phone", changes.phone)?
            .set("bio", changes.bio)?
            .set("location", changes.location)?
            .set("avatar", changes.avatar)?
            .set("latitude", changes.latitude)?
            .set("longitude", changes.longitude)?;
        update.apply(&self.pool, "id", id).await
    }

    async fn list_photographers(&self) -> StoreResult<Vec<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = 'photographer' ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_profile(&self, user_id: i64) -> StoreResult<Option<PhotographerProfile>> {
        Ok(sqlx::query_as::<_, PhotographerProfile>(
            "SELECT * FROM photographer_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        changes: ProfileChanges,
    ) -> StoreResult<PhotographerProfile> {
        let mut update = Assignments::new(Entity::PhotographerProfile);
        update
            .set("specialties", changes.specialties)?
            .set("yearsOfExperience", changes.years_of_experience)?
            .set("equipment", changes.equipment)?
            .set("portfolioImages", changes.portfolio_images)?
            .set("availableTimes", changes.available_times)?
            .touch("updatedAt")?;
        update.apply(&self.pool, "userId", user_id).await
    }

    async fn create_service(&self, service: NewService) -> StoreResult<Service> {
        sqlx::query_as::<_, Service>(
            "INSERT INTO services
                (photographer_id, name, description, price, duration, max_photos, additional_photo_price, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(service.photographer_id)
        .bind(service.name)
        .bind(service.description)
        .bind(service.price)
        .bind(service.duration)
        .bind(service.max_photos)
        .bind(service.additional_photo_price)
        .bind(service.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(Entity::Service, e))
    }

    async fn find_service(&self, id: i64) -> StoreResult<Option<Service>> {
        fetch_by_id(&self.pool, Entity::Service, id).await
    }

    async fn update_service(&self, id: i64, changes: ServiceChanges) -> StoreResult<Service> {
        let mut update = Assignments::new(Entity::Service);
        update
            .set("name", changes.name)?
            .set("description", changes.description)?
            .set("price", changes.price)?
            .set("duration", changes.duration)?
            .set("maxPhotos", changes.max_photos)?
            .set("additionalPhotoPrice", changes.additional_photo_price)?
            .set("active", changes.active)?;
        update.apply(&self.pool, "id", id).await
    }

    async fn delete_service(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, Entity::Service, id).await
    }

    async fn list_services(&self, photographer_id: i64) -> StoreResult<Vec<Service>> {
        Ok(sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE photographer_id = $1 ORDER BY created_at, id",
        )
        .bind(photographer_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_session(&self, session: NewSession) -> StoreResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions
                (title, description, photographer_id, client_id, service_id, date, duration,
                 location, location_lat, location_lng, status, total_price, photos_included,
                 photos_delivered, additional_photos, additional_photo_price, payment_status, amount_paid)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
             RETURNING *",
        )
        .bind(session.title)
        .bind(session.description)
        .bind(session.photographer_id)
        .bind(session.client_id)
        .bind(session.service_id)
        .bind(session.date)
        .bind(session.duration)
        .bind(session.location)
        .bind(session.location_lat)
        .bind(session.location_lng)
        .bind(session.status)
        .bind(session.total_price)
        .bind(session.photos_included)
        .bind(session.photos_delivered)
        .bind(session.additional_photos)
        .bind(session.additional_photo_price)
        .bind(session.payment_status)
        .bind(session.amount_paid)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(Entity::Session, e))
    }

    async fn find_session(&self, id: i64) -> StoreResult<Option<Session>> {
        fetch_by_id(&self.pool, Entity::Session, id).await
    }

    async fn update_session(&self, id: i64, changes: SessionChanges) -> StoreResult<Session> {
        let mut update = Assignments::new(Entity::Session);
        update
            .set("title", changes.title)?
            .set("description", changes.description)?
            .set("serviceId", changes.service_id)?
            .set("date", changes.date)?
            .set("duration", changes.duration)?
            .set("location", changes.location)?
            .set("locationLat", changes.location_lat)?
            .set("locationLng", changes.location_lng)?
            .set("status", changes.status)?
            .set("totalPrice", changes.total_price)?
            .set("photosIncluded", changes.photos_included)?
            .set("photosDelivered", changes.photos_delivered)?
            .set("additionalPhotos", changes.additional_photos)?
            .set("additionalPhotoPrice", changes.additional_photo_price)?
            .set("paymentStatus", changes.payment_status)?
            .set("amountPaid", changes.amount_paid)?;
        update.apply(&self.pool, "id", id).await
    }

    async fn delete_session(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, Entity::Session, id).await
    }

    async fn list_sessions_by_photographer(&self, photographer_id: i64) -> StoreResult<Vec<Session>> {
        Ok(sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE photographer_id = $1 ORDER BY date DESC, id DESC",
        )
        .bind(photographer_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_sessions_by_client(&self, client_id: i64) -> StoreResult<Vec<Session>> {
        Ok(sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE client_id = $1 ORDER BY date DESC, id DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        sqlx::query_as::<_, Transaction>(
            "INSERT INTO transactions (user_id, amount, description, category, date, type, session_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(transaction.user_id)
        .bind(transaction.amount)
        .bind(transaction.description)
        .bind(transaction.category)
        .bind(transaction.date)
        .bind(transaction.kind)
        .bind(transaction.session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(Entity::Transaction, e))
    }

    async fn find_transaction(&self, id: i64) -> StoreResult<Option<Transaction>> {
        fetch_by_id(&self.pool, Entity::Transaction, id).await
    }

    async fn update_transaction(
        &self,
        id: i64,
        changes: TransactionChanges,
    ) -> StoreResult<Transaction> {
        let mut update = Assignments::new(Entity::Transaction);
        update
            .set("amount", changes.amount)?
            .set("description", changes.description)?
            .set("category", changes.category)?
            .set("date", changes.date)?
            .set("type", changes.kind)?
            .set("sessionId", changes.session_id)?;
        update.apply(&self.pool, "id", id).await
    }

    async fn delete_transaction(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, Entity::Transaction, id).await
    }

    async fn list_transactions(&self, user_id: i64) -> StoreResult<Vec<Transaction>> {
        Ok(sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY date DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_review(&self, review: NewReview) -> StoreResult<Review> {
        sqlx::query_as::<_, Review>(
            "INSERT INTO reviews
                (session_id, client_id, photographer_id, rating, quality_rating, professionalism_rating, comment)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(review.session_id)
        .bind(review.client_id)
        .bind(review.photographer_id)
        .bind(review.rating)
        .bind(review.quality_rating)
        .bind(review.professionalism_rating)
        .bind(review.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(Entity::Review, e))
    }

    async fn find_review_by_session(&self, session_id: i64) -> StoreResult<Option<Review>> {
        Ok(
            sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE session_id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_reviews(&self, photographer_id: i64) -> StoreResult<Vec<Review>> {
        Ok(sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE photographer_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(photographer_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_portfolio_item(&self, item: NewPortfolioItem) -> StoreResult<PortfolioItem> {
        sqlx::query_as::<_, PortfolioItem>(
            "INSERT INTO portfolio_items (user_id, image_url, title, description, category)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(item.user_id)
        .bind(item.image_url)
        .bind(item.title)
        .bind(item.description)
        .bind(item.category)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(Entity::PortfolioItem, e))
    }

    async fn find_portfolio_item(&self, id: i64) -> StoreResult<Option<PortfolioItem>> {
        fetch_by_id(&self.pool, Entity::PortfolioItem, id).await
    }

    async fn update_portfolio_item(
        &self,
        id: i64,
        changes: PortfolioChanges,
    ) -> StoreResult<PortfolioItem> {
        let mut update = Assignments::new(Entity::PortfolioItem);
        update
            .set("imageUrl", changes.image_url)?
            .set("title", changes.title)?
            .set("description", changes.description)?
            .set("category", changes.category)?;
        update.apply(&self.pool, "id", id).await
    }

    async fn delete_portfolio_item(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, Entity::PortfolioItem, id).await
    }

    async fn list_portfolio(&self, user_id: i64) -> StoreResult<Vec<PortfolioItem>> {
        Ok(sqlx::query_as::<_, PortfolioItem>(
            "SELECT * FROM portfolio_items WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_service_area(&self, area: NewServiceArea) -> StoreResult<ServiceArea> {
        sqlx::query_as::<_, ServiceArea>(
            "INSERT INTO service_areas (user_id, city, state, country, latitude, longitude, radius_km)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(area.user_id)
        .bind(area.city)
        .bind(area.state)
        .bind(area.country)
        .bind(area.latitude)
        .bind(area.longitude)
        .bind(area.radius_km)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(Entity::ServiceArea, e))
    }

    async fn find_service_area(&self, id: i64) -> StoreResult<Option<ServiceArea>> {
        fetch_by_id(&self.pool, Entity::ServiceArea, id).await
    }

    async fn update_service_area(
        &self,
        id: i64,
        changes: ServiceAreaChanges,
    ) -> StoreResult<ServiceArea> {
        let mut update = Assignments::new(Entity::ServiceArea);
        update
            .set("city", changes.city)?
            .set("state", changes.state)?
            .set("country", changes.country)?
            .set("latitude", changes.latitude)?
            .set("longitude", changes.longitude)?
            .set("radiusKm", changes.radius_km)?;
        update.apply(&self.pool, "id", id).await
    }

    async fn delete_service_area(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, Entity::ServiceArea, id).await
    }

    async fn list_service_areas(&self, user_id: i64) -> StoreResult<Vec<ServiceArea>> {
        Ok(sqlx::query_as::<_, ServiceArea>(
            "SELECT * FROM service_areas WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_all_service_areas(&self) -> StoreResult<Vec<ServiceArea>> {
        Ok(
            sqlx::query_as::<_, ServiceArea>("SELECT * FROM service_areas ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
