use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    NewPortfolioItem, NewReview, NewService, NewServiceArea, NewSession, NewTransaction, NewUser,
    PhotographerProfile, PortfolioChanges, PortfolioItem, ProfileChanges, Review, Service,
    ServiceArea, ServiceAreaChanges, ServiceChanges, Session, SessionChanges, Transaction,
    TransactionChanges, User, UserChanges,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field} already exists")]
    Duplicate { field: String },

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("{field} references a missing record")]
    MissingReference { field: String },

    #[error("{field} is out of range")]
    OutOfRange { field: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} has no column for field {field}")]
    UnmappedField { entity: &'static str, field: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { .. }
            | StoreError::MissingField { .. }
            | StoreError::MissingReference { .. }
            | StoreError::OutOfRange { .. } => AppError::Validation(err.to_string()),
            StoreError::NotFound { entity, id } => AppError::NotFound { entity, id },
            StoreError::Database(e) => AppError::Database(e),
            StoreError::UnmappedField { .. } | StoreError::Migration(_) => {
                AppError::Upstream(err.to_string())
            }
        }
    }
}

/// Persistence port. One implementation talks to Postgres, the other keeps
/// everything in process for tests and local runs.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// Writes the user row and its empty profile together.
    async fn create_photographer(&self, user: NewUser) -> StoreResult<(User, PhotographerProfile)>;
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User>;
    async fn list_photographers(&self) -> StoreResult<Vec<User>>;

    async fn find_profile(&self, user_id: i64) -> StoreResult<Option<PhotographerProfile>>;
    async fn update_profile(
        &self,
        user_id: i64,
        changes: ProfileChanges,
    ) -> StoreResult<PhotographerProfile>;

    async fn create_service(&self, service: NewService) -> StoreResult<Service>;
    async fn find_service(&self, id: i64) -> StoreResult<Option<Service>>;
    async fn update_service(&self, id: i64, changes: ServiceChanges) -> StoreResult<Service>;
    async fn delete_service(&self, id: i64) -> StoreResult<()>;
    async fn list_services(&self, photographer_id: i64) -> StoreResult<Vec<Service>>;

    async fn create_session(&self, session: NewSession) -> StoreResult<Session>;
    async fn find_session(&self, id: i64) -> StoreResult<Option<Session>>;
    async fn update_session(&self, id: i64, changes: SessionChanges) -> StoreResult<Session>;
    async fn delete_session(&self, id: i64) -> StoreResult<()>;
    async fn list_sessions_by_photographer(&self, photographer_id: i64) -> StoreResult<Vec<Session>>;
    async fn list_sessions_by_client(&self, client_id: i64) -> StoreResult<Vec<Session>>;

    async fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction>;
    async fn find_transaction(&self, id: i64) -> StoreResult<Option<Transaction>>;
    async fn update_transaction(
        &self,
        id: i64,
        changes: TransactionChanges,
    ) -> StoreResult<Transaction>;
    async fn delete_transaction(&self, id: i64) -> StoreResult<()>;
    async fn list_transactions(&self, user_id: i64) -> StoreResult<Vec<Transaction>>;

    async fn create_review(&self, review: NewReview) -> StoreResult<Review>;
    async fn find_review_by_session(&self, session_id: i64) -> StoreResult<Option<Review>>;
    async fn list_reviews(&self, photographer_id: i64) -> StoreResult<Vec<Review>>;

    async fn create_portfolio_item(&self, item: NewPortfolioItem) -> StoreResult<PortfolioItem>;
    async fn find_portfolio_item(&self, id: i64) -> StoreResult<Option<PortfolioItem>>;
    async fn update_portfolio_item(
        &self,
        id: i64,
        changes: PortfolioChanges,
    ) -> StoreResult<PortfolioItem>;
    async fn delete_portfolio_item(&self, id: i64) -> StoreResult<()>;
    async fn list_portfolio(&self, user_id: i64) -> StoreResult<Vec<PortfolioItem>>;

    async fn create_service_area(&self, area: NewServiceArea) -> StoreResult<ServiceArea>;
    async fn find_service_area(&self, id: i64) -> StoreResult<Option<ServiceArea>>;
    async fn update_service_area(
        &self,
        id: i64,
        changes: ServiceAreaChanges,
    ) -> StoreResult<ServiceArea>;
    async fn delete_service_area(&self, id: i64) -> StoreResult<()>;
    async fn list_service_areas(&self, user_id: i64) -> StoreResult<Vec<ServiceArea>>;
    async fn list_all_service_areas(&self) -> StoreResult<Vec<ServiceArea>>;
}

pub async fn get_db_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

/// Opens the store named by `DATABASE_URL`, running migrations for Postgres.
pub async fn open_store(config: &Config) -> StoreResult<Arc<dyn Store>> {
    if config.uses_memory_store() {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = get_db_pool(config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Connected to Postgres, migrations applied");
    Ok(Arc::new(PgStore::new(pool)))
}
