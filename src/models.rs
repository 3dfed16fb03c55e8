use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::input;
use crate::money::MoneyInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Photographer,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "session_status", rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Completed => "completed",
            SessionStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Canceled)
    }

    /// pending -> confirmed -> completed, and pending/confirmed -> canceled.
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Confirmed) | (Pending, Canceled) | (Confirmed, Completed) | (Confirmed, Canceled)
            )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing)]
    pub auth_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_photographer(&self) -> bool {
        self.role == Role::Photographer
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PhotographerProfile {
    pub id: i64,
    pub user_id: i64,
    pub specialties: Vec<String>,
    pub years_of_experience: Option<i32>,
    pub equipment: Option<String>,
    pub portfolio_images: Vec<String>,
    pub available_times: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub photographer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration: i32,
    pub max_photos: Option<i32>,
    pub additional_photo_price: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub photographer_id: i64,
    pub client_id: i64,
    pub service_id: Option<i64>,
    pub date: DateTime<Utc>,
    pub duration: i32,
    pub location: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub status: SessionStatus,
    pub total_price: i64,
    pub photos_included: Option<i32>,
    pub photos_delivered: Option<i32>,
    pub additional_photos: Option<i32>,
    pub additional_photo_price: Option<i64>,
    pub payment_status: PaymentStatus,
    pub amount_paid: i64,
    pub created_at: DateTime<Utc>,
}

/// Manually recorded income or expense. `amount` is always the unsigned
/// magnitude; `kind` carries the sign.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub description: String,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: TransactionType,
    pub session_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub session_id: i64,
    pub client_id: i64,
    pub photographer_id: i64,
    pub rating: i32,
    pub quality_rating: i32,
    pub professionalism_rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: i64,
    pub user_id: i64,
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArea {
    pub id: i64,
    pub user_id: i64,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub created_at: DateTime<Utc>,
}

// ── Request bodies ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<MoneyInput>,
    pub duration: Option<i32>,
    pub max_photos: Option<i32>,
    pub additional_photo_price: Option<MoneyInput>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatchRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<MoneyInput>,
    pub duration: Option<i32>,
    pub max_photos: Option<i32>,
    pub additional_photo_price: Option<MoneyInput>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "input::optional_id")]
    pub photographer_id: Option<i64>,
    #[serde(default, deserialize_with = "input::optional_id")]
    pub client_id: Option<i64>,
    #[serde(default, deserialize_with = "input::optional_id")]
    pub service_id: Option<i64>,
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub location: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub status: Option<SessionStatus>,
    pub total_price: Option<MoneyInput>,
    pub photos_included: Option<i32>,
    pub photos_delivered: Option<i32>,
    pub additional_photos: Option<i32>,
    pub additional_photo_price: Option<MoneyInput>,
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid: Option<MoneyInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatchRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "input::optional_id")]
    pub service_id: Option<i64>,
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub location: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub status: Option<SessionStatus>,
    pub total_price: Option<MoneyInput>,
    pub photos_included: Option<i32>,
    pub photos_delivered: Option<i32>,
    pub additional_photos: Option<i32>,
    pub additional_photo_price: Option<MoneyInput>,
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid: Option<MoneyInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionRequest {
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "input::optional_id")]
    pub session_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatchRequest {
    pub amount: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "input::optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "input::optional_id")]
    pub session_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReviewRequest {
    #[serde(deserialize_with = "input::id")]
    pub session_id: i64,
    pub rating: i32,
    pub quality_rating: i32,
    pub professionalism_rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolioItemRequest {
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

// ── Store records: fully resolved values, money already in cents ──

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub auth_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    pub specialties: Option<Vec<String>>,
    pub years_of_experience: Option<i32>,
    pub equipment: Option<String>,
    pub portfolio_images: Option<Vec<String>>,
    pub available_times: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub photographer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration: i32,
    pub max_photos: Option<i32>,
    pub additional_photo_price: Option<i64>,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration: Option<i32>,
    pub max_photos: Option<i32>,
    pub additional_photo_price: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub title: String,
    pub description: Option<String>,
    pub photographer_id: i64,
    pub client_id: i64,
    pub service_id: Option<i64>,
    pub date: DateTime<Utc>,
    pub duration: i32,
    pub location: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub status: SessionStatus,
    pub total_price: i64,
    pub photos_included: Option<i32>,
    pub photos_delivered: Option<i32>,
    pub additional_photos: Option<i32>,
    pub additional_photo_price: Option<i64>,
    pub payment_status: PaymentStatus,
    pub amount_paid: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SessionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub service_id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub location: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub status: Option<SessionStatus>,
    pub total_price: Option<i64>,
    pub photos_included: Option<i32>,
    pub photos_delivered: Option<i32>,
    pub additional_photos: Option<i32>,
    pub additional_photo_price: Option<i64>,
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub amount: i64,
    pub description: String,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
    pub kind: TransactionType,
    pub session_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionChanges {
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub kind: Option<TransactionType>,
    pub session_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub session_id: i64,
    pub client_id: i64,
    pub photographer_id: i64,
    pub rating: i32,
    pub quality_rating: i32,
    pub professionalism_rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPortfolioItem {
    pub user_id: i64,
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioChanges {
    pub image_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceArea {
    #[serde(skip)]
    pub user_id: i64,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAreaChanges {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
}
