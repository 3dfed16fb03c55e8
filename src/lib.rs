#[macro_use]
extern crate log;

pub mod areas;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod finance;
pub mod handlers;
pub mod identity;
pub mod input;
pub mod ledger;
pub mod models;
pub mod money;
pub mod portfolio;
pub mod profiles;
pub mod reviews;
pub mod search;
pub mod sessions;
pub mod state;

pub use handlers::router;
pub use state::AppState;
