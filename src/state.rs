use std::sync::Arc;

use crate::db::Store;
use crate::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, identity: Arc<dyn IdentityProvider>) -> Self {
        AppState { store, identity }
    }
}
