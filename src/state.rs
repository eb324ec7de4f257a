// src/state.rs

use std::sync::Arc;

use crate::repository::OrderStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub jwt_secret: String,
}
