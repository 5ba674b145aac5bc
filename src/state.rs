//! Shared application state for all routes.

use crate::service::DataService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// The registry inside is reloadable, so one service serves the whole
    /// process lifetime.
    pub service: Arc<DataService>,
}

impl AppState {
    pub fn new(service: Arc<DataService>) -> Self {
        AppState { service }
    }
}
