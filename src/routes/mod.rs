//! Router assembly.

mod common;
mod entity;

pub use common::{common_routes, common_routes_with_state};
pub use entity::entity_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Request bodies above this size are rejected before they buffer.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// The full application router: admin and namespace routes over one shared
/// state, with a request body cap.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(common_routes_with_state(state.clone()))
        .merge(entity_routes(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}
