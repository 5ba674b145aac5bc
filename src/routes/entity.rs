//! Namespace CRUD routes. Paths are parameterized; handlers resolve the
//! namespace (and optional sub-namespace) against the registry at call time.
//! The second segment doubles as an id for one-level reads and as the
//! sub-namespace for two-level operations, split by method.

use crate::handlers::entity::{
    create, create_sub, delete as delete_handler, delete_sub, info, info_sub, list, list_sub,
    page, page_sub, update, update_sub,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:ns", axum::routing::post(create).put(update))
        .route("/:ns/list", get(list))
        .route("/:ns/page", get(page))
        .route(
            "/:ns/:seg",
            get(info)
                .delete(delete_handler)
                .post(create_sub)
                .put(update_sub),
        )
        .route("/:ns/:seg/list", get(list_sub))
        .route("/:ns/:seg/page", get(page_sub))
        .route("/:ns/:seg/:id", get(info_sub).delete(delete_sub))
        .with_state(state)
}
