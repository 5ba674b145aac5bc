//! Admin handlers: configuration reload and namespace introspection.

use crate::error::DataError;
use crate::response;
use crate::state::AppState;
use axum::extract::State;

pub async fn reload_config(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let reloaded = state.service.reload_config().await?;
    Ok(response::success_one_ok(reloaded))
}

pub async fn namespaces(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let names = state.service.namespaces()?;
    Ok(response::success_many(names))
}
