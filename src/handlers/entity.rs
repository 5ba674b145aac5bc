//! Namespace CRUD handlers: list, page, info, create, update, delete, for
//! one- and two-level namespace paths.

use crate::case;
use crate::context::RequestContext;
use crate::error::DataError;
use crate::record::{json_type_name, Record};
use crate::response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

/// Path ids bind as numbers when they parse as one, otherwise as text.
fn parse_id(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(n) => Value::Number(n.into()),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Request bodies may arrive camelCase; fold the keys to the snake_case
/// column names before they reach the composer.
fn body_record(body: Value) -> Result<Record, DataError> {
    match body {
        Value::Object(mut map) => {
            case::object_keys_to_snake_case(&mut map);
            Ok(Record::from_map(map))
        }
        other => Err(DataError::BadRequest(format!(
            "body must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    ctx: RequestContext,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let rows = state.service.list(&ns, None, &ctx).await?;
    Ok(response::success_many(rows))
}

pub async fn page(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    ctx: RequestContext,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let page = state.service.page(&ns, None, &ctx).await?;
    Ok(response::success_one_ok(page))
}

pub async fn info(
    State(state): State<AppState>,
    Path((ns, id)): Path<(String, String)>,
    ctx: RequestContext,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let row = state
        .service
        .info(&ns, None, &ctx, &parse_id(&id))
        .await?
        .ok_or(DataError::NotFound(id))?;
    Ok(response::success_one_ok(row))
}

pub async fn create(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    ctx: RequestContext,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let record = body_record(body)?;
    let id = state.service.create(&ns, None, &ctx, record).await?;
    Ok(response::success_one(id.unwrap_or(Value::Null)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    ctx: RequestContext,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let record = body_record(body)?;
    let changed = state.service.update(&ns, None, &ctx, record).await?;
    Ok(response::success_one_ok(changed))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((ns, id)): Path<(String, String)>,
    ctx: RequestContext,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let removed = state.service.delete(&ns, None, &ctx, &parse_id(&id)).await?;
    Ok(response::success_one_ok(removed))
}

pub async fn list_sub(
    State(state): State<AppState>,
    Path((ns, sub)): Path<(String, String)>,
    ctx: RequestContext,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let rows = state.service.list(&ns, Some(&sub), &ctx).await?;
    Ok(response::success_many(rows))
}

pub async fn page_sub(
    State(state): State<AppState>,
    Path((ns, sub)): Path<(String, String)>,
    ctx: RequestContext,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let page = state.service.page(&ns, Some(&sub), &ctx).await?;
    Ok(response::success_one_ok(page))
}

pub async fn info_sub(
    State(state): State<AppState>,
    Path((ns, sub, id)): Path<(String, String, String)>,
    ctx: RequestContext,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let row = state
        .service
        .info(&ns, Some(&sub), &ctx, &parse_id(&id))
        .await?
        .ok_or(DataError::NotFound(id))?;
    Ok(response::success_one_ok(row))
}

pub async fn create_sub(
    State(state): State<AppState>,
    Path((ns, sub)): Path<(String, String)>,
    ctx: RequestContext,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let record = body_record(body)?;
    let id = state.service.create(&ns, Some(&sub), &ctx, record).await?;
    Ok(response::success_one(id.unwrap_or(Value::Null)))
}

pub async fn update_sub(
    State(state): State<AppState>,
    Path((ns, sub)): Path<(String, String)>,
    ctx: RequestContext,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let record = body_record(body)?;
    let changed = state.service.update(&ns, Some(&sub), &ctx, record).await?;
    Ok(response::success_one_ok(changed))
}

pub async fn delete_sub(
    State(state): State<AppState>,
    Path((ns, sub, id)): Path<(String, String, String)>,
    ctx: RequestContext,
) -> Result<impl axum::response::IntoResponse, DataError> {
    let removed = state
        .service
        .delete(&ns, Some(&sub), &ctx, &parse_id(&id))
        .await?;
    Ok(response::success_one_ok(removed))
}
