//! Per-request context: query parameters plus caller identity.

use crate::error::DataError;
use crate::sql::DEFAULT_PAGE_SIZE;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Header carrying the caller's tenant id.
pub const TENANT_ID_HEADER: &str = "X-Tenant-Id";

const PAGE_SIZE_PARAMS: [&str; 3] = ["pageSize", "rows", "limit"];
const PAGE_NO_PARAMS: [&str; 2] = ["pageNo", "page"];

/// What one call knows about its caller: the query parameters (multi-valued,
/// in name order) and the identity the transport layer established.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub params: BTreeMap<String, Vec<String>>,
    pub user_id: Option<i64>,
    pub tenant_id: Option<i64>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one query parameter value.
    pub fn add_param(&mut self, name: &str, value: &str) {
        self.params
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.add_param(name, value);
        self
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_tenant(mut self, tenant_id: i64) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// First value of a parameter, if any.
    pub fn first_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    fn int_param(&self, names: &[&str]) -> Option<i64> {
        for name in names {
            if let Some(v) = self.first_param(name) {
                if let Ok(n) = v.trim().parse::<i64>() {
                    return Some(n);
                }
            }
        }
        None
    }

    /// Offset and page size for a page query. Size comes from
    /// `pageSize`/`rows`/`limit`, the offset from a page number
    /// (`pageNo`/`page`, 1-based) or a raw `start`.
    pub fn page_bounds(&self) -> (i64, i64) {
        let limit = self.int_param(&PAGE_SIZE_PARAMS).unwrap_or(DEFAULT_PAGE_SIZE);
        let start = match self.int_param(&PAGE_NO_PARAMS) {
            Some(page_no) => ((page_no - 1) * limit).max(0),
            None => self.int_param(&["start"]).unwrap_or(0).max(0),
        };
        (start, limit)
    }

    /// Query parameters as a template variable map, first value per name.
    pub fn param_values(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (name, values) in &self.params {
            if let Some(first) = values.first() {
                out.insert(name.clone(), Value::String(first.clone()));
            }
        }
        out
    }
}

fn header_i64(headers: &HeaderMap, name: &str) -> Result<Option<i64>, DataError> {
    let raw = match headers.get(name).and_then(|v| v.to_str().ok()) {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Ok(None),
    };
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| DataError::BadRequest(format!("header {} must be an integer", name)))
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = DataError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| DataError::BadRequest(format!("bad query string: {e}")))?;
        let mut ctx = RequestContext::new();
        for (name, value) in pairs {
            ctx.params.entry(name).or_default().push(value);
        }
        ctx.user_id = header_i64(&parts.headers, USER_ID_HEADER)?;
        ctx.tenant_id = header_i64(&parts.headers, TENANT_ID_HEADER)?;
        Ok(ctx)
    }
}
