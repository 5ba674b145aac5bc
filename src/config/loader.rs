//! Load namespace configuration rows and build the registry.

use crate::config::registry::NamespaceRegistry;
use crate::config::types::{NamespaceRow, CONFIG_TABLE, STATUS_DELETED};
use crate::error::{ConfigError, DataError};
use crate::executor::StatementExecutor;

/// Read every live config row and link the registry from it. The returned
/// registry replaces the current one only on success.
pub async fn load_registry(
    executor: &dyn StatementExecutor,
) -> Result<NamespaceRegistry, DataError> {
    let sql = format!(
        "SELECT * FROM {} WHERE stat != {}",
        CONFIG_TABLE, STATUS_DELETED
    );
    let records = executor.query(&sql, &[]).await?;

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let row: NamespaceRow = serde_json::from_value(record.into_value())
            .map_err(|e| ConfigError::Load(format!("bad config row: {e}")))?;
        rows.push(row);
    }

    if rows.is_empty() {
        tracing::warn!("no namespace configuration rows");
    }

    let registry = NamespaceRegistry::from_rows(rows)?;
    tracing::info!(namespaces = registry.len(), "namespace configuration loaded");
    Ok(registry)
}
