//! ds_common_api DDL and namespace row seeding.

use crate::config::CONFIG_TABLE;
use crate::error::DataError;
use crate::executor::StatementExecutor;
use crate::record::Record;
use crate::sql::composer;
use serde_json::Value;

/// Create the namespace configuration table if it is missing. Idempotent;
/// call before the first reload.
pub async fn ensure_config_table(executor: &dyn StatementExecutor) -> Result<(), DataError> {
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
            pid BIGINT NOT NULL DEFAULT -1,
            namespace VARCHAR(255) NOT NULL,
            name VARCHAR(255),
            `type` VARCHAR(32),
            table_name VARCHAR(255),
            table_model TEXT,
            list_order_by_date TINYINT,
            clz_name VARCHAR(255),
            `sql` TEXT,
            info_sql TEXT,
            list_sql TEXT,
            create_sql TEXT,
            update_sql TEXT,
            delete_sql TEXT,
            tenant_isolation TINYINT,
            current_user_only TINYINT,
            id_type INT,
            stat INT NOT NULL DEFAULT 0,
            create_date DATETIME
        )
        "#,
        CONFIG_TABLE
    );
    executor.execute(&ddl, &[]).await?;
    Ok(())
}

/// Replace every namespace row with the given set. Each value must be an
/// object keyed by column name. Returns the number of rows inserted; the
/// caller still has to reload for the new rows to take effect.
pub async fn replace_config_rows(
    executor: &dyn StatementExecutor,
    rows: &[Value],
) -> Result<u64, DataError> {
    executor
        .execute(&format!("DELETE FROM {}", CONFIG_TABLE), &[])
        .await?;
    let mut count = 0u64;
    for row in rows {
        let record = Record::from_value(row.clone())?;
        let q = composer::build_insert(CONFIG_TABLE, &record)?;
        executor.execute(&q.sql, &q.params).await?;
        count += 1;
    }
    Ok(count)
}
