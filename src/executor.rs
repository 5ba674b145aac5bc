//! Statement execution over a MySQL pool, behind a trait so services
//! stay independent of the concrete backend.

use crate::error::DataError;
use crate::record::Record;
use crate::sql::BindValue;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;

/// Database vendor, as named in deployment configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    MariaDb,
    Oracle,
    PostgreSql,
    SqlServer,
    Db2,
    H2,
    Derby,
    Hsqldb,
}

impl Dialect {
    /// Parse a configured vendor token, e.g. `mysql` or `derby`.
    pub fn from_name(name: &str) -> Option<Dialect> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" => Some(Dialect::MySql),
            "mariadb" => Some(Dialect::MariaDb),
            "oracle" => Some(Dialect::Oracle),
            "postgresql" => Some(Dialect::PostgreSql),
            "sql_server" => Some(Dialect::SqlServer),
            "db2" => Some(Dialect::Db2),
            "h2" => Some(Dialect::H2),
            "derby" => Some(Dialect::Derby),
            "hsqldb" => Some(Dialect::Hsqldb),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dialect::MySql => "mysql",
            Dialect::MariaDb => "mariadb",
            Dialect::Oracle => "oracle",
            Dialect::PostgreSql => "postgresql",
            Dialect::SqlServer => "sql_server",
            Dialect::Db2 => "db2",
            Dialect::H2 => "h2",
            Dialect::Derby => "derby",
            Dialect::Hsqldb => "hsqldb",
        };
        f.write_str(name)
    }
}

/// Runs composed statements. Parameters arrive as JSON values and bind
/// positionally to `?` placeholders.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Vendor this executor speaks, used when rewriting pagination.
    fn dialect(&self) -> Dialect;

    /// Run a write statement, returning the affected row count.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DataError>;

    /// Run an INSERT and return the key the database generated for it.
    async fn execute_returning_key(&self, sql: &str, params: &[Value]) -> Result<i64, DataError>;

    /// Run a SELECT, decoding every row into a generic record.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DataError>;
}

/// Executor backed by an sqlx MySQL pool. MariaDB deployments use the
/// same pool with the dialect overridden.
pub struct MySqlExecutor {
    pool: MySqlPool,
    dialect: Dialect,
}

impl MySqlExecutor {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlExecutor {
            pool,
            dialect: Dialect::MySql,
        }
    }

    pub fn with_dialect(pool: MySqlPool, dialect: Dialect) -> Self {
        MySqlExecutor { pool, dialect }
    }
}

#[async_trait]
impl StatementExecutor for MySqlExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DataError> {
        tracing::debug!(sql = %sql, params = ?params, "execute");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(BindValue::from_json(p));
        }
        let done = query.execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn execute_returning_key(&self, sql: &str, params: &[Value]) -> Result<i64, DataError> {
        tracing::debug!(sql = %sql, params = ?params, "execute");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(BindValue::from_json(p));
        }
        let done = query.execute(&self.pool).await?;
        Ok(done.last_insert_id() as i64)
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DataError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(BindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }
}

fn row_to_record(row: &MySqlRow) -> Record {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Record::from_map(map)
}

fn cell_to_value(row: &MySqlRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(v) = row.try_get::<Option<i16>, _>(name) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(name) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(name) {
        if let Some(n) = v {
            return Value::Number(n.into());
        }
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = v {
            if let Some(n) = serde_json::Number::from_f64(n as f64) {
                return Value::Number(n);
            }
        }
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = v {
            if let Some(n) = serde_json::Number::from_f64(n) {
                return Value::Number(n);
            }
        }
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(name) {
        if let Some(b) = v {
            return Value::Bool(b);
        }
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        if let Some(d) = v {
            return Value::String(d.format("%Y-%m-%d %H:%M:%S").to_string());
        }
    }
    if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        if let Some(d) = v {
            return Value::String(d.format("%Y-%m-%d %H:%M:%S").to_string());
        }
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        if let Some(d) = v {
            return Value::String(d.format("%Y-%m-%d").to_string());
        }
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(name) {
        if let Some(s) = v {
            return Value::String(s);
        }
    }
    if let Ok(v) = row.try_get::<Option<serde_json::Value>, _>(name) {
        if let Some(j) = v {
            return j;
        }
    }
    Value::Null
}
