//! The five canonical operations for one namespace: policy predicates and
//! statement composition over the generic record model.

use crate::config::{NamespaceConfig, NamespaceKind};
use crate::context::RequestContext;
use crate::convert;
use crate::error::DataError;
use crate::executor::StatementExecutor;
use crate::hooks::LifecycleHooks;
use crate::ident::{IdAllocator, IdStrategy};
use crate::record::Record;
use crate::sql::{self, composer, template, where_clause, Page};
use serde_json::Value;

/// Always-true predicate every derived statement carries; policy clauses
/// splice in right after it.
const DUMMY: &str = "1=1";

/// One namespace's operations, bound to the shared executor, allocator,
/// and hooks for the duration of a call.
pub struct CrudTemplate<'a> {
    config: &'a NamespaceConfig,
    executor: &'a dyn StatementExecutor,
    ids: &'a IdAllocator,
    hooks: &'a LifecycleHooks,
}

impl<'a> CrudTemplate<'a> {
    pub fn new(
        config: &'a NamespaceConfig,
        executor: &'a dyn StatementExecutor,
        ids: &'a IdAllocator,
        hooks: &'a LifecycleHooks,
    ) -> Self {
        CrudTemplate {
            config,
            executor,
            ids,
            hooks,
        }
    }

    /// Fetch one record by id. Soft-deleted rows are not filtered here;
    /// a direct lookup may still see them.
    pub async fn info(&self, ctx: &RequestContext, id: &Value) -> Result<Option<Record>, DataError> {
        let (sql, params) = self.info_statement(ctx, id)?;
        let rows = self.executor.query(&sql, &params).await?;
        Ok(rows.into_iter().next())
    }

    /// Fetch every visible record, with caller filters applied.
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Record>, DataError> {
        let sql = self.list_statement(ctx)?;
        self.executor.query(&sql, &[]).await
    }

    /// One page of records. The count runs first; a zero total short-circuits
    /// without issuing the row query.
    pub async fn page(&self, ctx: &RequestContext) -> Result<Page<Record>, DataError> {
        let sql = self.list_statement(ctx)?;
        let (start, limit) = ctx.page_bounds();
        let (count_sql, page_sql) =
            sql::page::rewrite(&sql, start, limit, self.executor.dialect())?;

        let count_rows = self.executor.query(&count_sql, &[]).await?;
        let total = count_rows.first().and_then(convert::first_cell_i64).unwrap_or(0);
        if total <= 0 {
            return Ok(Page::empty(start, limit));
        }

        let rows = self.executor.query(&page_sql, &[]).await?;
        Ok(Page::new(rows, total, start, limit))
    }

    /// Insert a record and report its id: the allocated value for
    /// distributed/random strategies, the database key for auto-increment.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        mut record: Record,
    ) -> Result<Option<Value>, DataError> {
        if let Some(text) = self.configured_sql(self.config.create_sql.as_deref()) {
            self.hooks.run_before_create(&mut record)?;
            let sql = template::render(text, record.inner())?;
            let key = self.executor.execute_returning_key(&sql, &[]).await?;
            return Ok(Some(Value::from(key)));
        }

        let table = self.table()?;
        let d = &self.config.descriptor;

        let allocated = self.ids.next(self.config.id_strategy)?;
        if let Some(id) = &allocated {
            record.insert(&d.id_field, id.clone());
        }

        self.hooks.run_before_create(&mut record)?;

        if self.config.tenant_isolation {
            let tenant = self.required_tenant(ctx)?;
            record.insert(&d.tenant_id_field, Value::from(tenant));
        }
        if self.config.current_user_only {
            let user = self.required_user(ctx)?;
            record.insert(&d.user_id_field, Value::from(user));
        }

        let q = composer::build_insert(table, &record)?;
        match self.config.id_strategy {
            IdStrategy::AutoIncrement => {
                let key = self.executor.execute_returning_key(&q.sql, &q.params).await?;
                Ok(Some(Value::from(key)))
            }
            _ => {
                self.executor.execute(&q.sql, &q.params).await?;
                Ok(allocated)
            }
        }
    }

    /// Update a record by its id field. On an ownership-scoped namespace the
    /// record must first be readable by the caller, or nothing is written.
    pub async fn update(&self, ctx: &RequestContext, mut record: Record) -> Result<bool, DataError> {
        if let Some(text) = self.configured_sql(self.config.update_sql.as_deref()) {
            self.hooks.run_before_update(&mut record)?;
            let sql = template::render(text, record.inner())?;
            return Ok(self.executor.execute(&sql, &[]).await? > 0);
        }

        let table = self.table()?;
        let d = &self.config.descriptor;
        let id = record
            .get(&d.id_field)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| {
                DataError::Validation(format!("field '{}' is required", d.id_field))
            })?;

        if self.config.current_user_only && self.info(ctx, &id).await?.is_none() {
            return Err(DataError::Forbidden(format!(
                "record {} is not visible to the caller",
                id
            )));
        }

        self.hooks.run_before_update(&mut record)?;
        let q = composer::build_update(table, &record, &d.id_field, &id)?;
        Ok(self.executor.execute(&q.sql, &q.params).await? > 0)
    }

    /// Delete by id; a namespace with a soft-delete column marks the row
    /// instead of removing it. Reports whether a row was affected.
    pub async fn delete(&self, ctx: &RequestContext, id: &Value) -> Result<bool, DataError> {
        let d = &self.config.descriptor;

        if let Some(text) = self.configured_sql(self.config.delete_sql.as_deref()) {
            let sql = self
                .hooks
                .run_before_delete(d.has_is_deleted, text.to_string());
            let sql = template::render(&sql, &ctx.param_values())?;
            return Ok(self.executor.execute(&sql, &[id.clone()]).await? > 0);
        }

        let table = self.table()?;
        let mut sql = if d.has_is_deleted {
            format!("UPDATE {} SET {} = 1", table, d.del_field)
        } else {
            format!("DELETE FROM {}", table)
        };
        sql.push_str(&format!(" WHERE {} AND {} = ?", DUMMY, d.id_field));
        sql = self.apply_ownership(sql, ctx)?;
        let sql = self.hooks.run_before_delete(d.has_is_deleted, sql);
        Ok(self.executor.execute(&sql, &[id.clone()]).await? > 0)
    }

    /// The statement configured for an operation: an explicit-statement
    /// namespace always uses its one `sql`, a generic namespace its per-op
    /// column. Blank text means not configured.
    fn configured_sql(&self, per_op: Option<&'a str>) -> Option<&'a str> {
        let text = match self.config.kind {
            NamespaceKind::Single => self.config.sql.as_deref(),
            NamespaceKind::Crud => per_op,
        };
        text.filter(|s| !s.trim().is_empty())
    }

    fn table(&self) -> Result<&str, DataError> {
        self.config
            .table_name
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                DataError::Validation(format!(
                    "namespace '{}' has no table name",
                    self.config.namespace
                ))
            })
    }

    fn required_user(&self, ctx: &RequestContext) -> Result<i64, DataError> {
        ctx.user_id
            .ok_or_else(|| DataError::Forbidden("current user required".into()))
    }

    fn required_tenant(&self, ctx: &RequestContext) -> Result<i64, DataError> {
        ctx.tenant_id
            .ok_or_else(|| DataError::Forbidden("tenant id required".into()))
    }

    fn info_statement(
        &self,
        ctx: &RequestContext,
        id: &Value,
    ) -> Result<(String, Vec<Value>), DataError> {
        let mut sql = match self.configured_sql(self.config.info_sql.as_deref()) {
            Some(text) => template::render(text, &ctx.param_values())?,
            None => format!(
                "SELECT * FROM {} WHERE {} AND {} = ?",
                self.table()?,
                DUMMY,
                self.config.descriptor.id_field
            ),
        };
        sql = self.apply_ownership(sql, ctx)?;
        sql = self.apply_tenant(sql, ctx)?;
        Ok((sql, vec![id.clone()]))
    }

    fn list_statement(&self, ctx: &RequestContext) -> Result<String, DataError> {
        let d = &self.config.descriptor;
        let mut sql = match self.configured_sql(self.config.list_sql.as_deref()) {
            Some(text) => template::render(text, &ctx.param_values())?,
            None => {
                let table = self.table()?;
                if self.config.list_order_by_date {
                    format!(
                        "SELECT * FROM {} WHERE {} ORDER BY {} DESC",
                        table, DUMMY, d.create_date_field
                    )
                } else {
                    format!("SELECT * FROM {} WHERE {}", table, DUMMY)
                }
            }
        };

        if d.has_is_deleted {
            sql = splice(&sql, &format!(" AND {} != 1", d.del_field));
        }
        sql = self.apply_ownership(sql, ctx)?;
        sql = self.apply_tenant(sql, ctx)?;
        sql = splice(&sql, &where_clause::compile(&ctx.params));
        Ok(sql)
    }

    fn apply_ownership(&self, sql: String, ctx: &RequestContext) -> Result<String, DataError> {
        if !self.config.current_user_only {
            return Ok(sql);
        }
        let addition = format!(
            " AND {} = {}",
            self.config.descriptor.user_id_field,
            self.required_user(ctx)?
        );
        Ok(splice_or_append(&sql, &addition))
    }

    fn apply_tenant(&self, sql: String, ctx: &RequestContext) -> Result<String, DataError> {
        if !self.config.tenant_isolation {
            return Ok(sql);
        }
        let addition = format!(
            " AND {} = {}",
            self.config.descriptor.tenant_id_field,
            self.required_tenant(ctx)?
        );
        Ok(splice_or_append(&sql, &addition))
    }
}

/// Insert right after the first always-true predicate; a statement without
/// one is left alone.
fn splice(sql: &str, addition: &str) -> String {
    if addition.is_empty() {
        return sql.to_string();
    }
    sql.replacen(DUMMY, &format!("{}{}", DUMMY, addition), 1)
}

/// Like `splice`, but a statement without the predicate gets the clause
/// appended at the end.
fn splice_or_append(sql: &str, addition: &str) -> String {
    if sql.contains(DUMMY) {
        splice(sql, addition)
    } else {
        format!("{}{}", sql, addition)
    }
}
