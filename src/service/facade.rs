//! DataService: the shared entry point owning the executor, the reloadable
//! namespace registry, and the identifier allocator.

use crate::binding::{BindingRegistry, TableBinding};
use crate::config::{loader, NamespaceRegistry};
use crate::context::RequestContext;
use crate::convert;
use crate::error::{ConfigError, DataError};
use crate::executor::StatementExecutor;
use crate::hooks::LifecycleHooks;
use crate::ident::IdAllocator;
use crate::record::Record;
use crate::service::crud::CrudTemplate;
use crate::sql::{self, composer, Page};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// One service instance per process. Namespace operations resolve their
/// configuration against the registry snapshot current at call time; a
/// reload swaps the snapshot in whole.
pub struct DataService {
    executor: Arc<dyn StatementExecutor>,
    registry: RwLock<Arc<NamespaceRegistry>>,
    reload_gate: tokio::sync::Mutex<()>,
    ids: IdAllocator,
    hooks: LifecycleHooks,
    bindings: BindingRegistry,
}

/// Assembles a [`DataService`]. Only the executor is mandatory; the worker
/// id defaults to 0 and hooks and bindings default to empty.
pub struct DataServiceBuilder {
    executor: Arc<dyn StatementExecutor>,
    worker_id: i64,
    hooks: LifecycleHooks,
    bindings: BindingRegistry,
}

impl DataServiceBuilder {
    /// Snowflake worker id for distributed key allocation. Must be unique
    /// per process across the deployment.
    pub fn worker_id(mut self, worker_id: i64) -> Self {
        self.worker_id = worker_id;
        self
    }

    pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn bindings(mut self, bindings: BindingRegistry) -> Self {
        self.bindings = bindings;
        self
    }

    /// Build the service with an empty registry; call
    /// [`DataService::reload_config`] to load namespaces.
    pub fn build(self) -> Result<DataService, ConfigError> {
        Ok(DataService {
            executor: self.executor,
            registry: RwLock::new(Arc::new(NamespaceRegistry::unloaded())),
            reload_gate: tokio::sync::Mutex::new(()),
            ids: IdAllocator::new(self.worker_id)?,
            hooks: self.hooks,
            bindings: self.bindings,
        })
    }
}

impl DataService {
    pub fn builder(executor: Arc<dyn StatementExecutor>) -> DataServiceBuilder {
        DataServiceBuilder {
            executor,
            worker_id: 0,
            hooks: LifecycleHooks::new(),
            bindings: BindingRegistry::new(),
        }
    }

    /// Service with all defaults; shorthand for `builder(executor).build()`.
    pub fn new(executor: Arc<dyn StatementExecutor>) -> Result<Self, ConfigError> {
        Self::builder(executor).build()
    }

    fn current_registry(&self) -> Result<Arc<NamespaceRegistry>, DataError> {
        let guard = self
            .registry
            .read()
            .map_err(|_| ConfigError::Load("registry lock poisoned".into()))?;
        Ok(Arc::clone(&guard))
    }

    /// Reload namespace configuration from the database and swap it in.
    /// Concurrent reloads are rejected rather than queued; a failed load
    /// leaves the previous registry serving.
    pub async fn reload_config(&self) -> Result<bool, DataError> {
        let _gate = self
            .reload_gate
            .try_lock()
            .map_err(|_| ConfigError::ReloadInProgress)?;
        let fresh = loader::load_registry(self.executor.as_ref()).await?;
        let mut guard = self
            .registry
            .write()
            .map_err(|_| ConfigError::Load("registry lock poisoned".into()))?;
        *guard = Arc::new(fresh);
        Ok(true)
    }

    /// Top-level namespace names in the current registry, sorted.
    pub fn namespaces(&self) -> Result<Vec<String>, DataError> {
        let registry = self.current_registry()?;
        let mut names: Vec<String> = registry.namespaces().map(str::to_string).collect();
        names.sort();
        Ok(names)
    }

    pub async fn info(
        &self,
        namespace: &str,
        sub: Option<&str>,
        ctx: &RequestContext,
        id: &Value,
    ) -> Result<Option<Record>, DataError> {
        let registry = self.current_registry()?;
        let config = registry.resolve(namespace, sub)?;
        self.template(config).info(ctx, id).await
    }

    pub async fn list(
        &self,
        namespace: &str,
        sub: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<Vec<Record>, DataError> {
        let registry = self.current_registry()?;
        let config = registry.resolve(namespace, sub)?;
        self.template(config).list(ctx).await
    }

    pub async fn page(
        &self,
        namespace: &str,
        sub: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<Page<Record>, DataError> {
        let registry = self.current_registry()?;
        let config = registry.resolve(namespace, sub)?;
        self.template(config).page(ctx).await
    }

    pub async fn create(
        &self,
        namespace: &str,
        sub: Option<&str>,
        ctx: &RequestContext,
        record: Record,
    ) -> Result<Option<Value>, DataError> {
        let registry = self.current_registry()?;
        let config = registry.resolve(namespace, sub)?;
        self.template(config).create(ctx, record).await
    }

    pub async fn update(
        &self,
        namespace: &str,
        sub: Option<&str>,
        ctx: &RequestContext,
        record: Record,
    ) -> Result<bool, DataError> {
        let registry = self.current_registry()?;
        let config = registry.resolve(namespace, sub)?;
        self.template(config).update(ctx, record).await
    }

    pub async fn delete(
        &self,
        namespace: &str,
        sub: Option<&str>,
        ctx: &RequestContext,
        id: &Value,
    ) -> Result<bool, DataError> {
        let registry = self.current_registry()?;
        let config = registry.resolve(namespace, sub)?;
        self.template(config).delete(ctx, id).await
    }

    fn template<'a>(&'a self, config: &'a crate::config::NamespaceConfig) -> CrudTemplate<'a> {
        CrudTemplate::new(config, self.executor.as_ref(), &self.ids, &self.hooks)
    }

    /// Run an ad-hoc query and return every row.
    pub async fn query_list(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DataError> {
        self.executor.query(sql, params).await
    }

    /// Run an ad-hoc query and return the first row, if any.
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Record>, DataError> {
        let mut rows = self.executor.query(sql, params).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Paginate an ad-hoc query with bounds taken from the request context.
    /// The count statement runs first; a zero total skips the row fetch
    /// entirely.
    pub async fn query_page(
        &self,
        ctx: &RequestContext,
        sql: &str,
        params: &[Value],
    ) -> Result<Page<Record>, DataError> {
        let (start, limit) = ctx.page_bounds();
        let (count_sql, page_sql) = sql::page::rewrite(sql, start, limit, self.executor.dialect())?;
        let count_rows = self.executor.query(&count_sql, params).await?;
        let total = count_rows.first().and_then(convert::first_cell_i64).unwrap_or(0);
        if total <= 0 {
            return Ok(Page::empty(start, limit));
        }
        let rows = self.executor.query(&page_sql, params).await?;
        Ok(Page::new(rows, total, start, limit))
    }

    /// Insert a typed entity through its registered binding. Returns the
    /// generated key when the binding echoes it.
    pub async fn create_typed<T: Serialize>(
        &self,
        binding: &str,
        entity: &T,
    ) -> Result<Option<Value>, DataError> {
        let binding = self.binding(binding)?;
        let record = Record::from_typed(entity)?;
        let q = composer::build_insert(&binding.table_name, &record)?;
        if binding.echo_id {
            let key = self.executor.execute_returning_key(&q.sql, &q.params).await?;
            Ok(Some(Value::from(key)))
        } else {
            self.executor.execute(&q.sql, &q.params).await?;
            Ok(None)
        }
    }

    /// Update a typed entity by its id field through its registered binding.
    pub async fn update_typed<T: Serialize>(
        &self,
        binding: &str,
        entity: &T,
    ) -> Result<bool, DataError> {
        let binding = self.binding(binding)?;
        let record = Record::from_typed(entity)?;
        let id = record
            .get(&binding.id_field)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| {
                DataError::Validation(format!("field '{}' is required", binding.id_field))
            })?;
        let q = composer::build_update(&binding.table_name, &record, &binding.id_field, &id)?;
        Ok(self.executor.execute(&q.sql, &q.params).await? > 0)
    }

    fn binding(&self, name: &str) -> Result<&TableBinding, DataError> {
        self.bindings
            .get(name)
            .ok_or_else(|| DataError::Validation(format!("unknown binding '{name}'")))
    }
}
