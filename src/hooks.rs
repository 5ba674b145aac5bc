//! Lifecycle callbacks invoked around write operations.

use crate::error::DataError;
use crate::record::Record;
use std::sync::Arc;

/// Runs before an insert or update composes its statement; typically fills
/// audit fields. An error here suppresses the write.
pub type RecordHook = Arc<dyn Fn(&mut Record) -> Result<(), DataError> + Send + Sync>;

/// Runs before a delete executes. Receives the soft-delete flag and the
/// composed statement, and may return a rewritten statement.
pub type DeleteHook = Arc<dyn Fn(bool, &str) -> String + Send + Sync>;

#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub before_create: Option<RecordHook>,
    pub before_update: Option<RecordHook>,
    pub before_delete: Option<DeleteHook>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Record) -> Result<(), DataError> + Send + Sync + 'static,
    {
        self.before_create = Some(Arc::new(f));
        self
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Record) -> Result<(), DataError> + Send + Sync + 'static,
    {
        self.before_update = Some(Arc::new(f));
        self
    }

    pub fn on_delete<F>(mut self, f: F) -> Self
    where
        F: Fn(bool, &str) -> String + Send + Sync + 'static,
    {
        self.before_delete = Some(Arc::new(f));
        self
    }

    pub(crate) fn run_before_create(&self, record: &mut Record) -> Result<(), DataError> {
        match &self.before_create {
            Some(hook) => hook(record),
            None => Ok(()),
        }
    }

    pub(crate) fn run_before_update(&self, record: &mut Record) -> Result<(), DataError> {
        match &self.before_update {
            Some(hook) => hook(record),
            None => Ok(()),
        }
    }

    pub(crate) fn run_before_delete(&self, soft_delete: bool, sql: String) -> String {
        match &self.before_delete {
            Some(hook) => hook(soft_delete, &sql),
            None => sql,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_hook_can_fill_audit_fields() {
        let hooks = LifecycleHooks::new().on_create(|r| {
            r.insert("create_date", json!("2024-01-01 00:00:00"));
            Ok(())
        });
        let mut record = Record::new();
        hooks.run_before_create(&mut record).unwrap();
        assert_eq!(record.get("create_date"), Some(&json!("2024-01-01 00:00:00")));
    }

    #[test]
    fn a_failing_hook_propagates() {
        let hooks = LifecycleHooks::new()
            .on_update(|_| Err(DataError::Validation("rejected".into())));
        let mut record = Record::new();
        assert!(hooks.run_before_update(&mut record).is_err());
    }

    #[test]
    fn delete_hook_may_rewrite_the_statement() {
        let hooks = LifecycleHooks::new().on_delete(|soft, sql| {
            if soft {
                format!("{} AND stat = 0", sql)
            } else {
                sql.to_string()
            }
        });
        let out = hooks.run_before_delete(true, "UPDATE t SET is_deleted = 1".into());
        assert_eq!(out, "UPDATE t SET is_deleted = 1 AND stat = 0");

        let untouched = hooks.run_before_delete(false, "DELETE FROM t".into());
        assert_eq!(untouched, "DELETE FROM t");
    }
}
