#![allow(dead_code)]

use async_trait::async_trait;
use dataserve_sdk::{DataError, DataService, Dialect, Record, StatementExecutor};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Executor that answers queries from canned responses and logs every
/// statement it is handed, for asserting on exact SQL text.
pub struct ScriptedExecutor {
    dialect: Dialect,
    log: Mutex<Vec<(String, Vec<Value>)>>,
    responders: Mutex<Vec<(String, Vec<Record>)>>,
    hold: Option<HoldPoint>,
}

/// Pause point: a query matching `needle` signals `entered` and then waits
/// for `release`, so a test can hold a statement in flight.
struct HoldPoint {
    needle: String,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::with_dialect(Dialect::MySql)
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        ScriptedExecutor {
            dialect,
            log: Mutex::new(Vec::new()),
            responders: Mutex::new(Vec::new()),
            hold: None,
        }
    }

    /// Executor whose queries matching `needle` block until released.
    pub fn holding(needle: &str) -> (Self, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let exec = ScriptedExecutor {
            hold: Some(HoldPoint {
                needle: needle.to_string(),
                entered: entered.clone(),
                release: release.clone(),
            }),
            ..Self::new()
        };
        (exec, entered, release)
    }

    /// Queries whose text contains `needle` answer with these rows.
    /// Earlier registrations win.
    pub fn respond(&self, needle: &str, rows: Vec<Record>) {
        self.responders
            .lock()
            .unwrap()
            .push((needle.to_string(), rows));
    }

    pub fn clear_responses(&self) {
        self.responders.lock().unwrap().clear();
    }

    pub fn statements(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// First logged statement containing `needle`, with its parameters.
    pub fn find(&self, needle: &str) -> Option<(String, Vec<Value>)> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .find(|(sql, _)| sql.contains(needle))
            .cloned()
    }
}

#[async_trait]
impl StatementExecutor for ScriptedExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DataError> {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(1)
    }

    async fn execute_returning_key(&self, sql: &str, params: &[Value]) -> Result<i64, DataError> {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(77)
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DataError> {
        if let Some(hold) = &self.hold {
            if sql.contains(&hold.needle) {
                hold.entered.notify_one();
                hold.release.notified().await;
            }
        }
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        let responders = self.responders.lock().unwrap();
        for (needle, rows) in responders.iter() {
            if sql.contains(needle) {
                return Ok(rows.clone());
            }
        }
        Ok(Vec::new())
    }
}

pub fn rec(v: Value) -> Record {
    Record::from_value(v).expect("record from object")
}

/// A plain generic namespace row over a table of the same name.
pub fn config_row(namespace: &str) -> Value {
    json!({
        "id": 1,
        "pid": -1,
        "namespace": namespace,
        "name": "test namespace",
        "type": "CRUD",
        "table_name": namespace,
        "stat": 0
    })
}

/// Service with the given config rows already loaded.
pub async fn loaded_service(exec: &Arc<ScriptedExecutor>, rows: Vec<Value>) -> DataService {
    exec.respond("ds_common_api", rows.into_iter().map(rec).collect());
    let service = DataService::builder(exec.clone())
        .build()
        .expect("build service");
    service.reload_config().await.expect("reload");
    service
}
