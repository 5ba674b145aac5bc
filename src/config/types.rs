//! Raw configuration rows as stored in the namespace config table.

use crate::convert;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Table the namespace configuration is read from.
pub const CONFIG_TABLE: &str = "ds_common_api";

/// Rows in this state are dropped when loading.
pub const STATUS_DELETED: i64 = 1;

/// `pid` marking a top-level namespace row.
pub const TOP_LEVEL_PID: i64 = -1;

/// Statement kind tokens as stored in the `type` column.
pub mod kind_token {
    pub const SINGLE: &str = "SINGLE";
    pub const CRUD: &str = "CRUD";
}

/// One row of the config store, decoded straight from the generic record
/// the executor returns.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NamespaceRow {
    pub id: i64,
    pub pid: i64,
    pub namespace: String,
    /// Human description, not the entity's name column.
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub table_name: Option<String>,
    #[serde(deserialize_with = "descriptor_from_cell")]
    pub table_model: Option<DescriptorOverrides>,
    #[serde(deserialize_with = "bool_from_cell")]
    pub list_order_by_date: Option<bool>,
    pub clz_name: Option<String>,
    pub sql: Option<String>,
    pub info_sql: Option<String>,
    pub list_sql: Option<String>,
    pub create_sql: Option<String>,
    pub update_sql: Option<String>,
    pub delete_sql: Option<String>,
    #[serde(deserialize_with = "bool_from_cell")]
    pub tenant_isolation: Option<bool>,
    #[serde(deserialize_with = "bool_from_cell")]
    pub current_user_only: Option<bool>,
    pub id_type: Option<i64>,
    pub stat: Option<i64>,
}

/// Per-namespace column-name overrides, stored as JSON text in the
/// `table_model` column. Keys follow the store's camelCase convention.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DescriptorOverrides {
    pub id_field: Option<String>,
    pub id_type: Option<i64>,
    pub name_field: Option<String>,
    pub creator_id_field: Option<String>,
    pub updater_id_field: Option<String>,
    pub create_date_field: Option<String>,
    pub update_date_field: Option<String>,
    pub uid_field: Option<String>,
    pub state_field: Option<String>,
    #[serde(deserialize_with = "bool_from_cell")]
    pub has_is_deleted: Option<bool>,
    pub del_field: Option<String>,
    pub user_id_field: Option<String>,
    pub tenant_id_field: Option<String>,
}

/// MySQL hands flags back as TINYINT, so accept numbers, strings, and
/// booleans alike.
fn bool_from_cell<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.as_ref().and_then(convert::to_bool))
}

/// The overrides column holds JSON text; accept an already-decoded object
/// too since seed data may inline it.
fn descriptor_from_cell<'de, D>(deserializer: D) -> Result<Option<DescriptorOverrides>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => {
            if text.trim().is_empty() {
                return Ok(None);
            }
            serde_json::from_str(&text).map(Some).map_err(serde::de::Error::custom)
        }
        Some(obj @ Value::Object(_)) => {
            serde_json::from_value(obj).map(Some).map_err(serde::de::Error::custom)
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "table_model must be JSON text or an object, got {}",
            crate::record::json_type_name(&other)
        ))),
    }
}
