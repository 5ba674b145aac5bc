//! Builds parameterized INSERT and UPDATE text from a generic record.
//! Identifiers come from configuration, values always ride as parameters.

use crate::error::DataError;
use crate::record::{is_null_sentinel, Record};
use serde_json::Value;

/// Composed statement plus its positional parameters; the two are never
/// produced separately.
#[derive(Clone, Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    pub fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) {
        self.params.push(v);
    }
}

/// Quote an identifier for the MySQL family.
pub fn quoted(s: &str) -> String {
    format!("`{}`", s.replace('`', "``"))
}

/// INSERT from a record: every field with a non-null value becomes a column;
/// the reserved null sentinels bind SQL NULL so a payload can clear a column
/// explicitly. Fails when nothing remains to insert.
pub fn build_insert(table: &str, record: &Record) -> Result<QueryBuf, DataError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();

    for (name, value) in record.fields() {
        if value.is_null() {
            continue;
        }
        cols.push(quoted(name));
        placeholders.push("?");
        if is_null_sentinel(value) {
            q.push_param(Value::Null);
        } else {
            q.push_param(value.clone());
        }
    }

    if cols.is_empty() {
        return Err(DataError::Validation("record has no fields".into()));
    }

    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(table),
        cols.join(", "),
        placeholders.join(", ")
    );
    Ok(q)
}

/// UPDATE by id: SET for every non-null field except the id column itself,
/// the id bound last for the WHERE clause.
pub fn build_update(
    table: &str,
    record: &Record,
    id_column: &str,
    id_value: &Value,
) -> Result<QueryBuf, DataError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();

    for (name, value) in record.fields() {
        if name == id_column || value.is_null() {
            continue;
        }
        sets.push(format!("{} = ?", quoted(name)));
        if is_null_sentinel(value) {
            q.push_param(Value::Null);
        } else {
            q.push_param(value.clone());
        }
    }

    if sets.is_empty() {
        return Err(DataError::Validation("record has no updatable fields".into()));
    }

    q.push_param(id_value.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quoted(table),
        sets.join(", "),
        quoted(id_column)
    );
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{NULL_INT, NULL_STRING};
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.insert(*k, v.clone());
        }
        r
    }

    #[test]
    fn insert_includes_only_present_fields_in_order() {
        let r = record(&[("title", json!("a")), ("author_id", json!(5))]);
        let q = build_insert("news", &r).unwrap();
        assert_eq!(q.sql, "INSERT INTO `news` (`title`, `author_id`) VALUES (?, ?)");
        assert_eq!(q.params, vec![json!("a"), json!(5)]);
    }

    #[test]
    fn insert_omits_id_column_when_record_has_none() {
        let r = record(&[("title", json!("a"))]);
        let q = build_insert("news", &r).unwrap();
        assert!(!q.sql.contains("`id`"));
    }

    #[test]
    fn insert_skips_json_nulls_but_binds_sentinels_as_null() {
        let r = record(&[
            ("title", json!("a")),
            ("summary", Value::Null),
            ("remark", json!(NULL_STRING)),
            ("score", json!(NULL_INT)),
        ]);
        let q = build_insert("news", &r).unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO `news` (`title`, `remark`, `score`) VALUES (?, ?, ?)"
        );
        assert_eq!(q.params, vec![json!("a"), Value::Null, Value::Null]);
    }

    #[test]
    fn insert_rejects_empty_record() {
        let r = Record::new();
        assert!(matches!(
            build_insert("news", &r),
            Err(DataError::Validation(_))
        ));

        let only_nulls = record(&[("a", Value::Null)]);
        assert!(matches!(
            build_insert("news", &only_nulls),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn update_excludes_id_from_set_and_binds_it_last() {
        let r = record(&[("id", json!(9)), ("title", json!("b")), ("views", json!(2))]);
        let q = build_update("news", &r, "id", &json!(9)).unwrap();
        assert_eq!(q.sql, "UPDATE `news` SET `title` = ?, `views` = ? WHERE `id` = ?");
        assert_eq!(q.params, vec![json!("b"), json!(2), json!(9)]);
    }

    #[test]
    fn update_with_only_the_id_fails() {
        let r = record(&[("id", json!(9))]);
        assert!(matches!(
            build_update("news", &r, "id", &json!(9)),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn identifiers_are_backtick_escaped() {
        assert_eq!(quoted("plain"), "`plain`");
        assert_eq!(quoted("odd`name"), "`odd``name`");
    }
}
