//! Named-placeholder substitution for configured statements. `#{name}`
//! renders the value as an SQL literal, `${name}` splices its raw text.

use crate::error::DataError;
use serde_json::{Map, Value};

/// Render a configured statement against a variable map. Any placeholder
/// naming a key the map lacks aborts the render.
pub fn render(sql: &str, vars: &Map<String, Value>) -> Result<String, DataError> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if (c == b'#' || c == b'$') && bytes.get(i + 1) == Some(&b'{') {
            let close = sql[i + 2..]
                .find('}')
                .map(|p| i + 2 + p)
                .ok_or_else(|| DataError::Validation("unclosed placeholder in statement".into()))?;
            let key = sql[i + 2..close].trim();
            let value = vars.get(key).ok_or_else(|| {
                DataError::Validation(format!("missing statement parameter '{}'", key))
            })?;
            if c == b'#' {
                out.push_str(&literal(value));
            } else {
                out.push_str(&raw(value));
            }
            i = close + 1;
        } else {
            let ch_len = sql[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            out.push_str(&sql[i..i + ch_len]);
            i += ch_len;
        }
    }
    Ok(out)
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

fn raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn hash_placeholders_render_literals() {
        let v = vars(&[("id", json!(5)), ("name", json!("dd"))]);
        let sql = render("SELECT * FROM news WHERE id = #{id} AND name = #{name}", &v).unwrap();
        assert_eq!(sql, "SELECT * FROM news WHERE id = 5 AND name = 'dd'");
    }

    #[test]
    fn string_literals_double_embedded_quotes() {
        let v = vars(&[("name", json!("d'd"))]);
        let sql = render("WHERE name = #{name}", &v).unwrap();
        assert_eq!(sql, "WHERE name = 'd''d'");
    }

    #[test]
    fn dollar_placeholders_splice_raw_text() {
        let v = vars(&[("table", json!("news")), ("id", json!(3))]);
        let sql = render("SELECT * FROM ${table} WHERE id = #{id}", &v).unwrap();
        assert_eq!(sql, "SELECT * FROM news WHERE id = 3");
    }

    #[test]
    fn null_and_bool_render_as_sql_tokens() {
        let v = vars(&[("a", Value::Null), ("b", json!(true))]);
        assert_eq!(render("#{a} #{b}", &v).unwrap(), "NULL true");
    }

    #[test]
    fn missing_key_aborts() {
        let v = vars(&[]);
        assert!(matches!(
            render("WHERE id = #{id}", &v),
            Err(DataError::Validation(_))
        ));
        assert!(matches!(
            render("FROM ${table}", &v),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn unclosed_placeholder_aborts() {
        let v = vars(&[("id", json!(1))]);
        assert!(matches!(
            render("WHERE id = #{id", &v),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn text_without_placeholders_is_untouched() {
        let v = vars(&[]);
        let sql = "SELECT 1 # not a placeholder, $10";
        assert_eq!(render(sql, &v).unwrap(), sql);
    }
}
