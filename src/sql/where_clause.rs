//! Compiles reserved `q_` request parameters into a textual predicate
//! fragment for splicing into a composed statement.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const FILTER_PREFIX: &str = "q_";

fn denylist() -> &'static Regex {
    static DENYLIST: OnceLock<Regex> = OnceLock::new();
    DENYLIST.get_or_init(|| {
        Regex::new(r"(?i)select|update|delete|insert|drop|truncate|union|\*|--|;").unwrap()
    })
}

/// A value that trips the denylist is dropped entirely rather than
/// partially cleaned; everything else is trimmed.
fn sanitize(value: &str) -> String {
    if denylist().is_match(value) {
        String::new()
    } else {
        value.trim().to_string()
    }
}

/// Build the caller where-clause from request parameters. Only names with
/// the `q_` prefix participate; the prefix is stripped to name the column.
/// One value compiles to an equality, several to an IN list. The fragment
/// starts with ` AND ` so it can be appended to a `WHERE 1=1` base.
pub fn compile(params: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = String::new();
    for (name, values) in params {
        let column = match name.strip_prefix(FILTER_PREFIX) {
            Some(c) => c,
            None => continue,
        };
        if values.len() == 1 {
            out.push_str(&format!(" AND {} = '{}'", column, sanitize(&values[0])));
        } else {
            let list = values
                .iter()
                .map(|v| format!("'{}'", sanitize(v)))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&format!(" AND {} IN ({})", column, list));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn single_value_compiles_to_equality() {
        let p = params(&[("q_name", &["dd"])]);
        assert_eq!(compile(&p), " AND name = 'dd'");
    }

    #[test]
    fn several_values_compile_to_an_in_list() {
        let p = params(&[("q_id", &["1", "2", "3"])]);
        assert_eq!(compile(&p), " AND id IN ('1','2','3')");
    }

    #[test]
    fn no_values_still_emit_the_in_clause() {
        let p = params(&[("q_name", &[])]);
        assert_eq!(compile(&p), " AND name IN ()");
    }

    #[test]
    fn keyword_bearing_values_are_blanked() {
        let p = params(&[("q_name", &["SELECT dd"])]);
        assert_eq!(compile(&p), " AND name = ''");

        let p = params(&[("q_name", &["x; DROP TABLE news"])]);
        assert_eq!(compile(&p), " AND name = ''");

        let p = params(&[("q_name", &["a--b"])]);
        assert_eq!(compile(&p), " AND name = ''");
    }

    #[test]
    fn the_denylist_ignores_case() {
        let p = params(&[("q_name", &["uNiOn all"])]);
        assert_eq!(compile(&p), " AND name = ''");
    }

    #[test]
    fn plain_values_are_trimmed() {
        let p = params(&[("q_name", &["  dd  "])]);
        assert_eq!(compile(&p), " AND name = 'dd'");
    }

    #[test]
    fn unprefixed_parameters_do_not_participate() {
        let p = params(&[("name", &["dd"]), ("pageSize", &["5"])]);
        assert_eq!(compile(&p), "");
    }

    #[test]
    fn filters_concatenate_in_name_order() {
        let p = params(&[("q_b", &["2"]), ("q_a", &["1"])]);
        assert_eq!(compile(&p), " AND a = '1' AND b = '2'");
    }
}
