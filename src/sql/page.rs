//! Derives a count statement and a row-limited statement from one SELECT,
//! working on the statement text itself.

use crate::error::DataError;
use crate::executor::Dialect;
use serde::{Deserialize, Serialize};

/// Page size used when the caller supplies none.
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// One page of results plus the bookkeeping a list UI needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total_count: i64,
    pub start: i64,
    pub page_size: i64,
    pub total_page: i64,
    pub current_page: i64,
    pub is_zero: bool,
}

impl<T> Page<T> {
    /// Envelope for a non-empty result. Derives total/current page numbers
    /// from the offset and page size.
    pub fn new(list: Vec<T>, total_count: i64, start: i64, page_size: i64) -> Self {
        let size = page_size.max(1);
        let total_page = if total_count % size == 0 {
            total_count / size
        } else {
            total_count / size + 1
        };
        Page {
            list,
            total_count,
            start,
            page_size,
            total_page,
            current_page: start / size + 1,
            is_zero: false,
        }
    }

    /// Envelope for a count of zero. The row query is never issued for
    /// this case.
    pub fn empty(start: i64, page_size: i64) -> Self {
        Page {
            list: Vec::new(),
            total_count: 0,
            start,
            page_size,
            total_page: 0,
            current_page: 0,
            is_zero: true,
        }
    }
}

/// Rewrite one SELECT into `(count_statement, page_statement)`.
///
/// The count statement swaps the projection for `COUNT(*)` and drops a
/// top-level ORDER BY; the page statement is the original text plus the
/// vendor's limiting clause. A union gets the limiting clause on every
/// branch, and its count statement is the combined statement untouched.
pub fn rewrite(
    select: &str,
    start: i64,
    limit: i64,
    dialect: Dialect,
) -> Result<(String, String), DataError> {
    let clause = limit_clause(start, limit, dialect)?;
    let mask = top_level_mask(select);

    if let Some((branches, combinators)) = split_union(select, &mask) {
        let mut page = String::new();
        for (i, branch) in branches.iter().enumerate() {
            if i > 0 {
                page.push(' ');
                page.push_str(combinators[i - 1]);
                page.push(' ');
            }
            page.push_str(branch.trim());
            page.push_str(&clause);
        }
        return Ok((select.to_string(), page));
    }

    let page = format!("{}{}", select, clause);
    let count = match find_keyword(select, &mask, "FROM", 0) {
        Some(from_pos) => {
            let end = match find_order_by(select, &mask) {
                Some(order_pos) if order_pos > from_pos => order_pos,
                _ => select.len(),
            };
            format!("SELECT COUNT(*) {}", select[from_pos..end].trim_end())
        }
        None => "SELECT COUNT(*)".to_string(),
    };
    Ok((count, page))
}

fn limit_clause(start: i64, limit: i64, dialect: Dialect) -> Result<String, DataError> {
    match dialect {
        Dialect::MySql | Dialect::MariaDb => Ok(format!(" LIMIT {}, {}", start, limit)),
        Dialect::Derby => Ok(format!(
            " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            start, limit
        )),
        other => Err(DataError::Dialect(other)),
    }
}

/// Per-byte flag: true where the byte sits at nesting depth zero and
/// outside any quoted run.
fn top_level_mask(sql: &str) -> Vec<bool> {
    #[derive(PartialEq)]
    enum Quote {
        None,
        Single,
        Double,
        Backtick,
    }

    let bytes = sql.as_bytes();
    let mut mask = vec![false; bytes.len()];
    let mut depth = 0usize;
    let mut quote = Quote::None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Quote::None => match c {
                b'\'' => quote = Quote::Single,
                b'"' => quote = Quote::Double,
                b'`' => quote = Quote::Backtick,
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ => {
                    if depth == 0 {
                        mask[i] = true;
                    }
                }
            },
            Quote::Single => {
                if c == b'\\' {
                    i += 1;
                } else if c == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 1;
                    } else {
                        quote = Quote::None;
                    }
                }
            }
            Quote::Double => {
                if c == b'"' {
                    quote = Quote::None;
                }
            }
            Quote::Backtick => {
                if c == b'`' {
                    quote = Quote::None;
                }
            }
        }
        i += 1;
    }
    mask
}

fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn bounded(bytes: &[u8], start: usize, end: usize) -> bool {
    (start == 0 || !is_ident_byte(bytes[start - 1])) && (end >= bytes.len() || !is_ident_byte(bytes[end]))
}

/// First top-level, word-bounded, case-insensitive occurrence of `kw` at
/// or after `from`.
fn find_keyword(sql: &str, mask: &[bool], kw: &str, from: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    let len = kw.len();
    let mut i = from;
    while i + len <= bytes.len() {
        if mask[i]
            && sql[i..i + len].eq_ignore_ascii_case(kw)
            && bounded(bytes, i, i + len)
            && mask[i..i + len].iter().all(|&m| m)
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn find_order_by(sql: &str, mask: &[bool]) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut from = 0;
    while let Some(p) = find_keyword(sql, mask, "ORDER", from) {
        let mut j = p + 5;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j + 2 <= bytes.len()
            && sql[j..j + 2].eq_ignore_ascii_case("BY")
            && bounded(bytes, j, j + 2)
        {
            return Some(p);
        }
        from = p + 5;
    }
    None
}

/// Split at top-level UNION / UNION ALL. Returns the branch texts and the
/// combinator tokens between them, or None when the statement has no
/// top-level set combination.
fn split_union<'a>(sql: &'a str, mask: &[bool]) -> Option<(Vec<&'a str>, Vec<&'a str>)> {
    let bytes = sql.as_bytes();
    let mut branches = Vec::new();
    let mut combinators = Vec::new();
    let mut pos = 0;
    let mut from = 0;
    while let Some(p) = find_keyword(sql, mask, "UNION", from) {
        let mut j = p + 5;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let next = if j + 3 <= bytes.len()
            && sql[j..j + 3].eq_ignore_ascii_case("ALL")
            && bounded(bytes, j, j + 3)
        {
            j + 3
        } else {
            p + 5
        };
        branches.push(&sql[pos..p]);
        combinators.push(&sql[p..next]);
        pos = next;
        from = next;
    }
    if branches.is_empty() {
        return None;
    }
    branches.push(&sql[pos..]);
    Some((branches, combinators))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_swaps_projection_and_drops_order_by() {
        let (count, page) = rewrite(
            "SELECT id, title FROM news WHERE 1=1 ORDER BY id DESC",
            0,
            12,
            Dialect::MySql,
        )
        .unwrap();
        assert_eq!(count, "SELECT COUNT(*) FROM news WHERE 1=1");
        assert_eq!(
            page,
            "SELECT id, title FROM news WHERE 1=1 ORDER BY id DESC LIMIT 0, 12"
        );
    }

    #[test]
    fn derby_uses_offset_fetch() {
        let (_, page) = rewrite("SELECT id FROM news", 24, 12, Dialect::Derby).unwrap();
        assert_eq!(
            page,
            "SELECT id FROM news OFFSET 24 ROWS FETCH NEXT 12 ROWS ONLY"
        );
    }

    #[test]
    fn unsupported_vendor_fails_fast() {
        let err = rewrite("SELECT id FROM news", 0, 12, Dialect::Oracle).unwrap_err();
        assert!(matches!(err, DataError::Dialect(Dialect::Oracle)));
    }

    #[test]
    fn subquery_from_is_not_the_split_point() {
        let (count, _) = rewrite(
            "SELECT (SELECT MAX(id) FROM log) AS top, id FROM news ORDER BY id",
            0,
            12,
            Dialect::MySql,
        )
        .unwrap();
        assert_eq!(count, "SELECT COUNT(*) FROM news");
    }

    #[test]
    fn quoted_keywords_are_ignored() {
        let (count, _) = rewrite(
            "SELECT id FROM t WHERE name = 'order by from union'",
            0,
            12,
            Dialect::MySql,
        )
        .unwrap();
        assert_eq!(
            count,
            "SELECT COUNT(*) FROM t WHERE name = 'order by from union'"
        );
    }

    #[test]
    fn union_limits_every_branch_and_counts_the_original() {
        let sql = "SELECT id FROM a UNION ALL SELECT id FROM b";
        let (count, page) = rewrite(sql, 0, 5, Dialect::MySql).unwrap();
        assert_eq!(count, sql);
        assert_eq!(
            page,
            "SELECT id FROM a LIMIT 0, 5 UNION ALL SELECT id FROM b LIMIT 0, 5"
        );
    }

    #[test]
    fn union_keeps_its_combinator_spelling() {
        let sql = "SELECT id FROM a union SELECT id FROM b";
        let (_, page) = rewrite(sql, 10, 5, Dialect::MariaDb).unwrap();
        assert_eq!(
            page,
            "SELECT id FROM a LIMIT 10, 5 union SELECT id FROM b LIMIT 10, 5"
        );
    }

    #[test]
    fn select_without_from_still_counts() {
        let (count, _) = rewrite("SELECT 1", 0, 12, Dialect::MySql).unwrap();
        assert_eq!(count, "SELECT COUNT(*)");
    }

    #[test]
    fn envelope_math_rounds_the_last_page_up() {
        let p = Page::new(vec![1, 2, 3], 25, 12, 12);
        assert_eq!(p.total_page, 3);
        assert_eq!(p.current_page, 2);
        assert!(!p.is_zero);

        let exact = Page::new(vec![1], 24, 0, 12);
        assert_eq!(exact.total_page, 2);
        assert_eq!(exact.current_page, 1);
    }

    #[test]
    fn empty_envelope_sets_the_zero_flag() {
        let p: Page<i32> = Page::empty(0, 12);
        assert!(p.is_zero);
        assert_eq!(p.total_count, 0);
        assert!(p.list.is_empty());
    }
}
