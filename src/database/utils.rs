use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?").expect("placeholder pattern is valid"));

/// Collapses whitespace and rewrites `?` placeholders to Postgres `$1, $2, ...`.
pub fn sql(query: &str) -> String {
    let cleaned = query.split_whitespace().collect::<Vec<&str>>().join(" ");
    let mut param_index = 0;
    PLACEHOLDER
        .replace_all(&cleaned, |_: &regex::Captures| {
            param_index += 1;
            format!("${}", param_index)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_placeholders_are_numbered() {
        let query = sql(r#"
            SELECT id
            FROM   week_schedules
            WHERE  start_date <= ? AND end_date >= ?
        "#);
        assert_eq!(
            query,
            "SELECT id FROM week_schedules WHERE start_date <= $1 AND end_date >= $2"
        );
    }

    #[test]
    fn test_query_without_placeholders() {
        assert_eq!(sql("SELECT 1"), "SELECT 1");
    }
}
