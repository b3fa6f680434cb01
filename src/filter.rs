use tracing::debug;

use crate::parser::{ParsedTable, Row};

#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    pub key: String,
    pub value: String,
}

/// Filter text per configured column key, in configuration order.
///
/// The keys are fixed at construction and are independent of the headers a
/// parsed file happens to carry. Columns without a key are never filtered, and
/// a key the file does not contain only matches while its filter is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    entries: Vec<FilterEntry>,
}

impl FilterState {
    pub fn new(keys: &[String]) -> Self {
        let mut entries: Vec<FilterEntry> = Vec::with_capacity(keys.len());
        for key in keys {
            if !entries.iter().any(|e| &e.key == key) {
                entries.push(FilterEntry {
                    key: key.clone(),
                    value: String::new(),
                });
            }
        }
        FilterState { entries }
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn key_at(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(|e| e.key.as_str())
    }

    /// Store the raw value for `key`. Returns false for keys outside the set.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.entries
            .iter()
            .all(|e| cell_matches(row.get(&e.key), &e.value))
    }
}

/// Case insensitive containment. An absent cell only satisfies an empty filter.
fn cell_matches(cell: Option<&str>, filter: &str) -> bool {
    match cell {
        Some(value) => value.to_lowercase().contains(&filter.to_lowercase()),
        None => filter.is_empty(),
    }
}

/// Indices into `table.data` of the rows passing every filter, in table order.
pub fn filtered_indices(table: &ParsedTable, filters: &FilterState) -> Vec<usize> {
    let indices: Vec<usize> = table
        .data
        .iter()
        .enumerate()
        .filter(|(_, row)| filters.matches(row))
        .map(|(idx, _)| idx)
        .collect();
    debug!(
        "Filtered {} of {} rows",
        indices.len(),
        table.data.len()
    );
    indices
}

/// Number of rows in the whole table whose `column` cell contains the filter
/// text for that column. Other filters are ignored and rows without the
/// column are not counted.
pub fn column_match_count(table: &ParsedTable, filters: &FilterState, column: &str) -> usize {
    let term = filters.get(column).unwrap_or_default().to_lowercase();
    table
        .data
        .iter()
        .filter(|row| {
            row.get(column)
                .is_some_and(|v| v.to_lowercase().contains(&term))
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn default_filters() -> FilterState {
        FilterState::new(&keys(&[
            "input",
            "title",
            "status_code",
            "content_length",
            "port",
            "url",
        ]))
    }

    const RESULTS: &str = "input,title,status_code,content_length,port,url\n\
                          a.com,Home,200,12,443,https://a.com\n\
                          b.com,Login,404,0,80,http://b.com/login\n\
                          c.com,Home Page,200,5,443,https://C.com";

    #[test]
    fn empty_filters_select_everything() {
        let table = parse(RESULTS);
        let filters = default_filters();
        assert_eq!(filtered_indices(&table, &filters), vec![0, 1, 2]);
    }

    #[test]
    fn filters_are_case_insensitive_substrings() {
        let table = parse(RESULTS);
        let mut filters = default_filters();
        filters.set("title", "HOME");
        assert_eq!(filtered_indices(&table, &filters), vec![0, 2]);

        filters.set("url", "c.COM");
        assert_eq!(filtered_indices(&table, &filters), vec![2]);
    }

    #[test]
    fn all_filters_must_match() {
        let table = parse(RESULTS);
        let mut filters = default_filters();
        filters.set("status_code", "200");
        filters.set("port", "80");
        assert!(filtered_indices(&table, &filters).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let table = parse(RESULTS);
        let mut filters = default_filters();
        filters.set("url", "https");
        let first = filtered_indices(&table, &filters);
        let second = filtered_indices(&table, &filters);
        assert_eq!(first, second);
        assert_eq!(first, vec![0, 2]);
    }

    #[test]
    fn missing_columns_only_match_empty_filters() {
        let table = parse("url\nhttp://x.com\nhttp://y.com");
        let mut filters = default_filters();
        assert_eq!(filtered_indices(&table, &filters), vec![0, 1]);

        filters.set("title", "x");
        assert!(filtered_indices(&table, &filters).is_empty());
    }

    #[test]
    fn unlisted_headers_are_not_filtered() {
        let table = parse("host,url\nzzz,http://x.com");
        let filters = FilterState::new(&keys(&["url"]));
        assert_eq!(filters.get("host"), None);
        assert_eq!(filtered_indices(&table, &filters), vec![0]);
    }

    #[test]
    fn url_filter_selects_single_row() {
        let table = parse("url\nhttp://x.com\nhttp://y.com");
        let mut filters = default_filters();
        filters.set("url", "x");
        assert_eq!(filtered_indices(&table, &filters), vec![0]);
        assert_eq!(column_match_count(&table, &filters, "url"), 1);
    }

    #[test]
    fn url_count_ignores_other_filters() {
        let table = parse(RESULTS);
        let mut filters = default_filters();
        filters.set("status_code", "404");
        assert_eq!(filtered_indices(&table, &filters), vec![1]);
        assert_eq!(column_match_count(&table, &filters, "url"), 3);

        filters.set("url", "https");
        assert_eq!(column_match_count(&table, &filters, "url"), 2);
    }

    #[test]
    fn url_count_skips_rows_without_url() {
        let table = parse("url\nhttp://x.com\n");
        let filters = default_filters();
        assert_eq!(table.data.len(), 2);
        assert_eq!(column_match_count(&table, &filters, "url"), 1);
    }

    #[test]
    fn set_ignores_unknown_keys() {
        let mut filters = default_filters();
        assert!(!filters.set("host", "x"));
        assert!(filters.set("port", " 443 "));
        assert_eq!(filters.get("port"), Some(" 443 "));
        assert_eq!(filters.len(), 6);
    }

    #[test]
    fn duplicate_keys_are_collapsed() {
        let filters = FilterState::new(&keys(&["url", "port", "url"]));
        assert_eq!(filters.len(), 2);
        assert_eq!(filters.key_at(1), Some("port"));
    }
}
