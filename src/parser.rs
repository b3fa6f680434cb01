use std::collections::HashMap;

/// A single record, keyed by header name.
///
/// Cells the source line did not provide are absent. When the header line
/// contains a name twice the later column wins, same as a plain map insert.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Row {
    cells: HashMap<String, Option<String>>,
}

impl Row {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).and_then(|c| c.as_deref())
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Row {
            cells: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub data: Vec<Row>,
}

impl ParsedTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Split raw text into headers and rows.
///
/// Lines are separated by `\n` and fields by `,`. There is no quoting, no
/// trimming and no validation of the field count: short lines leave trailing
/// cells undefined and long lines drop the extra values. An empty line
/// produces a row with every cell undefined.
pub fn parse(content: &str) -> ParsedTable {
    let mut lines = content.split('\n');
    let headers: Vec<String> = lines
        .next()
        .unwrap_or_default()
        .split(',')
        .map(str::to_string)
        .collect();

    let data = lines
        .map(|line| {
            let values: Vec<&str> = if line.is_empty() {
                Vec::new()
            } else {
                line.split(',').collect()
            };
            let mut cells = HashMap::with_capacity(headers.len());
            for (idx, header) in headers.iter().enumerate() {
                cells.insert(header.clone(), values.get(idx).map(|v| v.to_string()));
            }
            Row { cells }
        })
        .collect();

    ParsedTable { headers, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_rows() {
        let table = parse("a,b\n1,2\n3,4");
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.data.len(), 2);
        assert_eq!(table.data[0], Row::from_pairs(&[("a", "1"), ("b", "2")]));
        assert_eq!(table.data[1], Row::from_pairs(&[("a", "3"), ("b", "4")]));
    }

    #[test]
    fn trailing_newline_adds_undefined_row() {
        let table = parse("a\n1\n");
        assert_eq!(table.data.len(), 2);
        assert_eq!(table.data[0].get("a"), Some("1"));
        assert_eq!(table.data[1].get("a"), None);
    }

    #[test]
    fn ragged_lines() {
        let table = parse("a,b,c\n1\n1,2,3,4");
        assert_eq!(table.data[0].get("a"), Some("1"));
        assert_eq!(table.data[0].get("b"), None);
        assert_eq!(table.data[0].get("c"), None);
        assert_eq!(table.data[1].get("c"), Some("3"));
    }

    #[test]
    fn header_count_and_row_count() {
        let content = "input,title,status_code,content_length,port,url\n\
                       a.com,A,200,12,443,https://a.com\n\
                       b.com,B,404,0,80,http://b.com\n\
                       c.com,C,301,5,443,https://c.com";
        let table = parse(content);
        assert_eq!(table.headers.len(), 6);
        assert_eq!(table.data.len(), 3);
        assert!(table.has_column("url"));
        assert!(!table.has_column("host"));
    }

    #[test]
    fn no_quote_handling() {
        let table = parse("a,b\n\"x,y\",z");
        assert_eq!(table.data[0].get("a"), Some("\"x"));
        assert_eq!(table.data[0].get("b"), Some("y\""));
    }

    #[test]
    fn duplicate_headers_collide() {
        let table = parse("a,a\n1,2");
        assert_eq!(table.headers, vec!["a", "a"]);
        assert_eq!(table.data[0].get("a"), Some("2"));
    }

    #[test]
    fn empty_and_header_only_input() {
        let table = parse("");
        assert_eq!(table.headers, vec![""]);
        assert!(table.data.is_empty());

        let table = parse("a,b");
        assert_eq!(table.headers, vec!["a", "b"]);
        assert!(table.data.is_empty());
    }

    #[test]
    fn fixture_file() {
        let table = parse(include_str!("../tests/fixtures/probes.csv"));
        assert_eq!(table.headers.len(), 6);
        // Five records plus the row produced by the final newline
        assert_eq!(table.data.len(), 6);
        assert_eq!(table.data[4].get("title"), Some(""));
        assert_eq!(table.data[4].get("port"), Some("8443"));
        assert_eq!(table.data[5].get("url"), None);
    }

    #[test]
    fn carriage_returns_are_kept() {
        let table = parse("a,url\r\n1,x\r\n");
        assert_eq!(table.headers, vec!["a", "url\r"]);
        assert_eq!(table.data[0].get("url\r"), Some("x\r"));
    }
}
