//! Tab-separated martservice responses.

use super::DatasetInfo;
use crate::gateway::Table;

/// Non-empty lines without their `\r`. A line of bare tabs is a row of empty
/// cells and is kept.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
}

/// Parse a `type=datasets` listing. Only `TableSet` entries are datasets.
pub(crate) fn parse_datasets(text: &str) -> Vec<DatasetInfo> {
    lines(text)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 || fields[0] != "TableSet" {
                return None;
            }
            Some(DatasetInfo {
                name: fields[1].to_string(),
                display_name: fields[2].to_string(),
            })
        })
        .collect()
}

/// Parse a query result produced with `header="1"`.
///
/// An empty body carries no header, so the requested attribute names stand in
/// for the columns.
pub(crate) fn parse_query_result(text: &str, requested: &[String]) -> Table {
    let mut lines = lines(text);
    let mut table = match lines.next() {
        Some(header) => Table::new(header.split('\t')),
        None => return Table::new(requested.iter().cloned()),
    };
    for line in lines {
        table.push_row(line.split('\t'));
    }
    table
}
