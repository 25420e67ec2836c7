//! Spreadsheet access.
//!
//! [`SheetsApi`] is the narrow set of operations the publisher needs. Two
//! implementations exist:
//!
//! - [`google::GoogleSheets`]: the Google Sheets v4 REST API
//! - [`memory::MemoryWorkbook`]: an in-process workbook for dry runs and tests

pub mod google;
pub mod memory;

use crate::error::Result;

/// A worksheet inside the target spreadsheet document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub id: i64,
    pub title: String,
}

pub trait SheetsApi {
    /// All worksheets, in tab order.
    async fn worksheets(&self) -> Result<Vec<Worksheet>>;

    /// Append a worksheet with the given grid size.
    async fn add_worksheet(&self, title: &str, rows: u32, columns: u32) -> Result<Worksheet>;

    /// Write `rows` into `sheet` starting at column A of the 1-based row
    /// `first_row`.
    async fn write_rows(&self, sheet: &Worksheet, first_row: u32, rows: &[Vec<String>]) -> Result<()>;

    /// Delete `remove` and retitle `rename` as one atomic change.
    async fn swap(&self, remove: &[Worksheet], rename: &[(Worksheet, String)]) -> Result<()>;

    async fn delete_worksheets(&self, sheets: &[Worksheet]) -> Result<()>;
}

/// A1 column letters for a 1-based column index (`1` is `A`, `27` is `AA`).
pub fn column_name(mut index: u32) -> String {
    let mut name = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        name.push(b'A' + rem as u8);
        index = (index - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// A1 range covering `rows` starting at `first_row`, e.g. `'2024/5'!A2:AK4`.
pub fn a1_range(title: &str, first_row: u32, rows: &[Vec<String>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(1) as u32;
    let last_row = first_row + (rows.len().max(1) as u32) - 1;
    format!(
        "'{}'!A{}:{}{}",
        title.replace('\'', "''"),
        first_row,
        column_name(width),
        last_row
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(1), "A");
        assert_eq!(column_name(26), "Z");
        assert_eq!(column_name(27), "AA");
        assert_eq!(column_name(37), "AK");
        assert_eq!(column_name(200), "GR");
    }

    #[test]
    fn test_a1_range() {
        let rows = vec![vec!["x".to_string(); 37], vec!["y".to_string(); 10]];
        assert_eq!(a1_range("2024/5", 2, &rows), "'2024/5'!A2:AK3");
        assert_eq!(a1_range("it's", 3, &[vec!["a".into()]]), "'it''s'!A3:A3");
    }
}
