//! In-process workbook.
//!
//! Behaves like a spreadsheet document closely enough for the publisher:
//! worksheets have ids, titles and a cell grid, and `swap` applies all of its
//! changes or none. Used by `--dry-run` and by tests.

use super::{SheetsApi, Worksheet};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetData {
    pub id: i64,
    pub title: String,
    pub rows: u32,
    pub columns: u32,
    /// Cells keyed by 1-based (row, column).
    pub cells: BTreeMap<(u32, u32), String>,
}

impl SheetData {
    pub fn cell(&self, row: u32, column: u32) -> Option<&str> {
        self.cells.get(&(row, column)).map(String::as_str)
    }

    /// Cells of one row from column A up to the last filled column.
    pub fn row(&self, row: u32) -> Vec<String> {
        let last = self
            .cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|((_, c), _)| *c)
            .max()
            .unwrap_or(0);
        (1..=last)
            .map(|c| self.cell(row, c).unwrap_or_default().to_string())
            .collect()
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    sheets: Vec<SheetData>,
    /// When set, the next `write_rows` fails with this message.
    fail_next_write: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryWorkbook {
    inner: Mutex<Inner>,
}

impl MemoryWorkbook {
    /// Workbook pre-populated with empty worksheets of the given titles.
    pub fn with_sheets<'a>(titles: impl IntoIterator<Item = &'a str>) -> Self {
        let book = Self::default();
        {
            let mut inner = book.lock();
            for title in titles {
                let id = inner.next_id;
                inner.next_id += 1;
                inner.sheets.push(SheetData {
                    id,
                    title: title.to_string(),
                    rows: 1000,
                    columns: 26,
                    ..Default::default()
                });
            }
        }
        book
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn titles(&self) -> Vec<String> {
        self.lock().sheets.iter().map(|s| s.title.clone()).collect()
    }

    pub fn sheet(&self, title: &str) -> Option<SheetData> {
        self.lock().sheets.iter().find(|s| s.title == title).cloned()
    }

    /// Make the next `write_rows` call fail.
    #[cfg(test)]
    pub fn fail_next_write(&self, message: &str) {
        self.lock().fail_next_write = Some(message.to_string());
    }

    fn not_found(id: i64) -> Error {
        Error::Sheets {
            status: 404,
            body: format!("no worksheet with id {id}"),
        }
    }
}

impl SheetsApi for MemoryWorkbook {
    async fn worksheets(&self) -> Result<Vec<Worksheet>> {
        Ok(self
            .lock()
            .sheets
            .iter()
            .map(|s| Worksheet {
                id: s.id,
                title: s.title.clone(),
            })
            .collect())
    }

    async fn add_worksheet(&self, title: &str, rows: u32, columns: u32) -> Result<Worksheet> {
        let mut inner = self.lock();
        if inner.sheets.iter().any(|s| s.title == title) {
            return Err(Error::Sheets {
                status: 400,
                body: format!("a sheet named {title:?} already exists"),
            });
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.sheets.push(SheetData {
            id,
            title: title.to_string(),
            rows,
            columns,
            ..Default::default()
        });
        Ok(Worksheet {
            id,
            title: title.to_string(),
        })
    }

    async fn write_rows(&self, sheet: &Worksheet, first_row: u32, rows: &[Vec<String>]) -> Result<()> {
        let mut inner = self.lock();
        if let Some(message) = inner.fail_next_write.take() {
            return Err(Error::Sheets {
                status: 500,
                body: message,
            });
        }
        let data = inner
            .sheets
            .iter_mut()
            .find(|s| s.id == sheet.id)
            .ok_or_else(|| Self::not_found(sheet.id))?;

        for (r, row) in rows.iter().enumerate() {
            let row_no = first_row + r as u32;
            if row_no > data.rows || row.len() as u32 > data.columns {
                return Err(Error::Sheets {
                    status: 400,
                    body: format!("row {row_no} exceeds grid {}x{}", data.rows, data.columns),
                });
            }
            for (c, value) in row.iter().enumerate() {
                data.cells.insert((row_no, c as u32 + 1), value.clone());
            }
        }
        Ok(())
    }

    async fn swap(&self, remove: &[Worksheet], rename: &[(Worksheet, String)]) -> Result<()> {
        let mut inner = self.lock();
        let mut staged = inner.sheets.clone();

        for sheet in remove {
            let pos = staged
                .iter()
                .position(|s| s.id == sheet.id)
                .ok_or_else(|| Self::not_found(sheet.id))?;
            staged.remove(pos);
        }
        for (sheet, title) in rename {
            if staged.iter().any(|s| s.title == *title && s.id != sheet.id) {
                return Err(Error::Sheets {
                    status: 400,
                    body: format!("a sheet named {title:?} already exists"),
                });
            }
            let data = staged
                .iter_mut()
                .find(|s| s.id == sheet.id)
                .ok_or_else(|| Self::not_found(sheet.id))?;
            data.title = title.clone();
        }

        inner.sheets = staged;
        Ok(())
    }

    async fn delete_worksheets(&self, sheets: &[Worksheet]) -> Result<()> {
        let mut inner = self.lock();
        inner.sheets.retain(|s| !sheets.iter().any(|d| d.id == s.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_swap_is_all_or_nothing() {
        let book = MemoryWorkbook::with_sheets(["README", "2023/5"]);
        let sheets = book.worksheets().await.unwrap();
        let staged = book.add_worksheet("2024/5~staging", 10, 10).await.unwrap();

        let bogus = Worksheet { id: 99, title: "x".into() };
        assert!(book.swap(&[sheets[1].clone(), bogus], &[]).await.is_err());
        assert_eq!(book.titles(), vec!["README", "2023/5", "2024/5~staging"]);

        book.swap(&[sheets[1].clone()], &[(staged, "2024/5".into())])
            .await
            .unwrap();
        assert_eq!(book.titles(), vec!["README", "2024/5"]);
    }

    #[tokio::test]
    async fn test_write_rows_and_read_back() {
        let book = MemoryWorkbook::default();
        let sheet = book.add_worksheet("s", 5, 3).await.unwrap();
        book.write_rows(&sheet, 2, &[vec!["a".into(), "b".into()], vec!["c".into()]])
            .await
            .unwrap();

        let data = book.sheet("s").unwrap();
        assert_eq!(data.row(2), vec!["a", "b"]);
        assert_eq!(data.cell(3, 1), Some("c"));
        assert_eq!(data.row(1), Vec::<String>::new());

        let too_wide = vec![vec!["x".to_string(); 4]];
        assert!(book.write_rows(&sheet, 1, &too_wide).await.is_err());
    }
}
