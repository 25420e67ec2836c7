//! Publishing room calendars into the spreadsheet.
//!
//! Every run rebuilds the document: one worksheet per month, named by its
//! `YearMonth`, with a header in row 2 and one row per room from row 3.
//! Only the reserved sheet (`README` by default) survives a publish.
//!
//! # Sheet layout
//!
//! | A | B | C | D | E | F | G.. |
//! |---|---|---|---|---|---|-----|
//! | 施設名 | 部屋名 | 定員 | 午前の使用料 | 午後の使用料 | 夜間の使用料 | `2024/5/1(水)` .. |
//! | `=HYPERLINK(place)` | room | capacity | fee | fee | fee | `=HYPERLINK(month, "○ : × : -")` .. |
//!
//! # Staged swap
//!
//! New month sheets are first built under a `~staging` title. Only once all
//! of them are written are the old sheets deleted and the staged ones renamed,
//! in a single [`SheetsApi::swap`]. A failure before that point removes the
//! staged sheets and leaves the previously published sheets untouched.

use crate::config::SpreadsheetConfig;
use crate::error::{Error, Result};
use crate::models::{MonthGrid, Room, YearMonth};
use crate::sheets::{SheetsApi, Worksheet};
use itertools::izip;
use tracing::{debug, error, info, instrument, warn};

/// Row holding the column titles.
pub const HEADER_ROW: u32 = 2;
/// Row of the first room; room `i` goes to `FIRST_ROOM_ROW + i`.
pub const FIRST_ROOM_ROW: u32 = 3;

const FIXED_COLUMNS: [&str; 6] = [
    "施設名",
    "部屋名",
    "定員",
    "午前の使用料",
    "午後の使用料",
    "夜間の使用料",
];

const STAGING_SUFFIX: &str = "~staging";

#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub reserved_sheet: String,
    pub rows: u32,
    pub columns: u32,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            reserved_sheet: "README".to_string(),
            rows: 200,
            columns: 200,
        }
    }
}

impl From<&SpreadsheetConfig> for PublishOptions {
    fn from(config: &SpreadsheetConfig) -> Self {
        Self {
            reserved_sheet: config.reserved_sheet.clone(),
            rows: config.rows,
            columns: config.columns,
        }
    }
}

/// What a publish changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub sheets: Vec<String>,
    pub removed: Vec<String>,
    pub rooms: usize,
}

/// `=HYPERLINK("url","label")` with embedded quotes doubled.
pub fn hyperlink(url: &str, label: &str) -> String {
    format!(
        "=HYPERLINK(\"{}\",\"{}\")",
        url.replace('"', "\"\""),
        label.replace('"', "\"\"")
    )
}

/// Column titles for one month sheet.
pub fn header_row(key: &YearMonth, grid: &MonthGrid) -> Vec<String> {
    FIXED_COLUMNS
        .iter()
        .map(|s| s.to_string())
        .chain(
            grid.days
                .iter()
                .zip(&grid.weekdays)
                .map(|(day, weekday)| format!("{key}/{day}({weekday})")),
        )
        .collect()
}

/// One room's row in a month sheet.
pub fn room_row(room: &Room, grid: &MonthGrid) -> Vec<String> {
    let mut row = vec![
        hyperlink(&room.place_url, &room.place_name),
        room.room_name.clone(),
        room.capacity.clone(),
        room.am_fee.clone(),
        room.pm_fee.clone(),
        room.night_fee.clone(),
    ];
    for (am, pm, night) in izip!(&grid.morning, &grid.afternoon, &grid.night) {
        row.push(hyperlink(&grid.source_url, &format!("{am} : {pm} : {night}")));
    }
    row
}

/// Build every month sheet's cell block, starting at [`HEADER_ROW`].
///
/// The first room's months decide which sheets exist. Every other room must
/// have each of them, and every grid must fit the sheet.
pub fn layout(rooms: &[Room], options: &PublishOptions) -> Result<Vec<(YearMonth, Vec<Vec<String>>)>> {
    let first = rooms
        .first()
        .ok_or_else(|| Error::schema("publish", "no rooms were scraped"))?;
    if first.calendar.is_empty() {
        warn!(room = %first.room_name, "First room has no months; no month sheets will be built");
    }

    let needed_rows = FIRST_ROOM_ROW - 1 + rooms.len() as u32;
    if needed_rows > options.rows {
        return Err(Error::schema(
            "publish",
            format!("{} rooms need {needed_rows} rows, sheets have {}", rooms.len(), options.rows),
        ));
    }

    let mut blocks = Vec::new();
    for (key, first_grid) in first.calendar.iter() {
        let mut block = Vec::with_capacity(rooms.len() + 1);
        block.push(header_row(key, first_grid));

        for room in rooms {
            let grid = room.calendar.get(key).ok_or_else(|| Error::MissingMonth {
                room: format!("{} / {}", room.place_name, room.room_name),
                month: key.to_string(),
            })?;
            grid.validate()?;
            let row = room_row(room, grid);
            if row.len() as u32 > options.columns {
                return Err(Error::schema(
                    format!("publish {key}"),
                    format!("{} columns needed, sheets have {}", row.len(), options.columns),
                ));
            }
            block.push(row);
        }
        blocks.push((key.clone(), block));
    }
    Ok(blocks)
}

/// Replace the month sheets of the document with the given rooms' calendars.
#[instrument(level = "info", skip_all, fields(rooms = rooms.len()))]
pub async fn publish<A: SheetsApi>(api: &A, rooms: &[Room], options: &PublishOptions) -> Result<PublishReport> {
    let blocks = layout(rooms, options)?;

    let mut existing = api.worksheets().await?;
    let leftovers: Vec<Worksheet> = existing
        .iter()
        .filter(|s| s.title.ends_with(STAGING_SUFFIX))
        .cloned()
        .collect();
    if !leftovers.is_empty() {
        warn!(count = leftovers.len(), "Removing staged sheets left by an earlier run");
        api.delete_worksheets(&leftovers).await?;
        existing.retain(|s| !s.title.ends_with(STAGING_SUFFIX));
    }

    let mut staged: Vec<(Worksheet, String)> = Vec::with_capacity(blocks.len());
    if let Err(e) = stage(api, &blocks, options, &mut staged).await {
        discard(api, &staged).await;
        return Err(e);
    }

    let remove: Vec<Worksheet> = existing
        .into_iter()
        .filter(|s| s.title != options.reserved_sheet)
        .collect();
    if let Err(e) = api.swap(&remove, &staged).await {
        discard(api, &staged).await;
        return Err(e);
    }

    let report = PublishReport {
        sheets: staged.into_iter().map(|(_, title)| title).collect(),
        removed: remove.into_iter().map(|s| s.title).collect(),
        rooms: rooms.len(),
    };
    info!(sheets = ?report.sheets, removed = ?report.removed, "Published calendars");
    Ok(report)
}

async fn stage<A: SheetsApi>(
    api: &A,
    blocks: &[(YearMonth, Vec<Vec<String>>)],
    options: &PublishOptions,
    staged: &mut Vec<(Worksheet, String)>,
) -> Result<()> {
    for (key, block) in blocks {
        let title = key.to_string();
        let sheet = api
            .add_worksheet(&format!("{title}{STAGING_SUFFIX}"), options.rows, options.columns)
            .await?;
        staged.push((sheet.clone(), title));
        api.write_rows(&sheet, HEADER_ROW, block).await?;
        debug!(sheet = %key, rows = block.len(), "Staged month sheet");
    }
    Ok(())
}

async fn discard<A: SheetsApi>(api: &A, staged: &[(Worksheet, String)]) {
    let sheets: Vec<Worksheet> = staged.iter().map(|(s, _)| s.clone()).collect();
    if let Err(e) = api.delete_worksheets(&sheets).await {
        error!(error = %e, count = sheets.len(), "Failed to remove staged sheets");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityMark, Calendar, Status};
    use crate::sheets::memory::MemoryWorkbook;

    fn grid(url: &str, days: usize) -> MonthGrid {
        MonthGrid {
            days: (1..=days).map(|d| d.to_string()).collect(),
            weekdays: ["月", "火", "水", "木", "金", "土", "日"]
                .iter()
                .cycle()
                .take(days)
                .map(|s| s.to_string())
                .collect(),
            morning: vec![Status::Mark(AvailabilityMark::Open); days],
            afternoon: vec![Status::Mark(AvailabilityMark::Closed); days],
            night: vec![Status::Mark(AvailabilityMark::Unknown); days],
            source_url: url.to_string(),
        }
    }

    fn room(name: &str, months: &[(&str, &str)]) -> Room {
        let mut calendar = Calendar::default();
        for (year, month) in months {
            calendar.insert(
                YearMonth::new(*year, *month),
                grid(&format!("https://example.org/cal?year={year}&month={month}"), 3),
            );
        }
        Room {
            place_name: "Civic Hall".into(),
            place_url: "https://example.org/room.cgi?id=5".into(),
            room_name: name.into(),
            room_url: "https://example.org/detail.cgi?room=1".into(),
            capacity: "10".into(),
            am_fee: "100".into(),
            pm_fee: "200".into(),
            night_fee: "300".into(),
            calendar,
        }
    }

    #[test]
    fn test_hyperlink_escapes_quotes() {
        assert_eq!(hyperlink("https://a/b", "x"), r#"=HYPERLINK("https://a/b","x")"#);
        assert_eq!(hyperlink("u", r#"say "hi""#), r#"=HYPERLINK("u","say ""hi""")"#);
    }

    #[test]
    fn test_header_row() {
        let header = header_row(&YearMonth::new("2024", "5"), &grid("u", 2));
        assert_eq!(header.len(), 8);
        assert_eq!(header[0], "施設名");
        assert_eq!(header[5], "夜間の使用料");
        assert_eq!(header[6], "2024/5/1(月)");
        assert_eq!(header[7], "2024/5/2(火)");
    }

    #[test]
    fn test_room_row() {
        let r = room("Hall A", &[("2024", "5")]);
        let g = r.calendar.get(&YearMonth::new("2024", "5")).unwrap();
        let row = room_row(&r, g);

        assert_eq!(row[0], r#"=HYPERLINK("https://example.org/room.cgi?id=5","Civic Hall")"#);
        assert_eq!(&row[1..6], ["Hall A", "10", "100", "200", "300"]);
        assert_eq!(row.len(), 9);
        assert_eq!(
            row[6],
            r#"=HYPERLINK("https://example.org/cal?year=2024&month=5","○ : × : -")"#
        );
    }

    #[test]
    fn test_layout_missing_month() {
        let rooms = vec![
            room("A", &[("2024", "5"), ("2024", "6")]),
            room("B", &[("2024", "5")]),
        ];
        let err = layout(&rooms, &PublishOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingMonth { ref month, .. } if month == "2024/6"));
    }

    #[test]
    fn test_layout_requires_rooms() {
        assert!(matches!(layout(&[], &PublishOptions::default()), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_layout_checks_sheet_extent() {
        let rooms = vec![room("A", &[("2024", "5")])];
        let narrow = PublishOptions {
            columns: 8,
            ..Default::default()
        };
        assert!(matches!(layout(&rooms, &narrow), Err(Error::Schema { .. })));
    }

    #[tokio::test]
    async fn test_publish_resets_sheets() {
        let book = MemoryWorkbook::with_sheets(["README", "2023/5"]);
        let rooms = vec![
            room("A", &[("2024", "5"), ("2024", "6")]),
            room("B", &[("2024", "5"), ("2024", "6")]),
        ];

        let report = publish(&book, &rooms, &PublishOptions::default()).await.unwrap();

        assert_eq!(book.titles(), vec!["README", "2024/5", "2024/6"]);
        assert_eq!(report.removed, vec!["2023/5"]);
        assert_eq!(report.sheets, vec!["2024/5", "2024/6"]);

        let sheet = book.sheet("2024/6").unwrap();
        assert_eq!((sheet.rows, sheet.columns), (200, 200));
        assert_eq!(sheet.row(1), Vec::<String>::new());
        assert_eq!(sheet.cell(HEADER_ROW, 7), Some("2024/6/1(月)"));
        assert_eq!(sheet.cell(FIRST_ROOM_ROW, 2), Some("A"));
        assert_eq!(sheet.cell(FIRST_ROOM_ROW + 1, 2), Some("B"));
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_previous_sheets() {
        let book = MemoryWorkbook::with_sheets(["README", "2023/5"]);
        book.fail_next_write("backend unavailable");
        let rooms = vec![room("A", &[("2024", "5")])];

        let err = publish(&book, &rooms, &PublishOptions::default()).await.unwrap_err();

        assert!(matches!(err, Error::Sheets { status: 500, .. }));
        assert_eq!(book.titles(), vec!["README", "2023/5"]);
    }

    #[tokio::test]
    async fn test_publish_clears_leftover_staging() {
        let book = MemoryWorkbook::with_sheets(["README", "2024/5~staging"]);
        let rooms = vec![room("A", &[("2024", "5")])];

        let report = publish(&book, &rooms, &PublishOptions::default()).await.unwrap();

        assert_eq!(book.titles(), vec!["README", "2024/5"]);
        assert!(report.removed.is_empty());
    }
}
