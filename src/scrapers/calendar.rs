//! Month calendar scraper.
//!
//! A month page holds one or more `table.empty02` tables. Row by row they
//! read:
//!
//! 0. day numbers
//! 1. weekday labels
//! 2. morning status icons
//! 3. afternoon status icons
//! 4. night status icons
//!
//! The first cell of every row is a label and is skipped. A status cell is
//! normally a `td` holding an icon; a `th` in a status row (a closure day,
//! say) contributes its text instead. When the month is split over several
//! tables, each table's rows append to the same five sequences.

use super::element_text;
use super::months::resolve_month_links;
use crate::error::{Error, Result};
use crate::fetch::{PageSource, fetch_document};
use crate::models::{AvailabilityMark, MonthGrid, Room, Status, YearMonth};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static CALENDAR_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table.empty02").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());
static ICON: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

const ROWS: usize = 5;

/// Read the `year` and `month` query parameters of a month URL.
pub fn year_month_of(url: &Url) -> Result<YearMonth> {
    let param = |name: &'static str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| Error::MissingQueryParam {
                url: url.to_string(),
                param: name,
            })
    };
    Ok(YearMonth::new(param("year")?, param("month")?))
}

/// Build a [`MonthGrid`] from a month page.
pub fn parse_month_grid(document: &Html, month_url: &Url) -> Result<MonthGrid> {
    let mut grid = MonthGrid {
        source_url: month_url.to_string(),
        ..Default::default()
    };

    for table in document.select(&CALENDAR_TABLE) {
        for (row_index, row) in table.select(&ROW).enumerate() {
            for cell in row.select(&CELL).skip(1) {
                match row_index {
                    0 => grid.days.push(element_text(cell)),
                    1 => grid.weekdays.push(element_text(cell)),
                    2..ROWS => {
                        let status = if cell.value().name() == "td" {
                            let src = cell.select(&ICON).next().and_then(|img| img.value().attr("src"));
                            Status::Mark(AvailabilityMark::from_icon(src))
                        } else {
                            Status::Text(element_text(cell))
                        };
                        match row_index {
                            2 => grid.morning.push(status),
                            3 => grid.afternoon.push(status),
                            _ => grid.night.push(status),
                        }
                    }
                    _ => {
                        return Err(Error::schema(
                            format!("calendar {month_url}"),
                            format!("table.empty02 has more than {ROWS} rows"),
                        ));
                    }
                }
            }
        }
    }

    grid.validate()?;
    if grid.is_empty() {
        warn!(%month_url, "Calendar page has no day columns");
    }
    Ok(grid)
}

/// Fill in the calendar of every room.
///
/// For each room the month links are resolved, then each month page is
/// fetched and stored under its `YearMonth`.
#[instrument(level = "info", skip_all, fields(rooms = rooms.len()))]
pub async fn collect_calendars<S: PageSource>(source: &S, rooms: &mut [Room]) -> Result<()> {
    for room in rooms.iter_mut() {
        let room_url = Url::parse(&room.room_url)?;
        for month_url in resolve_month_links(source, &room_url).await? {
            let key = year_month_of(&month_url)?;
            let document = fetch_document(source, &month_url).await?;
            let grid = parse_month_grid(&document, &month_url)?;
            debug!(month = %key, days = grid.len(), "Parsed month");
            room.calendar.insert(key, grid);
        }
        info!(
            place = %room.place_name,
            room = %room.room_name,
            months = ?room.calendar.keys().map(ToString::to_string).collect::<Vec<_>>(),
            "Collected calendar"
        );
    }
    Ok(())
}
