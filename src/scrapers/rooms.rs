//! Room listing scraper.
//!
//! A facility page lists its rooms in the first `table.empty01`. Each room
//! row starts with a `th.roomth` holding the link to the room's detail page,
//! followed by data cells in a fixed order:
//!
//! | Cell | Field |
//! |------|-------|
//! | 1st `td` | capacity |
//! | 2nd `td` | morning fee |
//! | 3rd `td` | afternoon fee |
//! | 4th `td` | night fee |

use super::{LINK, element_text};
use crate::error::{Error, Result};
use crate::fetch::{PageSource, fetch_document};
use crate::models::{Calendar, Facility, Room};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static ROOM_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table.empty01").unwrap());
static ROOM_HEADER: Lazy<Selector> = Lazy::new(|| Selector::parse("th.roomth").unwrap());
static DATA_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());

const DATA_CELLS: usize = 4;

/// Extract the rooms listed on one facility page.
pub fn parse_rooms(document: &Html, facility: &Facility) -> Result<Vec<Room>> {
    let context = || format!("room listing {}", facility.url);
    let facility_url = Url::parse(&facility.url)?;

    let table = document
        .select(&ROOM_TABLE)
        .next()
        .ok_or_else(|| Error::schema(context(), "no table.empty01"))?;

    let mut rooms = Vec::new();
    for header in table.select(&ROOM_HEADER) {
        let link = header
            .select(&LINK)
            .next()
            .ok_or_else(|| Error::schema(context(), "room header has no link"))?;
        let href = link
            .value()
            .attr("href")
            .ok_or_else(|| Error::schema(context(), "room link has no href"))?;
        let row = header
            .parent()
            .and_then(ElementRef::wrap)
            .ok_or_else(|| Error::schema(context(), "room header is not inside a row"))?;

        let cells: Vec<String> = row.select(&DATA_CELL).map(element_text).collect();
        let [capacity, am_fee, pm_fee, night_fee] = match <[String; DATA_CELLS]>::try_from(
            cells.into_iter().take(DATA_CELLS).collect::<Vec<_>>(),
        ) {
            Ok(fields) => fields,
            Err(found) => {
                return Err(Error::schema(
                    context(),
                    format!(
                        "room {:?} has {} data cells, expected {DATA_CELLS}",
                        element_text(link),
                        found.len()
                    ),
                ));
            }
        };

        rooms.push(Room {
            place_name: facility.name.clone(),
            place_url: facility.url.clone(),
            room_name: element_text(link),
            room_url: facility_url.join(href)?.to_string(),
            capacity,
            am_fee,
            pm_fee,
            night_fee,
            calendar: Calendar::default(),
        });
    }

    debug!(facility = %facility.name, count = rooms.len(), "Parsed rooms");
    Ok(rooms)
}

/// Fetch every facility page and flatten their rooms into one list.
#[instrument(level = "info", skip_all, fields(facilities = facilities.len()))]
pub async fn list_rooms<S: PageSource>(source: &S, facilities: &[Facility]) -> Result<Vec<Room>> {
    let mut rooms = Vec::new();
    for facility in facilities {
        let url = Url::parse(&facility.url)?;
        let document = fetch_document(source, &url).await?;
        rooms.extend(parse_rooms(&document, facility)?);
    }
    info!(count = rooms.len(), "Listed rooms");
    Ok(rooms)
}
