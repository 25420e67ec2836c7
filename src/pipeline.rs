//! The crawl half of the pipeline.
//!
//! Facility index → room listings → month links and calendars. The result is
//! handed to [`publish`](crate::publish) by `main`. Stages run one after
//! another, every request waits for the previous one, and the first error
//! ends the run.

use crate::error::Result;
use crate::fetch::PageSource;
use crate::models::Room;
use crate::scrapers::{calendar, facilities, rooms};
use tracing::{info, instrument};
use url::Url;

/// Crawl the site starting at `base_url` and return every room with its
/// calendar filled in.
#[instrument(level = "info", skip(source), fields(%base_url))]
pub async fn scrape<S: PageSource>(
    source: &S,
    base_url: &Url,
    max_facilities: Option<usize>,
) -> Result<Vec<Room>> {
    let mut facilities = facilities::index_facilities(source, base_url).await?;
    if let Some(limit) = max_facilities {
        facilities.truncate(limit);
        info!(limit, "Limiting crawl to the first facilities");
    }

    let mut rooms = rooms::list_rooms(source, &facilities).await?;
    calendar::collect_calendars(source, &mut rooms).await?;

    let months: usize = rooms.iter().map(|r| r.calendar.len()).sum();
    info!(
        facilities = facilities.len(),
        rooms = rooms.len(),
        months,
        "Scrape complete"
    );
    Ok(rooms)
}
