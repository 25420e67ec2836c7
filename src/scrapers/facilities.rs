//! Facility index scraper.
//!
//! Facilities on the index page are marked with a `<span class="green s">`
//! sitting next to the facility link. Only links carrying a query string
//! (`room.cgi?id=5`) lead to a bookable room listing; the rest are
//! decorative and are dropped.

use super::{LINK, element_text};
use crate::error::{Error, Result};
use crate::fetch::{PageSource, fetch_document};
use crate::models::Facility;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static MARKER: Lazy<Selector> = Lazy::new(|| Selector::parse("span.green.s").unwrap());

/// Extract facilities from the index page, in document order.
///
/// Duplicates are kept.
pub fn parse_facilities(document: &Html, base_url: &Url) -> Result<Vec<Facility>> {
    let mut facilities = Vec::new();

    for marker in document.select(&MARKER) {
        let parent = marker
            .parent()
            .and_then(ElementRef::wrap)
            .ok_or_else(|| Error::schema("facility index", "marker span has no parent element"))?;
        let link = parent
            .select(&LINK)
            .next()
            .ok_or_else(|| Error::schema("facility index", "no link next to marker span"))?;
        let href = link
            .value()
            .attr("href")
            .ok_or_else(|| Error::schema("facility index", "facility link has no href"))?;

        let url = base_url.join(href)?;
        if url.query().is_some_and(|q| !q.is_empty()) {
            facilities.push(Facility {
                name: element_text(link),
                url: url.to_string(),
            });
        } else {
            debug!(%url, "Skipping facility link without query");
        }
    }

    Ok(facilities)
}

/// Fetch the index page and list its bookable facilities.
#[instrument(level = "info", skip(source), fields(%base_url))]
pub async fn index_facilities<S: PageSource>(source: &S, base_url: &Url) -> Result<Vec<Facility>> {
    let document = fetch_document(source, base_url).await?;
    let facilities = parse_facilities(&document, base_url)?;
    info!(count = facilities.len(), "Indexed facilities");
    Ok(facilities)
}
