//! Scrapers for the facility-reservation site.
//!
//! The crawl walks four kinds of page, each with its own module:
//!
//! | Page | Module | Yields |
//! |------|--------|--------|
//! | Facility index | [`facilities`] | `Facility` (name, URL) |
//! | Facility room listing | [`rooms`] | `Room` with fees, empty calendar |
//! | Room detail | [`months`] | one URL per bookable month |
//! | Month calendar | [`calendar`] | `MonthGrid` keyed by `YearMonth` |
//!
//! Each module splits a pure `parse_*` function over page text from an async
//! function that fetches through a [`PageSource`](crate::fetch::PageSource).
//! Pages are requested strictly one after another.

pub mod calendar;
pub mod facilities;
pub mod months;
pub mod rooms;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

/// Selector for the first `<a>` inside an element.
pub(crate) static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Whitespace-trimmed text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
