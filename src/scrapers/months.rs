//! Month navigation on a room's detail page.
//!
//! The page carries a date navigation list
//! (`div.institution02 div.datelink li`) with one entry per bookable month.
//! The month being shown has no link of its own; the room URL stands in for
//! it.

use super::LINK;
use crate::error::{Error, Result};
use crate::fetch::{PageSource, fetch_document};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static INSTITUTION: Lazy<Selector> = Lazy::new(|| Selector::parse("div.institution02").unwrap());
static DATE_LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("div.datelink").unwrap());
static ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());

/// List one URL per month offered on the room page, in page order.
pub fn parse_month_links(document: &Html, room_url: &Url) -> Result<Vec<Url>> {
    let context = || format!("month navigation {room_url}");
    let nav = document
        .select(&INSTITUTION)
        .next()
        .and_then(|container| container.select(&DATE_LINKS).next())
        .ok_or_else(|| Error::schema(context(), "no div.institution02 div.datelink"))?;

    let mut urls = Vec::new();
    for item in nav.select(&ITEM) {
        match item.select(&LINK).next() {
            None => urls.push(room_url.clone()),
            Some(link) => {
                let href = link
                    .value()
                    .attr("href")
                    .ok_or_else(|| Error::schema(context(), "month link has no href"))?;
                urls.push(room_url.join(href)?);
            }
        }
    }
    Ok(urls)
}

/// Fetch a room's detail page and resolve its month URLs.
#[instrument(level = "debug", skip(source), fields(%room_url))]
pub async fn resolve_month_links<S: PageSource>(source: &S, room_url: &Url) -> Result<Vec<Url>> {
    let document = fetch_document(source, room_url).await?;
    let urls = parse_month_links(&document, room_url)?;
    debug!(count = urls.len(), "Resolved month links");
    Ok(urls)
}
