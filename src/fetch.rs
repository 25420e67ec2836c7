//! Page fetching.
//!
//! Scrapers never talk to the network directly; they go through a
//! [`PageSource`], which lets tests serve canned pages instead of the live
//! site. Requests are issued one at a time and are never retried.

use crate::error::Result;
use reqwest::Client;
use scraper::Html;
use std::time::Instant;
use tracing::{debug, instrument};
use url::Url;

/// Something that can return the body of a page.
pub trait PageSource {
    async fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// [`PageSource`] backed by HTTP GET requests.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        let t0 = Instant::now();
        let body = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Fetch a page and parse it into a queryable document.
pub async fn fetch_document<S: PageSource>(source: &S, url: &Url) -> Result<Html> {
    let body = source.fetch_text(url).await?;
    Ok(Html::parse_document(&body))
}
