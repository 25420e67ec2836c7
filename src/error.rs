//! Error type shared by every pipeline stage.
//!
//! The kinds follow the places a run can break: fetching a page, finding the
//! markup the scrapers expect, reconciling data across rooms, and talking to
//! the spreadsheet service. Nothing in the pipeline recovers from these; they
//! bubble up to `main` and end the run.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or non-success HTTP status.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A link or configured URL could not be parsed or resolved.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The page did not have the shape the scraper relies on.
    #[error("schema mismatch in {context}: {detail}")]
    Schema { context: String, detail: String },

    /// A month URL is missing the `year` or `month` query parameter.
    #[error("month URL {url} has no `{param}` query parameter")]
    MissingQueryParam { url: String, param: &'static str },

    /// A room lacks a month that the first room publishes.
    #[error("room {room:?} has no calendar for {month}")]
    MissingMonth { room: String, month: String },

    /// Exchanging the service-account key for an access token failed.
    #[error("authorization failed: {0}")]
    Auth(#[from] gcp_auth::Error),

    /// The spreadsheet service rejected a request.
    #[error("spreadsheet API returned {status}: {body}")]
    Sheets { status: u16, body: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::Schema`].
    pub fn schema(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Schema {
            context: context.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_message() {
        let e = Error::schema("room table", "expected 4 data cells, found 2");
        assert_eq!(
            e.to_string(),
            "schema mismatch in room table: expected 4 data cells, found 2"
        );
    }

    #[test]
    fn test_missing_month_message() {
        let e = Error::MissingMonth {
            room: "Hall A".to_string(),
            month: "2024/6".to_string(),
        };
        assert_eq!(e.to_string(), "room \"Hall A\" has no calendar for 2024/6");
    }
}
