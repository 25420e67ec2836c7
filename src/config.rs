//! YAML configuration for a run.
//!
//! ```yaml
//! base_url: https://www.suisin.city.nagoya.jp/system/institution/index.cgi
//! spreadsheet:
//!   key_file: credentials/token.json
//!   doc_id: 1AbCdEf
//! ```
//!
//! `spreadsheet.key_file` is resolved against the directory holding the
//! config file, so a config and its credentials can move together.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use url::Url;

fn default_reserved_sheet() -> String {
    "README".to_string()
}

fn default_extent() -> u32 {
    200
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Facility index page the crawl starts from.
    pub base_url: String,
    pub spreadsheet: SpreadsheetConfig,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetConfig {
    /// Access token file produced by an external authorizer.
    pub key_file: PathBuf,
    /// Identifier of the target spreadsheet document.
    pub doc_id: String,
    /// The one worksheet a publish never deletes.
    #[serde(default = "default_reserved_sheet")]
    pub reserved_sheet: String,
    #[serde(default = "default_extent")]
    pub rows: u32,
    #[serde(default = "default_extent")]
    pub columns: u32,
}

impl Config {
    /// Read and validate a config file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config: Config = serde_yaml::from_str(&text)?;

        if config.spreadsheet.key_file.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.spreadsheet.key_file = base.join(&config.spreadsheet.key_file);
        }
        config.base_url()?;
        if config.spreadsheet.doc_id.trim().is_empty() {
            return Err(Error::Config("spreadsheet.doc_id is empty".to_string()));
        }

        debug!(base_url = %config.base_url, key_file = %config.spreadsheet.key_file.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?)
    }
}
