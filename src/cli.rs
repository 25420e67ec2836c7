//! Command-line interface definitions.
//!
//! Every option can also be supplied through the environment variable named
//! next to it.

use clap::Parser;
use std::path::PathBuf;

/// Collect room availability calendars and republish them to a spreadsheet.
///
/// # Examples
///
/// ```sh
/// # Crawl the configured site and rebuild the spreadsheet
/// facility_calendar -c ./config.yaml
///
/// # Crawl two facilities, keep a JSON snapshot, leave the spreadsheet alone
/// facility_calendar --max-facilities 2 -j ./snapshots --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config.yaml
    #[arg(short, long, env = "FACILITY_CALENDAR_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Facility index URL (overrides `base_url` from the config file)
    #[arg(long, env = "FACILITY_CALENDAR_BASE_URL")]
    pub base_url: Option<String>,

    /// Only crawl the first N facilities
    #[arg(long)]
    pub max_facilities: Option<usize>,

    /// Also write a JSON snapshot of the scraped rooms into this directory
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Publish into an in-memory workbook instead of the remote spreadsheet
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["facility_calendar"]);

        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(cli.base_url.is_none());
        assert!(cli.max_facilities.is_none());
        assert!(cli.json_output_dir.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "facility_calendar",
            "-c",
            "/etc/fc.yaml",
            "--base-url",
            "https://example.org/index.cgi",
            "--max-facilities",
            "2",
            "-j",
            "/tmp/json",
            "--dry-run",
        ]);

        assert_eq!(cli.config, PathBuf::from("/etc/fc.yaml"));
        assert_eq!(cli.base_url.as_deref(), Some("https://example.org/index.cgi"));
        assert_eq!(cli.max_facilities, Some(2));
        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
        assert!(cli.dry_run);
    }
}
