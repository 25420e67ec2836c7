//! # Facility Calendar
//!
//! Collects room availability calendars from a municipal facility-reservation
//! site and republishes them into a shared spreadsheet, one worksheet per
//! month and one row per room.
//!
//! ## Usage
//!
//! ```sh
//! facility_calendar -c ./config.yaml
//! ```
//!
//! ## Architecture
//!
//! The application is a straight pipeline:
//! 1. **Facilities**: list bookable facilities from the index page
//! 2. **Rooms**: read each facility's room table (capacity and fees)
//! 3. **Calendars**: follow each room's month links and read its availability grid
//! 4. **Publish**: rebuild the month worksheets of the spreadsheet

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod publish;
mod scrapers;
mod sheets;
mod utils;

use cli::Cli;
use config::Config;
use fetch::HttpSource;
use publish::{FIRST_ROOM_ROW, HEADER_ROW, PublishOptions, publish};
use sheets::google::GoogleSheets;
use sheets::memory::MemoryWorkbook;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("facility_calendar starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = Config::load(&args.config)?;
    let base_url = match &args.base_url {
        Some(url) => Url::parse(url)?,
        None => config.base_url()?,
    };

    // ---- Scrape ----
    let source = HttpSource::new(&config.user_agent)?;
    let rooms = pipeline::scrape(&source, &base_url, args.max_facilities).await?;

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = outputs::json::write_snapshot(&rooms, dir).await {
            error!(path = %dir, error = %e, "Failed to write JSON snapshot");
        }
    }

    // ---- Publish ----
    let options = PublishOptions::from(&config.spreadsheet);
    let report = if args.dry_run {
        let book = MemoryWorkbook::with_sheets([options.reserved_sheet.as_str()]);
        let report = publish(&book, &rooms, &options).await?;
        for sheet in book.titles().iter().filter_map(|title| book.sheet(title)) {
            info!(
                sheet = %sheet.title,
                columns = sheet.row(HEADER_ROW).len(),
                cells = sheet.cells.len(),
                first_room = sheet.cell(FIRST_ROOM_ROW, 2).unwrap_or_default(),
                "Dry run sheet"
            );
        }
        report
    } else {
        let sheets = GoogleSheets::open(
            reqwest::Client::new(),
            &config.spreadsheet.key_file,
            &config.spreadsheet.doc_id,
        )
        .await?;
        publish(&sheets, &rooms, &options).await?
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        rooms = report.rooms,
        sheets = report.sheets.len(),
        dry_run = args.dry_run,
        "Execution complete"
    );

    Ok(())
}
