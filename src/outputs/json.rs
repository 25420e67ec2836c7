//! JSON snapshot of a run's scraped rooms.
//!
//! ```text
//! json_output_dir/
//! └── 2024-05-06.json
//! ```
//!
//! A later run on the same day overwrites the file.

use crate::error::Result;
use crate::models::Room;
use crate::utils::ensure_writable_dir;
use chrono::Local;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Write `rooms` to `{json_output_dir}/{local date}.json` and return the path.
#[instrument(level = "info", skip_all, fields(%json_output_dir, rooms = rooms.len()))]
pub async fn write_snapshot(rooms: &[Room], json_output_dir: &str) -> Result<PathBuf> {
    ensure_writable_dir(json_output_dir).await?;

    let json = serde_json::to_string_pretty(rooms)?;
    let path = PathBuf::from(json_output_dir).join(format!("{}.json", Local::now().date_naive()));
    fs::write(&path, json).await?;

    info!(path = %path.display(), "Wrote JSON snapshot");
    Ok(path)
}
