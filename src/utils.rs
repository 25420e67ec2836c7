//! Small helpers for logging and output directories.

use crate::error::Result;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a marker file
/// in it. A marker that cannot be removed is logged, not fatal.
#[instrument(level = "debug", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<()> {
    fs::create_dir_all(path).await?;
    let marker = Path::new(path).join(".facility_calendar_write_check");
    fs::write(&marker, b"").await?;
    if let Err(e) = fs::remove_file(&marker).await {
        warn!(marker = %marker.display(), error = %e, "Failed to remove write-check file");
    }
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        // Each character is three bytes; a cut at 4 lands mid-character.
        let result = truncate_for_log("予約状況", 4);
        assert_eq!(result, "予…(+9 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        ensure_writable_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_leaves_no_marker() {
        let dir = tempfile::tempdir().unwrap();
        ensure_writable_dir(dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        assert!(ensure_writable_dir(file.to_str().unwrap()).await.is_err());
    }
}
