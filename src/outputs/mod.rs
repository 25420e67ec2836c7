//! Local outputs written alongside the spreadsheet publish.
//!
//! - [`json`]: a dated JSON snapshot of the scraped rooms

pub mod json;
