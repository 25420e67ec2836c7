//! Data models for facilities, rooms and their monthly availability grids.
//!
//! - [`Facility`]: a venue discovered on the index page
//! - [`Room`]: a bookable room with its fees and collected [`Calendar`]
//! - [`YearMonth`]: the `"YYYY/M"` key naming one month (and one worksheet)
//! - [`MonthGrid`]: one month of day labels plus three status rows
//! - [`AvailabilityMark`]: the symbol shown for one time slot on one day
//! - [`Status`]: a slot's mark, or the text printed in its cell

use crate::error::{Error, Result};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A public venue listed on the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    /// Display text of the facility link.
    pub name: String,
    /// Absolute URL of the facility's room listing.
    pub url: String,
}

/// A bookable room within a facility.
///
/// The facility is referenced by name and URL only. `calendar` starts empty
/// and is filled by the calendar extractor.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub place_name: String,
    pub place_url: String,
    pub room_name: String,
    pub room_url: String,
    /// Capacity as printed on the listing, e.g. `"30人"`.
    pub capacity: String,
    pub am_fee: String,
    pub pm_fee: String,
    pub night_fee: String,
    pub calendar: Calendar,
}

/// Year and month taken from a month page's query string.
///
/// Both parts are kept verbatim so the key matches what the site emits
/// (`month=5` gives `"2024/5"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct YearMonth {
    pub year: String,
    pub month: String,
}

impl YearMonth {
    pub fn new(year: impl Into<String>, month: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            month: month.into(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Availability of one time slot on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AvailabilityMark {
    #[serde(rename = "○")]
    Open,
    #[serde(rename = "×")]
    Closed,
    #[serde(rename = "△")]
    Partial,
    #[serde(rename = "□")]
    ReservedA,
    #[serde(rename = "◆")]
    ReservedB,
    #[serde(rename = "-")]
    Unknown,
}

impl AvailabilityMark {
    /// Map a status icon to its mark.
    ///
    /// Only the file name of `src` is compared, so `img/mark01.gif` and an
    /// absolute URL ending in `mark01.gif` are the same icon. A missing or
    /// unrecognised icon is [`AvailabilityMark::Unknown`].
    pub fn from_icon(src: Option<&str>) -> Self {
        let file_name = src
            .map(|s| s.rsplit('/').next().unwrap_or(s))
            .unwrap_or_default();
        match file_name {
            "mark01.gif" => AvailabilityMark::Open,
            "mark02.gif" => AvailabilityMark::Closed,
            "mark03.gif" => AvailabilityMark::Partial,
            "mark04.gif" => AvailabilityMark::ReservedA,
            "mark05.gif" => AvailabilityMark::ReservedB,
            _ => AvailabilityMark::Unknown,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AvailabilityMark::Open => "○",
            AvailabilityMark::Closed => "×",
            AvailabilityMark::Partial => "△",
            AvailabilityMark::ReservedA => "□",
            AvailabilityMark::ReservedB => "◆",
            AvailabilityMark::Unknown => "-",
        }
    }
}

impl fmt::Display for AvailabilityMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What one time slot on one day shows.
///
/// Data cells carry a status icon. Header cells in a status row (closure
/// days, for instance) carry text instead, which is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Status {
    Mark(AvailabilityMark),
    Text(String),
}

impl From<AvailabilityMark> for Status {
    fn from(mark: AvailabilityMark) -> Self {
        Status::Mark(mark)
    }
}

impl PartialEq<AvailabilityMark> for Status {
    fn eq(&self, other: &AvailabilityMark) -> bool {
        matches!(self, Status::Mark(mark) if mark == other)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Mark(mark) => mark.fmt(f),
            Status::Text(text) => f.write_str(text),
        }
    }
}

/// One month of a room's availability.
///
/// The five sequences are parallel: index `i` describes the `i`-th day
/// column of the month's table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub days: Vec<String>,
    pub weekdays: Vec<String>,
    pub morning: Vec<Status>,
    pub afternoon: Vec<Status>,
    pub night: Vec<Status>,
    /// Page the grid was scraped from; day cells link back here.
    pub source_url: String,
}

impl MonthGrid {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Check that all five sequences have the same length.
    pub fn validate(&self) -> Result<()> {
        let lens = [
            self.days.len(),
            self.weekdays.len(),
            self.morning.len(),
            self.afternoon.len(),
            self.night.len(),
        ];
        if lens.iter().all(|&n| n == lens[0]) {
            Ok(())
        } else {
            Err(Error::schema(
                format!("calendar {}", self.source_url),
                format!("row lengths differ (days, weekdays, am, pm, night) = {lens:?}"),
            ))
        }
    }
}

/// A room's months in the order they were collected.
///
/// Inserting an existing key replaces its grid in place.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    months: Vec<(YearMonth, MonthGrid)>,
}

impl Calendar {
    pub fn insert(&mut self, key: YearMonth, grid: MonthGrid) {
        match self.months.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = grid,
            None => self.months.push((key, grid)),
        }
    }

    pub fn get(&self, key: &YearMonth) -> Option<&MonthGrid> {
        self.months.iter().find(|(k, _)| k == key).map(|(_, g)| g)
    }

    pub fn keys(&self) -> impl Iterator<Item = &YearMonth> {
        self.months.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&YearMonth, &MonthGrid)> {
        self.months.iter().map(|(k, g)| (k, g))
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

impl Serialize for Calendar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_mapping() {
        assert_eq!(AvailabilityMark::from_icon(Some("img/mark01.gif")).symbol(), "○");
        assert_eq!(AvailabilityMark::from_icon(Some("img/mark02.gif")).symbol(), "×");
        assert_eq!(AvailabilityMark::from_icon(Some("img/mark03.gif")).symbol(), "△");
        assert_eq!(AvailabilityMark::from_icon(Some("img/mark04.gif")).symbol(), "□");
        assert_eq!(AvailabilityMark::from_icon(Some("img/mark05.gif")).symbol(), "◆");
    }

    #[test]
    fn test_icon_mapping_unknown() {
        assert_eq!(AvailabilityMark::from_icon(Some("img/mark06.gif")), AvailabilityMark::Unknown);
        assert_eq!(AvailabilityMark::from_icon(Some("")), AvailabilityMark::Unknown);
        assert_eq!(AvailabilityMark::from_icon(None), AvailabilityMark::Unknown);
        assert_eq!(AvailabilityMark::Unknown.to_string(), "-");
    }

    #[test]
    fn test_icon_mapping_uses_file_name() {
        assert_eq!(
            AvailabilityMark::from_icon(Some("https://example.org/system/img/mark03.gif")),
            AvailabilityMark::Partial
        );
        assert_eq!(AvailabilityMark::from_icon(Some("mark05.gif")), AvailabilityMark::ReservedB);
    }

    #[test]
    fn test_year_month_display() {
        assert_eq!(YearMonth::new("2024", "5").to_string(), "2024/5");
    }

    #[test]
    fn test_month_grid_validate() {
        let mut grid = MonthGrid {
            days: vec!["1".into(), "2".into()],
            weekdays: vec!["月".into(), "火".into()],
            morning: vec![AvailabilityMark::Open.into(); 2],
            afternoon: vec![AvailabilityMark::Open.into(); 2],
            night: vec![Status::Text("休館".into()); 2],
            source_url: "https://example.org/cal".into(),
        };
        assert!(grid.validate().is_ok());

        grid.night.pop();
        assert!(matches!(grid.validate(), Err(Error::Schema { .. })));
    }

    #[test]
    fn test_calendar_keeps_order_and_replaces() {
        let mut cal = Calendar::default();
        cal.insert(YearMonth::new("2024", "5"), MonthGrid::default());
        cal.insert(YearMonth::new("2024", "6"), MonthGrid::default());
        cal.insert(
            YearMonth::new("2024", "5"),
            MonthGrid {
                source_url: "replaced".into(),
                ..Default::default()
            },
        );

        let keys: Vec<String> = cal.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["2024/5", "2024/6"]);
        assert_eq!(cal.get(&YearMonth::new("2024", "5")).unwrap().source_url, "replaced");
    }

    #[test]
    fn test_calendar_serializes_as_map() {
        let mut cal = Calendar::default();
        cal.insert(
            YearMonth::new("2024", "5"),
            MonthGrid {
                days: vec!["1".into()],
                weekdays: vec!["水".into()],
                morning: vec![AvailabilityMark::Open.into()],
                afternoon: vec![AvailabilityMark::Closed.into()],
                night: vec![Status::Text("休館".into())],
                source_url: "u".into(),
            },
        );
        let json = serde_json::to_value(&cal).unwrap();
        assert_eq!(json["2024/5"]["morning"][0], "○");
        assert_eq!(json["2024/5"]["afternoon"][0], "×");
        assert_eq!(json["2024/5"]["night"][0], "休館");
    }

    #[test]
    fn test_status_display_and_comparison() {
        let mark = Status::from(AvailabilityMark::Partial);
        assert_eq!(mark.to_string(), "△");
        assert_eq!(mark, AvailabilityMark::Partial);

        let text = Status::Text("休館".into());
        assert_eq!(text.to_string(), "休館");
        assert_ne!(text, AvailabilityMark::Unknown);
    }
}
