use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

/// Per-site, per-day state reported by the availability source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    /// Bookable online
    Available,
    /// Already booked
    Reserved,
    /// Closed or otherwise not available
    Closed,
    /// Open for extending an existing stay only
    Open,
    /// Booking window has not opened yet
    NotYetReleased,
    /// First-come first-served (walk-up) site
    NotReservable,
    /// Booking cutoff has passed for this date
    NotAvailableCutoff,
    /// Anything the source reported that we do not recognise
    Unknown,
}

impl AvailabilityStatus {
    /// Display order used by status summaries.
    pub const PRIORITY: [AvailabilityStatus; 8] = [
        AvailabilityStatus::Available,
        AvailabilityStatus::NotReservable,
        AvailabilityStatus::Open,
        AvailabilityStatus::Reserved,
        AvailabilityStatus::NotYetReleased,
        AvailabilityStatus::Closed,
        AvailabilityStatus::NotAvailableCutoff,
        AvailabilityStatus::Unknown,
    ];

    /// Statuses shown in the compact glyph summary, in emission order.
    pub const COMPACT: [AvailabilityStatus; 4] = [
        AvailabilityStatus::Available,
        AvailabilityStatus::NotReservable,
        AvailabilityStatus::Open,
        AvailabilityStatus::NotAvailableCutoff,
    ];

    /// Parse a raw status string from recreation.gov.
    ///
    /// Accepts the internal API's wording as well as the one-letter legacy
    /// RIDB codes. Never fails: unrecognised values map to `Unknown`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "Available" => AvailabilityStatus::Available,
            "Reserved" => AvailabilityStatus::Reserved,
            "Not Available" | "Closed" => AvailabilityStatus::Closed,
            "Open" => AvailabilityStatus::Open,
            "NYR" | "Not Yet Released" => AvailabilityStatus::NotYetReleased,
            "Not Reservable" | "Not Reservable Management" | "Walk-up" => {
                AvailabilityStatus::NotReservable
            }
            "Not Available Cutoff" => AvailabilityStatus::NotAvailableCutoff,
            // Legacy RIDB format support
            "A" => AvailabilityStatus::Available,
            "R" => AvailabilityStatus::Reserved,
            "X" => AvailabilityStatus::Closed,
            "W" | "N" => AvailabilityStatus::NotReservable,
            _ => AvailabilityStatus::Unknown,
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "Available",
            AvailabilityStatus::Reserved => "Reserved",
            AvailabilityStatus::Closed => "Closed",
            AvailabilityStatus::Open => "Open (extend only)",
            AvailabilityStatus::NotYetReleased => "Not Yet Released",
            AvailabilityStatus::NotReservable => "Walk-up",
            AvailabilityStatus::NotAvailableCutoff => "Cutoff Passed",
            AvailabilityStatus::Unknown => "Unknown",
        }
    }

    /// Glyph used in space-constrained summaries
    pub fn glyph(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "✅",
            AvailabilityStatus::Reserved => "❌",
            AvailabilityStatus::Closed => "🔒",
            AvailabilityStatus::Open => "🟡",
            AvailabilityStatus::NotYetReleased => "🕒",
            AvailabilityStatus::NotReservable => "🚶",
            AvailabilityStatus::NotAvailableCutoff => "⛔",
            AvailabilityStatus::Unknown => "❔",
        }
    }

    /// Whether a camper could actually occupy the site on this date
    /// (online, walk-up or extension).
    pub fn is_bookable(&self) -> bool {
        matches!(
            self,
            AvailabilityStatus::Available
                | AvailabilityStatus::NotReservable
                | AvailabilityStatus::Open
        )
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Merged availability calendar for a single campsite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampsiteRecord {
    /// Upstream campsite identifier
    pub campsite_id: String,
    /// Display name of the site (e.g. "A035")
    pub site_name: String,
    /// Loop the site belongs to, when reported
    pub campsite_loop: Option<String>,
    /// Site type (e.g. "STANDARD NONELECTRIC"), when reported
    pub campsite_type: Option<String>,
    /// One status per date
    pub availabilities: BTreeMap<NaiveDate, AvailabilityStatus>,
    /// Bookable quantity per date (group sites report more than one)
    pub quantities: BTreeMap<NaiveDate, u32>,
}

impl CampsiteRecord {
    /// Create an empty record
    pub fn new(campsite_id: String, site_name: String, campsite_loop: Option<String>) -> Self {
        Self {
            campsite_id,
            site_name,
            campsite_loop,
            campsite_type: None,
            availabilities: BTreeMap::new(),
            quantities: BTreeMap::new(),
        }
    }
}

/// Exactly one record per campsite id, ordered by id
pub type MergedCalendar = BTreeMap<String, CampsiteRecord>;

/// One (site, date) projection of the merged calendar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Display name of the site
    pub site_name: String,
    /// Calendar date
    pub date: NaiveDate,
    /// Status on that date
    pub status: AvailabilityStatus,
    /// Reported quantity, 0 when the source gave none
    pub quantity: u32,
    /// Upstream campsite identifier
    pub campsite_id: String,
}

/// Inclusive date window. A missing bound means unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    /// First date, inclusive
    pub start: Option<NaiveDate>,
    /// Last date, inclusive
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// Create a window from two optional bounds
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls inside the window, bounds included
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// A calendar month, the unit of upstream availability queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthToken {
    year: i32,
    month: u32,
}

impl MonthToken {
    /// Build a token, returning `None` for a month outside 1..=12 or a year
    /// chrono cannot represent
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse `YYYY-MM` or a full `YYYY-MM-DD` date
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(Self::from_date(date));
        }
        let (year, month) = raw.split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    /// Calendar year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1..=12
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following month, wrapping December into January of the next year
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        // validated on construction; only `next` past the last year can miss
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// `start_date` query value expected by the monthly availability endpoint
    pub fn start_date_param(&self) -> String {
        format!("{}T00:00:00.000Z", self.first_day().format("%Y-%m-%d"))
    }

    /// Whether `date` falls in this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Custom error type for engine runs
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Every monthly fetch failed or returned no sites
    #[error("No availability data for campground {campground_id} in months {months}")]
    TotalDataUnavailable {
        /// Campground that was queried
        campground_id: String,
        /// Months that were requested, comma separated
        months: String,
    },
}

impl actix_web::ResponseError for EngineError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            EngineError::TotalDataUnavailable { .. } => actix_web::http::StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            EngineError::TotalDataUnavailable { .. } => {
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "total_data_unavailable",
                    "message": self.to_string()
                }))
            }
        }
    }
}
