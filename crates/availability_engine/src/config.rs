use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::availability_types::AvailabilityStatus;

/// Default recreation.gov internal API root
pub const DEFAULT_REC_GOV_BASE_URL: &str = "https://www.recreation.gov/api";

/// Default RIDB API root
pub const DEFAULT_RIDB_BASE_URL: &str = "https://ridb.recreation.gov/api/v1";

/// Maximum number of campsites that get a detail fetch per run
pub const DEFAULT_DETAIL_FETCH_CAP: usize = 50;

/// Process-wide engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// RIDB API key (optional, sent as the `apikey` header)
    pub ridb_api_key: Option<String>,

    /// Base URL for the recreation.gov internal API
    pub rec_gov_base_url: String,

    /// Base URL for the RIDB API
    pub ridb_base_url: String,

    /// Cap on detail fetches per run (default: 50)
    pub detail_fetch_cap: usize,

    /// Per-request timeout (default: 30 seconds)
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ridb_api_key: None,
            rec_gov_base_url: DEFAULT_REC_GOV_BASE_URL.to_string(),
            ridb_base_url: DEFAULT_RIDB_BASE_URL.to_string(),
            detail_fetch_cap: DEFAULT_DETAIL_FETCH_CAP,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Build the configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ridb_api_key: std::env::var("RECREATION_GOV_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            rec_gov_base_url: std::env::var("REC_GOV_BASE_URL")
                .unwrap_or(defaults.rec_gov_base_url),
            ridb_base_url: std::env::var("RIDB_BASE_URL").unwrap_or(defaults.ridb_base_url),
            detail_fetch_cap: env_number("DETAIL_FETCH_CAP", defaults.detail_fetch_cap),
            request_timeout: Duration::from_secs(env_number(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        }
    }
}

fn env_number<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}={:?}, using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Which statuses end up in the displayed rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Every status
    All,
    /// Only `Available`
    #[default]
    Available,
    /// `Available`, `NotReservable` and `Open`
    Bookable,
}

impl StatusFilter {
    /// Status predicate handed to the filter projection
    pub fn matches(&self, status: AvailabilityStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Available => status == AvailabilityStatus::Available,
            StatusFilter::Bookable => status.is_bookable(),
        }
    }
}

/// Primary ordering of the displayed rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Natural site order, then date
    #[default]
    Site,
    /// Date, then natural site order
    Date,
}

/// Policy for the secondary campsite detail fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPolicy {
    /// Whether to fetch campsite details at all
    pub fetch_details: bool,
    /// Fetch every site named in the filter regardless of status
    pub fetch_all_filtered: bool,
    /// Only `Available` sites qualify (otherwise walk-up and open too)
    pub include_available_only: bool,
}

/// Everything one run of the engine needs from its caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Public campground identifier
    pub campground_id: String,
    /// Raw window start (`YYYY-MM-DD`), may be empty
    pub filter_start: Option<String>,
    /// Raw window end (`YYYY-MM-DD`), may be empty
    pub filter_end: Option<String>,
    /// Window length used when no bound is given
    pub default_duration_days: Option<i64>,
    /// Month to query when the window has no start (`YYYY-MM`)
    pub anchor_month: Option<String>,
    /// Raw site names to restrict to, empty for no restriction
    pub site_filter: Vec<String>,
    /// Which statuses appear in the displayed rows
    pub status_filter: StatusFilter,
    /// Primary row ordering
    pub sort_key: SortKey,
    /// Detail fetch policy
    pub detail_policy: DetailPolicy,
    /// Whether to fetch recreation-area details, events and media
    pub include_rec_area: bool,
    /// Overrides "today" for date defaults
    pub today: Option<NaiveDate>,
}

impl RunConfig {
    /// Minimal config for a campground, everything else defaulted
    pub fn for_campground(campground_id: impl Into<String>) -> Self {
        Self {
            campground_id: campground_id.into(),
            ..Self::default()
        }
    }
}
