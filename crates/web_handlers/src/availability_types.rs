use availability_engine::{DetailPolicy, EngineError, RunConfig, SortKey, StatusFilter};
use serde::Deserialize;
use validator::Validate;

/// Query parameters for `GET /api/availability/{campground_id}`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AvailabilityQuery {
    /// Window start (`YYYY-MM-DD`)
    pub start: Option<String>,

    /// Window end (`YYYY-MM-DD`)
    pub end: Option<String>,

    /// Window length when only one bound (or none) is given
    #[validate(range(min = 1, max = 365, message = "Duration must be between 1 and 365 days"))]
    pub duration: Option<i64>,

    /// Month to query when no start is given (`YYYY-MM`)
    pub month: Option<String>,

    /// Comma-separated site names
    pub sites: Option<String>,

    /// Which statuses to list: `all`, `available` or `bookable`
    pub status: Option<StatusFilter>,

    /// Primary ordering: `site` or `date`
    pub sort: Option<SortKey>,

    /// Fetch campsite details
    #[serde(default)]
    pub details: bool,

    /// Fetch details for every named site regardless of status
    #[serde(default)]
    pub fetch_all_filtered: bool,

    /// Only available sites qualify for details
    #[serde(default)]
    pub available_only: bool,

    /// Fetch recreation area details, events and media
    #[serde(default)]
    pub rec_area: bool,
}

impl AvailabilityQuery {
    /// Build the engine's run configuration for a campground
    pub fn into_run_config(self, campground_id: &str) -> RunConfig {
        let site_filter = self
            .sites
            .as_deref()
            .map(|sites| {
                sites
                    .split(',')
                    .map(str::trim)
                    .filter(|site| !site.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        RunConfig {
            campground_id: campground_id.to_string(),
            filter_start: self.start,
            filter_end: self.end,
            default_duration_days: self.duration,
            anchor_month: self.month,
            site_filter,
            status_filter: self.status.unwrap_or_default(),
            sort_key: self.sort.unwrap_or_default(),
            detail_policy: DetailPolicy {
                fetch_details: self.details,
                fetch_all_filtered: self.fetch_all_filtered,
                include_available_only: self.available_only,
            },
            include_rec_area: self.rec_area,
            today: None,
        }
    }
}

/// Campground path segment
#[derive(Debug, Validate)]
pub struct CampgroundPath {
    /// Campground id, trimmed
    #[validate(length(min = 1, message = "Campground ID is required"))]
    pub campground_id: String,
}

impl CampgroundPath {
    /// Wrap a raw path segment
    pub fn new(raw: &str) -> Self {
        Self {
            campground_id: raw.trim().to_string(),
        }
    }
}

/// Custom error type for availability requests
#[derive(thiserror::Error, Debug)]
pub enum AvailabilityError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Engine run failed
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl actix_web::ResponseError for AvailabilityError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            AvailabilityError::Validation(_) => actix_web::http::StatusCode::BAD_REQUEST,
            AvailabilityError::Engine(e) => e.status_code(),
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            AvailabilityError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            AvailabilityError::Engine(e) => e.error_response(),
        }
    }
}
