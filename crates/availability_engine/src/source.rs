use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::availability_types::MonthToken;
use crate::run_context::RunContext;

/// Upstream operations the engine depends on.
///
/// Implementations never fail past this boundary: every problem becomes
/// `None`, and every call appends exactly one entry to the run's call log.
#[async_trait::async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Campground metadata from the recreation.gov internal API
    async fn fetch_campground_metadata(
        &self,
        ctx: &RunContext,
        campground_id: &str,
    ) -> Option<CampgroundMetadata>;

    /// One month of per-site availability
    async fn fetch_monthly_availability(
        &self,
        ctx: &RunContext,
        campground_id: &str,
        month: MonthToken,
    ) -> Option<MonthlyAvailability>;

    /// Facility record from RIDB
    async fn fetch_facility_details(
        &self,
        ctx: &RunContext,
        facility_id: &str,
    ) -> Option<FacilityDetails>;

    /// Recreation area record from RIDB
    async fn fetch_rec_area_details(&self, ctx: &RunContext, rec_area_id: &str) -> Option<Value>;

    /// Events attached to a recreation area
    async fn fetch_rec_area_events(
        &self,
        ctx: &RunContext,
        rec_area_id: &str,
    ) -> Option<Vec<Value>>;

    /// Media attached to a recreation area
    async fn fetch_rec_area_media(&self, ctx: &RunContext, rec_area_id: &str)
    -> Option<Vec<Value>>;

    /// Rich detail for a single campsite
    async fn fetch_campsite_details(
        &self,
        ctx: &RunContext,
        facility_id: &str,
        campsite_id: &str,
    ) -> Option<Value>;

    /// Search summary (ratings, price range) for a campground
    async fn fetch_search_summary(&self, ctx: &RunContext, campground_id: &str) -> Option<Value>;
}

/// Campground metadata; both ids may be missing on older campgrounds
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CampgroundMetadata {
    /// RIDB facility id
    #[serde(default, deserialize_with = "lenient_id")]
    pub facility_id: Option<String>,

    /// Parent recreation area id
    #[serde(default, deserialize_with = "lenient_id")]
    pub parent_rec_area_id: Option<String>,

    /// Display name
    #[serde(default)]
    pub facility_name: Option<String>,
}

/// Envelope returned by `/camps/campgrounds/{id}`
#[derive(Debug, Deserialize)]
pub struct CampgroundMetadataResponse {
    /// Wrapped metadata
    pub campground: CampgroundMetadata,
}

/// Response structure from the monthly availability endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlyAvailability {
    /// Sites keyed by campsite id
    #[serde(default)]
    pub campsites: HashMap<String, CampsitePayload>,
}

/// Campsite availability data for one month
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampsitePayload {
    /// Site name, e.g. `A001`
    #[serde(default)]
    pub site: Option<String>,

    /// Loop the site belongs to
    #[serde(rename = "loop", default)]
    pub campsite_loop: Option<String>,

    /// Site type, e.g. `STANDARD NONELECTRIC`
    #[serde(default)]
    pub campsite_type: Option<String>,

    /// Raw status keyed by `2025-07-05T00:00:00Z`
    #[serde(default)]
    pub availabilities: HashMap<String, String>,

    /// Remaining quantity keyed like `availabilities`
    #[serde(default)]
    pub quantities: HashMap<String, u32>,
}

/// Facility record from RIDB, only the fields identifier resolution needs
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FacilityDetails {
    /// Facility id
    #[serde(rename = "FacilityID", default, deserialize_with = "lenient_id")]
    pub facility_id: Option<String>,

    /// Facility name
    #[serde(rename = "FacilityName", default)]
    pub facility_name: Option<String>,

    /// Parent recreation area id
    #[serde(rename = "ParentRecAreaID", default, deserialize_with = "lenient_id")]
    pub parent_rec_area_id: Option<String>,

    /// Nested recreation area references
    #[serde(rename = "RECAREA", default)]
    pub rec_areas: Vec<RecAreaRef>,
}

impl FacilityDetails {
    /// Parent recreation area, falling back to the first nested reference
    pub fn rec_area_id(&self) -> Option<String> {
        self.parent_rec_area_id.clone().or_else(|| {
            self.rec_areas
                .iter()
                .find_map(|rec_area| rec_area.rec_area_id.clone())
        })
    }
}

/// Nested recreation area reference inside a facility record
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecAreaRef {
    /// Recreation area id
    #[serde(rename = "RecAreaID", default, deserialize_with = "lenient_id")]
    pub rec_area_id: Option<String>,

    /// Recreation area name
    #[serde(rename = "RecAreaName", default)]
    pub rec_area_name: Option<String>,
}

/// `RECDATA` list envelope used by RIDB collection endpoints
#[derive(Debug, Deserialize)]
pub struct RecDataResponse {
    /// Records
    #[serde(rename = "RECDATA", default)]
    pub rec_data: Vec<Value>,
}

// Ids arrive as strings, numbers, empty strings or null depending on source.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_rec_area_prefers_parent() {
        let facility: FacilityDetails = serde_json::from_value(serde_json::json!({
            "FacilityID": "232447",
            "ParentRecAreaID": "2991",
            "RECAREA": [{ "RecAreaID": 1234 }]
        }))
        .unwrap();

        assert_eq!(facility.rec_area_id().as_deref(), Some("2991"));
    }

    #[test]
    fn test_facility_rec_area_falls_back_to_nested() {
        let facility: FacilityDetails = serde_json::from_value(serde_json::json!({
            "FacilityID": 232447,
            "ParentRecAreaID": "",
            "RECAREA": [{ "RecAreaName": "No id" }, { "RecAreaID": 1234 }]
        }))
        .unwrap();

        assert_eq!(facility.facility_id.as_deref(), Some("232447"));
        assert_eq!(facility.rec_area_id().as_deref(), Some("1234"));
    }

    #[test]
    fn test_campsite_payload_defaults() {
        let month: MonthlyAvailability = serde_json::from_value(serde_json::json!({
            "campsites": {
                "100": {
                    "site": "A001",
                    "loop": "A",
                    "availabilities": { "2025-07-05T00:00:00Z": "Available" }
                }
            }
        }))
        .unwrap();

        let site = &month.campsites["100"];
        assert_eq!(site.campsite_loop.as_deref(), Some("A"));
        assert!(site.quantities.is_empty());
    }
}
