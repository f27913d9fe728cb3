//! Campground → facility / recreation-area identifier resolution.
//!
//! Resolution is a small state machine:
//!
//! ```text
//! Unresolved ──metadata──▶ IdFound | IncompleteData | FetchFailed
//! IncompleteData | FetchFailed ──facility details──▶ IdFound
//! ```
//!
//! No other transition is permitted and no step ever fails the run.

use serde::Serialize;
use tracing::{info, warn};

use crate::run_context::RunContext;
use crate::source::{AvailabilitySource, CampgroundMetadata, FacilityDetails};

/// Outcome of identifier resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    /// Metadata has not been consulted yet
    Unresolved,
    /// Recreation area id is known
    IdFound,
    /// Metadata arrived but without a recreation area id
    IncompleteData,
    /// Metadata could not be fetched at all
    FetchFailed,
}

/// Identifiers for one campground
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierBundle {
    /// Public campground id
    pub campground_id: String,
    /// Facility id used by RIDB
    pub facility_id: String,
    /// Parent recreation area, when known
    pub rec_area_id: Option<String>,
    /// Where the bundle is in the resolution state machine
    pub resolution_status: ResolutionStatus,
}

impl IdentifierBundle {
    /// Fresh bundle; the facility id defaults to the campground id
    pub fn unresolved(campground_id: &str) -> Self {
        Self {
            campground_id: campground_id.to_string(),
            facility_id: campground_id.to_string(),
            rec_area_id: None,
            resolution_status: ResolutionStatus::Unresolved,
        }
    }

    /// Apply the campground metadata lookup (first step)
    pub fn apply_metadata(&mut self, metadata: Option<&CampgroundMetadata>) {
        if self.resolution_status != ResolutionStatus::Unresolved {
            return;
        }

        match metadata {
            Some(metadata) => {
                if let Some(ref facility_id) = metadata.facility_id {
                    self.facility_id = facility_id.clone();
                }
                match metadata.parent_rec_area_id {
                    Some(ref rec_area_id) => {
                        self.rec_area_id = Some(rec_area_id.clone());
                        self.resolution_status = ResolutionStatus::IdFound;
                    }
                    None => self.resolution_status = ResolutionStatus::IncompleteData,
                }
            }
            None => self.resolution_status = ResolutionStatus::FetchFailed,
        }
    }

    /// Whether the second-chance lookup may still change this bundle
    pub fn needs_second_chance(&self) -> bool {
        self.rec_area_id.is_none()
            && matches!(
                self.resolution_status,
                ResolutionStatus::IncompleteData | ResolutionStatus::FetchFailed
            )
    }

    /// Apply the facility-details lookup (second step).
    ///
    /// Returns `true` when the bundle was upgraded to `IdFound`.
    pub fn apply_facility_details(&mut self, facility: Option<&FacilityDetails>) -> bool {
        if !self.needs_second_chance() {
            return false;
        }

        match facility.and_then(FacilityDetails::rec_area_id) {
            Some(rec_area_id) => {
                self.rec_area_id = Some(rec_area_id);
                self.resolution_status = ResolutionStatus::IdFound;
                true
            }
            None => false,
        }
    }
}

/// Resolve identifiers from campground metadata (first step only).
///
/// The second-chance step reuses the facility details fetched in the main
/// fan-out, see [`IdentifierBundle::apply_facility_details`].
pub async fn resolve_identifiers(
    source: &dyn AvailabilitySource,
    ctx: &RunContext,
    campground_id: &str,
) -> IdentifierBundle {
    let metadata = source.fetch_campground_metadata(ctx, campground_id).await;

    let mut bundle = IdentifierBundle::unresolved(campground_id);
    bundle.apply_metadata(metadata.as_ref());

    match bundle.resolution_status {
        ResolutionStatus::IdFound => info!(
            "Resolved campground {} to facility {} in rec area {}",
            campground_id,
            bundle.facility_id,
            bundle.rec_area_id.as_deref().unwrap_or_default()
        ),
        status => {
            warn!(
                "Campground {} resolved without rec area ({:?})",
                campground_id, status
            );
            ctx.note(format!(
                "Recreation area unresolved for campground {} ({:?})",
                campground_id, status
            ));
        }
    }

    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RecAreaRef;

    fn metadata(facility_id: Option<&str>, rec_area_id: Option<&str>) -> CampgroundMetadata {
        CampgroundMetadata {
            facility_id: facility_id.map(str::to_string),
            parent_rec_area_id: rec_area_id.map(str::to_string),
            facility_name: None,
        }
    }

    #[test]
    fn test_metadata_with_rec_area_is_found() {
        let mut bundle = IdentifierBundle::unresolved("232447");
        bundle.apply_metadata(Some(&metadata(Some("F1"), Some("2991"))));

        assert_eq!(bundle.resolution_status, ResolutionStatus::IdFound);
        assert_eq!(bundle.facility_id, "F1");
        assert_eq!(bundle.rec_area_id.as_deref(), Some("2991"));
        assert!(!bundle.needs_second_chance());
    }

    #[test]
    fn test_metadata_without_rec_area_is_incomplete() {
        let mut bundle = IdentifierBundle::unresolved("232447");
        bundle.apply_metadata(Some(&metadata(None, None)));

        assert_eq!(bundle.resolution_status, ResolutionStatus::IncompleteData);
        assert_eq!(bundle.facility_id, "232447");
        assert!(bundle.needs_second_chance());
    }

    #[test]
    fn test_missing_metadata_is_fetch_failed() {
        let mut bundle = IdentifierBundle::unresolved("232447");
        bundle.apply_metadata(None);

        assert_eq!(bundle.resolution_status, ResolutionStatus::FetchFailed);
        assert_eq!(bundle.facility_id, "232447");
        assert!(bundle.rec_area_id.is_none());
    }

    #[test]
    fn test_second_chance_upgrades_from_nested_reference() {
        let mut bundle = IdentifierBundle::unresolved("232447");
        bundle.apply_metadata(None);

        let facility = FacilityDetails {
            rec_areas: vec![RecAreaRef {
                rec_area_id: Some("2991".to_string()),
                rec_area_name: None,
            }],
            ..FacilityDetails::default()
        };

        assert!(bundle.apply_facility_details(Some(&facility)));
        assert_eq!(bundle.resolution_status, ResolutionStatus::IdFound);
        assert_eq!(bundle.rec_area_id.as_deref(), Some("2991"));

        // Only one upgrade is permitted
        assert!(!bundle.apply_facility_details(Some(&facility)));
    }

    #[test]
    fn test_second_chance_without_data_keeps_status() {
        let mut bundle = IdentifierBundle::unresolved("232447");
        bundle.apply_metadata(Some(&metadata(Some("F1"), None)));

        assert!(!bundle.apply_facility_details(None));
        assert!(!bundle.apply_facility_details(Some(&FacilityDetails::default())));
        assert_eq!(bundle.resolution_status, ResolutionStatus::IncompleteData);
    }

    #[test]
    fn test_metadata_applies_only_once() {
        let mut bundle = IdentifierBundle::unresolved("232447");
        bundle.apply_metadata(None);
        bundle.apply_metadata(Some(&metadata(Some("F1"), Some("2991"))));

        assert_eq!(bundle.resolution_status, ResolutionStatus::FetchFailed);
    }
}
