use std::collections::{BTreeMap, HashMap};

use futures_util::future::join_all;
use serde_json::Value;

use crate::run_context::RunContext;
use crate::source::AvailabilitySource;

/// Per-run campsite detail cache.
///
/// Failed fetches are cached too, so a campsite is requested at most once per
/// run. Nothing is evicted; the detail selector's cap bounds the size.
#[derive(Debug, Default)]
pub struct DetailCache {
    entries: HashMap<String, Option<Value>>,
}

impl DetailCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of campsites requested so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been requested yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch details for `campsite_ids`, concurrently for anything not cached.
    ///
    /// Returns the successful payloads keyed by campsite id.
    pub async fn fetch_all(
        &mut self,
        source: &dyn AvailabilitySource,
        ctx: &RunContext,
        facility_id: &str,
        campsite_ids: &[String],
    ) -> BTreeMap<String, Value> {
        let mut missing: Vec<&str> = campsite_ids
            .iter()
            .map(String::as_str)
            .filter(|campsite_id| !self.entries.contains_key(*campsite_id))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        let fetched = join_all(missing.into_iter().map(|campsite_id| async move {
            let details = source
                .fetch_campsite_details(ctx, facility_id, campsite_id)
                .await;
            (campsite_id.to_string(), details)
        }))
        .await;

        self.entries.extend(fetched);

        campsite_ids
            .iter()
            .filter_map(|campsite_id| {
                self.entries
                    .get(campsite_id)
                    .cloned()
                    .flatten()
                    .map(|details| (campsite_id.clone(), details))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability_types::MonthToken;
    use crate::source::{CampgroundMetadata, FacilityDetails, MonthlyAvailability};
    use std::sync::Mutex;

    /// Counts campsite detail requests; `missing` ids always fail
    #[derive(Default)]
    struct CountingSource {
        missing: Vec<String>,
        requests: Mutex<HashMap<String, usize>>,
    }

    impl CountingSource {
        fn requests_for(&self, campsite_id: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .get(campsite_id)
                .copied()
                .unwrap_or(0)
        }

        fn total_requests(&self) -> usize {
            self.requests.lock().unwrap().values().sum()
        }
    }

    #[async_trait::async_trait]
    impl AvailabilitySource for CountingSource {
        async fn fetch_campground_metadata(
            &self,
            _ctx: &RunContext,
            _campground_id: &str,
        ) -> Option<CampgroundMetadata> {
            None
        }

        async fn fetch_monthly_availability(
            &self,
            _ctx: &RunContext,
            _campground_id: &str,
            _month: MonthToken,
        ) -> Option<MonthlyAvailability> {
            None
        }

        async fn fetch_facility_details(
            &self,
            _ctx: &RunContext,
            _facility_id: &str,
        ) -> Option<FacilityDetails> {
            None
        }

        async fn fetch_rec_area_details(&self, _ctx: &RunContext, _id: &str) -> Option<Value> {
            None
        }

        async fn fetch_rec_area_events(&self, _ctx: &RunContext, _id: &str) -> Option<Vec<Value>> {
            None
        }

        async fn fetch_rec_area_media(&self, _ctx: &RunContext, _id: &str) -> Option<Vec<Value>> {
            None
        }

        async fn fetch_campsite_details(
            &self,
            ctx: &RunContext,
            _facility_id: &str,
            campsite_id: &str,
        ) -> Option<Value> {
            *self
                .requests
                .lock()
                .unwrap()
                .entry(campsite_id.to_string())
                .or_insert(0) += 1;

            let url = format!("mock://campsites/{}", campsite_id);
            if self.missing.iter().any(|id| id == campsite_id) {
                ctx.record_failure("campsite details", &url, Some(404), "Not found");
                return None;
            }
            ctx.record_success("campsite details", &url, 200);
            Some(serde_json::json!({ "CampsiteID": campsite_id }))
        }

        async fn fetch_search_summary(&self, _ctx: &RunContext, _id: &str) -> Option<Value> {
            None
        }
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_repeated_ids_fetch_once() {
        let source = CountingSource::default();
        let ctx = RunContext::new();
        let mut cache = DetailCache::new();

        let details = cache
            .fetch_all(&source, &ctx, "232447", &ids(&["101", "102", "101", "101"]))
            .await;

        assert_eq!(details.len(), 2);
        assert_eq!(details["101"]["CampsiteID"], "101");
        assert_eq!(source.requests_for("101"), 1);
        assert_eq!(source.requests_for("102"), 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(ctx.call_log().len(), 2);
    }

    #[tokio::test]
    async fn test_second_call_reuses_hits_and_failures() {
        let source = CountingSource {
            missing: ids(&["103"]),
            ..CountingSource::default()
        };
        let ctx = RunContext::new();
        let mut cache = DetailCache::new();
        assert!(cache.is_empty());

        let first = cache
            .fetch_all(&source, &ctx, "232447", &ids(&["101", "103"]))
            .await;
        assert_eq!(first.len(), 1);
        assert!(!first.contains_key("103"));

        let second = cache
            .fetch_all(&source, &ctx, "232447", &ids(&["103", "101", "104"]))
            .await;

        assert_eq!(second.len(), 2);
        assert!(second.contains_key("101"));
        assert!(second.contains_key("104"));
        assert_eq!(source.requests_for("101"), 1);
        assert_eq!(source.requests_for("103"), 1);
        assert_eq!(source.requests_for("104"), 1);
        assert_eq!(source.total_requests(), 3);
        assert_eq!(cache.len(), 3);
        assert_eq!(ctx.call_stats(), (2, 1));
    }
}
