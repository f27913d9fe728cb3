use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::availability_types::{EngineError, MergedCalendar, MonthToken, Row};
use crate::config::{EngineConfig, RunConfig};
use crate::dates::{DateInputs, NormalizedDates, month_range, normalize_dates};
use crate::detail_cache::DetailCache;
use crate::detail_selector::{DetailSelection, select_detail_fetches};
use crate::filter::filter_rows;
use crate::identifiers::{IdentifierBundle, resolve_identifiers};
use crate::merge::{fetch_months, merge_or_fail};
use crate::rec_gov_client::{RecGovClient, RecGovError};
use crate::run_context::{RunContext, RunReport};
use crate::source::{AvailabilitySource, FacilityDetails};
use crate::summary::StatusSummary;

/// Recreation-area enrichment, each part absent when its fetch failed
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecAreaInfo {
    /// Recreation area id the data was fetched for
    pub rec_area_id: String,
    /// RIDB recreation area record
    pub details: Option<Value>,
    /// Events in the recreation area
    pub events: Option<Vec<Value>>,
    /// Photos and other media
    pub media: Option<Vec<Value>>,
}

/// Everything one run produces
#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    /// Normalized window and anchor month
    pub dates: NormalizedDates,
    /// Months that were queried
    pub months: Vec<MonthToken>,
    /// Resolved identifiers
    pub identifiers: IdentifierBundle,
    /// One record per campsite
    pub calendar: MergedCalendar,
    /// Sorted rows passing the status filter
    pub rows: Vec<Row>,
    /// Counts over every row in the window and site filter
    pub summary: StatusSummary,
    /// Sites chosen for the detail fetch
    pub detail_selection: DetailSelection,
    /// Campsite details keyed by campsite id
    pub campsite_details: BTreeMap<String, Value>,
    /// RIDB facility record
    pub facility: Option<FacilityDetails>,
    /// Recreation area enrichment, when requested and resolvable
    pub rec_area: Option<RecAreaInfo>,
    /// Search summary passed through untouched
    pub search_summary: Option<Value>,
    /// Call log and processing notes
    pub report: RunReport,
}

/// Availability aggregation engine
pub struct AvailabilityEngine {
    source: Arc<dyn AvailabilitySource>,
    config: EngineConfig,
}

impl AvailabilityEngine {
    /// Create an engine over any availability source
    pub fn new(source: Arc<dyn AvailabilitySource>, config: EngineConfig) -> Self {
        Self { source, config }
    }

    /// Create an engine backed by the recreation.gov client
    pub fn with_rec_gov(config: EngineConfig) -> Result<Self, RecGovError> {
        let client = RecGovClient::new(&config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the whole pipeline for one campground.
    ///
    /// Every upstream failure is absorbed into the result; the only error is
    /// [`EngineError::TotalDataUnavailable`].
    pub async fn aggregate_availability(
        &self,
        run: &RunConfig,
    ) -> Result<AggregationResult, EngineError> {
        let source = self.source.as_ref();
        let ctx = RunContext::new();
        let mut detail_cache = DetailCache::new();
        let today = run.today.unwrap_or_else(|| Utc::now().date_naive());

        info!(
            "Starting availability run {} for campground {}",
            ctx.run_id(),
            run.campground_id
        );

        let dates = normalize_dates(
            DateInputs {
                filter_start: run.filter_start.as_deref(),
                filter_end: run.filter_end.as_deref(),
                default_duration_days: run.default_duration_days,
                anchor_month: run.anchor_month.as_deref(),
            },
            today,
            &ctx,
        );
        let months = month_range(&dates.window, dates.anchor_month);

        // months and search don't depend on identifiers; facility and rec area do
        let resolve_dependent = async {
            let identifiers = resolve_identifiers(source, &ctx, &run.campground_id).await;
            let batch_rec_area_id = if run.include_rec_area {
                identifiers.rec_area_id.clone()
            } else {
                None
            };
            let (facility, rec_area) = futures_util::join!(
                source.fetch_facility_details(&ctx, &identifiers.facility_id),
                fetch_rec_area(source, &ctx, batch_rec_area_id.as_deref()),
            );
            (identifiers, facility, rec_area)
        };

        let (month_results, search_summary, (mut identifiers, facility, mut rec_area)) =
            futures_util::join!(
                fetch_months(source, &ctx, &run.campground_id, &months),
                source.fetch_search_summary(&ctx, &run.campground_id),
                resolve_dependent,
            );

        let calendar = match merge_or_fail(&run.campground_id, &month_results, &months, &ctx) {
            Ok(calendar) => calendar,
            Err(e) => {
                let (succeeded, failed) = ctx.call_stats();
                warn!(
                    "Run {} failed: {} ({} calls ok, {} failed)",
                    ctx.run_id(),
                    e,
                    succeeded,
                    failed
                );
                return Err(e);
            }
        };

        // second chance only matters when rec-area data was asked for
        if run.include_rec_area && identifiers.apply_facility_details(facility.as_ref()) {
            let rec_area_id = identifiers.rec_area_id.as_deref().unwrap_or_default();
            info!(
                "Recovered rec area {} for campground {} from facility details",
                rec_area_id, run.campground_id
            );
            ctx.note(format!(
                "Recreation area {} recovered from facility details",
                rec_area_id
            ));
            rec_area = fetch_rec_area(source, &ctx, identifiers.rec_area_id.as_deref()).await;
        }

        let all_rows = filter_rows(
            &calendar,
            &dates.window,
            &run.site_filter,
            run.sort_key,
            |_| true,
        );
        let rows = filter_rows(
            &calendar,
            &dates.window,
            &run.site_filter,
            run.sort_key,
            |status| run.status_filter.matches(status),
        );
        let summary = StatusSummary::from_rows(&all_rows);

        let (detail_selection, campsite_details) = if run.detail_policy.fetch_details {
            let selection = select_detail_fetches(
                &run.detail_policy,
                &run.site_filter,
                &all_rows,
                &calendar,
                self.config.detail_fetch_cap,
                &ctx,
            );
            let details = detail_cache
                .fetch_all(
                    source,
                    &ctx,
                    &identifiers.facility_id,
                    &selection.campsite_ids,
                )
                .await;
            (selection, details)
        } else {
            (DetailSelection::default(), BTreeMap::new())
        };

        if !detail_cache.is_empty() {
            debug!(
                "Run {} requested details for {} campsites, {} returned",
                ctx.run_id(),
                detail_cache.len(),
                campsite_details.len()
            );
        }

        let report = ctx.into_report();
        info!(
            "Run {} complete: {} campsites, {} rows ({}), {} calls ok, {} failed",
            report.run_id,
            calendar.len(),
            rows.len(),
            summary.compact,
            report.calls_succeeded,
            report.calls_failed
        );

        Ok(AggregationResult {
            dates,
            months,
            identifiers,
            calendar,
            rows,
            summary,
            detail_selection,
            campsite_details,
            facility,
            rec_area,
            search_summary,
            report,
        })
    }
}

/// Fetch details, events and media for a recreation area concurrently
async fn fetch_rec_area(
    source: &dyn AvailabilitySource,
    ctx: &RunContext,
    rec_area_id: Option<&str>,
) -> Option<RecAreaInfo> {
    let rec_area_id = rec_area_id?;

    let (details, events, media) = futures_util::join!(
        source.fetch_rec_area_details(ctx, rec_area_id),
        source.fetch_rec_area_events(ctx, rec_area_id),
        source.fetch_rec_area_media(ctx, rec_area_id),
    );

    Some(RecAreaInfo {
        rec_area_id: rec_area_id.to_string(),
        details,
        events,
        media,
    })
}
