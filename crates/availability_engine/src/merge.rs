use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::availability_types::{
    AvailabilityStatus, CampsiteRecord, EngineError, MergedCalendar, MonthToken,
};
use crate::dates::parse_date;
use crate::run_context::RunContext;
use crate::source::{AvailabilitySource, MonthlyAvailability};

/// Result of one monthly fetch; `None` means the month contributes nothing
#[derive(Debug, Clone)]
pub struct MonthResult {
    /// Requested month
    pub month: MonthToken,
    /// Parsed payload, absent on failure
    pub payload: Option<MonthlyAvailability>,
}

impl MonthResult {
    /// Whether this month produced at least one campsite
    pub fn has_sites(&self) -> bool {
        self.payload
            .as_ref()
            .is_some_and(|payload| !payload.campsites.is_empty())
    }
}

/// Issue one monthly fetch per month and await them together.
///
/// Results come back in the order of `months`; a failed month never cancels
/// its siblings.
pub async fn fetch_months(
    source: &dyn AvailabilitySource,
    ctx: &RunContext,
    campground_id: &str,
    months: &[MonthToken],
) -> Vec<MonthResult> {
    let fetches = months.iter().map(|&month| async move {
        MonthResult {
            month,
            payload: source
                .fetch_monthly_availability(ctx, campground_id, month)
                .await,
        }
    });

    join_all(fetches).await
}

/// Fold monthly payloads into one calendar, in the order given.
///
/// Dates outside the requested months are dropped. Should two payloads
/// report the same (site, date), the later one wins.
pub fn merge_months(
    results: &[MonthResult],
    requested: &[MonthToken],
    ctx: &RunContext,
) -> MergedCalendar {
    let mut calendar = MergedCalendar::new();

    for result in results {
        let Some(ref payload) = result.payload else {
            ctx.note(format!("Month {} contributed no data (fetch failed)", result.month));
            continue;
        };
        if payload.campsites.is_empty() {
            ctx.note(format!("Month {} returned no campsites", result.month));
            continue;
        }

        let mut dropped = 0usize;

        for (campsite_id, site) in &payload.campsites {
            let record = calendar.entry(campsite_id.clone()).or_insert_with(|| {
                CampsiteRecord::new(
                    campsite_id.clone(),
                    site.site.clone().unwrap_or_else(|| campsite_id.clone()),
                    site.campsite_loop.clone(),
                )
            });
            if record.campsite_loop.is_none() {
                record.campsite_loop = site.campsite_loop.clone();
            }
            if record.campsite_type.is_none() {
                record.campsite_type = site.campsite_type.clone();
            }

            for (date_key, raw_status) in &site.availabilities {
                let Some(date) = parse_date(date_key) else {
                    warn!("Failed to parse date: {}", date_key);
                    continue;
                };
                if !requested.iter().any(|month| month.contains(date)) {
                    dropped += 1;
                    continue;
                }
                record
                    .availabilities
                    .insert(date, AvailabilityStatus::from_raw(raw_status));
            }

            for (date_key, quantity) in &site.quantities {
                if let Some(date) = parse_date(date_key) {
                    if requested.iter().any(|month| month.contains(date)) {
                        record.quantities.insert(date, *quantity);
                    }
                }
            }
        }

        if dropped > 0 {
            warn!(
                "Dropped {} dates outside the requested months from {}",
                dropped, result.month
            );
            ctx.note(format!(
                "Month {} reported {} dates outside the requested months",
                result.month, dropped
            ));
        }

        debug!(
            "Merged month {} ({} campsites)",
            result.month,
            payload.campsites.len()
        );
    }

    calendar
}

/// Merge, failing only when no month produced a single campsite
pub fn merge_or_fail(
    campground_id: &str,
    results: &[MonthResult],
    requested: &[MonthToken],
    ctx: &RunContext,
) -> Result<MergedCalendar, EngineError> {
    let calendar = merge_months(results, requested, ctx);

    if calendar.is_empty() && !results.iter().any(MonthResult::has_sites) {
        let months = requested
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(EngineError::TotalDataUnavailable {
            campground_id: campground_id.to_string(),
            months,
        });
    }

    info!(
        "Merged {} campsites from {}/{} months for campground {}",
        calendar.len(),
        results.iter().filter(|result| result.has_sites()).count(),
        results.len(),
        campground_id
    );

    Ok(calendar)
}
