use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::availability_types::{AvailabilityStatus, MergedCalendar, Row};
use crate::config::DetailPolicy;
use crate::filter::{normalize_site_name, site_lookup};
use crate::run_context::RunContext;
use crate::sort::site_sort_key;

/// Sites chosen for the rich detail fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailSelection {
    /// Campsite ids, ordered by the numeric part of the site name
    pub campsite_ids: Vec<String>,
    /// Whether candidates were dropped to respect the cap
    pub capped: bool,
    /// Number of candidates before capping
    pub candidates: usize,
    /// Requested site names that matched no campsite
    pub unresolved: Vec<String>,
}

/// Decide which campsites get a detail fetch.
///
/// With `fetch_all_filtered` and a non-empty site filter every named site is
/// selected regardless of status. Otherwise a site qualifies when one of its
/// rows is `Available`, or walk-up/open unless `include_available_only`.
pub fn select_detail_fetches(
    policy: &DetailPolicy,
    site_filter: &[String],
    rows: &[Row],
    calendar: &MergedCalendar,
    cap: usize,
    ctx: &RunContext,
) -> DetailSelection {
    let mut unresolved = Vec::new();
    let mut seen = HashSet::new();
    let mut candidates: Vec<(u64, String)> = Vec::new();

    if policy.fetch_all_filtered && !site_filter.is_empty() {
        let lookup = site_lookup(calendar);
        for name in site_filter {
            match lookup.get(&normalize_site_name(name)) {
                Some(campsite_id) => {
                    if seen.insert(campsite_id.clone()) {
                        let site_name = calendar
                            .get(campsite_id)
                            .map_or(name.as_str(), |record| record.site_name.as_str());
                        candidates.push((site_sort_key(site_name).1, campsite_id.clone()));
                    }
                }
                None => {
                    warn!("Requested site {} not found in calendar, skipping", name);
                    ctx.note(format!("Requested site {} not found for detail fetch", name));
                    unresolved.push(name.clone());
                }
            }
        }
    } else {
        for row in rows {
            let qualifies = row.status == AvailabilityStatus::Available
                || (!policy.include_available_only
                    && matches!(
                        row.status,
                        AvailabilityStatus::NotReservable | AvailabilityStatus::Open
                    ));
            if qualifies && seen.insert(row.campsite_id.clone()) {
                candidates.push((site_sort_key(&row.site_name).1, row.campsite_id.clone()));
            }
        }
    }

    // stable: equal numbers keep insertion order
    candidates.sort_by_key(|(number, _)| *number);

    let total = candidates.len();
    let capped = total > cap;
    if capped {
        warn!("Detail fetch capped at {} of {} sites", cap, total);
        ctx.note(format!(
            "Detail fetch limited to {} of {} eligible sites",
            cap, total
        ));
    }

    DetailSelection {
        campsite_ids: candidates
            .into_iter()
            .take(cap)
            .map(|(_, campsite_id)| campsite_id)
            .collect(),
        capped,
        candidates: total,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability_types::CampsiteRecord;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn row(campsite_id: &str, site: &str, status: AvailabilityStatus) -> Row {
        Row {
            site_name: site.to_string(),
            date: day(1),
            status,
            quantity: 1,
            campsite_id: campsite_id.to_string(),
        }
    }

    fn calendar(sites: &[(&str, &str)]) -> MergedCalendar {
        sites
            .iter()
            .map(|(id, name)| {
                let mut record = CampsiteRecord::new(id.to_string(), name.to_string(), None);
                record
                    .availabilities
                    .insert(day(1), AvailabilityStatus::Reserved);
                (id.to_string(), record)
            })
            .collect()
    }

    #[test]
    fn test_fetch_all_filtered_ignores_status_and_drops_unknown_names() {
        let ctx = RunContext::new();
        let calendar = calendar(&[("101", "A1"), ("103", "A3")]);
        let policy = DetailPolicy {
            fetch_details: true,
            fetch_all_filtered: true,
            include_available_only: true,
        };

        let selection = select_detail_fetches(
            &policy,
            &["A1".to_string(), "A2".to_string()],
            &[],
            &calendar,
            50,
            &ctx,
        );

        assert_eq!(selection.campsite_ids, vec!["101".to_string()]);
        assert_eq!(selection.unresolved, vec!["A2".to_string()]);
        assert!(!selection.capped);
        assert_eq!(ctx.notes().len(), 1);
    }

    #[test]
    fn test_status_policy() {
        let ctx = RunContext::new();
        let rows = vec![
            row("1", "A1", AvailabilityStatus::Reserved),
            row("2", "A2", AvailabilityStatus::NotReservable),
            row("3", "A3", AvailabilityStatus::Available),
            row("4", "A4", AvailabilityStatus::Open),
            row("3", "A3", AvailabilityStatus::Available),
        ];

        let broad = DetailPolicy {
            fetch_details: true,
            ..DetailPolicy::default()
        };
        let selection = select_detail_fetches(&broad, &[], &rows, &MergedCalendar::new(), 50, &ctx);
        assert_eq!(selection.campsite_ids, vec!["2", "3", "4"]);

        let narrow = DetailPolicy {
            fetch_details: true,
            include_available_only: true,
            ..DetailPolicy::default()
        };
        let selection =
            select_detail_fetches(&narrow, &[], &rows, &MergedCalendar::new(), 50, &ctx);
        assert_eq!(selection.campsite_ids, vec!["3"]);
    }

    #[test]
    fn test_cap_keeps_lowest_site_numbers() {
        let ctx = RunContext::new();
        // Insert in descending order so the sort has work to do
        let rows: Vec<Row> = (1..=60)
            .rev()
            .map(|n| row(&format!("id-{}", n), &format!("{:03}", n), AvailabilityStatus::Available))
            .collect();

        let policy = DetailPolicy {
            fetch_details: true,
            ..DetailPolicy::default()
        };
        let selection =
            select_detail_fetches(&policy, &[], &rows, &MergedCalendar::new(), 50, &ctx);

        assert!(selection.capped);
        assert_eq!(selection.candidates, 60);
        assert_eq!(selection.campsite_ids.len(), 50);
        assert_eq!(selection.campsite_ids.first().map(String::as_str), Some("id-1"));
        assert_eq!(selection.campsite_ids.last().map(String::as_str), Some("id-50"));
    }

    #[test]
    fn test_numeric_ties_keep_insertion_order() {
        let ctx = RunContext::new();
        let rows = vec![
            row("b", "B5", AvailabilityStatus::Available),
            row("a", "A5", AvailabilityStatus::Available),
            row("c", "C1", AvailabilityStatus::Available),
        ];
        let policy = DetailPolicy::default();
        let selection =
            select_detail_fetches(&policy, &[], &rows, &MergedCalendar::new(), 50, &ctx);

        assert_eq!(selection.campsite_ids, vec!["c", "b", "a"]);
    }
}
