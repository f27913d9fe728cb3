use std::collections::{HashMap, HashSet};

use crate::availability_types::{AvailabilityStatus, DateWindow, MergedCalendar, Row};
use crate::config::SortKey;
use crate::sort::sort_rows;

/// Canonical form used to compare site names.
///
/// Purely numeric names lose their leading zeros (`"007"` ≡ `"7"`); anything
/// else is case-folded and otherwise compared verbatim (`"A07"` ≠ `"A7"`).
pub fn normalize_site_name(name: &str) -> String {
    let name = name.trim();
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
        let stripped = name.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        name.to_lowercase()
    }
}

/// Normalized site name → campsite id over the whole calendar
pub fn site_lookup(calendar: &MergedCalendar) -> HashMap<String, String> {
    calendar
        .values()
        .map(|record| {
            (
                normalize_site_name(&record.site_name),
                record.campsite_id.clone(),
            )
        })
        .collect()
}

/// Project the calendar into sorted rows.
///
/// A (site, date, status) triple is kept when the date is inside `window`,
/// the site is named in `site_filter` (or the filter is empty), and the
/// status satisfies `predicate`.
pub fn filter_rows<P>(
    calendar: &MergedCalendar,
    window: &DateWindow,
    site_filter: &[String],
    sort_key: SortKey,
    predicate: P,
) -> Vec<Row>
where
    P: Fn(AvailabilityStatus) -> bool,
{
    let wanted: HashSet<String> = site_filter
        .iter()
        .map(|name| normalize_site_name(name))
        .filter(|name| !name.is_empty())
        .collect();

    let mut rows = Vec::new();

    for record in calendar.values() {
        if !wanted.is_empty() && !wanted.contains(&normalize_site_name(&record.site_name)) {
            continue;
        }

        for (date, status) in &record.availabilities {
            if !window.contains(*date) || !predicate(*status) {
                continue;
            }
            rows.push(Row {
                site_name: record.site_name.clone(),
                date: *date,
                status: *status,
                quantity: record.quantities.get(date).copied().unwrap_or(0),
                campsite_id: record.campsite_id.clone(),
            });
        }
    }

    sort_rows(&mut rows, sort_key);
    rows
}
