use std::collections::HashMap;

use serde::Serialize;

use crate::availability_types::{AvailabilityStatus, Row};

/// Per-status counts over a set of rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    /// Statuses present, in display priority order
    pub counts: Vec<StatusCount>,
    /// Compact glyph rendering, e.g. `✅3 | 🚶2`
    pub compact: String,
    /// Number of rows counted
    pub total: usize,
}

/// Count for a single status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    /// Status counted
    pub status: AvailabilityStatus,
    /// Number of rows with that status
    pub count: usize,
}

impl StatusSummary {
    /// Count rows by status
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut tally: HashMap<AvailabilityStatus, usize> = HashMap::new();
        for row in rows {
            *tally.entry(row.status).or_insert(0) += 1;
        }

        let counts = AvailabilityStatus::PRIORITY
            .iter()
            .filter_map(|status| {
                tally.get(status).map(|&count| StatusCount {
                    status: *status,
                    count,
                })
            })
            .collect();

        let compact = AvailabilityStatus::COMPACT
            .iter()
            .filter_map(|status| match tally.get(status) {
                Some(&count) if count > 0 => Some(format!("{}{}", status.glyph(), count)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" | ");

        Self {
            counts,
            compact,
            total: rows.len(),
        }
    }

    /// Count for one status, zero when absent
    pub fn count(&self, status: AvailabilityStatus) -> usize {
        self.counts
            .iter()
            .find(|entry| entry.status == status)
            .map_or(0, |entry| entry.count)
    }
}
