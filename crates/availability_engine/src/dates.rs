//! Date window normalization and month fan-out planning.

use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;

use crate::availability_types::{DateWindow, MonthToken};
use crate::run_context::RunContext;

/// Longest window the engine will query, in days, bounds included
pub const MAX_WINDOW_DAYS: i64 = 40;

/// Raw date inputs as they arrive from the caller
#[derive(Debug, Clone, Copy, Default)]
pub struct DateInputs<'a> {
    /// Requested first day, possibly empty
    pub filter_start: Option<&'a str>,
    /// Requested last day, possibly empty
    pub filter_end: Option<&'a str>,
    /// Window length used when neither bound is present
    pub default_duration_days: Option<i64>,
    /// Month to query when the window has no start
    pub anchor_month: Option<&'a str>,
}

/// Concrete window plus the month used when the window has no start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizedDates {
    /// Capped window
    pub window: DateWindow,
    /// Anchor month, defaulted to the current month
    pub anchor_month: MonthToken,
}

/// Resolve raw inputs into a capped window.
///
/// Rules, first match wins:
/// 1. no bounds and a positive duration: `today ..= today + duration`
/// 2. start only: `start ..= start + 39`
/// 3. end only: `end - 39 ..= end`
/// 4. both: kept, but the end is pulled in to `start + 39` when longer
///
/// An explicit bound always wins over the duration. Unparseable bounds are
/// treated as absent and noted on the run context.
pub fn normalize_dates(inputs: DateInputs<'_>, today: NaiveDate, ctx: &RunContext) -> NormalizedDates {
    let start = parse_bound("start", inputs.filter_start, ctx);
    let end = parse_bound("end", inputs.filter_end, ctx);
    let span = TimeDelta::days(MAX_WINDOW_DAYS - 1);

    let window = match (start, end) {
        (None, None) => match inputs.default_duration_days {
            Some(days) if days > 0 => {
                // clamp first; the cap would pull the end in anyway
                let days = days.min(MAX_WINDOW_DAYS - 1);
                DateWindow::new(Some(today), Some(add_days(today, TimeDelta::days(days))))
            }
            _ => DateWindow::default(),
        },
        (Some(start), None) => DateWindow::new(Some(start), Some(add_days(start, span))),
        (None, Some(end)) => DateWindow::new(Some(add_days(end, -span)), Some(end)),
        (Some(start), Some(end)) => cap_window(start, end),
    };

    let anchor_month = match inputs.anchor_month.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => MonthToken::parse(raw).unwrap_or_else(|| {
            ctx.note(format!("Ignoring unparseable anchor month {:?}", raw));
            MonthToken::from_date(today)
        }),
        None => MonthToken::from_date(today),
    };

    NormalizedDates {
        window,
        anchor_month,
    }
}

/// Ordered, duplicate-free months covering the window.
///
/// Seeds with the start's month (or the anchor when there is no start) and
/// walks forward to the end's month inclusive. Always yields at least one month.
pub fn month_range(window: &DateWindow, anchor_month: MonthToken) -> Vec<MonthToken> {
    let seed = window.start.map(MonthToken::from_date).unwrap_or(anchor_month);
    let mut months = vec![seed];

    if let Some(end) = window.end {
        let last = MonthToken::from_date(end);
        let mut current = seed.next();
        while current <= last {
            if !months.contains(&current) {
                months.push(current);
            }
            current = current.next();
        }
    }

    months
}

fn cap_window(start: NaiveDate, end: NaiveDate) -> DateWindow {
    let span = TimeDelta::days(MAX_WINDOW_DAYS - 1);
    if (end - start).num_days() + 1 > MAX_WINDOW_DAYS {
        DateWindow::new(Some(start), Some(add_days(start, span)))
    } else {
        DateWindow::new(Some(start), Some(end))
    }
}

fn add_days(date: NaiveDate, delta: TimeDelta) -> NaiveDate {
    date.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

fn parse_bound(label: &str, raw: Option<&str>, ctx: &RunContext) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match parse_date(raw) {
        Some(date) => Some(date),
        None => {
            ctx.note(format!("Ignoring unparseable {} date {:?}", label, raw));
            None
        }
    }
}

/// Parse `YYYY-MM-DD`, ignoring any time-of-day suffix
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn normalize(start: Option<&str>, end: Option<&str>, duration: Option<i64>) -> DateWindow {
        let ctx = RunContext::new();
        let inputs = DateInputs {
            filter_start: start,
            filter_end: end,
            default_duration_days: duration,
            anchor_month: None,
        };
        normalize_dates(inputs, date("2025-07-15"), &ctx).window
    }

    #[test]
    fn test_duration_only_starts_today() {
        let window = normalize(None, None, Some(7));
        assert_eq!(window.start, Some(date("2025-07-15")));
        assert_eq!(window.end, Some(date("2025-07-22")));
    }

    #[test]
    fn test_long_duration_is_capped() {
        let window = normalize(None, None, Some(90));
        assert_eq!(window.end, Some(date("2025-08-23")));
    }

    #[test]
    fn test_huge_duration_is_capped_without_overflow() {
        let window = normalize(None, None, Some(i64::MAX));
        assert_eq!(window.start, Some(date("2025-07-15")));
        assert_eq!(window.end, Some(date("2025-08-23")));
    }

    #[test]
    fn test_start_only_gets_forty_day_window() {
        let window = normalize(Some("2025-07-01"), None, Some(3));
        assert_eq!(window.start, Some(date("2025-07-01")));
        assert_eq!(window.end, Some(date("2025-08-09")));
    }

    #[test]
    fn test_end_only_reaches_back() {
        let window = normalize(None, Some("2025-08-09"), None);
        assert_eq!(window.start, Some(date("2025-07-01")));
    }

    #[test]
    fn test_both_bounds_capped_at_forty_days() {
        let window = normalize(Some("2025-07-01"), Some("2025-09-30"), None);
        assert_eq!(window.end, Some(date("2025-08-09")));

        let kept = normalize(Some("2025-07-01"), Some("2025-08-09"), None);
        assert_eq!(kept.end, Some(date("2025-08-09")));
    }

    #[test]
    fn test_window_never_exceeds_limit() {
        let inputs = [
            (None, None, Some(1)),
            (None, None, Some(400)),
            (None, None, Some(i64::MAX)),
            (Some("2025-01-31"), None, None),
            (None, Some("2025-03-01"), None),
            (Some("2024-02-01"), Some("2024-12-31"), None),
            (Some("2025-12-20"), Some("2026-01-05"), Some(10)),
        ];
        for (start, end, duration) in inputs {
            let window = normalize(start, end, duration);
            let (start, end) = (window.start.unwrap(), window.end.unwrap());
            assert!((end - start).num_days() <= MAX_WINDOW_DAYS - 1);
        }
    }

    #[test]
    fn test_no_inputs_leaves_window_open_and_defaults_anchor() {
        let ctx = RunContext::new();
        let normalized = normalize_dates(DateInputs::default(), date("2025-07-15"), &ctx);
        assert_eq!(normalized.window, DateWindow::default());
        assert_eq!(normalized.anchor_month.to_string(), "2025-07");
    }

    #[test]
    fn test_garbage_bound_is_noted_and_ignored() {
        let ctx = RunContext::new();
        let inputs = DateInputs {
            filter_start: Some("not-a-date"),
            filter_end: Some("2025-07-10"),
            ..DateInputs::default()
        };
        let normalized = normalize_dates(inputs, date("2025-07-15"), &ctx);
        assert_eq!(normalized.window.start, Some(date("2025-06-01")));
        assert_eq!(ctx.notes().len(), 1);
    }

    #[test]
    fn test_out_of_range_anchor_is_noted_and_defaulted() {
        let ctx = RunContext::new();
        let inputs = DateInputs {
            anchor_month: Some("300000-01"),
            ..DateInputs::default()
        };
        let normalized = normalize_dates(inputs, date("2025-07-15"), &ctx);

        assert_eq!(normalized.anchor_month.to_string(), "2025-07");
        assert_eq!(
            normalized.anchor_month.start_date_param(),
            "2025-07-01T00:00:00.000Z"
        );
        assert_eq!(ctx.notes().len(), 1);
    }

    #[test]
    fn test_month_range_is_contiguous() {
        let cases = [
            ("2025-07-01", "2025-07-10"),
            ("2025-07-25", "2025-08-20"),
            ("2025-12-10", "2026-01-15"),
            ("2024-11-30", "2025-03-01"),
        ];
        for (start, end) in cases {
            let window = DateWindow::new(Some(date(start)), Some(date(end)));
            let anchor = MonthToken::new(2000, 1).unwrap();
            let months = month_range(&window, anchor);

            assert_eq!(months.first(), Some(&MonthToken::from_date(date(start))));
            assert_eq!(months.last(), Some(&MonthToken::from_date(date(end))));
            for pair in months.windows(2) {
                assert_eq!(pair[0].next(), pair[1]);
            }
        }
    }

    #[test]
    fn test_month_range_falls_back_to_anchor() {
        let anchor = MonthToken::new(2025, 9).unwrap();
        assert_eq!(month_range(&DateWindow::default(), anchor), vec![anchor]);

        let end_only = DateWindow::new(None, Some(date("2025-11-02")));
        let months: Vec<String> = month_range(&end_only, anchor)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(months, vec!["2025-09", "2025-10", "2025-11"]);
    }
}
