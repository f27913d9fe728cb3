use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::availability_types::Row;
use crate::config::SortKey;

static SITE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\D*)(\d+)").expect("site name pattern is valid"));

/// Split a site name into `(prefix, number)` at the first digit run.
///
/// `"A035"` → `("A", 35)`, `"12"` → `("", 12)`, `"GROUP"` → `("GROUP", 0)`.
pub fn site_sort_key(site_name: &str) -> (&str, u64) {
    match SITE_NAME.captures(site_name) {
        Some(captures) => {
            let prefix = captures.get(1).map_or("", |m| m.as_str());
            let number = captures
                .get(2)
                .map_or(0, |m| m.as_str().parse().unwrap_or(u64::MAX));
            (prefix, number)
        }
        None => (site_name, 0),
    }
}

/// Natural order of two site names: prefix lexically, then number numerically
pub fn compare_sites(a: &str, b: &str) -> Ordering {
    let (a_prefix, a_number) = site_sort_key(a);
    let (b_prefix, b_number) = site_sort_key(b);
    a_prefix.cmp(b_prefix).then(a_number.cmp(&b_number))
}

/// Two-level row comparator; `primary` picks which ordering comes first
pub fn compare_rows(a: &Row, b: &Row, primary: SortKey) -> Ordering {
    let by_site = compare_sites(&a.site_name, &b.site_name);
    let by_date = a.date.cmp(&b.date);
    match primary {
        SortKey::Site => by_site.then(by_date),
        SortKey::Date => by_date.then(by_site),
    }
}

/// Stable in-place sort of rows
pub fn sort_rows(rows: &mut [Row], primary: SortKey) {
    rows.sort_by(|a, b| compare_rows(a, b, primary));
}
