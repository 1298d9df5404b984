//! Merging raw departures into display-ready rows.
//!
//! The API returns one record per predicted arrival, so a station with a
//! train to Barking every few minutes produces several records that differ
//! only in arrival time. For display these collapse into one row per
//! `(destination, line)` pair carrying all of that pair's arrival times.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::departure::Departure;

/// One display row: every upcoming departure sharing a destination and
/// line, in source (arrival) order.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    /// Grouped departures; never empty, first element is the
    /// representative (earliest by source ordering).
    pub departures: Vec<Departure>,
}

impl MergedRow {
    /// The first departure in the group, used for row labels.
    pub fn representative(&self) -> &Departure {
        // merge_departures only creates rows with at least one entry
        &self.departures[0]
    }

    /// Minute offsets for every departure in the group, in order.
    ///
    /// Departures with unparseable timestamps are skipped.
    pub fn times(&self, now: DateTime<Utc>) -> Vec<i64> {
        self.departures
            .iter()
            .filter_map(|d| d.arriving_in_minutes(now))
            .collect()
    }
}

/// Group departures by exact `(destination, line)` in a single stable pass.
///
/// Rows appear in first-seen destination order; within a row the source
/// arrival ordering is preserved. The key match is case-sensitive with no
/// normalization. Empty input produces empty output. Deterministic, O(n).
pub fn merge_departures(departures: &[Departure]) -> Vec<MergedRow> {
    let mut rows: Vec<MergedRow> = Vec::new();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for dep in departures {
        let key = (dep.destination.clone(), dep.line.clone());
        match seen.get(&key) {
            Some(&idx) => rows[idx].departures.push(dep.clone()),
            None => {
                seen.insert(key, rows.len());
                rows.push(MergedRow {
                    departures: vec![dep.clone()],
                });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap()
    }

    fn dep(id: &str, destination: &str, line: &str, secs_ahead: i64) -> Departure {
        Departure {
            id: id.to_string(),
            line: line.to_string(),
            mode: "tube".to_string(),
            destination: destination.to_string(),
            arrival_time: (fixed_now() + Duration::seconds(secs_ahead)).to_rfc3339(),
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(merge_departures(&[]).is_empty());
    }

    #[test]
    fn all_same_group_gives_single_row() {
        let deps = vec![
            dep("a", "Barking", "district", 60),
            dep("b", "Barking", "district", 180),
            dep("c", "Barking", "district", 400),
        ];
        let rows = merge_departures(&deps);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].departures.len(), 3);
        assert_eq!(rows[0].times(fixed_now()), vec![1, 3, 6]);
    }

    #[test]
    fn groups_by_destination_and_line_in_first_seen_order() {
        let deps = vec![
            dep("a", "Barking", "district", 120),
            dep("b", "Barking", "district", 300),
            dep("c", "Upminster", "district", 200),
        ];
        let rows = merge_departures(&deps);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].representative().destination, "Barking");
        assert_eq!(rows[0].times(fixed_now()), vec![2, 5]);

        assert_eq!(rows[1].representative().destination, "Upminster");
        assert_eq!(rows[1].times(fixed_now()), vec![3]);
    }

    #[test]
    fn same_destination_different_line_stays_separate() {
        let deps = vec![
            dep("a", "Barking", "district", 60),
            dep("b", "Barking", "hammersmith-city", 120),
        ];
        let rows = merge_departures(&deps);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].representative().line, "district");
        assert_eq!(rows[1].representative().line, "hammersmith-city");
    }

    #[test]
    fn key_match_is_case_sensitive() {
        let deps = vec![
            dep("a", "Barking", "district", 60),
            dep("b", "BARKING", "district", 120),
        ];
        assert_eq!(merge_departures(&deps).len(), 2);
    }

    #[test]
    fn interleaved_groups_preserve_within_group_order() {
        let deps = vec![
            dep("a", "Barking", "district", 60),
            dep("b", "Upminster", "district", 90),
            dep("c", "Barking", "district", 240),
            dep("d", "Upminster", "district", 360),
        ];
        let rows = merge_departures(&deps);
        assert_eq!(rows.len(), 2);
        let ids: Vec<&str> = rows[0].departures.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        let ids: Vec<&str> = rows[1].departures.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d"]);
    }

    #[test]
    fn merge_is_pure() {
        let deps = vec![
            dep("a", "Barking", "district", 60),
            dep("b", "Upminster", "district", 90),
            dep("c", "Barking", "district", 240),
        ];
        assert_eq!(merge_departures(&deps), merge_departures(&deps));
    }
}
