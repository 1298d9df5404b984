//! Departure and per-station departure list types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::station::Station;

/// A single upcoming departure from a station.
///
/// `id` identifies one prediction record from the API; it is *not* used to
/// decide whether two departures represent the same upcoming service. A
/// later poll may carry a fresh `id` and an updated `arrival_time` for what
/// is conceptually the same train, so grouping goes by
/// `(destination, line)` instead (see [`super::merge::merge_departures`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departure {
    pub id: String,
    /// Lowercase line code, e.g. "district".
    pub line: String,
    /// Transit mode, e.g. "tube" or "dlr".
    pub mode: String,
    /// Full destination stop name.
    pub destination: String,
    /// ISO-8601 timestamp with offset.
    pub arrival_time: String,
}

impl Departure {
    /// Parsed arrival timestamp, if `arrival_time` is well-formed.
    pub fn arrival_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.arrival_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Whole minutes until arrival, floored toward negative infinity.
    ///
    /// A departure 90 seconds ahead is 1 minute away; one 30 seconds in the
    /// past is -1, not 0. Callers must not assume the result is
    /// non-negative. Returns `None` if the timestamp does not parse.
    pub fn arriving_in_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        let arrival = self.arrival_at()?;
        Some((arrival - now).num_seconds().div_euclid(60))
    }

    /// Destination name with the verbose station suffix stripped.
    pub fn display_destination(&self) -> String {
        shorten_destination(&self.destination)
    }

    /// Display name for this departure's line code.
    pub fn display_line(&self) -> String {
        format_line_name(&self.line)
    }
}

/// Strip the verbose station-type suffixes from a destination name.
pub fn shorten_destination(destination: &str) -> String {
    destination
        .replace(" Underground Station", "")
        .replace(" Rail Station", "")
        .replace(" DLR Station", "")
}

/// Display name for a lowercase line code.
///
/// A few codes have fixed display forms; anything else has each word
/// capitalized ("district" becomes "District").
pub fn format_line_name(line: &str) -> String {
    match line {
        "hammersmith-city" => "H&C".to_string(),
        "london-overground" => "Overground".to_string(),
        "dlr" => "DLR".to_string(),
        _ => capitalize_words(line),
    }
}

/// Capitalize the first letter of each word, preserving separators.
fn capitalize_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c == ' ' || c == '-';
    }
    out
}

/// Ordered departures for one station.
///
/// Identity is `station.id`. The departure ordering from the source is
/// preserved; it is assumed to be by increasing arrival time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDepartures {
    pub station: Station,
    pub departures: Vec<Departure>,
}

impl StationDepartures {
    pub fn id(&self) -> &str {
        &self.station.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn departure_at(arrival: DateTime<Utc>) -> Departure {
        Departure {
            id: "test-id".to_string(),
            line: "district".to_string(),
            mode: "tube".to_string(),
            destination: "Upminster Underground Station".to_string(),
            arrival_time: arrival.to_rfc3339(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn ninety_seconds_ahead_is_one_minute() {
        let now = fixed_now();
        let dep = departure_at(now + Duration::seconds(90));
        assert_eq!(dep.arriving_in_minutes(now), Some(1));
    }

    #[test]
    fn thirty_seconds_past_floors_to_minus_one() {
        let now = fixed_now();
        let dep = departure_at(now - Duration::seconds(30));
        assert_eq!(dep.arriving_in_minutes(now), Some(-1));
    }

    #[test]
    fn exact_minute_boundaries() {
        let now = fixed_now();
        assert_eq!(departure_at(now).arriving_in_minutes(now), Some(0));
        assert_eq!(
            departure_at(now + Duration::seconds(120)).arriving_in_minutes(now),
            Some(2)
        );
        assert_eq!(
            departure_at(now - Duration::seconds(60)).arriving_in_minutes(now),
            Some(-1)
        );
    }

    #[test]
    fn malformed_arrival_time_is_none() {
        let mut dep = departure_at(fixed_now());
        dep.arrival_time = "not a timestamp".to_string();
        assert_eq!(dep.arriving_in_minutes(fixed_now()), None);
    }

    #[test]
    fn offset_timestamps_are_normalized() {
        let dep = Departure {
            arrival_time: "2024-01-20T13:00:00+01:00".to_string(),
            ..departure_at(fixed_now())
        };
        // 13:00+01:00 is 12:00 UTC.
        assert_eq!(dep.arriving_in_minutes(fixed_now()), Some(0));
    }

    #[test]
    fn line_name_special_cases() {
        assert_eq!(format_line_name("hammersmith-city"), "H&C");
        assert_eq!(format_line_name("london-overground"), "Overground");
        assert_eq!(format_line_name("dlr"), "DLR");
    }

    #[test]
    fn line_name_capitalizes_unmapped_codes() {
        assert_eq!(format_line_name("district"), "District");
        assert_eq!(format_line_name("elizabeth"), "Elizabeth");
        assert_eq!(format_line_name("new tube"), "New Tube");
    }

    #[test]
    fn destination_shortening() {
        assert_eq!(
            shorten_destination("Barking Underground Station"),
            "Barking"
        );
        assert_eq!(shorten_destination("Upminster"), "Upminster");
    }

    #[test]
    fn station_departures_identity_is_station_id() {
        let sd = StationDepartures {
            station: Station {
                id: "940GZZLUBKG".to_string(),
                lat: 51.539,
                lon: 0.081,
                name: "Barking Underground Station".to_string(),
            },
            departures: vec![],
        };
        assert_eq!(sd.id(), "940GZZLUBKG");
    }
}
