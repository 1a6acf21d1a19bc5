//! Local-time-to-UTC scheduling.
//!
//! Converts a fixed wall-clock time in a named IANA timezone into the next
//! UTC instant it occurs, using the timezone database for the conversion.
//! Fixed numeric offsets are deliberately absent: they drift by the DST
//! delta twice a year, which is exactly the failure this module exists to
//! prevent.

pub mod trigger;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use herald_common::types::ScheduleConfig;

/// Longest DST gap worth probing across. Real zones jump by at most two
/// hours; three leaves headroom for historical oddities.
const MAX_GAP_PROBE_MINUTES: i64 = 3 * 60;

/// Compute the smallest UTC instant `>= now` at which the schedule's local
/// wall-clock time occurs in its zone.
///
/// Pure and deterministic for a given `now`; recomputed on every call, so
/// clock adjustments and DST transitions self-heal with no cached state.
///
/// DST handling: an ambiguous local time (fall-back) resolves to its earlier
/// occurrence; a non-existent local time (spring-forward gap) resolves to
/// the first valid instant after the gap.
pub fn next_fire_time(now: DateTime<Utc>, schedule: &ScheduleConfig) -> DateTime<Utc> {
    let mut date = now.with_timezone(&schedule.timezone).date_naive();

    // Today's slot may already be past or sit inside a DST gap, so walk
    // forward until a candidate maps at or after `now`. Two dates suffice
    // for every real zone; the bound only guards the calendar's far edge.
    for _ in 0..4 {
        if let Some(candidate) = resolve_wall_clock(date, schedule) {
            if candidate >= now {
                return candidate;
            }
        }
        match date.succ_opt() {
            Some(next_date) => date = next_date,
            None => break,
        }
    }

    // Reachable only at the end of the representable calendar.
    now
}

/// True while `now` sits inside the schedule's target minute in its zone.
pub fn is_due(now: DateTime<Utc>, schedule: &ScheduleConfig) -> bool {
    let local = now.with_timezone(&schedule.timezone);
    local.hour() == schedule.hour && local.minute() == schedule.minute
}

/// Map the schedule's wall-clock time on `date` to a UTC instant, resolving
/// DST ambiguity and gaps. `None` only when a gapped candidate has no valid
/// instant within the probe window.
fn resolve_wall_clock(date: NaiveDate, schedule: &ScheduleConfig) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(schedule.hour, schedule.minute, 0)?;
    match schedule.timezone.from_local_datetime(&naive) {
        LocalResult::Single(local) => Some(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _later) => Some(earlier.with_timezone(&Utc)),
        LocalResult::None => first_instant_after_gap(naive, schedule.timezone),
    }
}

/// Walk forward minute by minute from a gapped local time until the zone
/// maps it again. Lands on the first representable instant after the jump,
/// e.g. 03:00 for a 02:30 target under a 02:00 -> 03:00 spring-forward.
fn first_instant_after_gap(start: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    let mut probe = start;
    for _ in 0..MAX_GAP_PROBE_MINUTES {
        probe += Duration::minutes(1);
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(local) => return Some(local.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, _later) => return Some(earlier.with_timezone(&Utc)),
            LocalResult::None => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(hour: u32, minute: u32, zone: &str) -> ScheduleConfig {
        ScheduleConfig::new(hour, minute, zone.parse().unwrap()).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_salta_evening_maps_to_next_utc_midnight() {
        // Salta is UTC-3 year-round: 21:00 local = 00:00 UTC next day.
        let config = schedule(21, 0, "America/Argentina/Salta");
        let now = utc(2024, 6, 15, 23, 30, 0);
        assert_eq!(next_fire_time(now, &config), utc(2024, 6, 16, 0, 0, 0));
    }

    #[test]
    fn test_salta_just_after_fire_rolls_to_next_day() {
        let config = schedule(21, 0, "America/Argentina/Salta");
        let now = utc(2024, 6, 16, 0, 30, 0);
        assert_eq!(next_fire_time(now, &config), utc(2024, 6, 17, 0, 0, 0));
    }

    #[test]
    fn test_exact_target_instant_counts_as_due_now() {
        // Future-or-equal: at the target instant itself, fire now rather
        // than tomorrow.
        let config = schedule(21, 0, "America/Argentina/Salta");
        let now = utc(2024, 6, 16, 0, 0, 0);
        assert_eq!(next_fire_time(now, &config), now);
    }

    #[test]
    fn test_deterministic_for_same_now() {
        let config = schedule(9, 30, "Europe/Madrid");
        let now = utc(2024, 2, 1, 12, 0, 0);
        assert_eq!(next_fire_time(now, &config), next_fire_time(now, &config));
    }

    #[test]
    fn test_future_or_equal_and_earliest_over_sweep() {
        let config = schedule(21, 0, "America/Argentina/Salta");
        let base = utc(2024, 6, 10, 0, 0, 0);
        for hours in 0..96 {
            let now = base + Duration::hours(hours);
            let next = next_fire_time(now, &config);
            assert!(next >= now, "next fire must never be in the past");
            // Earliest matching instant: at most one day away, and the
            // target minute never occurs strictly between now and next.
            assert!(next - now <= Duration::hours(24));
            let local = next.with_timezone(&config.timezone);
            assert_eq!((local.hour(), local.minute()), (21, 0));
        }
    }

    #[test]
    fn test_target_wall_clock_preserved_across_spring_forward() {
        // Regression for the fixed-offset defect: after 2024-03-10 the US
        // eastern offset changes from -05:00 to -04:00. An offset-based
        // conversion lands an hour off; the tz-backed one must not.
        let config = schedule(12, 0, "America/New_York");
        for day in 8..=13 {
            let now = utc(2024, 3, day, 0, 0, 0);
            let local = next_fire_time(now, &config).with_timezone(&config.timezone);
            assert_eq!((local.hour(), local.minute()), (12, 0));
        }
    }

    #[test]
    fn test_no_duplicate_day_across_fall_back() {
        // The repeated 01:00-02:00 hour on 2024-11-03 must not yield two
        // fires on the same local date.
        let config = schedule(1, 30, "America/New_York");
        let mut now = utc(2024, 11, 2, 0, 0, 0);
        let mut dates = Vec::new();
        for _ in 0..3 {
            let next = next_fire_time(now, &config);
            dates.push(next.with_timezone(&config.timezone).date_naive());
            now = next + Duration::seconds(1);
        }
        let mut deduped = dates.clone();
        deduped.dedup();
        assert_eq!(dates, deduped, "each local date fires exactly once");
    }

    #[test]
    fn test_spring_forward_gap_lands_on_first_valid_instant() {
        // 02:30 does not exist on 2024-03-10 in New York; the gap probe
        // must land on 03:00 EDT (07:00 UTC), not a phantom offset time.
        let config = schedule(2, 30, "America/New_York");
        let now = utc(2024, 3, 10, 5, 0, 0); // local midnight EST
        assert_eq!(next_fire_time(now, &config), utc(2024, 3, 10, 7, 0, 0));
    }

    #[test]
    fn test_fall_back_ambiguity_takes_earlier_occurrence() {
        // 01:30 occurs twice on 2024-11-03 in New York: 05:30 UTC (EDT)
        // and 06:30 UTC (EST). The earlier one wins.
        let config = schedule(1, 30, "America/New_York");
        let now = utc(2024, 11, 3, 4, 0, 0); // local midnight EDT
        assert_eq!(next_fire_time(now, &config), utc(2024, 11, 3, 5, 30, 0));
    }

    #[test]
    fn test_is_due_matches_target_minute_only() {
        let config = schedule(21, 0, "America/Argentina/Salta");
        assert!(is_due(utc(2024, 6, 16, 0, 0, 30), &config));
        assert!(!is_due(utc(2024, 6, 16, 0, 1, 0), &config));
        assert!(!is_due(utc(2024, 6, 16, 1, 0, 0), &config));
    }
}
