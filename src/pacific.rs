//! US Pacific wall-clock helpers.
//!
//! Timestamps are stored in UTC. The curator reads them in Pacific time, so
//! grouping and display convert here, following the US daylight saving rules
//! in force since 2007.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, TimeZone, Utc, Weekday};

const HOUR: i32 = 3600;

fn offset_hours_west(hours: i32) -> FixedOffset {
    FixedOffset::west_opt(hours * HOUR).unwrap_or_else(|| Utc.fix())
}

/// UTC instant at which local time reads `hour:00` on the nth Sunday of the month.
fn nth_sunday_at(year: i32, month: u32, n: u8, hour: u32, west: i32) -> Option<DateTime<Utc>> {
    let day = NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, n)?;
    let local = day.and_hms_opt(hour, 0, 0)?;
    Some(Utc.from_utc_datetime(&(local + chrono::Duration::hours(west as i64))))
}

pub fn is_daylight_time(instant: DateTime<Utc>) -> bool {
    let year = instant.year();
    // 02:00 PST on the second Sunday of March, 02:00 PDT on the first Sunday of November
    let (Some(start), Some(end)) = (
        nth_sunday_at(year, 3, 2, 2, 8),
        nth_sunday_at(year, 11, 1, 2, 7),
    ) else {
        return false;
    };
    instant >= start && instant < end
}

pub fn offset_at(instant: DateTime<Utc>) -> FixedOffset {
    if is_daylight_time(instant) {
        offset_hours_west(7)
    } else {
        offset_hours_west(8)
    }
}

pub fn to_pacific(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&offset_at(instant))
}

/// Pacific calendar date of an RFC 3339 timestamp.
pub fn pacific_date(timestamp: &str) -> Option<NaiveDate> {
    let instant = DateTime::parse_from_rfc3339(timestamp).ok()?.with_timezone(&Utc);
    Some(to_pacific(instant).date_naive())
}

/// Group items by the Pacific date of their timestamp, keeping input order.
///
/// Items with an unparseable timestamp are dropped. Input sorted newest-first
/// yields groups newest-first.
pub fn group_by_date<T, F>(items: Vec<T>, timestamp: F) -> Vec<(NaiveDate, Vec<T>)>
where
    F: Fn(&T) -> &str,
{
    let mut groups: Vec<(NaiveDate, Vec<T>)> = Vec::new();
    for item in items {
        let Some(date) = pacific_date(timestamp(&item)) else {
            tracing::warn!("Skipping item with unparseable timestamp {}", timestamp(&item));
            continue;
        };
        match groups.iter_mut().find(|(d, _)| *d == date) {
            Some((_, group)) => group.push(item),
            None => groups.push((date, vec![item])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn winter_is_standard_time() {
        let local = to_pacific(utc("2025-01-15T12:00:00Z"));
        assert_eq!(local.offset().utc_minus_local(), 8 * HOUR);
        assert_eq!(local.format("%H:%M").to_string(), "04:00");
    }

    #[test]
    fn summer_is_daylight_time() {
        let local = to_pacific(utc("2025-07-04T12:00:00Z"));
        assert_eq!(local.offset().utc_minus_local(), 7 * HOUR);
        assert_eq!(local.format("%H:%M").to_string(), "05:00");
    }

    #[test]
    fn transitions_in_2025() {
        // DST starts 2025-03-09 at 10:00 UTC and ends 2025-11-02 at 09:00 UTC
        assert!(!is_daylight_time(utc("2025-03-09T09:59:59Z")));
        assert!(is_daylight_time(utc("2025-03-09T10:00:00Z")));
        assert!(is_daylight_time(utc("2025-11-02T08:59:59Z")));
        assert!(!is_daylight_time(utc("2025-11-02T09:00:00Z")));
    }

    #[test]
    fn late_utc_evening_lands_on_previous_pacific_day() {
        let date = pacific_date("2025-06-02T03:30:00+00:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn groups_preserve_order() {
        let items = vec![
            ("a", "2025-06-02T20:00:00Z"),
            ("b", "2025-06-02T03:00:00Z"),
            ("c", "2025-06-01T18:00:00Z"),
            ("d", "garbage"),
        ];
        let groups = group_by_date(items, |(_, ts)| *ts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(groups[0].1.len(), 1);
        assert_eq!(groups[1].1.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec!["b", "c"]);
    }
}
