//! Timestamp parsing and reference-timezone calendar helpers.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an RFC 3339 instant, or a zone-less local timestamp interpreted in `offset`.
pub fn parse_instant(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(instant.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Calendar date of `instant` in the reference timezone.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// First instant of `date` in the reference timezone.
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// Last millisecond of `date` in the reference timezone.
pub fn end_of_day(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
    offset
        .from_local_datetime(&date.and_time(last))
        .single()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn wat() -> FixedOffset {
        FixedOffset::east_opt(3600).expect("valid offset")
    }

    #[test]
    fn parses_rfc3339_and_local_timestamps() {
        let utc = parse_instant("2025-05-01T09:00:00Z", wat()).expect("rfc3339 parses");
        assert_eq!(utc.hour(), 9);

        let local = parse_instant("2025-05-01T10:00", wat()).expect("local parses");
        assert_eq!(local, utc);

        assert!(parse_instant("tomorrow at noon", wat()).is_none());
        assert!(parse_instant("   ", wat()).is_none());
    }

    #[test]
    fn local_date_crosses_midnight_in_reference_zone() {
        let late_evening_utc = parse_instant("2025-05-01T23:30:00Z", wat()).expect("parses");
        assert_eq!(
            local_date(late_evening_utc, wat()),
            NaiveDate::from_ymd_opt(2025, 5, 2).expect("valid date")
        );
    }

    #[test]
    fn day_bounds_cover_the_whole_local_day() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 2).expect("valid date");
        let start = start_of_day(date, wat()).expect("start resolves");
        let end = end_of_day(date, wat()).expect("end resolves");
        assert_eq!(start.to_rfc3339(), "2025-05-01T23:00:00+00:00");
        assert_eq!(local_date(end, wat()), date);
        assert_eq!(end - start, chrono::Duration::milliseconds(86_399_999));
    }
}
