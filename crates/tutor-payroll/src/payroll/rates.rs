use chrono::{DateTime, FixedOffset, Utc};

use super::calendar::parse_instant;
use super::domain::ClassLevel;

pub const PRIMARY_HOURLY_RATE: u32 = 3800;
pub const MIDDLE_HOURLY_RATE: u32 = 4300;
pub const SENIOR_HOURLY_RATE: u32 = 5000;

/// Pay bands grouping the class levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    /// Nursery through Year 6.
    Primary,
    /// Year 7 through Year 10.
    Middle,
    /// Year 11 and Year 12.
    Senior,
}

impl RateTier {
    pub const fn hourly_rate(self) -> u32 {
        match self {
            RateTier::Primary => PRIMARY_HOURLY_RATE,
            RateTier::Middle => MIDDLE_HOURLY_RATE,
            RateTier::Senior => SENIOR_HOURLY_RATE,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RateTier::Primary => "Nursery - Year 6",
            RateTier::Middle => "Year 7 - Year 10",
            RateTier::Senior => "Year 11 - Year 12",
        }
    }

    pub const fn ordered() -> [RateTier; 3] {
        [RateTier::Primary, RateTier::Middle, RateTier::Senior]
    }
}

impl ClassLevel {
    pub const fn tier(self) -> RateTier {
        match self {
            ClassLevel::Nursery => RateTier::Primary,
            ClassLevel::Year(year) if year <= 6 => RateTier::Primary,
            ClassLevel::Year(year) if year <= 10 => RateTier::Middle,
            ClassLevel::Year(_) => RateTier::Senior,
        }
    }
}

/// Hourly rate for a class level label; unrecognized labels pay nothing.
pub fn rate_for(class_level: &str) -> u32 {
    ClassLevel::parse(class_level)
        .map(|level| level.tier().hourly_rate())
        .unwrap_or(0)
}

/// Payment for a lesson, rounded half-up to the nearest whole currency unit.
pub fn compute_payment(class_level: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    if end <= start {
        return 0;
    }

    let hours = (end - start).num_milliseconds() as f64 / 3_600_000.0;
    (f64::from(rate_for(class_level)) * hours).round() as u64
}

/// Like [`compute_payment`] but over raw timestamps; unparseable input pays nothing.
pub fn quote_payment(class_level: &str, start: &str, end: &str, offset: FixedOffset) -> u64 {
    match (parse_instant(start, offset), parse_instant(end, offset)) {
        (Some(start), Some(end)) => compute_payment(class_level, start, end),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, hour, minute, 0).unwrap()
    }

    #[test]
    fn rate_table_covers_every_class_level() {
        for level in ClassLevel::ordered() {
            let expected = match level {
                ClassLevel::Nursery => 3800,
                ClassLevel::Year(1..=6) => 3800,
                ClassLevel::Year(7..=10) => 4300,
                ClassLevel::Year(_) => 5000,
            };
            assert_eq!(rate_for(&level.to_string()), expected, "{level}");
        }
    }

    #[test]
    fn unknown_levels_pay_nothing() {
        assert_eq!(rate_for("Reception"), 0);
        assert_eq!(rate_for(""), 0);
        assert_eq!(compute_payment("University", at(14, 0), at(15, 0)), 0);
    }

    #[test]
    fn year_ten_to_twelve_are_not_primary() {
        assert_eq!(rate_for("Year 10"), 4300);
        assert_eq!(rate_for("Year 11"), 5000);
        assert_eq!(rate_for("Year 12"), 5000);
    }

    #[test]
    fn payment_scales_with_duration() {
        assert_eq!(compute_payment("Year 8", at(14, 0), at(15, 30)), 6450);
        assert_eq!(compute_payment("Nursery", at(9, 0), at(9, 30)), 1900);
        assert_eq!(compute_payment("Year 12", at(9, 0), at(11, 0)), 10_000);
    }

    #[test]
    fn payment_rounds_half_up() {
        // 3800 * (59 / 60) = 3736.67
        assert_eq!(compute_payment("Year 1", at(9, 0), at(9, 59)), 3737);
        // 4300 * (61 / 60) = 4371.67
        assert_eq!(compute_payment("Year 7", at(9, 0), at(10, 1)), 4372);
        // 5000 * (225 s) = 312.5
        let start = at(9, 0);
        assert_eq!(
            compute_payment("Year 11", start, start + chrono::Duration::seconds(225)),
            313
        );
    }

    #[test]
    fn payment_fails_closed_on_inverted_or_invalid_intervals() {
        assert_eq!(compute_payment("Year 8", at(15, 0), at(14, 0)), 0);
        assert_eq!(compute_payment("Year 8", at(15, 0), at(15, 0)), 0);

        let offset = FixedOffset::east_opt(3600).expect("valid offset");
        assert_eq!(quote_payment("Year 8", "not-a-time", "2025-02-10T15:00", offset), 0);
        assert_eq!(
            quote_payment("Year 8", "2025-02-10T14:00", "2025-02-10T15:30", offset),
            6450
        );
    }
}
