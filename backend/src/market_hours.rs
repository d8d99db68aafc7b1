// =============================================================================
// Market hours: Indian cash session (09:15 – 15:30 IST, Monday – Friday)
// =============================================================================

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, Utc, Weekday};

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// India Standard Time (UTC+05:30, no daylight saving).
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn session_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 15, 0).unwrap_or_default()
}

fn session_close() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 30, 0).unwrap_or_default()
}

/// Session boundaries as local IST times.
pub fn session_bounds() -> (NaiveTime, NaiveTime) {
    (session_open(), session_close())
}

/// True when `now` falls on a weekday between 09:15 and 15:30 IST inclusive.
/// Exchange holidays are not modelled.
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&ist());
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let t = local.time();
    t >= session_open() && t <= session_close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        ist()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn open_during_weekday_session() {
        // 2024-07-10 is a Wednesday.
        assert!(is_market_open(ist_at(2024, 7, 10, 9, 15)));
        assert!(is_market_open(ist_at(2024, 7, 10, 12, 0)));
        assert!(is_market_open(ist_at(2024, 7, 10, 15, 30)));
    }

    #[test]
    fn closed_outside_session() {
        assert!(!is_market_open(ist_at(2024, 7, 10, 9, 14)));
        assert!(!is_market_open(ist_at(2024, 7, 10, 15, 31)));
    }

    #[test]
    fn closed_on_weekend() {
        assert!(!is_market_open(ist_at(2024, 7, 13, 11, 0)));
        assert!(!is_market_open(ist_at(2024, 7, 14, 11, 0)));
    }
}
