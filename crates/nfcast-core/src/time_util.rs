//! Time utilities: epoch timestamps and quote-timestamp composition.
//!
//! The feed header carries only an hour/minute/second triple, so the full
//! quote timestamp is composed from the local system date, the header time,
//! and the sub-second part of the local clock. Milliseconds are truncated,
//! never rounded up into the next second.

use chrono::{DateTime, Local, Timelike};

use crate::types::WallTime;

/// Current time as **milliseconds** since Unix epoch.
#[inline]
pub fn now_ms() -> u64 {
    Local::now().timestamp_millis() as u64
}

/// Compose a `YYYY-MM-DD HH:MM:SS.mmm` quote timestamp.
///
/// Date and milliseconds come from `now`; hours/minutes/seconds come from the
/// header `time` when present and from `now` otherwise.
pub fn quote_timestamp(time: Option<WallTime>, now: DateTime<Local>) -> String {
    let (hour, minute, second) = match time {
        Some(t) => (u32::from(t.hour), u32::from(t.minute), u32::from(t.second)),
        None => (now.hour(), now.minute(), now.second()),
    };
    // timestamp_subsec_millis can report 1000+ during a leap second.
    let millis = now.timestamp_subsec_millis().min(999);
    format!(
        "{} {:02}:{:02}:{:02}.{:03}",
        now.format("%Y-%m-%d"),
        hour,
        minute,
        second,
        millis,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local_at(h: u32, m: u32, s: u32, milli: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 11, 27, h, m, s)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(i64::from(milli)))
            .unwrap()
    }

    #[test]
    fn header_time_overrides_clock_time() {
        let now = local_at(14, 0, 5, 123);
        let t = WallTime { hour: 9, minute: 15, second: 30 };
        assert_eq!(quote_timestamp(Some(t), now), "2025-11-27 09:15:30.123");
    }

    #[test]
    fn falls_back_to_wall_clock() {
        let now = local_at(10, 20, 30, 7);
        assert_eq!(quote_timestamp(None, now), "2025-11-27 10:20:30.007");
    }

    #[test]
    fn end_of_day_boundary() {
        let now = local_at(23, 59, 59, 999);
        let t = WallTime { hour: 23, minute: 59, second: 59 };
        assert_eq!(quote_timestamp(Some(t), now), "2025-11-27 23:59:59.999");
    }
}
