//! Feature extraction
//!
//! Maps a timestamp to the categorical attributes the learner works on:
//! a 4-hour time-of-day bucket and the day of the week, both in the
//! timestamp's own local time.

use chrono::{DateTime, Datelike, FixedOffset, Local, TimeZone, Timelike, Utc};

use crate::types::{AttributeId, AttributeValue, AttributeVector, TimeBucket};

const MINUTES_PER_DAY: u32 = 24 * 60;
const BUCKET_MINUTES: u32 = 4 * 60;
/// Bucket 0 begins at 02:00
const BUCKET_SHIFT_MINUTES: u32 = 2 * 60;

/// Number of attributes produced by [`attributes_of`]
pub const ATTRIBUTE_COUNT: usize = 2;

/// Time-of-day bucket for a local hour and minute
pub fn time_bucket(hour: u32, minute: u32) -> TimeBucket {
    let minute_of_day = hour * 60 + minute;
    let shifted = (minute_of_day + MINUTES_PER_DAY - BUCKET_SHIFT_MINUTES) % MINUTES_PER_DAY;
    TimeBucket::new((shifted / BUCKET_MINUTES % TimeBucket::COUNT as u32) as u8)
}

/// Attribute vector `[time_of_day, weekday]` for a timestamp
pub fn attributes_of<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> AttributeVector<AttributeValue> {
    AttributeVector::new(vec![
        (
            AttributeId::TIME_OF_DAY,
            AttributeValue::TimeOfDay(time_bucket(timestamp.hour(), timestamp.minute())),
        ),
        (AttributeId::WEEKDAY, AttributeValue::Weekday(timestamp.weekday())),
    ])
}

/// Zone in which stored UTC timestamps are interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Zone {
    /// System local time, DST-aware
    #[default]
    Local,
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl Zone {
    /// Parse an offset such as `+02:00`; `None` means system local time
    pub fn from_offset(offset: Option<&str>) -> anyhow::Result<Self> {
        match offset {
            None => Ok(Zone::Local),
            Some(s) => s
                .parse::<FixedOffset>()
                .map(Zone::Fixed)
                .map_err(|e| anyhow::anyhow!("Invalid UTC offset '{}': {}", s, e)),
        }
    }

    /// Attributes of a UTC instant as seen in this zone
    pub fn attributes(&self, instant: &DateTime<Utc>) -> AttributeVector<AttributeValue> {
        match self {
            Zone::Local => attributes_of(&instant.with_timezone(&Local)),
            Zone::Fixed(offset) => attributes_of(&instant.with_timezone(offset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};

    fn at(offset_hours: i32, day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        offset.from_local_datetime(&naive).unwrap()
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(time_bucket(2, 0).index(), 0);
        assert_eq!(time_bucket(5, 59).index(), 0);
        assert_eq!(time_bucket(6, 0).index(), 1);
        assert_eq!(time_bucket(10, 0).index(), 2);
        assert_eq!(time_bucket(14, 0).index(), 3);
        assert_eq!(time_bucket(18, 0).index(), 4);
        assert_eq!(time_bucket(22, 0).index(), 5);
        assert_eq!(time_bucket(23, 59).index(), 5);
        assert_eq!(time_bucket(0, 0).index(), 5);
        assert_eq!(time_bucket(1, 59).index(), 5);
    }

    #[test]
    fn test_attributes_of_early_morning() {
        // 2024-01-01 is a Monday
        let attrs = attributes_of(&at(0, 1, 3, 0));
        assert_eq!(
            attrs.get(AttributeId::TIME_OF_DAY),
            Some(&AttributeValue::TimeOfDay(TimeBucket::new(0)))
        );
        assert_eq!(attrs.get(AttributeId::WEEKDAY), Some(&AttributeValue::Weekday(Weekday::Mon)));
    }

    #[test]
    fn test_attributes_of_wraps_past_midnight() {
        let attrs = attributes_of(&at(0, 2, 1, 0));
        assert_eq!(
            attrs.get(AttributeId::TIME_OF_DAY),
            Some(&AttributeValue::TimeOfDay(TimeBucket::new(5)))
        );
        assert_eq!(attrs.get(AttributeId::WEEKDAY), Some(&AttributeValue::Weekday(Weekday::Tue)));
        assert_eq!(attrs.len(), ATTRIBUTE_COUNT);
    }

    #[test]
    fn test_attributes_use_local_offset() {
        // 23:30 UTC on Monday is 01:30 Tuesday at +02:00
        let local = at(2, 2, 1, 30);
        let utc = local.with_timezone(&Utc);
        let zone = Zone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(zone.attributes(&utc), attributes_of(&local));
        assert_eq!(
            zone.attributes(&utc).get(AttributeId::WEEKDAY),
            Some(&AttributeValue::Weekday(Weekday::Tue))
        );
    }

    #[test]
    fn test_zone_from_offset() {
        assert_eq!(Zone::from_offset(None).unwrap(), Zone::Local);
        assert_eq!(
            Zone::from_offset(Some("+02:00")).unwrap(),
            Zone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert!(Zone::from_offset(Some("tomorrow")).is_err());
    }
}
