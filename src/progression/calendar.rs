//! Calendar-day arithmetic in the server's local offset
//!
//! Streaks, daily stats keys, challenge dates and challenge completion all
//! compare calendar days through the same [`DayClock`].

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Calendar view of UTC instants at a fixed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayClock {
    offset: FixedOffset,
}

impl Default for DayClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Build from an offset in minutes east of UTC
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar day of an instant
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// `YYYY-MM-DD` key of an instant's local day
    pub fn iso_date(&self, at: DateTime<Utc>) -> String {
        self.day_of(at).format("%Y-%m-%d").to_string()
    }

    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.day_of(a) == self.day_of(b)
    }

    /// Whole local days from `earlier` to `later` (negative if reversed)
    pub fn days_between(&self, earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
        (self.day_of(later) - self.day_of(earlier)).num_days()
    }

    /// First instant of the local day containing `at`
    pub fn start_of_day(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        self.local_instant(self.day_of(at), 0)
    }

    /// Next instant strictly after `now` at which the local clock reads `hour:00`
    pub fn next_occurrence(&self, now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
        let today = self.local_instant(self.day_of(now), hour);
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    fn local_instant(&self, day: NaiveDate, hour: u32) -> DateTime<Utc> {
        let naive = day
            .and_hms_opt(hour.min(23), 0, 0)
            .unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN));
        // Fixed offsets map every local time to exactly one instant
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}
