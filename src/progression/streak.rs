//! Streak continuation and reset
//!
//! Streaks are evaluated lazily: nothing touches them at day rollover, they
//! are recomputed only when a habit is completed.

use chrono::{DateTime, Utc};

use super::calendar::DayClock;

/// Outcome of a streak-affecting action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: i32,
    pub last_active_date: DateTime<Utc>,
}

/// Advance a streak for an action happening at `now`.
///
/// Same local day keeps the count, the following day extends it, anything
/// else (a gap, or a last-active date in the future) restarts at 1.
pub fn advance_streak(
    clock: &DayClock,
    current_streak: i32,
    last_active_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> StreakUpdate {
    let streak = match clock.days_between(last_active_date, now) {
        0 => current_streak,
        1 => current_streak.saturating_add(1),
        _ => 1,
    };

    StreakUpdate {
        streak,
        last_active_date: now,
    }
}

/// Streak as it should be shown, without mutating stored state.
/// A streak whose last activity is older than yesterday reads as broken.
pub fn display_streak(
    clock: &DayClock,
    streak: i32,
    last_active_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i32 {
    match clock.days_between(last_active_date, now) {
        0 | 1 => streak,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let clock = DayClock::utc();
        let earlier = now() - Duration::hours(3);
        for streak in [0, 1, 7, 100] {
            let update = advance_streak(&clock, streak, earlier, now());
            assert_eq!(update.streak, streak);
            assert_eq!(update.last_active_date, now());
        }
    }

    #[test]
    fn test_yesterday_extends() {
        let clock = DayClock::utc();
        let yesterday = now() - Duration::days(1);
        for streak in [0, 1, 7, 100] {
            assert_eq!(advance_streak(&clock, streak, yesterday, now()).streak, streak + 1);
        }
    }

    #[test]
    fn test_late_last_night_counts_as_yesterday() {
        let clock = DayClock::utc();
        let last_night = DateTime::parse_from_rfc3339("2024-05-14T23:59:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(advance_streak(&clock, 4, last_night, now()).streak, 5);
    }

    #[test]
    fn test_gap_restarts_at_one() {
        let clock = DayClock::utc();
        for gap in [2, 3, 30, 365] {
            let last = now() - Duration::days(gap);
            assert_eq!(advance_streak(&clock, 12, last, now()).streak, 1);
        }
    }

    #[test]
    fn test_future_last_active_restarts() {
        let clock = DayClock::utc();
        let skewed = now() + Duration::days(2);
        assert_eq!(advance_streak(&clock, 9, skewed, now()).streak, 1);
    }

    #[test]
    fn test_display_streak() {
        let clock = DayClock::utc();
        assert_eq!(display_streak(&clock, 5, now(), now()), 5);
        assert_eq!(display_streak(&clock, 5, now() - Duration::days(1), now()), 5);
        assert_eq!(display_streak(&clock, 5, now() - Duration::days(2), now()), 0);
    }
}
