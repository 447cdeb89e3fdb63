use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// When sync cycles fire.
///
/// Sub-minute intervals use a fixed period. Whole minutes and whole hours
/// align to wall-clock boundaries the way a cron field does (`minute % n ==
/// 0`, `hour % n == 0`). Anything else runs once a minute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    FixedPeriod { seconds: u64 },
    EveryNMinutes { minutes: u32 },
    EveryNHours { hours: u32 },
}

impl Cadence {
    pub fn from_interval(seconds: u64) -> Self {
        if seconds < 60 {
            return Cadence::FixedPeriod {
                seconds: seconds.max(1),
            };
        }

        if seconds % 60 != 0 {
            return Cadence::EveryNMinutes { minutes: 1 };
        }

        let minutes = seconds / 60;
        if minutes < 60 {
            return Cadence::EveryNMinutes {
                minutes: minutes as u32,
            };
        }

        if minutes % 60 == 0 {
            let hours = u32::try_from(minutes / 60).unwrap_or(u32::MAX);
            Cadence::EveryNHours { hours }
        } else {
            Cadence::EveryNMinutes { minutes: 1 }
        }
    }

    pub fn is_fixed_period(&self) -> bool {
        matches!(self, Cadence::FixedPeriod { .. })
    }

    /// First firing time strictly after `now`.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Cadence::FixedPeriod { seconds } => now + Duration::seconds(seconds as i64),
            Cadence::EveryNMinutes { minutes } => {
                let mut at = truncate(now, Duration::minutes(1)) + Duration::minutes(1);
                while at.minute() % minutes.max(1) != 0 {
                    at += Duration::minutes(1);
                }
                at
            }
            Cadence::EveryNHours { hours } => {
                let mut at = truncate(now, Duration::hours(1)) + Duration::hours(1);
                while at.hour() % hours.max(1) != 0 {
                    at += Duration::hours(1);
                }
                at
            }
        }
    }

    /// Firing time following one that just fired. The wall clock may read
    /// slightly before `previous` when a sleep wakes early, so the search
    /// starts from whichever is later and never lands on `previous` again.
    pub fn next_after(&self, previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        self.next_fire(previous.max(now))
    }
}

fn truncate(at: DateTime<Utc>, unit: Duration) -> DateTime<Utc> {
    at.duration_trunc(unit).unwrap_or(at)
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::FixedPeriod { seconds } => write!(f, "every {}s", seconds),
            Cadence::EveryNMinutes { minutes: 1 } => write!(f, "every minute"),
            Cadence::EveryNMinutes { minutes } => write!(f, "every {} minutes", minutes),
            Cadence::EveryNHours { hours: 1 } => write!(f, "every hour"),
            Cadence::EveryNHours { hours } => write!(f, "every {} hours", hours),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_cadence_selection() {
        assert_eq!(Cadence::from_interval(30), Cadence::FixedPeriod { seconds: 30 });
        assert_eq!(Cadence::from_interval(59), Cadence::FixedPeriod { seconds: 59 });
        assert_eq!(Cadence::from_interval(60), Cadence::EveryNMinutes { minutes: 1 });
        assert_eq!(Cadence::from_interval(300), Cadence::EveryNMinutes { minutes: 5 });
        assert_eq!(Cadence::from_interval(3540), Cadence::EveryNMinutes { minutes: 59 });
        assert_eq!(Cadence::from_interval(3600), Cadence::EveryNHours { hours: 1 });
        assert_eq!(Cadence::from_interval(7200), Cadence::EveryNHours { hours: 2 });
    }

    #[test]
    fn test_irregular_intervals_run_every_minute() {
        assert_eq!(Cadence::from_interval(90), Cadence::EveryNMinutes { minutes: 1 });
        assert_eq!(Cadence::from_interval(5400), Cadence::EveryNMinutes { minutes: 1 });
    }

    #[test]
    fn test_next_after_never_repeats_a_boundary() {
        let cadence = Cadence::EveryNMinutes { minutes: 5 };
        let fired = at(10, 5, 0);

        let early_wake = fired - Duration::milliseconds(800);
        assert_eq!(cadence.next_fire(early_wake), fired);
        assert_eq!(cadence.next_after(fired, early_wake), at(10, 10, 0));
        assert_eq!(cadence.next_after(fired, fired), at(10, 10, 0));

        let late_wake = at(10, 17, 30);
        assert_eq!(cadence.next_after(fired, late_wake), at(10, 20, 0));

        let hourly = Cadence::EveryNHours { hours: 1 };
        assert_eq!(hourly.next_after(at(11, 0, 0), at(10, 59, 59)), at(12, 0, 0));
    }

    #[test]
    fn test_next_fire_fixed_period() {
        let cadence = Cadence::FixedPeriod { seconds: 15 };
        assert_eq!(cadence.next_fire(at(10, 0, 7)), at(10, 0, 22));
    }

    #[test]
    fn test_next_fire_minutes_aligns_to_clock() {
        let every_five = Cadence::EveryNMinutes { minutes: 5 };
        assert_eq!(every_five.next_fire(at(10, 2, 30)), at(10, 5, 0));
        assert_eq!(every_five.next_fire(at(10, 5, 0)), at(10, 10, 0));
        assert_eq!(every_five.next_fire(at(10, 58, 0)), at(11, 0, 0));

        let every_minute = Cadence::EveryNMinutes { minutes: 1 };
        assert_eq!(every_minute.next_fire(at(10, 2, 59)), at(10, 3, 0));
    }

    #[test]
    fn test_next_fire_hours_aligns_to_clock() {
        let every_two = Cadence::EveryNHours { hours: 2 };
        assert_eq!(every_two.next_fire(at(9, 15, 0)), at(10, 0, 0));
        assert_eq!(every_two.next_fire(at(10, 0, 0)), at(12, 0, 0));

        let daily = Cadence::EveryNHours { hours: 24 };
        assert_eq!(
            daily.next_fire(at(9, 15, 0)),
            Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Cadence::from_interval(30).to_string(), "every 30s");
        assert_eq!(Cadence::from_interval(600).to_string(), "every 10 minutes");
        assert_eq!(Cadence::from_interval(3600).to_string(), "every hour");
    }
}
