/// Fixed job schedules
///
/// Each job runs on one of three shapes: every N minutes on minute
/// boundaries, daily at a fixed UTC time, or weekly on a fixed weekday and
/// UTC time. `next_occurrence` is pure date arithmetic so the runner can
/// sleep until exactly the next boundary.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};

/// When a job fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSchedule {
    /// On minute boundaries divisible by N (N in 1..=60)
    EveryMinutes(u32),

    /// Once a day at the given UTC time
    DailyAt { hour: u32, minute: u32 },

    /// Once a week on the given weekday at the given UTC time
    WeeklyAt {
        weekday: Weekday,
        hour: u32,
        minute: u32,
    },
}

impl JobSchedule {
    /// The first instant strictly after `after` at which the schedule fires
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            JobSchedule::EveryMinutes(n) => {
                let n = n.clamp(1, 60);
                // Round up to the next minute boundary, then walk to a
                // matching minute. Bounded: some minute in every hour
                // satisfies minute % n == 0.
                let mut candidate = truncate_to_minute(after) + Duration::minutes(1);
                while candidate.minute() % n != 0 {
                    candidate += Duration::minutes(1);
                }
                candidate
            }
            JobSchedule::DailyAt { hour, minute } => {
                let time = NaiveTime::from_hms_opt(hour, minute, 0)
                    .unwrap_or(NaiveTime::MIN);
                let candidate = after.date_naive().and_time(time).and_utc();
                if candidate > after {
                    candidate
                } else {
                    candidate + Duration::days(1)
                }
            }
            JobSchedule::WeeklyAt {
                weekday,
                hour,
                minute,
            } => {
                let time = NaiveTime::from_hms_opt(hour, minute, 0)
                    .unwrap_or(NaiveTime::MIN);
                let days_ahead = (i64::from(weekday.num_days_from_monday())
                    - i64::from(after.weekday().num_days_from_monday())
                    + 7)
                    % 7;
                let candidate = (after.date_naive() + Duration::days(days_ahead))
                    .and_time(time)
                    .and_utc();
                if candidate > after {
                    candidate
                } else {
                    candidate + Duration::days(7)
                }
            }
        }
    }
}

fn truncate_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::seconds(i64::from(t.second())) - Duration::nanoseconds(i64::from(t.nanosecond()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_every_minutes_rounds_to_boundary() {
        let schedule = JobSchedule::EveryMinutes(30);

        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 3, 10, 12, 45)),
            at(2024, 6, 3, 10, 30, 0)
        );
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 3, 10, 30, 0)),
            at(2024, 6, 3, 11, 0, 0)
        );
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 3, 10, 59, 59)),
            at(2024, 6, 3, 11, 0, 0)
        );
    }

    #[test]
    fn test_every_minute() {
        let schedule = JobSchedule::EveryMinutes(1);
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 3, 10, 12, 45)),
            at(2024, 6, 3, 10, 13, 0)
        );
    }

    #[test]
    fn test_daily_same_day() {
        let schedule = JobSchedule::DailyAt { hour: 9, minute: 0 };
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 3, 7, 0, 0)),
            at(2024, 6, 3, 9, 0, 0)
        );
    }

    #[test]
    fn test_daily_rolls_to_next_day() {
        let schedule = JobSchedule::DailyAt { hour: 9, minute: 0 };
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 3, 9, 0, 0)),
            at(2024, 6, 4, 9, 0, 0)
        );
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 3, 23, 59, 59)),
            at(2024, 6, 4, 9, 0, 0)
        );
    }

    #[test]
    fn test_weekly_lands_on_weekday() {
        // 2024-06-03 is a Monday
        let schedule = JobSchedule::WeeklyAt {
            weekday: Weekday::Sun,
            hour: 0,
            minute: 0,
        };
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 3, 12, 0, 0)),
            at(2024, 6, 9, 0, 0, 0)
        );
    }

    #[test]
    fn test_weekly_same_day_rolls_a_week() {
        // 2024-06-09 is a Sunday
        let schedule = JobSchedule::WeeklyAt {
            weekday: Weekday::Sun,
            hour: 0,
            minute: 0,
        };
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 9, 0, 0, 0)),
            at(2024, 6, 16, 0, 0, 0)
        );
        assert_eq!(
            schedule.next_occurrence(at(2024, 6, 8, 23, 59, 0)),
            at(2024, 6, 9, 0, 0, 0)
        );
    }
}
