//! Scheduling period and calendar helpers.
//!
//! # Time Model
//! A period is an inclusive range of calendar dates. Weekly limits are
//! evaluated over 7-day windows anchored at the period start, so a period
//! starting on a Wednesday has weeks Wed..Tue.
//!
//! # Consecutive Runs
//! A nurse's shifts, in chronological order, form a chain while each next
//! shift starts on the same calendar day as the previous one or the day
//! after. The run length is the number of shifts in the chain. A streak
//! carried in from history extends the first chain when that chain begins
//! no later than the day after the last recorded shift.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingPeriod {
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
}

/// A consecutive-shift streak carried in from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakCarry {
    /// Date of the last shift worked before the period.
    pub last_shift_date: NaiveDate,
    /// Length of the streak ending on `last_shift_date`.
    pub streak: u32,
}

impl SchedulingPeriod {
    /// Creates a period.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Creates a period of `days` days starting at `start`.
    pub fn from_days(start: NaiveDate, days: u32) -> Self {
        let end = start
            .checked_add_days(Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(start);
        Self { start, end }
    }

    /// Number of days (0 if `end < start`).
    pub fn num_days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }

    /// Whether a date falls in the period.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Index of the 7-day window containing `date`, anchored at the period start.
    ///
    /// Dates before the start map to window 0.
    pub fn week_index(&self, date: NaiveDate) -> usize {
        let offset = (date - self.start).num_days().max(0);
        (offset / 7) as usize
    }

    /// Number of 7-day windows covering the period.
    pub fn num_weeks(&self) -> usize {
        let days = self.num_days().max(1);
        ((days + 6) / 7) as usize
    }
}

/// Computes consecutive-run lengths from chronologically sorted shift dates.
///
/// Each element of `dates` is the start date of one shift. Returns one length
/// per chain, in chronological order. An empty input yields no runs.
pub fn consecutive_runs(dates: &[NaiveDate], carry: Option<StreakCarry>) -> Vec<u32> {
    let mut runs = Vec::new();
    let Some(&first) = dates.first() else {
        return runs;
    };

    let carried = match carry {
        Some(c)
            if c.streak > 0
                && first >= c.last_shift_date
                && (first - c.last_shift_date).num_days() <= 1 =>
        {
            c.streak
        }
        _ => 0,
    };
    let mut current = carried + 1;

    for pair in dates.windows(2) {
        let gap = (pair[1] - pair[0]).num_days();
        if gap <= 1 {
            current += 1;
        } else {
            runs.push(current);
            current = 1;
        }
    }
    runs.push(current);
    runs
}

/// Longest consecutive run (0 if there are no shifts).
pub fn longest_run(dates: &[NaiveDate], carry: Option<StreakCarry>) -> u32 {
    consecutive_runs(dates, carry).into_iter().max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_period_days_and_weeks() {
        let p = SchedulingPeriod::from_days(d(6), 7);
        assert_eq!(p.end, d(12));
        assert_eq!(p.num_days(), 7);
        assert_eq!(p.num_weeks(), 1);

        let p2 = SchedulingPeriod::from_days(d(6), 10);
        assert_eq!(p2.num_weeks(), 2);
        assert_eq!(p2.week_index(d(6)), 0);
        assert_eq!(p2.week_index(d(12)), 0);
        assert_eq!(p2.week_index(d(13)), 1);
    }

    #[test]
    fn test_period_contains() {
        let p = SchedulingPeriod::new(d(6), d(12));
        assert!(p.contains(d(6)));
        assert!(p.contains(d(12)));
        assert!(!p.contains(d(5)));
        assert!(!p.contains(d(13)));
    }

    #[test]
    fn test_runs_split_on_gap() {
        let dates = [d(6), d(7), d(7), d(9), d(10)];
        assert_eq!(consecutive_runs(&dates, None), vec![3, 2]);
        assert_eq!(longest_run(&dates, None), 3);
    }

    #[test]
    fn test_runs_empty() {
        assert!(consecutive_runs(&[], None).is_empty());
        assert_eq!(longest_run(&[], None), 0);
    }

    #[test]
    fn test_carry_extends_first_run() {
        let carry = StreakCarry {
            last_shift_date: d(5),
            streak: 2,
        };
        assert_eq!(consecutive_runs(&[d(6), d(7), d(10)], Some(carry)), vec![4, 1]);
    }

    #[test]
    fn test_carry_ignored_after_break() {
        let carry = StreakCarry {
            last_shift_date: d(3),
            streak: 3,
        };
        assert_eq!(consecutive_runs(&[d(6), d(7)], Some(carry)), vec![2]);
    }
}
