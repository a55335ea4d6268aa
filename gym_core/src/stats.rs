//! Derived statistics: day completion, streaks and aggregate totals.
//!
//! Nothing here mutates state. Completion is always computed against
//! progress clamped to the day's targets, so overshooting one field never
//! compensates for another.

use crate::progress::{get_or_zero, ProgressLog};
use crate::{Day, DayCounts, DayProgress, Field, Slot};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Progress with every field clamped to `[0, target]`
pub fn clamped(day: &Day, progress: &DayProgress) -> DayCounts {
    let mut out = DayCounts::default();
    for slot in Slot::ALL {
        for field in Field::ALL {
            let target = day.targets.get(slot, field);
            *out.slot_mut(slot).get_mut(field) = progress.get(slot, field).min(target);
        }
    }
    out
}

/// Completion percentage of a day, rounded to the nearest integer.
///
/// The denominator floors to 1, so a day without targets reads 0%.
pub fn day_completion(day: &Day, progress: &DayProgress) -> u32 {
    let target = day.targets.total().max(1) as u64;
    let done = clamped(day, progress).total() as u64;
    ((done * 100 + target / 2) / target) as u32
}

/// A day is perfect when it has targets and clamped progress covers them all
pub fn is_day100(day: &Day, progress: &DayProgress) -> bool {
    let target = day.targets.total();
    target > 0 && clamped(day, progress).total() >= target
}

/// Every midday target met (and there is at least one)
pub fn midday_met(day: &Day, progress: &DayProgress) -> bool {
    let targets = day.targets.midday;
    targets.sum() > 0
        && Field::ALL
            .iter()
            .all(|f| progress.midday.get(*f) >= targets.get(*f))
}

/// Current streak over the whole progress history.
///
/// Starts at the most recent active date and walks backward; a gap between
/// two active dates is bridged only when every date in between is the rest
/// weekday.
pub fn global_streak(log: &ProgressLog, skip: Option<Weekday>) -> u32 {
    let active: Vec<NaiveDate> = log
        .iter()
        .filter(|(_, p)| p.is_active())
        .map(|(d, _)| *d)
        .collect();

    let Some(mut newer) = active.last().copied() else {
        return 0;
    };

    let mut streak = 1;
    for older in active.iter().rev().skip(1).copied() {
        if !gap_bridged(older, newer, skip) {
            break;
        }
        streak += 1;
        newer = older;
    }
    streak
}

/// True when every date strictly between `older` and `newer` is the rest day
fn gap_bridged(older: NaiveDate, newer: NaiveDate, skip: Option<Weekday>) -> bool {
    let mut d = older + Duration::days(1);
    while d < newer {
        if Some(d.weekday()) != skip {
            return false;
        }
        d += Duration::days(1);
    }
    true
}

/// Raw repetition totals over the generated schedule
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub pushups: u32,
    /// Both arms
    pub lifts: u32,
}

pub fn totals(days: &[Day], log: &ProgressLog) -> Totals {
    days.iter()
        .map(|d| get_or_zero(log, d.date))
        .fold(Totals::default(), |mut acc, p| {
            for slot in Slot::ALL {
                acc.pushups += p.slot(slot).pushups;
                acc.lifts += p.slot(slot).lifts();
            }
            acc
        })
}

/// Sprint-wide overview for display
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SprintSummary {
    pub days: u32,
    pub perfect_days: u32,
    /// Clamped progress over all targets of the sprint
    pub completion: u32,
}

pub fn sprint_summary(days: &[Day], log: &ProgressLog) -> SprintSummary {
    let mut target: u64 = 0;
    let mut done: u64 = 0;
    let mut perfect_days = 0;

    for day in days {
        let p = get_or_zero(log, day.date);
        target += day.targets.total() as u64;
        done += clamped(day, &p).total() as u64;
        if is_day100(day, &p) {
            perfect_days += 1;
        }
    }

    let target = target.max(1);
    SprintSummary {
        days: days.len() as u32,
        perfect_days,
        completion: ((done * 100 + target / 2) / target) as u32,
    }
}
