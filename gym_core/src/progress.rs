//! Per-day completion counters.
//!
//! Entries are created lazily the first time a date is touched and only ever
//! removed by a full wipe. Counter edges are clamped, never reported as
//! errors.

use crate::{DayProgress, Field, Slot, MAX_COUNT};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// All logged progress, keyed by date
pub type ProgressLog = BTreeMap<NaiveDate, DayProgress>;

/// Return the entry for `date`, creating an all-zero one if missing
pub fn get_or_init(log: &mut ProgressLog, date: NaiveDate) -> &mut DayProgress {
    log.entry(date).or_insert_with(|| {
        tracing::debug!("Initialized progress for {}", date);
        DayProgress::default()
    })
}

/// Read-only lookup; missing dates read as zero
pub fn get_or_zero(log: &ProgressLog, date: NaiveDate) -> DayProgress {
    log.get(&date).copied().unwrap_or_default()
}

/// Add one repetition, clamped to `MAX_COUNT`. Returns the new count.
pub fn increment(log: &mut ProgressLog, date: NaiveDate, slot: Slot, field: Field) -> u32 {
    let value = get_or_init(log, date).slot_mut(slot).get_mut(field);
    *value = value.saturating_add(1).min(MAX_COUNT);
    tracing::debug!("{} {} {} -> {}", date, slot, field, *value);
    *value
}

/// Remove one repetition, clamped at zero. Returns the new count.
pub fn decrement(log: &mut ProgressLog, date: NaiveDate, slot: Slot, field: Field) -> u32 {
    let value = get_or_init(log, date).slot_mut(slot).get_mut(field);
    *value = value.saturating_sub(1);
    tracing::debug!("{} {} {} -> {}", date, slot, field, *value);
    *value
}

/// Zero all three slots of `date`
pub fn reset_day(log: &mut ProgressLog, date: NaiveDate) {
    *get_or_init(log, date) = DayProgress::default();
    tracing::info!("Reset progress for {}", date);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
    }

    #[test]
    fn test_get_or_init_creates_zeroed_entry() {
        let mut log = ProgressLog::new();
        assert_eq!(*get_or_init(&mut log, day()), DayProgress::default());
        assert!(log.contains_key(&day()));
        assert_eq!(get_or_zero(&log, day().succ_opt().unwrap()).total(), 0);
    }

    #[test]
    fn test_increment_then_decrement_restores_value() {
        let mut log = ProgressLog::new();
        increment(&mut log, day(), Slot::Morning, Field::Pushups);
        let before = increment(&mut log, day(), Slot::Morning, Field::Pushups);

        increment(&mut log, day(), Slot::Morning, Field::Pushups);
        let after = decrement(&mut log, day(), Slot::Morning, Field::Pushups);
        assert_eq!(before, after);
        assert_eq!(log[&day()].morning.dumb_r, 0);
    }

    #[test]
    fn test_counters_clamp_at_both_ends() {
        let mut log = ProgressLog::new();
        assert_eq!(decrement(&mut log, day(), Slot::Midday, Field::DumbL), 0);

        get_or_init(&mut log, day()).evening.dumb_r = MAX_COUNT;
        assert_eq!(increment(&mut log, day(), Slot::Evening, Field::DumbR), MAX_COUNT);
        assert_eq!(decrement(&mut log, day(), Slot::Evening, Field::DumbR), MAX_COUNT - 1);
    }

    #[test]
    fn test_reset_day_only_touches_that_date() {
        let mut log = ProgressLog::new();
        let other = day().succ_opt().unwrap();
        increment(&mut log, day(), Slot::Midday, Field::DumbR);
        increment(&mut log, other, Slot::Midday, Field::DumbR);

        reset_day(&mut log, day());
        assert_eq!(log[&day()].total(), 0);
        assert_eq!(log[&other].total(), 1);
    }
}
