//! Sprint schedule generation.
//!
//! Days are never stored: the schedule is rebuilt from the configuration
//! whenever it is needed, so a config change takes effect immediately.

use crate::document::DEFAULT_TITLE;
use crate::{Day, DayTargets, SlotCounts, SprintConfig};
use chrono::{Datelike, Duration};

/// Linear progression value for a 0-based step: `min(progressive_max, step + 1)`
pub fn progression_value(cfg: &SprintConfig, step: u32) -> u32 {
    cfg.progressive_max.min(step.saturating_add(1))
}

/// Targets for the day at progression `step`
///
/// - morning: fixed base push-ups and base lifts
/// - midday: progressive lifts, push-ups only when the progressive flag is set
/// - evening: progressive push-ups, fixed base lifts
pub fn targets_for_step(cfg: &SprintConfig, step: u32) -> DayTargets {
    let p = progression_value(cfg, step);
    let midday_pushups = if cfg.pushup_midday_progressive { p } else { 0 };

    DayTargets {
        morning: SlotCounts::new(cfg.base_pushups, cfg.base_lifts, cfg.base_lifts),
        midday: SlotCounts::new(midday_pushups, p, p),
        evening: SlotCounts::new(p, cfg.base_lifts, cfg.base_lifts),
    }
}

/// Build the ordered list of sprint days
///
/// Walks forward from the start date, skipping the rest weekday without
/// counting it, until `total_days` days have been included.
pub fn build_days(cfg: &SprintConfig) -> Vec<Day> {
    let skip = cfg.skip_day();
    let mut days = Vec::with_capacity(cfg.total_days as usize);
    let mut date = cfg.start_date;
    let mut included: u32 = 0;

    while included < cfg.total_days {
        if skip == Some(date.weekday()) {
            date += Duration::days(1);
            continue;
        }

        let title = if cfg.rotation.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            cfg.rotation[included as usize % cfg.rotation.len()].clone()
        };

        days.push(Day {
            date,
            weekday: date.weekday(),
            title,
            targets: targets_for_step(cfg, included),
        });

        included += 1;
        date += Duration::days(1);
    }

    tracing::trace!("Built schedule of {} days from {}", days.len(), cfg.start_date);
    days
}
