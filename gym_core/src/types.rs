//! Core domain types for the Micro-Gym sprint tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Slots and exercise fields
//! - Per-day counters (used for both progress and targets)
//! - Derived schedule days
//! - Badges, titles and the events emitted by the gamification engine

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for any single counter
pub const MAX_COUNT: u32 = 999;

// ============================================================================
// Slots and Fields
// ============================================================================

/// Time-of-day bucket within a day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Morning,
    Midday,
    Evening,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Morning, Slot::Midday, Slot::Evening];

    /// Position of this slot, also the index into the configured time labels
    pub fn index(self) -> usize {
        match self {
            Slot::Morning => 0,
            Slot::Midday => 1,
            Slot::Evening => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Morning => "morning",
            Slot::Midday => "midday",
            Slot::Evening => "evening",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "morning" | "am" => Ok(Slot::Morning),
            "midday" | "noon" => Ok(Slot::Midday),
            "evening" | "pm" => Ok(Slot::Evening),
            other => Err(crate::Error::Other(format!("Unknown slot: {}", other))),
        }
    }
}

/// Exercise counter within a slot
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Pushups,
    /// Right-arm dumbbell lifts
    DumbR,
    /// Left-arm dumbbell lifts
    DumbL,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Pushups, Field::DumbR, Field::DumbL];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Pushups => "pushups",
            Field::DumbR => "dumbR",
            Field::DumbL => "dumbL",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "pushups" | "pu" => Ok(Field::Pushups),
            "dumbr" | "right" | "r" => Ok(Field::DumbR),
            "dumbl" | "left" | "l" => Ok(Field::DumbL),
            other => Err(crate::Error::Other(format!("Unknown field: {}", other))),
        }
    }
}

// ============================================================================
// Counters
// ============================================================================

/// The three counters of one slot
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotCounts {
    #[serde(default)]
    pub pushups: u32,
    #[serde(default)]
    pub dumb_r: u32,
    #[serde(default)]
    pub dumb_l: u32,
}

impl SlotCounts {
    pub fn new(pushups: u32, dumb_r: u32, dumb_l: u32) -> Self {
        Self {
            pushups,
            dumb_r,
            dumb_l,
        }
    }

    pub fn get(&self, field: Field) -> u32 {
        match field {
            Field::Pushups => self.pushups,
            Field::DumbR => self.dumb_r,
            Field::DumbL => self.dumb_l,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut u32 {
        match field {
            Field::Pushups => &mut self.pushups,
            Field::DumbR => &mut self.dumb_r,
            Field::DumbL => &mut self.dumb_l,
        }
    }

    pub fn sum(&self) -> u32 {
        self.pushups + self.dumb_r + self.dumb_l
    }

    /// Lifts across both arms
    pub fn lifts(&self) -> u32 {
        self.dumb_r + self.dumb_l
    }
}

/// Counters for a whole day: three slots of three fields.
///
/// The same shape carries both logged progress and derived targets.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCounts {
    #[serde(default)]
    pub morning: SlotCounts,
    #[serde(default)]
    pub midday: SlotCounts,
    #[serde(default)]
    pub evening: SlotCounts,
}

/// Logged repetitions for one date
pub type DayProgress = DayCounts;

/// Goal repetitions for one date
pub type DayTargets = DayCounts;

impl DayCounts {
    pub fn slot(&self, slot: Slot) -> &SlotCounts {
        match slot {
            Slot::Morning => &self.morning,
            Slot::Midday => &self.midday,
            Slot::Evening => &self.evening,
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut SlotCounts {
        match slot {
            Slot::Morning => &mut self.morning,
            Slot::Midday => &mut self.midday,
            Slot::Evening => &mut self.evening,
        }
    }

    pub fn get(&self, slot: Slot, field: Field) -> u32 {
        self.slot(slot).get(field)
    }

    /// Sum of all nine counters
    pub fn total(&self) -> u32 {
        Slot::ALL.iter().map(|s| self.slot(*s).sum()).sum()
    }

    /// A day is active when at least one slot has logged anything
    pub fn is_active(&self) -> bool {
        Slot::ALL.iter().any(|s| self.slot(*s).sum() > 0)
    }

    /// Clamp every counter into `[0, MAX_COUNT]`
    pub fn clamp_to_max(&mut self) {
        for slot in Slot::ALL {
            for field in Field::ALL {
                let value = self.slot_mut(slot).get_mut(field);
                *value = (*value).min(MAX_COUNT);
            }
        }
    }
}

// ============================================================================
// Schedule Types
// ============================================================================

/// One derived day of the sprint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Day {
    pub date: NaiveDate,
    pub weekday: Weekday,
    /// Exercise name from the rotation
    pub title: String,
    pub targets: DayTargets,
}

// ============================================================================
// Gamification Types
// ============================================================================

/// Badges that can be earned once per document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Badge {
    DayMaster,
    WeekFinisher,
    Challenge12,
    Pushups50,
    Lifts100,
    Streak7,
    Streak12,
}

impl Badge {
    pub const ALL: [Badge; 7] = [
        Badge::DayMaster,
        Badge::WeekFinisher,
        Badge::Challenge12,
        Badge::Pushups50,
        Badge::Lifts100,
        Badge::Streak7,
        Badge::Streak12,
    ];

    /// Key used in the persisted badge map
    pub fn id(self) -> &'static str {
        match self {
            Badge::DayMaster => "dayMaster",
            Badge::WeekFinisher => "weekFinisher",
            Badge::Challenge12 => "challenge12",
            Badge::Pushups50 => "pu50",
            Badge::Lifts100 => "lifts100",
            Badge::Streak7 => "streak7",
            Badge::Streak12 => "streak12",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Badge::DayMaster => "Day Master",
            Badge::WeekFinisher => "Week Finisher",
            Badge::Challenge12 => "Sprint Challenger",
            Badge::Pushups50 => "50 Push-ups",
            Badge::Lifts100 => "100 Lifts",
            Badge::Streak7 => "Streak 7",
            Badge::Streak12 => "Streak 12",
        }
    }
}

/// Rank shown for an XP level
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Title {
    Rookie,
    Sprinter,
    Ironcore,
    Gladiator,
    Titan,
}

impl Title {
    pub fn for_level(level: u64) -> Self {
        match level {
            l if l >= 20 => Title::Titan,
            l if l >= 15 => Title::Gladiator,
            l if l >= 10 => Title::Ironcore,
            l if l >= 5 => Title::Sprinter,
            _ => Title::Rookie,
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Title::Rookie => "Rookie",
            Title::Sprinter => "Sprinter",
            Title::Ironcore => "Ironcore",
            Title::Gladiator => "Gladiator",
            Title::Titan => "Titan",
        };
        f.write_str(name)
    }
}

/// One-time notifications produced by a mutation and its reconcile pass.
///
/// The presentation layer decides how to show them (toast, confetti, line of
/// terminal output); the engine only guarantees each fires once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A counter just reached its non-zero target
    TargetReached {
        date: NaiveDate,
        slot: Slot,
        field: Field,
    },
    /// First logged movement of the calendar day
    FirstMove { xp: u64 },
    /// A scheduled day reached 100%
    DayMaster { date: NaiveDate, xp: u64 },
    /// A Friday reached 100%
    WeekFinisher { date: NaiveDate },
    /// Every scheduled day of the sprint reached 100%
    SprintComplete,
    BadgeEarned(Badge),
    DailyQuestDone { date: NaiveDate, xp: u64 },
    WeeklyQuestDone { week: String, xp: u64 },
    LevelUp { level: u64, title: Title },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::TargetReached { slot, field, .. } => {
                write!(f, "Target reached: {} {}", slot, field)
            }
            GameEvent::FirstMove { xp } => write!(f, "First move of the day (+{} XP)", xp),
            GameEvent::DayMaster { date, xp } => {
                write!(f, "Day Master: {} completed at 100% (+{} XP)", date, xp)
            }
            GameEvent::WeekFinisher { date } => {
                write!(f, "Week Finisher: Friday {} completed at 100%", date)
            }
            GameEvent::SprintComplete => f.write_str("Sprint complete: every day at 100%"),
            GameEvent::BadgeEarned(badge) => write!(f, "Badge: {}", badge.label()),
            GameEvent::DailyQuestDone { date, xp } => {
                write!(f, "Daily quest done for {} (+{} XP)", date, xp)
            }
            GameEvent::WeeklyQuestDone { week, xp } => {
                write!(f, "Weekly quest done for {} (+{} XP)", week, xp)
            }
            GameEvent::LevelUp { level, title } => write!(f, "Level {} reached: {}", level, title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_and_field_parsing() {
        assert_eq!("Morning".parse::<Slot>().unwrap(), Slot::Morning);
        assert_eq!("noon".parse::<Slot>().unwrap(), Slot::Midday);
        assert_eq!("dumbR".parse::<Field>().unwrap(), Field::DumbR);
        assert_eq!("left".parse::<Field>().unwrap(), Field::DumbL);
        assert!("night".parse::<Slot>().is_err());
    }

    #[test]
    fn test_counts_serialize_with_document_keys() {
        let mut day = DayCounts::default();
        day.midday.dumb_r = 3;
        let json = serde_json::to_value(day).unwrap();
        assert_eq!(json["midday"]["dumbR"], 3);
        assert_eq!(json["evening"]["dumbL"], 0);
    }

    #[test]
    fn test_active_and_total() {
        let mut day = DayCounts::default();
        assert!(!day.is_active());
        *day.slot_mut(Slot::Evening).get_mut(Field::Pushups) = 4;
        day.morning.dumb_l = 2;
        assert!(day.is_active());
        assert_eq!(day.total(), 6);
    }

    #[test]
    fn test_clamp_to_max() {
        let mut day = DayCounts::default();
        day.morning.pushups = 5_000;
        day.clamp_to_max();
        assert_eq!(day.morning.pushups, MAX_COUNT);
    }

    #[test]
    fn test_title_thresholds() {
        assert_eq!(Title::for_level(0), Title::Rookie);
        assert_eq!(Title::for_level(5), Title::Sprinter);
        assert_eq!(Title::for_level(14), Title::Ironcore);
        assert_eq!(Title::for_level(15), Title::Gladiator);
        assert_eq!(Title::for_level(40), Title::Titan);
    }
}
