//! The persisted root document and its import/export contract.
//!
//! Everything the tracker knows lives in one [`Document`]: the sprint
//! configuration, per-day progress, achievements, gamification state and
//! quests. The JSON shape uses camelCase keys and ISO dates so exported
//! files stay readable and portable.

use crate::{DayProgress, Error, Result, MAX_COUNT};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// Longest sprint accepted by the configuration merge
pub const MAX_SPRINT_DAYS: u32 = 366;

/// Latest calendar year a sprint may start in
pub const MAX_START_YEAR: i32 = 9999;

/// Label used when the rotation list is empty
pub const DEFAULT_TITLE: &str = "Dumbbell";

// ============================================================================
// Sprint Configuration
// ============================================================================

/// Sprint configuration (`cfg` in the document)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SprintConfig {
    pub start_date: NaiveDate,
    pub total_days: u32,
    /// `-1` for none, otherwise `0` (Sunday) through `6` (Saturday)
    pub skip_weekday: i8,
    pub times: [String; 3],
    pub rotation: Vec<String>,
    pub pushup_midday_progressive: bool,
    pub base_pushups: u32,
    /// Per arm
    pub base_lifts: u32,
    pub progressive_max: u32,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2025, 8, 20).unwrap_or_default(),
            total_days: 12,
            skip_weekday: 0,
            times: ["8:30 AM".into(), "12:00 PM".into(), "4:00 PM".into()],
            rotation: vec![
                "Biceps Curl".into(),
                "Shoulder Press".into(),
                "Bent-over Row".into(),
            ],
            pushup_midday_progressive: false,
            base_pushups: 12,
            base_lifts: 12,
            progressive_max: 12,
        }
    }
}

impl SprintConfig {
    /// The rest weekday, if one is configured
    pub fn skip_day(&self) -> Option<Weekday> {
        weekday_from_sunday(self.skip_weekday)
    }
}

/// Convert a Sunday-based weekday number to a `Weekday`; negative means none
pub fn weekday_from_sunday(n: i8) -> Option<Weekday> {
    match n {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Sunday-based weekday number of a date (`0` = Sunday)
pub fn sunday_index(date: NaiveDate) -> i8 {
    date.weekday().num_days_from_sunday() as i8
}

/// Partial configuration: every field optional, merged over a base.
///
/// Numeric fields are read wide so out-of-range values can be rejected with
/// a clear message instead of a generic parse failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SprintConfigPatch {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_days: Option<i64>,
    #[serde(default)]
    pub skip_weekday: Option<i64>,
    #[serde(default)]
    pub times: Option<Vec<String>>,
    #[serde(default)]
    pub rotation: Option<Vec<String>>,
    #[serde(default)]
    pub pushup_midday_progressive: Option<bool>,
    #[serde(default)]
    pub base_pushups: Option<i64>,
    #[serde(default)]
    pub base_lifts: Option<i64>,
    #[serde(default)]
    pub progressive_max: Option<i64>,
}

/// Parse an ISO `YYYY-MM-DD` date as typed by a user
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Date(format!("{:?}: {}", s, e)))
}

/// Merge `patch` over `base`, validating every explicit value.
///
/// Absent fields keep the base value. Blank time labels fall back to the
/// base label; rotation entries are trimmed and blank ones dropped.
pub fn merge_config(base: &SprintConfig, patch: SprintConfigPatch) -> Result<SprintConfig> {
    let mut cfg = base.clone();

    if let Some(start) = patch.start_date {
        checked_range("startDate year", start.year() as i64, 1, MAX_START_YEAR as i64)?;
        cfg.start_date = start;
    }
    if let Some(days) = patch.total_days {
        cfg.total_days = checked_range("totalDays", days, 1, MAX_SPRINT_DAYS as i64)? as u32;
    }
    if let Some(skip) = patch.skip_weekday {
        cfg.skip_weekday = checked_range("skipWeekday", skip, -1, 6)? as i8;
    }
    if let Some(times) = patch.times {
        for (i, label) in times.into_iter().take(3).enumerate() {
            let label = label.trim();
            if !label.is_empty() {
                cfg.times[i] = label.to_string();
            }
        }
    }
    if let Some(rotation) = patch.rotation {
        cfg.rotation = rotation
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(progressive) = patch.pushup_midday_progressive {
        cfg.pushup_midday_progressive = progressive;
    }
    if let Some(n) = patch.base_pushups {
        cfg.base_pushups = checked_range("basePushups", n, 0, MAX_COUNT as i64)? as u32;
    }
    if let Some(n) = patch.base_lifts {
        cfg.base_lifts = checked_range("baseLifts", n, 0, MAX_COUNT as i64)? as u32;
    }
    if let Some(n) = patch.progressive_max {
        cfg.progressive_max = checked_range("progressiveMax", n, 0, MAX_COUNT as i64)? as u32;
    }

    Ok(cfg)
}

fn checked_range(name: &str, value: i64, min: i64, max: i64) -> Result<i64> {
    if value < min || value > max {
        return Err(Error::Config(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value)
}

// ============================================================================
// Achievements, Gamification, Quests
// ============================================================================

/// Write-once achievement markers
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Achievements {
    /// Dates that reached 100% ("Day Master")
    pub days: BTreeMap<NaiveDate, bool>,
    /// Fridays that reached 100% ("Week Finisher")
    pub weeks: BTreeMap<NaiveDate, bool>,
    /// Every day of the sprint reached 100%
    pub challenge12: bool,
}

/// XP, streak and badge state
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GamifyState {
    #[serde(rename = "xpTotal")]
    pub xp_total: u64,
    #[serde(rename = "xpToday")]
    pub xp_today: u64,
    #[serde(
        rename = "lastXPDay",
        serialize_with = "serialize_optional_date",
        deserialize_with = "deserialize_optional_date"
    )]
    pub last_xp_day: Option<NaiveDate>,
    pub streak: u32,
    #[serde(rename = "streakBest")]
    pub streak_best: u32,
    pub badges: BTreeMap<String, bool>,
    #[serde(
        rename = "firstMoveDay",
        serialize_with = "serialize_optional_date",
        deserialize_with = "deserialize_optional_date"
    )]
    pub first_move_day: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DailyQuest {
    pub key: String,
    pub label: String,
    pub done: bool,
    pub rewarded: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WeeklyQuest {
    pub key: String,
    pub label: String,
    pub target: u32,
    pub count: u32,
    pub rewarded: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Quests {
    pub daily: BTreeMap<NaiveDate, DailyQuest>,
    /// Keyed by ISO week, e.g. `2025-W34`
    pub weekly: BTreeMap<String, WeeklyQuest>,
    pub stickers: BTreeMap<String, bool>,
}

// Dates written by older exports may be empty strings.
fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn serialize_optional_date<S>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
        None => serializer.serialize_str(""),
    }
}

// ============================================================================
// Document
// ============================================================================

/// The single persisted root of all tracker state
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Document {
    pub version: u32,
    pub cfg: SprintConfig,
    pub progress: BTreeMap<NaiveDate, DayProgress>,
    pub achievements: Achievements,
    pub gamify: GamifyState,
    pub quests: Quests,
}

impl Default for Document {
    fn default() -> Self {
        Self::with_config(SprintConfig::default())
    }
}

/// Wire form accepted by import: every top-level block optional
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    cfg: Option<SprintConfigPatch>,
    #[serde(default)]
    progress: Option<BTreeMap<NaiveDate, DayProgress>>,
    #[serde(default)]
    achievements: Option<Achievements>,
    #[serde(default)]
    gamify: Option<GamifyState>,
    #[serde(default)]
    quests: Option<Quests>,
}

impl Document {
    /// Fresh document with empty progress for the given configuration
    pub fn with_config(cfg: SprintConfig) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            cfg,
            progress: BTreeMap::new(),
            achievements: Achievements::default(),
            gamify: GamifyState::default(),
            quests: Quests::default(),
        }
    }

    /// Parse and validate an exported document.
    ///
    /// Rejects text that is not JSON, documents missing `cfg` or `progress`,
    /// and configurations with out-of-range values. Missing
    /// `achievements`, `gamify` and `quests` blocks are defaulted, `cfg` is
    /// merged over the default configuration and counters are clamped.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(text)
            .map_err(|e| Error::Import(format!("not a valid document: {}", e)))?;

        let patch = raw
            .cfg
            .ok_or_else(|| Error::Import("missing `cfg` block".into()))?;
        let mut progress = raw
            .progress
            .ok_or_else(|| Error::Import("missing `progress` block".into()))?;

        let cfg = merge_config(&SprintConfig::default(), patch)
            .map_err(|e| Error::Import(e.to_string()))?;

        for day in progress.values_mut() {
            day.clamp_to_max();
        }

        Ok(Self {
            version: raw.version.unwrap_or(DOCUMENT_VERSION),
            cfg,
            progress,
            achievements: raw.achievements.unwrap_or_default(),
            gamify: raw.gamify.unwrap_or_default(),
            quests: raw.quests.unwrap_or_default(),
        })
    }

    /// Serialize the whole document for export
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_merge_overrides_only_explicit_fields() {
        let patch = SprintConfigPatch {
            total_days: Some(5),
            skip_weekday: Some(-1),
            ..Default::default()
        };
        let cfg = merge_config(&SprintConfig::default(), patch).unwrap();

        assert_eq!(cfg.total_days, 5);
        assert_eq!(cfg.skip_day(), None);
        assert_eq!(cfg.base_pushups, 12);
        assert_eq!(cfg.rotation.len(), 3);
    }

    #[test]
    fn test_merge_rejects_out_of_range_values() {
        let zero_days = SprintConfigPatch {
            total_days: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            merge_config(&SprintConfig::default(), zero_days),
            Err(Error::Config(_))
        ));

        let bad_skip = SprintConfigPatch {
            skip_weekday: Some(7),
            ..Default::default()
        };
        assert!(merge_config(&SprintConfig::default(), bad_skip).is_err());

        let negative = SprintConfigPatch {
            base_lifts: Some(-3),
            ..Default::default()
        };
        assert!(merge_config(&SprintConfig::default(), negative).is_err());
    }

    #[test]
    fn test_merge_rejects_start_date_out_of_calendar_range() {
        let far_future = SprintConfigPatch {
            start_date: Some(NaiveDate::MAX),
            total_days: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            merge_config(&SprintConfig::default(), far_future),
            Err(Error::Config(_))
        ));

        let last_year = SprintConfigPatch {
            start_date: Some(date("9999-12-25")),
            total_days: Some(MAX_SPRINT_DAYS as i64),
            ..Default::default()
        };
        let cfg = merge_config(&SprintConfig::default(), last_year).unwrap();
        assert_eq!(crate::build_days(&cfg).len(), MAX_SPRINT_DAYS as usize);
    }

    #[test]
    fn test_import_rejects_unreachable_start_date() {
        let text = r#"{
            "cfg": { "startDate": "+262142-12-29", "totalDays": 5, "skipWeekday": -1 },
            "progress": {}
        }"#;
        assert!(matches!(Document::from_json(text), Err(Error::Import(_))));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(" 2025-08-20 ").unwrap(), date("2025-08-20"));
        assert!(matches!(parse_date("2025-02-30"), Err(Error::Date(_))));
        assert!(matches!(parse_date("yesterday"), Err(Error::Date(_))));
    }

    #[test]
    fn test_merge_cleans_times_and_rotation() {
        let patch = SprintConfigPatch {
            times: Some(vec!["7:00 AM".into(), "  ".into()]),
            rotation: Some(vec![" Curl ".into(), "".into(), "Row".into()]),
            ..Default::default()
        };
        let cfg = merge_config(&SprintConfig::default(), patch).unwrap();

        assert_eq!(cfg.times[0], "7:00 AM");
        assert_eq!(cfg.times[1], "12:00 PM");
        assert_eq!(cfg.rotation, vec!["Curl".to_string(), "Row".to_string()]);
    }

    #[test]
    fn test_export_uses_document_keys() {
        let mut doc = Document::default();
        doc.progress
            .insert(date("2025-08-20"), DayProgress::default());
        let json: serde_json::Value =
            serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["cfg"]["startDate"], "2025-08-20");
        assert_eq!(json["cfg"]["skipWeekday"], 0);
        assert_eq!(json["cfg"]["pushupMiddayProgressive"], false);
        assert_eq!(json["gamify"]["lastXPDay"], "");
        assert!(json["progress"]["2025-08-20"]["morning"]["dumbL"].is_number());
        assert_eq!(json["achievements"]["challenge12"], false);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut doc = Document::default();
        doc.progress.entry(date("2025-08-21")).or_default().midday.dumb_r = 4;
        doc.achievements.days.insert(date("2025-08-21"), true);
        doc.gamify.xp_total = 321;
        doc.gamify.last_xp_day = Some(date("2025-08-21"));
        doc.gamify.badges.insert("dayMaster".into(), true);
        doc.quests.stickers.insert("day:2025-08-21".into(), true);

        let restored = Document::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_import_defaults_missing_blocks() {
        let text = r#"{
            "version": 1,
            "cfg": { "totalDays": 3, "rotation": [] },
            "progress": {},
            "achievements": { "days": { "2025-08-20": true } }
        }"#;
        let doc = Document::from_json(text).unwrap();

        assert_eq!(doc.cfg.total_days, 3);
        assert!(doc.cfg.rotation.is_empty());
        assert_eq!(doc.cfg.base_lifts, 12);
        assert_eq!(doc.gamify, GamifyState::default());
        assert_eq!(doc.quests, Quests::default());
        assert_eq!(doc.achievements.days.len(), 1);
    }

    #[test]
    fn test_import_accepts_empty_date_markers() {
        let text = r#"{
            "cfg": {},
            "progress": { "2025-08-20": { "morning": { "pushups": 2000 } } },
            "gamify": { "xpTotal": 10, "lastXPDay": "", "streak": 1 }
        }"#;
        let doc = Document::from_json(text).unwrap();

        assert_eq!(doc.gamify.last_xp_day, None);
        assert_eq!(doc.gamify.xp_total, 10);
        assert_eq!(doc.progress[&date("2025-08-20")].morning.pushups, MAX_COUNT);
        assert_eq!(doc.progress[&date("2025-08-20")].midday.pushups, 0);
    }

    #[test]
    fn test_import_rejects_missing_required_blocks() {
        let no_progress = r#"{ "cfg": { "totalDays": 3 } }"#;
        assert!(matches!(
            Document::from_json(no_progress),
            Err(Error::Import(_))
        ));

        let no_cfg = r#"{ "progress": {} }"#;
        assert!(matches!(Document::from_json(no_cfg), Err(Error::Import(_))));

        assert!(matches!(
            Document::from_json("not json at all"),
            Err(Error::Import(_))
        ));
    }

    #[test]
    fn test_import_rejects_invalid_config() {
        let text = r#"{ "cfg": { "totalDays": -2 }, "progress": {} }"#;
        assert!(matches!(Document::from_json(text), Err(Error::Import(_))));
    }

    #[test]
    fn test_sunday_based_weekdays() {
        assert_eq!(sunday_index(date("2025-08-24")), 0); // Sunday
        assert_eq!(sunday_index(date("2025-08-22")), 5); // Friday
        assert_eq!(weekday_from_sunday(-1), None);
        assert_eq!(weekday_from_sunday(3), Some(Weekday::Wed));
    }
}
