//! Gamification engine: XP, levels, badges, quests and stickers.
//!
//! Awards are write-once. Every mutation is followed by [`reconcile`], an
//! idempotent pass that re-derives achievements from the progress log and
//! fires each reward at most once. Its step order is part of the contract:
//!
//! 1. rebuild the schedule
//! 2. perfect days, Friday week finishers, sprint completion
//! 3. daily quests
//! 4. streak and best streak
//! 5. badges (these read steps 2 and 4)
//! 6. weekly quest for the current week

use crate::config::RulesConfig;
use crate::document::{sunday_index, DailyQuest, Document, GamifyState, Quests, WeeklyQuest};
use crate::progress::get_or_zero;
use crate::schedule::build_days;
use crate::stats::{global_streak, is_day100, midday_met, totals};
use crate::{Badge, GameEvent, Title};
use chrono::{Datelike, NaiveDate};

pub const XP_PER_REP: u64 = 1;
pub const XP_FIRST_MOVE: u64 = 5;
pub const XP_DAY_MASTER: u64 = 10;
pub const XP_DAILY_QUEST: u64 = 15;
pub const XP_WEEKLY_QUEST: u64 = 50;
pub const XP_PER_LEVEL: u64 = 100;

pub const DAILY_QUEST_LABEL: &str = "Meet all midday targets";

const FRIDAY: i8 = 5;

// ============================================================================
// Experience Points and Levels
// ============================================================================

/// Streak multiplier in tenths: 10 below a 7-day streak, +1 per full week,
/// capped at 13
pub fn multiplier_tenths(streak: u32) -> u64 {
    10 + (streak as u64 / 7).min(3)
}

/// Streak multiplier as a factor (1.0 to 1.3)
pub fn xp_multiplier(streak: u32) -> f64 {
    multiplier_tenths(streak) as f64 / 10.0
}

/// Award `base` XP scaled by the streak multiplier. Returns the amount added.
///
/// `xp_today` restarts when `today` differs from the last day XP was earned.
pub fn add_xp(state: &mut GamifyState, base: u64, today: NaiveDate) -> u64 {
    if state.last_xp_day != Some(today) {
        state.xp_today = 0;
        state.last_xp_day = Some(today);
    }

    // round half up, in exact tenths
    let award = (base * multiplier_tenths(state.streak) + 5) / 10;
    state.xp_today += award;
    state.xp_total += award;
    tracing::debug!("+{} XP (total {})", award, state.xp_total);
    award
}

/// XP earned today, as seen on `today` (stale counters read as zero)
pub fn xp_today(state: &GamifyState, today: NaiveDate) -> u64 {
    if state.last_xp_day == Some(today) {
        state.xp_today
    } else {
        0
    }
}

pub fn level(xp_total: u64) -> u64 {
    xp_total / XP_PER_LEVEL
}

pub fn title(xp_total: u64) -> Title {
    Title::for_level(level(xp_total))
}

/// Level-up notification when `after` crosses a level boundary past `before`
pub fn level_up_event(before: u64, after: u64) -> Option<GameEvent> {
    let new_level = level(after);
    (new_level > level(before)).then(|| GameEvent::LevelUp {
        level: new_level,
        title: Title::for_level(new_level),
    })
}

/// Grant the first-move bonus if this is the first movement logged today on
/// a date that had no progress yet
pub fn first_move_bonus(
    state: &mut GamifyState,
    today: NaiveDate,
    day_total_before: u32,
) -> Option<GameEvent> {
    if day_total_before != 0 || state.first_move_day == Some(today) {
        return None;
    }
    state.first_move_day = Some(today);
    let xp = add_xp(state, XP_FIRST_MOVE, today);
    tracing::info!("First move of {} (+{} XP)", today, xp);
    Some(GameEvent::FirstMove { xp })
}

// ============================================================================
// Badges and Stickers
// ============================================================================

pub fn has_badge(state: &GamifyState, badge: Badge) -> bool {
    state.badges.get(badge.id()).copied().unwrap_or(false)
}

/// Mark a badge earned. Returns true only on the first award.
pub fn award_badge(state: &mut GamifyState, badge: Badge) -> bool {
    if has_badge(state, badge) {
        return false;
    }
    state.badges.insert(badge.id().to_string(), true);
    tracing::info!("Badge earned: {}", badge.label());
    true
}

/// Insert a sticker. Returns true only when it was not already held.
pub fn grant_sticker(quests: &mut Quests, id: &str) -> bool {
    if quests.stickers.get(id).copied().unwrap_or(false) {
        return false;
    }
    quests.stickers.insert(id.to_string(), true);
    tracing::debug!("Sticker granted: {}", id);
    true
}

// ============================================================================
// Quests
// ============================================================================

/// ISO-8601 week key, e.g. `2025-W34`
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

pub fn weekly_quest_label(target: u32) -> String {
    format!("Complete {} perfect days this week", target)
}

fn new_daily_quest(date: NaiveDate) -> DailyQuest {
    DailyQuest {
        key: date.to_string(),
        label: DAILY_QUEST_LABEL.to_string(),
        done: false,
        rewarded: false,
    }
}

fn new_weekly_quest(key: &str, target: u32) -> WeeklyQuest {
    WeeklyQuest {
        key: key.to_string(),
        label: weekly_quest_label(target),
        target,
        count: 0,
        rewarded: false,
    }
}

// ============================================================================
// Reconcile
// ============================================================================

/// Re-derive all achievements, quests, streaks and badges from the document,
/// firing each not-yet-granted reward once. Safe to run any number of times.
pub fn reconcile(doc: &mut Document, rules: &RulesConfig, today: NaiveDate) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // (1) schedule
    let days = build_days(&doc.cfg);

    // (2) perfect days and week finishers
    let mut all_perfect = !days.is_empty();
    for day in &days {
        let progress = get_or_zero(&doc.progress, day.date);
        if !is_day100(day, &progress) {
            all_perfect = false;
            continue;
        }
        if doc.achievements.days.get(&day.date).copied().unwrap_or(false) {
            continue;
        }

        doc.achievements.days.insert(day.date, true);
        let xp = add_xp(&mut doc.gamify, XP_DAY_MASTER, today);
        grant_sticker(&mut doc.quests, &format!("day:{}", day.date));
        tracing::info!("Day Master: {} at 100%", day.date);
        events.push(GameEvent::DayMaster { date: day.date, xp });

        if sunday_index(day.date) == FRIDAY
            && !doc.achievements.weeks.get(&day.date).copied().unwrap_or(false)
        {
            doc.achievements.weeks.insert(day.date, true);
            grant_sticker(&mut doc.quests, &format!("week:{}", day.date));
            tracing::info!("Week Finisher: {} at 100%", day.date);
            events.push(GameEvent::WeekFinisher { date: day.date });
        }
    }

    if all_perfect && !doc.achievements.challenge12 {
        doc.achievements.challenge12 = true;
        grant_sticker(&mut doc.quests, &format!("sprint:{}", doc.cfg.start_date));
        tracing::info!("Sprint starting {} completed", doc.cfg.start_date);
        events.push(GameEvent::SprintComplete);
    }

    // (3) daily quests
    for day in &days {
        let progress = get_or_zero(&doc.progress, day.date);
        let quest = doc
            .quests
            .daily
            .entry(day.date)
            .or_insert_with(|| new_daily_quest(day.date));
        quest.done = midday_met(day, &progress);

        if quest.done && !quest.rewarded {
            quest.rewarded = true;
            let xp = add_xp(&mut doc.gamify, XP_DAILY_QUEST, today);
            grant_sticker(&mut doc.quests, &format!("daily:{}", day.date));
            tracing::info!("Daily quest done for {}", day.date);
            events.push(GameEvent::DailyQuestDone { date: day.date, xp });
        }
    }

    // (4) streak
    let streak = global_streak(&doc.progress, doc.cfg.skip_day());
    doc.gamify.streak = streak;
    doc.gamify.streak_best = doc.gamify.streak_best.max(streak);

    // (5) badges, recomputed from the achievement maps
    let day_masters = doc.achievements.days.values().filter(|v| **v).count();
    let week_finishers = doc.achievements.weeks.values().filter(|v| **v).count();
    let sums = totals(&days, &doc.progress);

    let earned = [
        (Badge::DayMaster, day_masters >= 1),
        (Badge::WeekFinisher, week_finishers >= 1),
        (Badge::Challenge12, doc.achievements.challenge12),
        (Badge::Pushups50, sums.pushups >= 50),
        (Badge::Lifts100, sums.lifts >= 100),
        (Badge::Streak7, streak >= 7),
        (Badge::Streak12, streak >= 12),
    ];
    for (badge, condition) in earned {
        if condition && award_badge(&mut doc.gamify, badge) {
            events.push(GameEvent::BadgeEarned(badge));
        }
    }

    // (6) weekly quest for the current week
    let key = iso_week_key(today);
    let this_week = today.iso_week();
    let count = days
        .iter()
        .filter(|d| d.date.iso_week() == this_week)
        .filter(|d| is_day100(d, &get_or_zero(&doc.progress, d.date)))
        .count() as u32;

    let quest = doc
        .quests
        .weekly
        .entry(key.clone())
        .or_insert_with(|| new_weekly_quest(&key, rules.weekly_quest_target));
    quest.count = count;

    if quest.count >= quest.target && !quest.rewarded {
        quest.rewarded = true;
        let xp = add_xp(&mut doc.gamify, XP_WEEKLY_QUEST, today);
        grant_sticker(&mut doc.quests, &format!("weekly:{}", key));
        tracing::info!("Weekly quest done for {}", key);
        events.push(GameEvent::WeeklyQuestDone { week: key, xp });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DayProgress, SlotCounts, SprintConfig};
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn full_progress(p: u32) -> DayProgress {
        DayProgress {
            morning: SlotCounts::new(12, 12, 12),
            midday: SlotCounts::new(0, p, p),
            evening: SlotCounts::new(p, 12, 12),
        }
    }

    fn sprint(start: &str, days: u32) -> Document {
        Document::with_config(SprintConfig {
            start_date: date(start),
            total_days: days,
            skip_weekday: -1,
            ..Default::default()
        })
    }

    #[test]
    fn test_multiplier_steps_and_cap() {
        assert_eq!(xp_multiplier(0), 1.0);
        assert_eq!(xp_multiplier(6), 1.0);
        assert_eq!(xp_multiplier(7), 1.1);
        assert_eq!(xp_multiplier(13), 1.1);
        assert_eq!(xp_multiplier(14), 1.2);
        assert_eq!(xp_multiplier(20), 1.2);
        assert_eq!(xp_multiplier(21), 1.3);
        assert_eq!(xp_multiplier(400), 1.3);
    }

    #[test]
    fn test_add_xp_rounds_and_resets_daily_counter() {
        let mut state = GamifyState::default();
        let day1 = date("2025-08-20");

        assert_eq!(add_xp(&mut state, 1, day1), 1);
        state.streak = 7;
        assert_eq!(add_xp(&mut state, 10, day1), 11);
        assert_eq!(add_xp(&mut state, 5, day1), 6); // 5.5 rounds up
        assert_eq!(state.xp_today, 18);

        let day2 = day1 + Duration::days(1);
        assert_eq!(xp_today(&state, day2), 0);
        add_xp(&mut state, 1, day2);
        assert_eq!(state.xp_today, 1);
        assert_eq!(state.xp_total, 19);
        assert_eq!(state.last_xp_day, Some(day2));
    }

    #[test]
    fn test_levels_and_titles() {
        assert_eq!(level(99), 0);
        assert_eq!(level(100), 1);
        assert_eq!(title(499), Title::Rookie);
        assert_eq!(title(500), Title::Sprinter);
        assert_eq!(title(2_000), Title::Titan);
        assert_eq!(
            level_up_event(95, 105),
            Some(GameEvent::LevelUp {
                level: 1,
                title: Title::Rookie
            })
        );
        assert_eq!(level_up_event(100, 150), None);
    }

    #[test]
    fn test_first_move_bonus_once_per_day() {
        let mut state = GamifyState::default();
        let today = date("2025-08-20");

        assert_eq!(first_move_bonus(&mut state, today, 3), None);
        assert_eq!(
            first_move_bonus(&mut state, today, 0),
            Some(GameEvent::FirstMove { xp: 5 })
        );
        assert_eq!(first_move_bonus(&mut state, today, 0), None);
        assert!(first_move_bonus(&mut state, today + Duration::days(1), 0).is_some());
    }

    #[test]
    fn test_badges_and_stickers_are_write_once() {
        let mut state = GamifyState::default();
        assert!(award_badge(&mut state, Badge::Streak7));
        assert!(!award_badge(&mut state, Badge::Streak7));
        assert!(has_badge(&state, Badge::Streak7));

        let mut quests = Quests::default();
        assert!(grant_sticker(&mut quests, "day:2025-08-20"));
        assert!(!grant_sticker(&mut quests, "day:2025-08-20"));
        assert_eq!(quests.stickers.len(), 1);
    }

    #[test]
    fn test_iso_week_keys() {
        assert_eq!(iso_week_key(date("2025-08-20")), "2025-W34");
        // belongs to the last week of the previous ISO year
        assert_eq!(iso_week_key(date("2021-01-03")), "2020-W53");
        assert_eq!(iso_week_key(date("2024-12-30")), "2025-W01");
    }

    #[test]
    fn test_reconcile_awards_perfect_day_once() {
        let today = date("2025-08-20");
        let mut doc = sprint("2025-08-20", 1);
        doc.progress.insert(today, full_progress(1));

        let events = reconcile(&mut doc, &RulesConfig::default(), today);
        assert!(events.contains(&GameEvent::DayMaster { date: today, xp: 10 }));
        assert!(events.contains(&GameEvent::SprintComplete));
        assert!(events.contains(&GameEvent::BadgeEarned(Badge::DayMaster)));
        assert!(events.contains(&GameEvent::BadgeEarned(Badge::Challenge12)));
        assert_eq!(doc.achievements.days.get(&today), Some(&true));
        assert!(doc.quests.daily[&today].rewarded);
        assert_eq!(doc.gamify.xp_total, 10 + 15);

        let again = reconcile(&mut doc, &RulesConfig::default(), today);
        assert!(again.is_empty());
        assert_eq!(doc.gamify.xp_total, 25);
    }

    #[test]
    fn test_friday_grants_week_finisher() {
        let friday = date("2025-08-22");
        let mut doc = sprint("2025-08-20", 3);
        doc.progress.insert(friday, full_progress(3));

        let events = reconcile(&mut doc, &RulesConfig::default(), friday);
        assert!(events.contains(&GameEvent::WeekFinisher { date: friday }));
        assert!(events.contains(&GameEvent::BadgeEarned(Badge::WeekFinisher)));
        assert!(!doc.achievements.challenge12);
        assert_eq!(doc.quests.stickers.get("week:2025-08-22"), Some(&true));
    }

    #[test]
    fn test_achievements_survive_progress_reset() {
        let today = date("2025-08-20");
        let mut doc = sprint("2025-08-20", 1);
        doc.progress.insert(today, full_progress(1));
        reconcile(&mut doc, &RulesConfig::default(), today);

        doc.progress.insert(today, DayProgress::default());
        reconcile(&mut doc, &RulesConfig::default(), today);

        assert_eq!(doc.achievements.days.get(&today), Some(&true));
        assert!(has_badge(&doc.gamify, Badge::DayMaster));
        assert!(!doc.quests.daily[&today].done);
        assert!(doc.quests.daily[&today].rewarded);
    }

    #[test]
    fn test_daily_quest_needs_all_midday_targets() {
        let today = date("2025-08-21");
        let mut doc = sprint("2025-08-20", 3);
        let mut p = DayProgress::default();
        p.midday = SlotCounts::new(0, 2, 1); // second day needs 2 per arm
        doc.progress.insert(today, p);

        reconcile(&mut doc, &RulesConfig::default(), today);
        assert!(!doc.quests.daily[&today].done);
        assert_eq!(doc.quests.daily.len(), 3);
        assert_eq!(doc.quests.daily[&today].label, DAILY_QUEST_LABEL);

        doc.progress.get_mut(&today).unwrap().midday.dumb_l = 2;
        let events = reconcile(&mut doc, &RulesConfig::default(), today);
        assert!(events.contains(&GameEvent::DailyQuestDone { date: today, xp: 15 }));
    }

    #[test]
    fn test_weekly_quest_counts_current_week() {
        let mut doc = sprint("2025-08-18", 7); // Monday through Sunday
        for offset in 0..3 {
            let d = date("2025-08-18") + Duration::days(offset);
            doc.progress.insert(d, full_progress(offset as u32 + 1));
        }
        let today = date("2025-08-20");

        let events = reconcile(&mut doc, &RulesConfig::default(), today);
        let quest = &doc.quests.weekly["2025-W34"];
        assert_eq!(quest.count, 3);
        assert_eq!(quest.target, 3);
        assert!(quest.rewarded);
        assert!(events.contains(&GameEvent::WeeklyQuestDone {
            week: "2025-W34".into(),
            xp: 50
        }));
        assert_eq!(doc.quests.stickers.get("weekly:2025-W34"), Some(&true));
    }

    #[test]
    fn test_weekly_quest_target_from_rules() {
        let mut doc = sprint("2025-08-18", 7);
        doc.progress.insert(date("2025-08-18"), full_progress(1));
        let rules = RulesConfig {
            weekly_quest_target: 1,
            ..Default::default()
        };

        reconcile(&mut doc, &rules, date("2025-08-18"));
        assert!(doc.quests.weekly["2025-W34"].rewarded);
    }

    #[test]
    fn test_streak_badges_and_best_streak() {
        let mut doc = sprint("2025-08-01", 1);
        let mut p = DayProgress::default();
        p.evening.pushups = 1;
        for offset in 0..12 {
            doc.progress.insert(date("2025-08-01") + Duration::days(offset), p);
        }
        let today = date("2025-08-12");

        let events = reconcile(&mut doc, &RulesConfig::default(), today);
        assert_eq!(doc.gamify.streak, 12);
        assert_eq!(doc.gamify.streak_best, 12);
        assert!(events.contains(&GameEvent::BadgeEarned(Badge::Streak7)));
        assert!(events.contains(&GameEvent::BadgeEarned(Badge::Streak12)));

        // breaking the chain lowers the streak but never the best
        doc.progress.insert(date("2025-08-11"), DayProgress::default());
        reconcile(&mut doc, &RulesConfig::default(), today);
        assert_eq!(doc.gamify.streak, 1);
        assert_eq!(doc.gamify.streak_best, 12);
        assert!(has_badge(&doc.gamify, Badge::Streak12));
    }

    #[test]
    fn test_volume_badges() {
        let mut doc = sprint("2025-08-20", 2);
        let mut p = DayProgress::default();
        p.morning = SlotCounts::new(50, 50, 50);
        doc.progress.insert(date("2025-08-20"), p);

        let events = reconcile(&mut doc, &RulesConfig::default(), date("2025-08-20"));
        assert!(events.contains(&GameEvent::BadgeEarned(Badge::Pushups50)));
        assert!(events.contains(&GameEvent::BadgeEarned(Badge::Lifts100)));
    }
}
