//! Session controller: the single owner of the tracker document.
//!
//! Every user action is one call on [`Session`]. Each mutating call works on
//! a copy of the document, runs the reconcile pass, persists the copy and
//! only then swaps it in, so a failed save leaves the in-memory state as it
//! was.

use crate::config::RulesConfig;
use crate::document::{merge_config, DailyQuest, SprintConfigPatch, WeeklyQuest};
use crate::gamify::{self, XP_PER_REP};
use crate::progress;
use crate::schedule::build_days;
use crate::stats::{self, SprintSummary, Totals};
use crate::store::DocumentStore;
use crate::{Badge, Day, DayProgress, Document, Field, GameEvent, Result, Slot, Title};
use chrono::NaiveDate;
use std::path::Path;

/// Result of a counter change
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Counter value after the change
    pub value: u32,
    pub events: Vec<GameEvent>,
}

/// One scheduled day with its progress, ready for display
#[derive(Clone, Debug)]
pub struct DayView {
    pub day: Day,
    pub progress: DayProgress,
    pub completion: u32,
    pub perfect: bool,
    pub is_today: bool,
}

/// Read-only view of everything the front end shows
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub today: NaiveDate,
    pub days: Vec<DayView>,
    pub summary: SprintSummary,
    pub totals: Totals,
    pub xp_total: u64,
    pub xp_today: u64,
    pub daily_xp_goal: u64,
    pub multiplier: f64,
    pub level: u64,
    pub title: Title,
    pub streak: u32,
    pub streak_best: u32,
    pub badges: Vec<(Badge, bool)>,
    pub daily_quest: Option<DailyQuest>,
    pub weekly_quest: Option<WeeklyQuest>,
    pub stickers: usize,
}

pub struct Session<S: DocumentStore> {
    doc: Document,
    store: S,
    rules: RulesConfig,
    today: NaiveDate,
}

impl<S: DocumentStore> Session<S> {
    /// Open a session dated with the local calendar day
    pub fn open(store: S, rules: RulesConfig) -> Result<Self> {
        Self::open_at(store, rules, chrono::Local::now().date_naive())
    }

    /// Open a session for an explicit `today`
    pub fn open_at(store: S, rules: RulesConfig, today: NaiveDate) -> Result<Self> {
        rules.validate()?;
        let doc = store.load()?.unwrap_or_default();
        tracing::debug!(
            "Opened session for {} ({} logged days)",
            today,
            doc.progress.len()
        );
        Ok(Self {
            doc,
            store,
            rules,
            today,
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// The current sprint schedule
    pub fn days(&self) -> Vec<Day> {
        build_days(&self.doc.cfg)
    }

    /// Apply `mutate` to a copy, reconcile, persist, then swap it in
    fn commit<T, F>(&mut self, mutate: F) -> Result<(T, Vec<GameEvent>)>
    where
        F: FnOnce(&mut Document, &mut Vec<GameEvent>) -> T,
    {
        let today = self.today;
        let mut next = self.doc.clone();
        let xp_before = next.gamify.xp_total;

        let mut events = Vec::new();
        let value = mutate(&mut next, &mut events);
        events.extend(gamify::reconcile(&mut next, &self.rules, today));
        events.extend(gamify::level_up_event(xp_before, next.gamify.xp_total));

        self.store.save(&next)?;
        self.doc = next;
        Ok((value, events))
    }

    /// Run the reconcile pass on its own (e.g. when the day rolls over)
    pub fn refresh(&mut self) -> Result<Vec<GameEvent>> {
        let ((), events) = self.commit(|_, _| ())?;
        Ok(events)
    }

    /// Progress for `date`, creating and persisting an empty entry if needed
    pub fn day_progress(&mut self, date: NaiveDate) -> Result<DayProgress> {
        if let Some(p) = self.doc.progress.get(&date) {
            return Ok(*p);
        }
        let (p, _) = self.commit(|doc, _| *progress::get_or_init(&mut doc.progress, date))?;
        Ok(p)
    }

    /// Log one repetition
    ///
    /// Every press earns 1 XP, even when the counter is already at its cap.
    /// The first-move bonus applies when this is the day's first movement on
    /// an untouched date.
    pub fn increment(&mut self, date: NaiveDate, slot: Slot, field: Field) -> Result<Outcome> {
        let today = self.today;
        let target = self
            .days()
            .iter()
            .find(|d| d.date == date)
            .map(|d| d.targets.get(slot, field))
            .unwrap_or(0);

        let (value, events) = self.commit(|doc, events| {
            let before = progress::get_or_zero(&doc.progress, date);
            let value = progress::increment(&mut doc.progress, date, slot, field);
            let moved = value != before.get(slot, field);

            if moved {
                events.extend(gamify::first_move_bonus(&mut doc.gamify, today, before.total()));
            }
            gamify::add_xp(&mut doc.gamify, XP_PER_REP, today);
            if moved && target > 0 && value == target {
                events.push(GameEvent::TargetReached { date, slot, field });
            }
            value
        })?;

        Ok(Outcome { value, events })
    }

    /// Remove one repetition
    pub fn decrement(&mut self, date: NaiveDate, slot: Slot, field: Field) -> Result<Outcome> {
        let (value, events) =
            self.commit(|doc, _| progress::decrement(&mut doc.progress, date, slot, field))?;
        Ok(Outcome { value, events })
    }

    /// Zero every counter of `date`. Earned achievements are kept.
    pub fn reset_day(&mut self, date: NaiveDate) -> Result<Vec<GameEvent>> {
        let ((), events) = self.commit(|doc, _| progress::reset_day(&mut doc.progress, date))?;
        Ok(events)
    }

    /// Merge `patch` over the current sprint configuration.
    ///
    /// Invalid values reject the whole change.
    pub fn update_config(&mut self, patch: SprintConfigPatch) -> Result<Vec<GameEvent>> {
        let cfg = merge_config(&self.doc.cfg, patch)?;
        tracing::info!(
            "Sprint config updated: {} days from {}",
            cfg.total_days,
            cfg.start_date
        );
        let ((), events) = self.commit(|doc, _| doc.cfg = cfg)?;
        Ok(events)
    }

    /// Replace the whole document with an exported one.
    ///
    /// A rejected import leaves the session untouched.
    pub fn import_json(&mut self, text: &str) -> Result<Vec<GameEvent>> {
        let imported = Document::from_json(text)?;
        tracing::info!("Importing document with {} logged days", imported.progress.len());
        let ((), events) = self.commit(|doc, _| *doc = imported)?;
        Ok(events)
    }

    pub fn export_json(&self) -> Result<String> {
        self.doc.to_json_pretty()
    }

    /// Write the progress log as CSV. Returns the number of rows.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        crate::csv_export::write_progress_csv(&self.doc.progress, path)
    }

    /// Discard all stored state and start over from defaults
    pub fn wipe(&mut self) -> Result<()> {
        self.store.clear()?;
        self.doc = Document::default();
        tracing::info!("Wiped all progress and configuration");
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        let doc = &self.doc;
        let days = self.days();

        let views = days
            .iter()
            .map(|day| {
                let p = progress::get_or_zero(&doc.progress, day.date);
                DayView {
                    day: day.clone(),
                    progress: p,
                    completion: stats::day_completion(day, &p),
                    perfect: stats::is_day100(day, &p),
                    is_today: day.date == self.today,
                }
            })
            .collect();

        Snapshot {
            today: self.today,
            days: views,
            summary: stats::sprint_summary(&days, &doc.progress),
            totals: stats::totals(&days, &doc.progress),
            xp_total: doc.gamify.xp_total,
            xp_today: gamify::xp_today(&doc.gamify, self.today),
            daily_xp_goal: self.rules.daily_xp_goal,
            multiplier: gamify::xp_multiplier(doc.gamify.streak),
            level: gamify::level(doc.gamify.xp_total),
            title: gamify::title(doc.gamify.xp_total),
            streak: doc.gamify.streak,
            streak_best: doc.gamify.streak_best,
            badges: Badge::ALL
                .iter()
                .map(|b| (*b, gamify::has_badge(&doc.gamify, *b)))
                .collect(),
            daily_quest: doc.quests.daily.get(&self.today).cloned(),
            weekly_quest: doc
                .quests
                .weekly
                .get(&gamify::iso_week_key(self.today))
                .cloned(),
            stickers: doc.quests.stickers.values().filter(|v| **v).count(),
        }
    }
}
