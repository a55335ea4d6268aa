use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gym_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mgym")]
#[command(about = "Micro-gym sprint tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sprint schedule and progress (default)
    Show {
        /// Show only this date
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Show XP, level, streak, badges and quests
    Stats,

    /// Log repetitions
    Inc {
        /// morning, midday or evening
        slot: Slot,
        /// pushups, dumbR or dumbL
        field: Field,
        /// Date to log against (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        times: u32,
    },

    /// Remove logged repetitions
    Dec {
        slot: Slot,
        field: Field,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        times: u32,
    },

    /// Zero all counters of a day
    ResetDay {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Show or change the sprint configuration
    Config {
        #[arg(long, value_parser = parse_date)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        days: Option<i64>,
        /// Rest weekday, 0 (Sunday) to 6 (Saturday), -1 for none
        #[arg(long, allow_hyphen_values = true)]
        skip: Option<i64>,
        /// Comma-separated exercise names
        #[arg(long)]
        rotation: Option<String>,
        /// Comma-separated slot time labels
        #[arg(long)]
        times: Option<String>,
        #[arg(long)]
        midday_progressive: Option<bool>,
        #[arg(long)]
        base_pushups: Option<i64>,
        #[arg(long)]
        base_lifts: Option<i64>,
        #[arg(long)]
        progressive_max: Option<i64>,
    },

    /// Export the full document as JSON
    Export { path: PathBuf },

    /// Replace all state with an exported document
    Import { path: PathBuf },

    /// Export the progress log as CSV
    ExportCsv { path: PathBuf },

    /// Delete all progress and configuration
    Wipe {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    gym_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let store = JsonFileStore::new(data_dir.join("progress.json"));

    let mut session = match cli.today {
        Some(today) => Session::open_at(store, config.rules.clone(), today)?,
        None => Session::open(store, config.rules.clone())?,
    };
    let today = session.today();

    match cli.command.unwrap_or(Commands::Show { date: None }) {
        Commands::Show { date } => {
            // Reconcile (and save) first so a day rollover is reflected in the view
            print_events(&session.refresh()?);
            cmd_show(&session.snapshot(), date);
        }
        Commands::Stats => {
            // Same as show: refresh persists the reconciled document
            print_events(&session.refresh()?);
            cmd_stats(&session.snapshot());
        }
        Commands::Inc {
            slot,
            field,
            date,
            times,
        } => {
            let date = date.unwrap_or(today);
            let mut value = session.day_progress(date)?.get(slot, field);
            for _ in 0..times {
                let outcome = session.increment(date, slot, field)?;
                value = outcome.value;
                print_events(&outcome.events);
            }
            println!("{} {} {} = {}", date, slot, field, value);
        }
        Commands::Dec {
            slot,
            field,
            date,
            times,
        } => {
            let date = date.unwrap_or(today);
            let mut value = session.day_progress(date)?.get(slot, field);
            for _ in 0..times {
                let outcome = session.decrement(date, slot, field)?;
                value = outcome.value;
                print_events(&outcome.events);
            }
            println!("{} {} {} = {}", date, slot, field, value);
        }
        Commands::ResetDay { date } => {
            let date = date.unwrap_or(today);
            print_events(&session.reset_day(date)?);
            println!("✓ Progress for {} reset", date);
        }
        Commands::Config {
            start_date,
            days,
            skip,
            rotation,
            times,
            midday_progressive,
            base_pushups,
            base_lifts,
            progressive_max,
        } => {
            let patch = SprintConfigPatch {
                start_date,
                total_days: days,
                skip_weekday: skip,
                times: times.map(|t| split_list(&t)),
                rotation: rotation.map(|r| split_list(&r)),
                pushup_midday_progressive: midday_progressive,
                base_pushups,
                base_lifts,
                progressive_max,
            };
            if patch != SprintConfigPatch::default() {
                print_events(&session.update_config(patch)?);
                println!("✓ Configuration saved");
            }
            print_config(&session.document().cfg);
        }
        Commands::Export { path } => {
            std::fs::write(&path, session.export_json()?)?;
            println!("✓ Exported to {}", path.display());
        }
        Commands::Import { path } => {
            let text = std::fs::read_to_string(&path)?;
            match session.import_json(&text) {
                Ok(events) => {
                    print_events(&events);
                    println!("✓ Imported {}", path.display());
                }
                Err(e) => {
                    eprintln!("Invalid file: {}", e);
                    return Err(e);
                }
            }
        }
        Commands::ExportCsv { path } => {
            let rows = session.export_csv(&path)?;
            println!("✓ Exported {} rows to {}", rows, path.display());
        }
        Commands::Wipe { yes } => {
            if !yes {
                eprintln!("Refusing to wipe without --yes");
                return Err(Error::Other("wipe not confirmed".into()));
            }
            session.wipe()?;
            println!("✓ All progress and configuration deleted");
        }
    }

    Ok(())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(|x| x.trim().to_string()).collect()
}

fn print_events(events: &[GameEvent]) {
    for event in events {
        println!("  ★ {}", event);
    }
}

fn cmd_show(snap: &Snapshot, only: Option<NaiveDate>) {
    let views: Vec<&DayView> = snap
        .days
        .iter()
        .filter(|v| only.map_or(true, |d| v.day.date == d))
        .collect();

    if views.is_empty() {
        println!("No scheduled day matches.");
        return;
    }

    for view in views {
        let mut flags = String::new();
        if view.is_today {
            flags.push_str(" [TODAY]");
        }
        if view.perfect {
            flags.push_str(" [100%]");
        }
        println!(
            "{} {}  {:>3}%  {}{}",
            view.day.date,
            view.day.date.format("%a"),
            view.completion,
            view.day.title,
            flags
        );
        for slot in Slot::ALL {
            let done = view.progress.slot(slot);
            let target = view.day.targets.slot(slot);
            println!(
                "    {:<8} push-ups {:>3}/{:<3} right {:>3}/{:<3} left {:>3}/{:<3}",
                slot.as_str(),
                done.pushups,
                target.pushups,
                done.dumb_r,
                target.dumb_r,
                done.dumb_l,
                target.dumb_l
            );
        }
    }

    println!();
    println!(
        "Sprint: {}/{} perfect days, {}% overall",
        snap.summary.perfect_days, snap.summary.days, snap.summary.completion
    );
}

fn cmd_stats(snap: &Snapshot) {
    println!("╭─────────────────────────────────────────╮");
    println!("│  Level {} · {}", snap.level, snap.title);
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  XP today: {}/{} · XP total: {}",
        snap.xp_today, snap.daily_xp_goal, snap.xp_total
    );
    println!(
        "  Streak: {} (best: {}) · multiplier x{:.1}",
        snap.streak, snap.streak_best, snap.multiplier
    );
    println!(
        "  Totals: {} push-ups · {} lifts",
        snap.totals.pushups, snap.totals.lifts
    );
    println!();

    println!("  Badges:");
    for (badge, earned) in &snap.badges {
        println!("    {} {}", if *earned { "✓" } else { "—" }, badge.label());
    }
    println!();

    if let Some(quest) = &snap.daily_quest {
        println!(
            "  Daily quest: {} [{}]",
            quest.label,
            if quest.done { "done" } else { "open" }
        );
    }
    if let Some(quest) = &snap.weekly_quest {
        println!(
            "  Weekly quest: {} ({}/{})",
            quest.label, quest.count, quest.target
        );
    }
    println!("  Stickers: {}", snap.stickers);
}

fn print_config(cfg: &SprintConfig) {
    let skip = match cfg.skip_day() {
        Some(day) => day.to_string(),
        None => "none".to_string(),
    };
    println!("  Start date:   {}", cfg.start_date);
    println!("  Days:         {}", cfg.total_days);
    println!("  Rest day:     {}", skip);
    println!("  Times:        {}", cfg.times.join(", "));
    println!("  Rotation:     {}", cfg.rotation.join(", "));
    println!("  Midday push-ups progressive: {}", cfg.pushup_midday_progressive);
    println!(
        "  Base push-ups {} · base lifts {} · progression max {}",
        cfg.base_pushups, cfg.base_lifts, cfg.progressive_max
    );
}
