use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use liftxp_core::level::progress;
use liftxp_core::ledger::read_events;
use liftxp_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftxp")]
#[command(about = "Workout XP and leveling tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override today's date (YYYY-MM-DD) for the weekly discipline window
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the trainee's avatar
    Avatar {
        #[command(subcommand)]
        command: AvatarCommand,
    },

    /// Log, edit, delete and list workouts
    Log {
        #[command(subcommand)]
        command: LogCommand,
    },

    /// Compare attribute XP against total XP
    Check {
        #[arg(long)]
        user: String,
    },

    /// Export a trainee's workout logs to CSV
    Export {
        #[arg(long)]
        user: String,

        /// Output file (defaults to <data-dir>/exports/<user>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Rebuild weekly workout counters from the stored logs
    Reindex,
}

#[derive(Subcommand)]
enum AvatarCommand {
    /// Pick an avatar so workouts can earn XP
    Select {
        #[arg(long)]
        user: String,

        #[arg(long, default_value = "adventurer")]
        archetype: String,
    },

    /// Show XP, level and attributes
    Show {
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// Log a new workout
    Add {
        #[arg(long)]
        user: String,

        #[command(flatten)]
        fields: WorkoutFields,
    },

    /// Edit a logged workout (unset fields keep their stored value)
    Edit {
        #[arg(long)]
        id: Uuid,

        #[command(flatten)]
        fields: WorkoutFields,
    },

    /// Delete a logged workout
    Delete {
        #[arg(long)]
        id: Uuid,
    },

    /// List a trainee's workouts, newest first
    List {
        #[arg(long)]
        user: String,
    },
}

#[derive(Args)]
struct WorkoutFields {
    #[arg(long)]
    exercise: Option<String>,

    /// chest, back, shoulders, biceps, triceps, legs, abs, cardio, full_body
    #[arg(long)]
    muscle_group: Option<String>,

    #[arg(long)]
    sets: Option<u32>,

    #[arg(long)]
    reps: Option<u32>,

    #[arg(long)]
    weight: Option<f64>,

    /// Workout date (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

impl WorkoutFields {
    fn into_new_input(self, today: NaiveDate) -> Result<WorkoutInput> {
        let exercise_name = self
            .exercise
            .ok_or_else(|| Error::InvalidInput("--exercise is required".into()))?;
        let muscle_group = self
            .muscle_group
            .ok_or_else(|| Error::InvalidInput("--muscle-group is required".into()))?;
        Ok(WorkoutInput {
            date: self.date.unwrap_or(today),
            exercise_name,
            muscle_group: MuscleGroup::parse(&muscle_group),
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
        })
    }

    fn merge_into(self, mut input: WorkoutInput) -> WorkoutInput {
        if let Some(exercise) = self.exercise {
            input.exercise_name = exercise;
        }
        if let Some(group) = self.muscle_group {
            input.muscle_group = MuscleGroup::parse(&group);
        }
        if self.sets.is_some() {
            input.sets = self.sets;
        }
        if self.reps.is_some() {
            input.reps = self.reps;
        }
        if self.weight.is_some() {
            input.weight = self.weight;
        }
        if let Some(date) = self.date {
            input.date = date;
        }
        input
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

/// Files under the data directory
struct Paths {
    db: PathBuf,
    ledger: PathBuf,
    exports: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        let db_dir = data_dir.join("db");
        Self {
            db: db_dir.join("liftxp.json"),
            ledger: db_dir.join("xp_ledger.jsonl"),
            exports: data_dir.join("exports"),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Config decides the log level, so a broken config file is reported
    // through the default subscriber
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            liftxp_core::logging::init();
            fail(e)
        }
    };
    liftxp_core::logging::init_from_config(&config.logging);

    if let Err(e) = run(cli, config) {
        fail(e)
    }
}

fn fail(e: Error) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);
    let ctx = cli.today.map(Context::new).unwrap_or_else(Context::now);
    let rules = &config.xp;

    match cli.command {
        Commands::Avatar { command } => match command {
            AvatarCommand::Select { user, archetype } => cmd_avatar_select(&paths, &user, &archetype),
            AvatarCommand::Show { user } => cmd_avatar_show(&paths, &user, rules),
        },
        Commands::Log { command } => match command {
            LogCommand::Add { user, fields } => cmd_log_add(&paths, &user, fields, &ctx, rules),
            LogCommand::Edit { id, fields } => cmd_log_edit(&paths, id, fields, &ctx, rules),
            LogCommand::Delete { id } => cmd_log_delete(&paths, id, rules),
            LogCommand::List { user } => cmd_log_list(&paths, &user),
        },
        Commands::Check { user } => cmd_check(&paths, &user, rules),
        Commands::Export { user, out } => cmd_export(&paths, &user, out),
        Commands::Reindex => cmd_reindex(&paths),
    }
}

fn cmd_avatar_select(paths: &Paths, user: &str, archetype: &str) -> Result<()> {
    let avatar = Database::update(&paths.db, |db| select_avatar(db, user, archetype))?;
    println!("✓ Avatar '{}' selected for {}", avatar.archetype, avatar.user_id);
    Ok(())
}

fn cmd_avatar_show(paths: &Paths, user: &str, rules: &XpRules) -> Result<()> {
    let db = Database::load(&paths.db)?;
    let avatar = db.find_avatar(user)?.ok_or_else(|| Error::NoAvatar {
        user_id: user.to_string(),
    })?;

    let p = progress(avatar.total_xp, rules);
    println!("\n  {} the {}", avatar.user_id, avatar.archetype);
    println!("  Level {}  ({} XP total)", avatar.level, avatar.total_xp);
    println!("  Next level: {}/{} XP", p.into_level, p.level_span);
    println!();
    let attributes = avatar.attributes();
    for attribute in Attribute::ALL {
        println!("  {:<12} {:>6}", attribute.label(), attributes.get(attribute));
    }
    println!();
    Ok(())
}

fn cmd_log_add(
    paths: &Paths,
    user: &str,
    fields: WorkoutFields,
    ctx: &Context,
    rules: &XpRules,
) -> Result<()> {
    let input = fields.into_new_input(ctx.today)?;
    let outcome = Database::update(&paths.db, |db| log_workout(db, user, &input, ctx, rules))?;

    record(paths, XpEvent::from_outcome(&outcome, Utc::now()));

    println!("\n✓ Workout logged! ({})", outcome.log.id);
    display_award(&outcome.award);
    display_level_change(&outcome.level_change);
    Ok(())
}

fn cmd_log_edit(
    paths: &Paths,
    id: Uuid,
    fields: WorkoutFields,
    ctx: &Context,
    rules: &XpRules,
) -> Result<()> {
    let outcome = Database::update(&paths.db, |db| {
        let existing = db.get_log(id)?.ok_or(Error::LogNotFound(id))?;
        let input = fields.merge_into(WorkoutInput::from_log(&existing));
        edit_workout(db, id, &input, ctx, rules)
    })?;

    record(paths, XpEvent::from_outcome(&outcome, Utc::now()));

    println!("\n✓ Workout updated!");
    if let Some(old) = &outcome.replaced {
        println!("  Previous award: {} XP", old.total);
    }
    display_award(&outcome.award);
    display_level_change(&outcome.level_change);
    Ok(())
}

fn cmd_log_delete(paths: &Paths, id: Uuid, rules: &XpRules) -> Result<()> {
    let deletion = Database::update(&paths.db, |db| delete_workout(db, id, rules))?;

    record(paths, XpEvent::from_deletion(&deletion, Utc::now()));

    println!("\n✓ Workout deleted: -{} XP", deletion.xp_removed);
    display_level_change(&deletion.level_change);
    Ok(())
}

fn cmd_log_list(paths: &Paths, user: &str) -> Result<()> {
    let db = Database::load(&paths.db)?;
    let logs = db.filter_logs(&LogFilter::for_user(user))?;

    if logs.is_empty() {
        println!("No workouts logged for {}.", user);
        return Ok(());
    }

    for log in &logs {
        let load = match (log.sets, log.reps, log.weight) {
            (Some(s), Some(r), Some(w)) => format!("{}x{} @ {}", s, r, w),
            (_, Some(r), Some(w)) => format!("{} @ {}", r, w),
            (_, Some(r), None) => format!("{} reps", r),
            _ => String::new(),
        };
        println!(
            "{}  {}  {:<20} {:<10} {:<14} {:>4} XP",
            log.id, log.date, log.exercise_name, log.muscle_group, load, log.xp_awarded
        );
    }
    Ok(())
}

fn cmd_check(paths: &Paths, user: &str, rules: &XpRules) -> Result<()> {
    let db = Database::load(&paths.db)?;
    let avatar = db.find_avatar(user)?.ok_or_else(|| Error::NoAvatar {
        user_id: user.to_string(),
    })?;
    let report = check_avatar(&avatar, rules);

    println!("  Attribute XP sum: {}", report.attribute_sum);
    println!("  Total XP:         {}", report.total_xp);
    println!("  Drift:            {}", report.drift);

    let events = read_events(&paths.ledger)?;
    if !events.is_empty() {
        println!(
            "  Ledger replay:    {}",
            liftxp_core::ledger::replay_total(&events, user)
        );
    }

    if report.is_consistent() {
        println!("✓ Consistent");
    } else if !report.level_ok {
        println!("⚠ Stored level does not match total XP");
    } else {
        println!("⚠ Attribute XP differs from total XP (deleted workouts keep attribute XP)");
    }
    Ok(())
}

fn cmd_export(paths: &Paths, user: &str, out: Option<PathBuf>) -> Result<()> {
    let db = Database::load(&paths.db)?;
    let logs = db.filter_logs(&LogFilter::for_user(user))?;
    if logs.is_empty() {
        println!("No workouts logged for {} - nothing to export.", user);
        return Ok(());
    }

    let csv_path = out.unwrap_or_else(|| paths.exports.join(format!("{}.csv", user)));
    let count = export_logs_csv(&logs, &csv_path)?;

    println!("✓ Exported {} workouts to CSV", count);
    println!("  CSV: {}", csv_path.display());
    Ok(())
}

fn cmd_reindex(paths: &Paths) -> Result<()> {
    let weeks = Database::update(&paths.db, |db| Ok(db.rebuild_weekly_counts()))?;
    println!("✓ Rebuilt weekly counters ({} weeks)", weeks);
    Ok(())
}

/// Append to the ledger; the database is already saved, so failures only warn
fn record(paths: &Paths, event: XpEvent) {
    let mut ledger = JsonlLedger::new(&paths.ledger);
    if let Err(e) = ledger.append(&event) {
        tracing::warn!("Failed to append XP event to ledger: {}", e);
    }
}

fn display_award(award: &XpAward) {
    println!("  +{} XP", award.total);
    for attribute in Attribute::ALL {
        let gained = award.gains.get(attribute);
        if gained > 0 {
            println!("    {:<12} +{}", attribute.label(), gained);
        }
    }
}

fn display_level_change(change: &LevelChange) {
    match change {
        LevelChange::Up { to, .. } => println!("\n★ Level up! You reached level {}", to),
        LevelChange::Down { to, .. } => println!("\n▼ Level down to {}", to),
        LevelChange::Unchanged(level) => println!("  Level {}", level),
    }
}
