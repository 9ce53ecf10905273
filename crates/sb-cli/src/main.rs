mod server;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use sb_core::{
    AuthProvider, Cue, Habit, HabitKind, Heatmap, IdentityProvider, MAX_HEATMAP_WEEKS, Moment,
    Progress, SkillBook, SkillIcon, TimerToggle, format_duration, tone_gain,
};
use sb_store::{DataDir, Settings};

#[derive(Parser)]
#[command(name = "sb", about = "Skill book: level up your habits")]
struct Cli {
    /// Profile to use (one database per profile)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Add a new skill
    Add {
        /// Skill name
        name: String,

        /// Track time instead of daily check-ins
        #[arg(long)]
        timed: bool,

        /// Skill icon (label such as "Agility", or slot 1-23)
        #[arg(long)]
        icon: Option<SkillIcon>,
    },

    /// List all skills
    List,

    /// Show one skill with its recent history
    Show { skill: String },

    /// Complete a daily skill for today
    Complete { skill: String },

    /// Start a timed skill's timer
    Start { skill: String },

    /// Stop a timed skill's timer and bank the experience
    Stop { skill: String },

    /// Start or stop a timed skill's timer
    Toggle { skill: String },

    /// Show running timers and the experience they would award
    Status,

    /// Delete a skill and its history
    Delete { skill: String },

    /// Manage the focus list
    #[command(subcommand)]
    Focus(FocusCommand),

    /// Show totals for the profile
    Stats,

    /// Draw the activity heatmap
    Heatmap {
        /// Number of weeks (defaults to the configured value)
        #[arg(long)]
        weeks: Option<u32>,
    },

    /// Export the skill book to a JSON file
    Export { path: PathBuf },

    /// Import a skill book from a JSON file, replacing the current one
    Import { path: PathBuf },

    /// Delete every skill in the profile
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Attach an account to this profile
    Login {
        #[arg(long, value_parser = parse_provider)]
        provider: AuthProvider,
        handle: String,
    },

    /// Detach the account from this profile
    Logout,

    /// Show the attached account
    Whoami,

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum FocusCommand {
    /// Pin a skill to the focus list
    Add { skill: String },
    /// Unpin a skill
    Remove { skill: String },
    /// List pinned skills
    List,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print all settings
    Show,
    /// Set one setting
    Set { key: String, value: String },
}

fn parse_provider(s: &str) -> std::result::Result<AuthProvider, String> {
    AuthProvider::parse(s).ok_or_else(|| format!("unknown provider '{s}' (google, discord, github)"))
}

fn data_dir_base() -> Option<PathBuf> {
    std::env::var("SB_DATA_DIR").ok().map(PathBuf::from)
}

fn open_data(cli: &Cli) -> Result<DataDir> {
    let base = data_dir_base();
    DataDir::open(cli.profile.as_deref(), base.as_deref()).context("failed to open profile")
}

fn load_book(data: &DataDir) -> Result<SkillBook> {
    data.store().load_book().context("failed to load skill book")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve => cmd_serve(&cli).await,
        Commands::Add { name, timed, icon } => cmd_add(&cli, name, *timed, *icon),
        Commands::List => cmd_list(&cli),
        Commands::Show { skill } => cmd_show(&cli, skill),
        Commands::Complete { skill } => cmd_complete(&cli, skill),
        Commands::Start { skill } => cmd_start(&cli, skill),
        Commands::Stop { skill } => cmd_stop(&cli, skill),
        Commands::Toggle { skill } => cmd_toggle(&cli, skill),
        Commands::Status => cmd_status(&cli),
        Commands::Delete { skill } => cmd_delete(&cli, skill),
        Commands::Focus(sub) => cmd_focus(&cli, sub),
        Commands::Stats => cmd_stats(&cli),
        Commands::Heatmap { weeks } => cmd_heatmap(&cli, *weeks),
        Commands::Export { path } => cmd_export(&cli, path),
        Commands::Import { path } => cmd_import(&cli, path),
        Commands::Reset { yes } => cmd_reset(&cli, *yes),
        Commands::Login { provider, handle } => cmd_login(&cli, *provider, handle),
        Commands::Logout => cmd_logout(&cli),
        Commands::Whoami => cmd_whoami(&cli),
        Commands::Config(sub) => cmd_config(&cli, sub),
    }
}

// ---------------------------------------------------------------------------
// Advisory pidfile for observability
// ---------------------------------------------------------------------------

fn pidfile_path() -> PathBuf {
    data_dir_base()
        .unwrap_or_else(sb_store::default_base_dir)
        .join("sb-serve.pid")
}

/// Check for an existing pidfile and log accordingly, then write our own.
fn acquire_pidfile() -> Option<PathBuf> {
    let path = pidfile_path();
    if let Ok(content) = std::fs::read_to_string(&path)
        && let Ok(pid) = content.trim().parse::<u32>()
    {
        if is_process_alive(pid) {
            tracing::warn!("another sb serve (PID {pid}) is running; sharing the database");
        } else {
            tracing::info!("cleaned up stale pidfile (PID {pid} is dead)");
            let _ = std::fs::remove_file(&path);
        }
    }

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::File::create(&path) {
        Ok(mut f) => {
            let _ = write!(f, "{}", std::process::id());
            tracing::info!("wrote pidfile: {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::warn!("failed to write pidfile: {e}");
            None
        }
    }
}

fn release_pidfile(path: &Path) {
    let _ = std::fs::remove_file(path);
    tracing::info!("removed pidfile: {}", path.display());
}

#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    // kill(pid, 0) checks existence without sending a signal
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    false
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let data = open_data(cli)?;
    tracing::info!("starting MCP server for profile '{}'", data.profile());

    let pidfile = acquire_pidfile();

    let server = server::SbServer::new(data).context("failed to load skill book")?;
    let service = server
        .clone()
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    server.checkpoint_wal().await;

    if let Some(path) = pidfile {
        release_pidfile(&path);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn habit_line(habit: &Habit, now: &Moment) -> String {
    let status = match habit.kind {
        HabitKind::Daily if habit.is_completed_today(now.day) => "done today".to_string(),
        HabitKind::Daily => "not done".to_string(),
        HabitKind::Timed if habit.is_timer_running() => {
            let elapsed = habit
                .timer_started_at
                .map(|start| now.elapsed_ms_since(start))
                .unwrap_or(0);
            format!("running {}", format_duration(elapsed))
        }
        HabitKind::Timed => format!("{} today", format_duration(habit.time_today_ms)),
    };
    format!(
        "{} {:<20} lvl {:>2}  {:>10} xp  streak {:>3}  {}",
        habit.icon.emoji(),
        habit.name,
        habit.level,
        habit.experience,
        habit.streak,
        status
    )
}

/// Terminal rendition of the feedback cues: a bell when sound is on.
fn play_cues(settings: &Settings, cues: &[Cue]) {
    tracing::debug!(?cues, "feedback cues");
    if settings.sound_enabled && tone_gain(settings.sound_volume) > 0.0 && !cues.is_empty() {
        eprint!("\x07");
    }
}

fn report_progress(data: &DataDir, progress: &Progress, cues: &[Cue]) -> Result<()> {
    let settings = data.load_settings().context("failed to load settings")?;
    let habit = &progress.habit;

    println!(
        "+{} XP to {} ({} xp, level {}, {} to next)",
        progress.experience_gained,
        habit.name,
        habit.experience,
        habit.level,
        habit.experience_to_next
    );
    if let Some(days) = progress.streak_milestone {
        println!("Streak milestone: {days} days!");
    }
    if let Some(level) = progress.leveled_up_to {
        if settings.animations_enabled {
            println!("{} Level {level}!", habit.icon.emoji());
        }
        println!("Congratulations, you just advanced a {} level.", habit.name);
    }
    play_cues(&settings, cues);
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_add(cli: &Cli, name: &str, timed: bool, icon: Option<SkillIcon>) -> Result<()> {
    let data = open_data(cli)?;
    let mut book = load_book(&data)?;

    let kind = if timed { HabitKind::Timed } else { HabitKind::Daily };
    let habit = book.create(name, icon.unwrap_or_default(), kind)?;
    data.store()
        .save_habit(habit)
        .context("failed to save skill")?;

    println!("added {} skill '{}' ({})", habit.kind, habit.name, habit.id);
    Ok(())
}

fn cmd_list(cli: &Cli) -> Result<()> {
    let data = open_data(cli)?;
    let book = load_book(&data)?;
    let now = Moment::now_local();

    if book.is_empty() {
        println!("(no skills yet)");
        return Ok(());
    }
    for habit in book.habits() {
        println!("{}", habit_line(habit, &now));
    }
    println!("total level: {}", book.total_level());
    Ok(())
}

fn cmd_show(cli: &Cli, skill: &str) -> Result<()> {
    let data = open_data(cli)?;
    let book = load_book(&data)?;
    let now = Moment::now_local();
    let habit = book.resolve(skill)?;

    println!("{}", habit_line(habit, &now));
    println!("id:         {}", habit.id);
    println!("kind:       {}", habit.kind);
    println!("icon:       {}", habit.icon);
    println!("to next:    {}", habit.experience_to_next);
    match habit.last_completed {
        Some(day) => println!("last done:  {day}"),
        None => println!("last done:  never"),
    }
    if habit.history.is_empty() {
        println!("history:    (empty)");
    } else {
        println!("history:");
        for entry in habit.history.iter().rev().take(10) {
            match entry.duration_ms {
                Some(ms) => println!(
                    "  {}  +{} xp  {}",
                    entry.date,
                    entry.experience_gained,
                    format_duration(ms)
                ),
                None => println!("  {}  +{} xp", entry.date, entry.experience_gained),
            }
        }
    }
    Ok(())
}

fn cmd_complete(cli: &Cli, skill: &str) -> Result<()> {
    let data = open_data(cli)?;
    let mut book = load_book(&data)?;
    let now = Moment::now_local();

    let id = book.resolve(skill)?.id.clone();
    let progress = book.complete(&id, &now)?;
    if progress.is_noop() {
        println!("{} already completed today.", progress.habit.name);
        return Ok(());
    }
    data.store()
        .save_habit(&progress.habit)
        .context("failed to save skill")?;

    report_progress(&data, &progress, &Cue::for_completion(&progress))
}

fn cmd_start(cli: &Cli, skill: &str) -> Result<()> {
    let data = open_data(cli)?;
    let mut book = load_book(&data)?;
    let now = Moment::now_local();

    let id = book.resolve(skill)?.id.clone();
    let habit = book.start_timer(&id, &now)?;
    data.store()
        .save_habit(habit)
        .context("failed to save skill")?;

    println!("started {} timer", habit.name);
    play_cues(
        &data.load_settings().context("failed to load settings")?,
        &[Cue::TimerStart],
    );
    Ok(())
}

fn cmd_stop(cli: &Cli, skill: &str) -> Result<()> {
    let data = open_data(cli)?;
    let mut book = load_book(&data)?;
    let now = Moment::now_local();

    let id = book.resolve(skill)?.id.clone();
    let progress = book.stop_timer(&id, &now)?;
    data.store()
        .save_habit(&progress.habit)
        .context("failed to save skill")?;

    print_stopped(&data, &progress)
}

fn print_stopped(data: &DataDir, progress: &Progress) -> Result<()> {
    println!(
        "stopped {} timer ({} today)",
        progress.habit.name,
        format_duration(progress.habit.time_today_ms)
    );
    if progress.experience_gained == 0 {
        println!("not enough time for any experience");
        return Ok(());
    }
    report_progress(data, progress, &Cue::for_timer_stop(progress))
}

fn cmd_toggle(cli: &Cli, skill: &str) -> Result<()> {
    let data = open_data(cli)?;
    let mut book = load_book(&data)?;
    let now = Moment::now_local();

    let id = book.resolve(skill)?.id.clone();
    match book.toggle_timer(&id, &now)? {
        TimerToggle::Started(habit) => {
            data.store()
                .save_habit(&habit)
                .context("failed to save skill")?;
            println!("started {} timer", habit.name);
            play_cues(
                &data.load_settings().context("failed to load settings")?,
                &[Cue::TimerStart],
            );
            Ok(())
        }
        TimerToggle::Stopped(progress) => {
            data.store()
                .save_habit(&progress.habit)
                .context("failed to save skill")?;
            print_stopped(&data, &progress)
        }
    }
}

fn cmd_status(cli: &Cli) -> Result<()> {
    let data = open_data(cli)?;
    let book = load_book(&data)?;
    let now = Moment::now_local();

    let mut any = false;
    for habit in book.running_timers() {
        any = true;
        let elapsed = habit
            .timer_started_at
            .map(|start| now.elapsed_ms_since(start))
            .unwrap_or(0);
        let pending = book.pending_experience(&habit.id, &now)?;
        println!(
            "{} {}: {} elapsed, +{} xp pending",
            habit.icon.emoji(),
            habit.name,
            format_duration(elapsed),
            pending
        );
    }
    if !any {
        println!("no timers running");
    }
    Ok(())
}

fn cmd_delete(cli: &Cli, skill: &str) -> Result<()> {
    let data = open_data(cli)?;
    let mut book = load_book(&data)?;

    let id = book.resolve(skill)?.id.clone();
    data.store()
        .delete_habit(&id)
        .context("failed to delete skill")?;
    if let Some(habit) = book.remove(&id) {
        println!("deleted '{}'", habit.name);
    }
    Ok(())
}

fn cmd_focus(cli: &Cli, sub: &FocusCommand) -> Result<()> {
    let data = open_data(cli)?;
    let mut book = load_book(&data)?;

    match sub {
        FocusCommand::Add { skill } => {
            let habit = book.resolve(skill)?;
            let (id, name) = (habit.id.clone(), habit.name.clone());
            if book.focus(&id) {
                println!("focused '{name}'");
            } else {
                println!("'{name}' is already in focus");
            }
        }
        FocusCommand::Remove { skill } => {
            let habit = book.resolve(skill)?;
            let (id, name) = (habit.id.clone(), habit.name.clone());
            if book.unfocus(&id) {
                println!("unfocused '{name}'");
            } else {
                println!("'{name}' was not in focus");
            }
        }
        FocusCommand::List => {
            let now = Moment::now_local();
            let focused = book.focused();
            if focused.is_empty() {
                println!("(focus list is empty)");
            }
            for habit in focused {
                println!("{}", habit_line(habit, &now));
            }
            return Ok(());
        }
    }

    data.store()
        .save_focus(book.focus_ids())
        .context("failed to save focus list")
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let data = open_data(cli)?;
    let book = load_book(&data)?;
    let store = data.store();

    let db_size = store.db_size().context("failed to read database size")?;
    let history = store
        .history_count()
        .context("failed to count history")?;

    println!("profile:     {}", data.profile());
    println!("skills:      {}", book.len());
    println!("total level: {}", book.total_level());
    println!("total xp:    {}", book.total_experience());
    println!("best streak: {}", book.best_streak());
    println!("history:     {history}");
    println!("db_size:     {:.1}KB", db_size as f64 / 1024.0);
    Ok(())
}

fn cmd_heatmap(cli: &Cli, weeks: Option<u32>) -> Result<()> {
    let data = open_data(cli)?;
    let book = load_book(&data)?;
    let settings = data.load_settings().context("failed to load settings")?;
    let now = Moment::now_local();

    let weeks = weeks
        .unwrap_or(settings.heatmap_weeks)
        .clamp(1, MAX_HEATMAP_WEEKS);
    let heatmap = Heatmap::build(book.habits(), now.day, weeks);

    let width = heatmap.weeks.len() * 2;
    let mut header = vec![' '; width];
    for label in &heatmap.month_labels {
        for (i, c) in label.name.chars().enumerate() {
            if let Some(slot) = header.get_mut(label.column * 2 + i) {
                *slot = c;
            }
        }
    }
    println!("    {}", header.iter().collect::<String>().trim_end());

    const ROWS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    for (row, name) in ROWS.iter().enumerate() {
        let line: String = heatmap
            .weeks
            .iter()
            .map(|week| match week.get(row) {
                Some(cell) if cell.is_future => "  ",
                Some(cell) => match cell.intensity {
                    0 => "· ",
                    1 => "░ ",
                    2 => "▒ ",
                    3 => "▓ ",
                    _ => "█ ",
                },
                None => "  ",
            })
            .collect();
        println!("{name} {}", line.trim_end());
    }
    println!("{} active days", heatmap.active_days());
    Ok(())
}

fn cmd_export(cli: &Cli, path: &Path) -> Result<()> {
    let data = open_data(cli)?;
    data.store()
        .export_json_file(path)
        .with_context(|| format!("failed to export to {}", path.display()))?;
    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_import(cli: &Cli, path: &Path) -> Result<()> {
    let data = open_data(cli)?;
    let book = data
        .store()
        .import_json_file(path)
        .context("failed to import JSON")?;
    println!(
        "imported from {}. skills={}, total level={}",
        path.display(),
        book.len(),
        book.total_level()
    );
    Ok(())
}

fn cmd_reset(cli: &Cli, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to reset without --yes");
    }
    let data = open_data(cli)?;
    let mut book = load_book(&data)?;
    let removed = book.len();
    book.reset();
    data.store()
        .save_book(&book)
        .context("failed to save skill book")?;
    println!("reset profile '{}': removed {removed} skills", data.profile());
    Ok(())
}

fn cmd_login(cli: &Cli, provider: AuthProvider, handle: &str) -> Result<()> {
    let data = open_data(cli)?;
    let user = data
        .identity()
        .sign_in(provider, handle)
        .context("failed to sign in")?;
    println!("signed in as {} via {}", user.display_name, user.provider);
    Ok(())
}

fn cmd_logout(cli: &Cli) -> Result<()> {
    let data = open_data(cli)?;
    data.identity().sign_out().context("failed to sign out")?;
    println!("signed out");
    Ok(())
}

fn cmd_whoami(cli: &Cli) -> Result<()> {
    let data = open_data(cli)?;
    match data
        .identity()
        .current_user()
        .context("failed to read identity")?
    {
        Some(user) => println!(
            "{} via {} (since {})",
            user.display_name,
            user.provider,
            user.signed_in_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => println!("not signed in"),
    }
    Ok(())
}

fn cmd_config(cli: &Cli, sub: &ConfigCommand) -> Result<()> {
    let data = open_data(cli)?;
    let mut settings = data.load_settings().context("failed to load settings")?;

    match sub {
        ConfigCommand::Show => {
            for key in Settings::KEYS {
                if let Some(value) = settings.get(key) {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigCommand::Set { key, value } => {
            settings.set(key, value).context("failed to update setting")?;
            data.save_settings(&settings)
                .context("failed to save settings")?;
            if let Some(value) = settings.get(key) {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}
