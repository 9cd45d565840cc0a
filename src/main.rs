//! Guild Stats
//!
//! Turns OCR output from battle-report screenshots into a deduplicated,
//! sortable table of per-player stats with confidence markers for manual
//! review.

mod analysis;
mod config;
mod ocr;
mod paths;
mod roster;
mod stats;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use analysis::{export_records, render_table, AnalysisSession, ExportFormat, History};
use roster::RosterBook;
use stats::{SortColumn, StatKey};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("guild_stats.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "guild-stats",
    version,
    about = "Build a per-player stats table from battle-report screenshots"
)]
struct Cli {
    /// Directory holding the session, history and rosters.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// OCR screenshots and merge their players into the current table.
    Analyze(AnalyzeArgs),
    /// Print the current table.
    Table {
        /// Sort by this column first (same rules as `sort`).
        #[arg(long)]
        sort: Option<SortColumn>,
    },
    /// Sort by a column; repeating the active column flips direction.
    Sort { column: SortColumn },
    /// Manually correct one stat after checking the screenshot.
    Edit {
        family_name: String,
        stat: StatKey,
        value: i64,
    },
    /// Delete a spurious row.
    Remove { family_name: String },
    /// Clear the current table.
    Reset,
    /// Write the current table to a file.
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        /// Output path (default: GuildStats_<date>.<ext>).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Save, list, load or delete past analyses.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Manage guild rosters.
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },
    /// Check the tesseract install and fetch English trained data if missing.
    SetupOcr,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Screenshots, processed in the given order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Clear the table before analyzing.
    #[arg(long)]
    reset: bool,

    /// Binarization threshold (overrides config.json).
    #[arg(long)]
    threshold: Option<u8>,
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    List,
    Save,
    Load { id: i64 },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum RosterAction {
    List,
    Add { guild: String },
    Delete { guild: String },
    /// Fetch the guild page (or read a saved copy) and replace its members.
    Update {
        guild: String,
        #[arg(long)]
        from_file: Option<PathBuf>,
        #[arg(long)]
        region: Option<String>,
    },
}

fn print_table(session: &AnalysisSession, data_dir: &Path) -> Result<()> {
    let roster = RosterBook::load(&paths::rosters_file(data_dir))?.combined_members();
    let ranked = session.ranked();
    println!(
        "Sorted by {} ({:?})",
        session.sort.column, session.sort.direction
    );
    print!(
        "{}",
        render_table(&ranked, &config::get_config().policy, &roster)
    );
    Ok(())
}

fn run_history(action: HistoryAction, data_dir: &Path) -> Result<()> {
    let history_path = paths::history_file(data_dir);
    let session_path = paths::session_file(data_dir);
    let mut history = History::load(&history_path)?;

    match action {
        HistoryAction::List => {
            if history.entries().is_empty() {
                println!("No saved history.");
            }
            for entry in history.entries() {
                println!("{}  {}  ({} players)", entry.id, entry.name, entry.data.len());
            }
        }
        HistoryAction::Save => {
            let session = AnalysisSession::load(&session_path)?;
            let name = history.record(&session.collection, Local::now())?.name.clone();
            history.save(&history_path)?;
            log(&format!("Session saved as \"{}\"", name));
        }
        HistoryAction::Load { id } => {
            let mut session = AnalysisSession::load(&session_path)?;
            session.collection = history.restore(id)?;
            session.save(&session_path)?;
            log(&format!("Loaded session {}", id));
            print_table(&session, data_dir)?;
        }
        HistoryAction::Delete { id } => {
            if history.delete(id) {
                history.save(&history_path)?;
                log(&format!("Deleted saved analysis {}", id));
            } else {
                println!("No saved analysis with id {}", id);
            }
        }
    }
    Ok(())
}

fn run_roster(action: RosterAction, data_dir: &Path) -> Result<()> {
    let rosters_path = paths::rosters_file(data_dir);
    let mut book = RosterBook::load(&rosters_path)?;

    match action {
        RosterAction::List => {
            for (guild, roster) in book.guilds() {
                println!(
                    "{}  (updated {}, {} members)",
                    guild,
                    roster.last_updated.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    roster.members.len()
                );
            }
            let members = book.combined_members();
            println!("Combined roster: {} members", members.len());
        }
        RosterAction::Add { guild } => {
            book.add_guild(&guild, Utc::now())?;
            book.save(&rosters_path)?;
        }
        RosterAction::Delete { guild } => {
            book.delete_guild(&guild)?;
            book.save(&rosters_path)?;
        }
        RosterAction::Update {
            guild,
            from_file,
            region,
        } => {
            let config = config::get_config();
            let html = match from_file {
                Some(path) => std::fs::read_to_string(&path)
                    .context(format!("Failed to read {}", path.display()))?,
                None => roster::fetch_guild_html(
                    &config.roster_url,
                    &guild,
                    region.as_deref().unwrap_or(&config.roster_region),
                )?,
            };
            book.update_from_html(&guild, &html, Utc::now())?;
            book.save(&rosters_path)?;
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(paths::default_data_dir);
    paths::ensure_directories(&data_dir)?;
    config::init_config();

    let session_path = paths::session_file(&data_dir);

    match cli.command {
        Commands::Analyze(args) => {
            let config = config::get_config();
            let recognizer = ocr::build_recognizer(config, args.threshold)?;
            let builder = config.record_builder();

            let mut session = AnalysisSession::load(&session_path)?;
            if args.reset {
                session.reset();
            }
            let report = session.analyze_files(&recognizer, &builder, &args.files);
            session.save(&session_path)?;

            log(&format!(
                "Analysis complete! {} file(s) processed, {} failed, {} rows read, {} new players, {} duplicates ignored",
                report.files_processed,
                report.files_failed,
                report.records_accepted,
                report.players_added,
                report.duplicates_ignored
            ));
            print_table(&session, &data_dir)?;
        }
        Commands::Table { sort } => {
            let mut session = AnalysisSession::load(&session_path)?;
            if let Some(column) = sort {
                session.sort_by(column);
                session.save(&session_path)?;
            }
            print_table(&session, &data_dir)?;
        }
        Commands::Sort { column } => {
            let mut session = AnalysisSession::load(&session_path)?;
            session.sort_by(column);
            session.save(&session_path)?;
            print_table(&session, &data_dir)?;
        }
        Commands::Edit {
            family_name,
            stat,
            value,
        } => {
            let mut session = AnalysisSession::load(&session_path)?;
            session.correct(&family_name, stat, value)?;
            session.save(&session_path)?;
            log(&format!("Corrected {} {} = {}", family_name, stat, value));
            print_table(&session, &data_dir)?;
        }
        Commands::Remove { family_name } => {
            let mut session = AnalysisSession::load(&session_path)?;
            session.remove(&family_name)?;
            session.save(&session_path)?;
            log(&format!("Removed {}", family_name));
        }
        Commands::Reset => {
            let mut session = AnalysisSession::load(&session_path)?;
            session.reset();
            session.save(&session_path)?;
            log("Current analysis has been reset.");
        }
        Commands::Export { format, output } => {
            let session = AnalysisSession::load(&session_path)?;
            let output = output.unwrap_or_else(|| {
                PathBuf::from(analysis::export::default_filename(
                    format,
                    Local::now().date_naive(),
                ))
            });
            export_records(&session.ranked(), format, &output)?;
        }
        Commands::History { action } => run_history(action, &data_dir)?,
        Commands::Roster { action } => run_roster(action, &data_dir)?,
        Commands::SetupOcr => {
            let recognizer = ocr::ensure_tesseract(config::get_config())?;
            log(&format!("OCR ready: {}", recognizer.executable.display()));
        }
    }

    Ok(())
}

fn main() -> std::process::ExitCode {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    match run(Cli::parse()) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log(&format!("Error: {:#}", e));
            std::process::ExitCode::FAILURE
        }
    }
}
