use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use levelbook::archive::{self, parse_date};
use levelbook::init::{init_archive, parse_member_spec, sample_roster};
use levelbook::mutator::parse_count;
use levelbook::scoring::period_totals;
use levelbook::stats::mean_counts;
use levelbook::{Config, Error, PendingEdit, Reference, Result, Roster, Session, SummaryRow};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "levelbook")]
#[command(author, version, about = "Weekly activity ledger: XP, levels and ranks for a roster, kept in one zip archive")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Archive file (default: $LEVELBOOK_ARCHIVE, then .levelbook/config.toml, then levelbook.zip)
    #[arg(short, long, global = true)]
    archive: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a template archive with empty logs
    Init {
        /// Roster member as NAME:ROLE (repeatable; default: five sample scientists)
        #[arg(short, long = "member", value_name = "NAME:ROLE")]
        members: Vec<String>,

        /// Replace an existing archive
        #[arg(long)]
        force: bool,
    },

    /// Show every member's XP, level, rank and XP to next level
    Summary {
        /// Print as CSV
        #[arg(long, conflicts_with = "json")]
        csv: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one member's standing and weekly XP
    Member {
        /// Member name
        name: String,
    },

    /// List dates with recorded activity
    Dates {
        /// Only this member's dates
        #[arg(short, long)]
        member: Option<String>,
    },

    /// Show everyone's activity for one date
    Week {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Record a member's activity counts for a date
    Log {
        /// Member name
        member: String,

        /// Date (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Activity count as ACTIVITY=N (repeatable; unset activities count 0)
        #[arg(short = 's', long = "set", value_name = "ACTIVITY=N")]
        counts: Vec<String>,

        /// Commit without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the mean count of each activity over the whole period
    Stats,

    /// List activities and their points
    Activities,

    /// Generate shell completion script
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load();
    let archive_path = config.archive_path(cli.archive.as_deref());

    match cli.command {
        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "levelbook", &mut io::stdout());
            Ok(())
        }
        Command::Activities => {
            let reference = config.reference()?;
            println!("{:<24} {:>6}", "ACTIVITY".bold(), "POINTS".bold());
            for activity in reference.activities.iter() {
                println!("{:<24} {:>6}", activity.name, activity.points);
            }
            Ok(())
        }
        Command::Init { members, force } => {
            let reference = config.reference()?;
            let roster = if members.is_empty() {
                sample_roster()
            } else {
                let members = members
                    .iter()
                    .map(|spec| parse_member_spec(spec))
                    .collect::<Result<Vec<_>>>()?;
                Roster::new(members)?
            };
            init_archive(&archive_path, &roster, &reference.activities, force)
        }
        Command::Summary { csv, json } => {
            let session = open_session(&config, &archive_path)?;
            if csv {
                print!("{}", session.summary().to_csv()?);
            } else if json {
                let out = serde_json::to_string_pretty(session.summary().rows())
                    .map_err(|e| Error::Io(io::Error::other(e)))?;
                println!("{}", out);
            } else {
                print_summary(session.summary().rows());
            }
            Ok(())
        }
        Command::Member { name } => {
            let session = open_session(&config, &archive_path)?;
            print_member(&session, &name)
        }
        Command::Dates { member } => {
            let session = open_session(&config, &archive_path)?;
            let dates = match member {
                Some(name) => session.member_dates(&name)?,
                None => session.available_dates(),
            };
            if dates.is_empty() {
                println!("No activity recorded yet.");
            }
            for date in dates {
                println!("{}", date.format(archive::DATE_FORMAT));
            }
            Ok(())
        }
        Command::Stats => {
            let session = open_session(&config, &archive_path)?;
            print_stats(&session);
            Ok(())
        }
        Command::Week { date } => {
            let session = open_session(&config, &archive_path)?;
            print_week(&session, parse_date(&date)?);
            Ok(())
        }
        Command::Log {
            member,
            date,
            counts,
            yes,
        } => {
            let mut session = open_session(&config, &archive_path)?;
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let counts = parse_counts(&counts)?;
            record(&mut session, &archive_path, &member, date, &counts, yes)
        }
    }
}

fn open_session(config: &Config, path: &Path) -> Result<Session> {
    let reference: Reference = config.reference()?;
    let bytes = std::fs::read(path).map_err(|e| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("cannot read archive {}: {}", path.display(), e),
        ))
    })?;
    Session::open(&bytes, reference)
}

fn parse_counts(specs: &[String]) -> Result<BTreeMap<String, u32>> {
    let mut counts = BTreeMap::new();
    for spec in specs {
        let (activity, raw) = spec.split_once('=').ok_or_else(|| Error::CountOverflow {
            activity: spec.clone(),
            value: "missing '=N'".to_string(),
        })?;
        let activity = activity.trim().to_string();
        let count = parse_count(&activity, raw)?;
        counts.insert(activity, count);
    }
    Ok(counts)
}

fn record(
    session: &mut Session,
    path: &Path,
    member: &str,
    date: NaiveDate,
    counts: &BTreeMap<String, u32>,
    yes: bool,
) -> Result<()> {
    let names = session.reference().activities.names();
    let edit = session.begin_edit(member, date, counts)?;
    print_preview(edit, &names);

    if !yes && !confirm(&format!(
        "Commit these activities for {} on {}?",
        member,
        date.format(archive::DATE_FORMAT)
    )) {
        session.cancel_edit();
        println!("{}", "Cancelled, nothing changed.".yellow());
        return Ok(());
    }

    if let Some(bytes) = session.commit_edit()? {
        archive::write_file(path, &bytes)?;
        println!("{} {}", "Saved".green().bold(), path.display());
    }
    let row = session.standing(member)?;
    print_summary(std::slice::from_ref(row));
    Ok(())
}

fn confirm(question: &str) -> bool {
    eprint!("{} [y/N] ", question);
    io::stderr().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}

fn print_preview(edit: &PendingEdit, names: &[String]) {
    println!(
        "\n{} {} on {}",
        "Activities to add for".cyan().bold(),
        edit.member,
        edit.date.format(archive::DATE_FORMAT)
    );
    println!("{:<24} {:>6} {:>8}", "ACTIVITY".bold(), "COUNT".bold(), "XP".bold());
    for ((name, count), xp) in names.iter().zip(&edit.counts).zip(&edit.scores) {
        if *count > 0 {
            println!("{:<24} {:>6} {:>8}", name, count, xp);
        }
    }
    println!("{:<24} {:>6} {:>8}", "total", "", edit.xp());
    if let Some(previous) = &edit.replaces {
        let previous: Vec<String> = previous.iter().map(u32::to_string).collect();
        println!(
            "{} replaces the row already recorded for this date ({})",
            "Note:".yellow().bold(),
            previous.join(", ")
        );
    }
    println!();
}

fn print_summary(rows: &[SummaryRow]) {
    println!(
        "{:<24} {:<16} {:>8} {:>6} {:<14} {:>10}",
        "MEMBER".bold(),
        "ROLE".bold(),
        "XP".bold(),
        "LEVEL".bold(),
        "RANK".bold(),
        "TO NEXT".bold()
    );
    for row in rows {
        println!(
            "{:<24} {:<16} {:>8} {:>6} {:<14} {:>10}",
            truncate(&row.member_name, 24),
            truncate(&row.role, 16),
            row.total_xp,
            row.level,
            row.rank,
            row.xp_to_next_level.to_string()
        );
    }
}

fn print_member(session: &Session, name: &str) -> Result<()> {
    let row = session.standing(name)?;
    print_summary(std::slice::from_ref(row));

    let scores = session.period_scores(name)?;
    println!("\n{}", "Weekly XP".cyan().bold());
    let totals = period_totals(&scores);
    if totals.is_empty() {
        println!("  No activity recorded yet.");
    }
    for (date, xp) in totals {
        println!("  {}  {:>8}", date.format(archive::DATE_FORMAT), xp);
    }
    Ok(())
}

fn print_week(session: &Session, date: NaiveDate) {
    let week = session.week_activity(date);
    let names = session.reference().activities.names();

    println!(
        "{} {}",
        "Activity for the week of".cyan().bold(),
        date.format(archive::DATE_FORMAT)
    );
    if week.rows.is_empty() {
        println!("  No activity recorded for this date.");
    }
    for (member, counts) in &week.rows {
        let cells: Vec<String> = names
            .iter()
            .zip(counts)
            .filter(|(_, count)| **count > 0)
            .map(|(name, count)| format!("{}={}", name, count))
            .collect();
        let cells = if cells.is_empty() {
            "-".to_string()
        } else {
            cells.join(", ")
        };
        println!("  {:<24} {}", member, cells);
    }

    if let Some(mean) = mean_counts(week.rows.iter().map(|(_, c)| c.as_slice()), names.len()) {
        println!("\n{}", "Mean per member".cyan().bold());
        for (name, value) in names.iter().zip(mean) {
            println!("  {:<24} {:>6.2}", name, value);
        }
    }

    if week.warning {
        println!(
            "\n{} no data on this date for: {}",
            "Warning:".yellow().bold(),
            week.missing.join(", ")
        );
    }
}

fn print_stats(session: &Session) {
    let dates = session.available_dates();
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        println!("No activity recorded yet.");
        return;
    };
    let rows = session.total_activity();
    let names = session.reference().activities.names();

    println!(
        "{} {} to {} ({} weekly rows)",
        "Mean activity per member-week from".cyan().bold(),
        first.format(archive::DATE_FORMAT),
        last.format(archive::DATE_FORMAT),
        rows.len()
    );
    if let Some(mean) = mean_counts(rows.iter().map(|r| r.counts.as_slice()), names.len()) {
        for (name, value) in names.iter().zip(mean) {
            println!("  {:<24} {:>6.2}", name, value);
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
