mod config;
mod controller;
mod db;
mod error;
mod filter;
mod models;
mod notice;
mod pagination;
mod store;
mod suggest;
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use db::Database;
use error::BoardError;
use filter::{match_postings, CategoryChoice, CategorySelection, FilterState};
use models::{JobPosting, Level, PostingDraft};
use pagination::Pagination;
use std::collections::BTreeSet;
use std::path::PathBuf;
use store::JobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui::truncate;

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Job listing board - browse, filter, apply for and post jobs")]
struct Cli {
    /// Database file (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and seed default postings
    Init,

    /// Open the interactive board
    Browse,

    /// List postings matching the given filters
    List {
        /// Category to include (repeatable; omit or "All" for every category)
        #[arg(short, long)]
        category: Vec<String>,

        /// Level (Internship, Junior, Mid or Any)
        #[arg(short, long)]
        level: Option<String>,

        /// Exact location (or Any)
        #[arg(short = 'o', long)]
        location: Option<String>,

        /// Case-insensitive keyword
        #[arg(short, long)]
        keyword: Option<String>,

        /// Number of extra pages to load
        #[arg(short, long, default_value = "0")]
        more: usize,

        /// Show every match
        #[arg(short, long)]
        all: bool,
    },

    /// Show posting details
    Show {
        /// Posting ID
        id: i64,
    },

    /// Submit a new posting as an employer
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        category: String,
        /// Defaults to the configured fallback town
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long)]
        level: String,
        #[arg(long)]
        description: String,
    },

    /// Apply for a posting
    Apply {
        /// Posting ID
        id: i64,
    },

    /// Save a posting to your profile
    Save {
        /// Posting ID
        id: i64,
    },

    /// List saved postings
    Saved,

    /// List postings you applied for
    Applied,

    /// Discard stored postings and restore the defaults
    Reset {
        /// Also forget applied and saved jobs
        #[arg(long)]
        all: bool,
    },
}

fn init_logging(verbose: bool, log_file: Option<PathBuf>) -> Result<()> {
    let default = if verbose { "jobboard=debug" } else { "jobboard=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match log_file {
        // The terminal belongs to the board, so logs go to a file.
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn parse_choice(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("any"))
}

fn build_filter(
    category: &[String],
    level: Option<&str>,
    location: Option<&str>,
    keyword: Option<&str>,
) -> Result<FilterState> {
    let categories = CategorySelection::from_categories(category.iter().filter_map(|c| {
        match CategoryChoice::parse(c) {
            CategoryChoice::Category(c) => Some(c),
            CategoryChoice::All => None,
        }
    }));
    let level = parse_choice(level).map(str::parse::<Level>).transpose()?;
    Ok(FilterState {
        categories,
        level: level.into(),
        location: parse_choice(location).map(str::to_string).into(),
        keyword: keyword.unwrap_or_default().to_string(),
    })
}

/// Blank means "not given" so it is reported with the other missing fields.
fn parse_level_field(value: &str) -> Result<Option<Level>> {
    match value.trim() {
        "" => Ok(None),
        v => Ok(Some(v.parse()?)),
    }
}

fn print_table(jobs: &[&JobPosting], applied: &BTreeSet<i64>, saved: &BTreeSet<i64>) {
    println!(
        "{:<14} {:<2} {:<30} {:<22} {:<12} {:<11} {:<10}",
        "ID", "", "TITLE", "COMPANY", "CATEGORY", "LOCATION", "LEVEL"
    );
    println!("{}", "-".repeat(107));
    for job in jobs {
        let marker = match (applied.contains(&job.id), saved.contains(&job.id)) {
            (true, _) => "+",
            (false, true) => "*",
            _ => "",
        };
        println!(
            "{:<14} {:<2} {:<30} {:<22} {:<12} {:<11} {:<10}",
            job.id,
            marker,
            truncate(&job.title, 28),
            truncate(&job.company, 20),
            truncate(&job.category, 12),
            truncate(&job.location, 11),
            job.level
        );
    }
}

fn find_posting(store: &JobStore, id: i64) -> Result<&JobPosting> {
    Ok(store.find(id).ok_or(BoardError::JobNotFound(id))?)
}

fn print_ids(store: &JobStore, ids: &[i64], empty: &str) -> Result<()> {
    let jobs: Vec<&JobPosting> = ids.iter().filter_map(|id| store.find(*id)).collect();
    if jobs.is_empty() {
        println!("{}", empty);
    } else {
        print_table(&jobs, &store.applied_set()?, &store.saved_set()?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;
    let db_path = cli
        .db
        .clone()
        .or_else(|| config.database.clone())
        .unwrap_or_else(Database::default_path);

    let log_file = matches!(cli.command, Commands::Browse)
        .then(|| db_path.with_file_name("jobboard.log"));
    init_logging(cli.verbose, log_file)?;

    let db = Database::open(&db_path)?;
    info!(path = %db.path().display(), "opened database");
    if matches!(cli.command, Commands::Init) {
        db.init()?;
    } else {
        db.ensure_initialized()?;
    }
    let mut store = JobStore::open(db, config.applied_scope)?;

    match cli.command {
        Commands::Init => {
            println!(
                "Database initialized at {} ({} postings)",
                db_path.display(),
                store.postings().len()
            );
        }

        Commands::Browse => tui::run_board(store, &config)?,

        Commands::List {
            category,
            level,
            location,
            keyword,
            more,
            all,
        } => {
            let filter = build_filter(&category, level.as_deref(), location.as_deref(), keyword.as_deref())?;
            let matches = match_postings(store.postings(), &filter, &config.search_fields);
            if matches.is_empty() {
                println!("{}", controller::EMPTY_RESULTS);
                return Ok(());
            }

            let mut page = Pagination::default();
            page.reset(matches.len());
            for _ in 0..more {
                page.load_more(matches.len());
            }
            let shown = if all { matches.len() } else { page.shown(matches.len()) };

            println!("{} job(s) found ({})\n", matches.len(), filter.summary());
            print_table(&matches[..shown], &store.applied_set()?, &store.saved_set()?);
            if shown < matches.len() {
                println!("\n{} more - use --more {} or --all", matches.len() - shown, more + 1);
            }
        }

        Commands::Show { id } => {
            let job = find_posting(&store, id)?;
            println!("Job #{}", job.id);
            println!("Title: {}", job.title);
            println!("Company: {}", job.company);
            println!("Category: {}", job.category);
            println!("Location: {}", job.location);
            println!("Level: {}", job.level);
            if let Some(duration) = &job.duration {
                println!("Duration: {}", duration);
            }
            if store.is_applied(id)? {
                println!("Status: applied");
            }
            if store.is_saved(id)? {
                println!("Saved: yes");
            }
            println!("\n{}", textwrap::fill(&job.description, 80));
        }

        Commands::Post {
            title,
            company,
            category,
            location,
            level,
            description,
        } => {
            let draft = PostingDraft {
                title,
                company,
                category,
                location,
                level: parse_level_field(&level)?,
                description,
            };
            let posting = store.add_posting(draft, &config.fallback_location)?;
            println!("Job added (#{}): {} at {}, {}", posting.id, posting.title, posting.company, posting.location);
        }

        Commands::Apply { id } => {
            let job = find_posting(&store, id)?;
            let message = format!("Applied for \"{}\" at {}", job.title, job.company);
            if store.record_applied(id)? {
                println!("{}", message);
            } else {
                println!("You already applied for this job");
            }
        }

        Commands::Save { id } => {
            find_posting(&store, id)?;
            if store.record_saved(id)? {
                println!("Saved job to your profile");
            } else {
                println!("You already saved this job");
            }
        }

        Commands::Saved => print_ids(&store, &store.saved_ids()?, "No saved jobs.")?,

        Commands::Applied => print_ids(&store, &store.applied_ids()?, "No applications yet.")?,

        Commands::Reset { all } => {
            if all {
                store.clear_all()?;
                println!("Cleared applied and saved jobs.");
            } else {
                store.reset()?;
            }
            println!("Restored {} default postings.", store.postings().len());
        }
    }

    Ok(())
}
