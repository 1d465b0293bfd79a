use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};
use slug::slugify;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use truerate::{
    config::Config,
    error::CoreError,
    models::{
        project::Project,
        session::Session,
        store::Store,
        user::{NotificationPreferences, User},
    },
    services::{
        ledger::{
            CreateProjectParameters, archive_project, create_project, select_project,
            unarchive_project, update_tags,
        },
        profile::complete_onboarding,
        reporting::{
            Timeframe, archive_summary, entries_summary, format_duration, group_entries_by_day,
            portfolio_overview, tag_trends,
        },
        time_accounting::{
            EditEntryParameters, FinalizeEntryParameters, ManualEntryParameters, cancel_session,
            start_session, stop_session,
        },
        tracking::{record_manual_entry, record_timer_entry, update_entry},
    },
    storage::{Storage, StorageError, json::JsonFileStorage},
};

mod ui;

#[derive(Parser)]
#[command(
    name = "truerate",
    about = "Track your time and see what each project really pays"
)]
struct Cli {
    /// Path to the store file (defaults to $TRUERATE_STORE, then the data dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up your profile
    Init {
        /// Your name
        #[arg(long)]
        name: String,

        /// Your email address
        #[arg(long)]
        email: String,

        /// Your industry (e.g., "Photography")
        #[arg(long)]
        industry: String,

        /// Turn off project reminders
        #[arg(long)]
        no_reminders: bool,

        /// Turn off weekly reports
        #[arg(long)]
        no_weekly_reports: bool,

        /// Turn off insights
        #[arg(long)]
        no_insights: bool,
    },

    /// Show your profile
    Profile,

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Start the timer on the current project
    Start,

    /// Stop the timer and save the time entry
    Stop {
        /// What you worked on
        #[arg(short, long)]
        notes: Option<String>,

        /// Corrected start time (e.g., "2025-03-01T09:00")
        #[arg(long)]
        start: Option<String>,

        /// Corrected end time (e.g., "2025-03-01T11:30")
        #[arg(long)]
        end: Option<String>,
    },

    /// Discard the timer without saving anything
    Cancel,

    /// Show the timer
    Status,

    /// Log time manually
    Log {
        /// Start time (e.g., "2025-03-01T09:00")
        #[arg(long)]
        start: String,

        /// End time (e.g., "2025-03-01T11:30")
        #[arg(long)]
        end: String,

        /// What you worked on
        #[arg(short, long)]
        notes: Option<String>,

        /// Project to log against (defaults to the current project)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Manage time entries
    #[command(subcommand)]
    Entry(EntryCommands),

    /// List time entries grouped by day
    Entries {
        /// Project to list (defaults to the current project)
        project: Option<String>,
    },

    /// Show earnings and hourly rates across projects
    Insights {
        #[arg(short, long, value_enum, default_value_t = TimeframeArg::Month)]
        timeframe: TimeframeArg,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectCommands {
    /// Create a new project
    New {
        name: String,

        /// Total budget agreed with the client
        #[arg(long)]
        budget: f64,

        /// Expenses for the project
        #[arg(long, default_value_t = 0.0)]
        expenses: f64,

        /// Estimated hours
        #[arg(long)]
        estimate: f64,

        /// Due date (e.g., "2025-03-01")
        #[arg(long)]
        due: String,

        /// Add a description
        #[arg(short, long)]
        description: Option<String>,

        /// Add tags (can be used multiple times)
        #[arg(short, long, action = clap::ArgAction::Append)]
        tag: Vec<String>,
    },
    /// List active projects
    List,
    /// List archived projects with totals
    Archived,
    /// Show a project's numbers
    View { name: String },
    /// Make a project the current one
    Select { name: String },
    /// Archive a project
    Archive { name: String },
    /// Restore an archived project
    Unarchive { name: String },
    /// Replace a project's tags
    Tags {
        name: String,

        /// Tags to set (can be used multiple times; none clears)
        #[arg(short, long, action = clap::ArgAction::Append)]
        tag: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum EntryCommands {
    /// Edit a time entry's bounds or notes
    Edit {
        /// Entry id (as shown by `entries`)
        id: String,

        /// New start time
        #[arg(long)]
        start: Option<String>,

        /// New end time
        #[arg(long)]
        end: Option<String>,

        /// New notes (empty clears them)
        #[arg(short, long)]
        notes: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TimeframeArg {
    Day,
    Week,
    Month,
    Year,
    Total,
}

impl From<TimeframeArg> for Timeframe {
    fn from(arg: TimeframeArg) -> Self {
        match arg {
            TimeframeArg::Day => Timeframe::Day,
            TimeframeArg::Week => Timeframe::Week,
            TimeframeArg::Month => Timeframe::Month,
            TimeframeArg::Year => Timeframe::Year,
            TimeframeArg::Total => Timeframe::Total,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Project name is ambiguous. Multiple projects found: {}", .0.join(", "))]
    AmbiguousProjectName(Vec<String>),

    #[error("Time entry '{0}' not found")]
    EntryNotFound(String),

    #[error("Time entry id '{0}' matches more than one entry")]
    AmbiguousEntryId(String),

    #[error("Invalid date '{0}': {1}")]
    InvalidDate(String, String),

    #[error("Invalid date/time '{0}': {1}")]
    InvalidDateTime(String, String),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn main() {
    let cli = Cli::parse();
    let config = Config::resolve(cli.store.clone());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new("truerate=warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let storage = JsonFileStorage::new(config.store_path);

    let mut store = match storage.load() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: Failed to load store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, &mut store, &storage) {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn run(
    command: Option<Commands>,
    store: &mut Store,
    storage: &impl Storage,
) -> Result<(), CliError> {
    let tz = TimeZone::system();
    let now = Timestamp::now();
    let today = Zoned::now().date();

    match command {
        None => match store.current_project() {
            Some(project) => {
                let summary = entries_summary(store.entries_for_project(project.id));
                ui::render_project_details(project, &summary, true, today);
                ui::render_session(store, now);
            }
            None => {
                println!("No active project");
                println!(
                    "{}",
                    "Create one with `truerate project new` or pick one with `truerate project select`"
                        .dimmed()
                );
            }
        },
        Some(Commands::Init {
            name,
            email,
            industry,
            no_reminders,
            no_weekly_reports,
            no_insights,
        }) => {
            let user = User {
                name,
                email,
                industry,
                notification_preferences: NotificationPreferences {
                    project_reminders: !no_reminders,
                    weekly_reports: !no_weekly_reports,
                    insights: !no_insights,
                },
            };
            let user = complete_onboarding(store, user)?.clone();
            storage.save(store)?;
            println!("Welcome to True Rate, {}!", user.name.bold());
        }
        Some(Commands::Profile) => match &store.user {
            Some(user) => ui::render_profile(user),
            None => println!("No profile yet. Run `truerate init` to set one up"),
        },
        Some(Commands::Project(command)) => run_project_command(command, store, storage, today)?,
        Some(Commands::Start) => {
            start_session(store, now)?;
            storage.save(store)?;
            let name = store.current_project().map(|p| p.name.clone()).unwrap_or_default();
            println!("{} Tracking time on {}", "●".red(), name.bold());
        }
        Some(Commands::Stop { notes, start, end }) => {
            let pending = match store.session {
                Session::Stopped { .. } | Session::Idle => None,
                Session::Running { .. } => {
                    let elapsed = store.session.elapsed_since(now);
                    Some(stop_session(store, elapsed)?)
                }
            };
            let (project_id, duration) = match (pending, &store.session) {
                (Some(pending), _) => (pending.project_id, pending.duration),
                (
                    None,
                    Session::Stopped {
                        project_id,
                        completed_duration,
                        ..
                    },
                ) => (*project_id, *completed_duration),
                (None, _) => {
                    return Err(CoreError::SessionState {
                        expected: "running",
                        actual: store.session.name(),
                    }
                    .into());
                }
            };

            let recorded = record_timer_entry(
                store,
                FinalizeEntryParameters {
                    project_id,
                    duration,
                    notes,
                    start_time: start.as_deref().map(|s| parse_timestamp(s, &tz)).transpose()?,
                    end_time: end.as_deref().map(|s| parse_timestamp(s, &tz)).transpose()?,
                },
                now,
            )?;
            storage.save(store)?;
            println!(
                "Saved {} on {} ({:.2}h total)",
                format_duration(recorded.entry.duration()).bold(),
                recorded.project.name,
                recorded.project.time_spent()
            );
        }
        Some(Commands::Cancel) => {
            cancel_session(store)?;
            storage.save(store)?;
            println!("Timer discarded");
        }
        Some(Commands::Status) => ui::render_session(store, now),
        Some(Commands::Log {
            start,
            end,
            notes,
            project,
        }) => {
            let project_id = resolve_project_or_current(store, project.as_deref())?;
            let recorded = record_manual_entry(
                store,
                ManualEntryParameters {
                    project_id,
                    start_time: parse_timestamp(&start, &tz)?,
                    end_time: parse_timestamp(&end, &tz)?,
                    notes,
                },
            )?;
            storage.save(store)?;
            println!(
                "Logged {} on {} ({:.2}h total)",
                format_duration(recorded.entry.duration()).bold(),
                recorded.project.name,
                recorded.project.time_spent()
            );
        }
        Some(Commands::Entry(EntryCommands::Edit {
            id,
            start,
            end,
            notes,
        })) => {
            let entry_id = resolve_entry(store, &id)?;
            let recorded = update_entry(
                store,
                entry_id,
                EditEntryParameters {
                    start_time: start.as_deref().map(|s| parse_timestamp(s, &tz)).transpose()?,
                    end_time: end.as_deref().map(|s| parse_timestamp(s, &tz)).transpose()?,
                    notes,
                },
            )?;
            storage.save(store)?;
            println!(
                "Updated entry {} on {} ({:.2}h total)",
                ui::short_entry_id(&recorded.entry),
                recorded.project.name,
                recorded.project.time_spent()
            );
        }
        Some(Commands::Entries { project }) => {
            let project_id = resolve_project_or_current(store, project.as_deref())?;
            let project = store
                .get_project(project_id)
                .ok_or_else(|| CliError::ProjectNotFound(project_id.to_string()))?;
            let summary = entries_summary(store.entries_for_project(project_id));

            if summary.entry_count == 0 {
                println!("No time entries for {}", project.name);
            } else {
                ui::render_view_header(
                    &format!("{} ({} h)", project.name, summary.display_hours()),
                    summary.entry_count,
                    "entry",
                );
                let groups = group_entries_by_day(store.entries_for_project(project_id), &tz);
                ui::render_day_groups(&groups, &tz);
            }
        }
        Some(Commands::Insights { timeframe }) => {
            let overview = portfolio_overview(store, timeframe.into(), now, &tz);
            let trends = tag_trends(&store.projects);
            let title = format!("Insights ({:?})", timeframe);
            ui::render_overview(&title, &overview, &trends);
        }
    }

    Ok(())
}

fn run_project_command(
    command: ProjectCommands,
    store: &mut Store,
    storage: &impl Storage,
    today: Date,
) -> Result<(), CliError> {
    match command {
        ProjectCommands::New {
            name,
            budget,
            expenses,
            estimate,
            due,
            description,
            tag,
        } => {
            let due_date = due
                .parse::<Date>()
                .map_err(|e| CliError::InvalidDate(due.clone(), e.to_string()))?;
            let project = create_project(
                store,
                CreateProjectParameters {
                    name,
                    description,
                    total_budget: budget,
                    expenses,
                    estimated_time: estimate,
                    due_date,
                    tags: tag,
                },
            )?;
            storage.save(store)?;
            println!(
                "Created project {} ({} earnings)",
                project.name.bold(),
                ui::format_money(project.earnings())
            );
        }
        ProjectCommands::List => {
            let projects: Vec<_> = store.get_active_projects().collect();
            if projects.is_empty() {
                println!("No projects yet");
            } else {
                ui::render_view_header("Projects", projects.len(), "project");
                for project in projects {
                    let is_current = store.current_project_id == Some(project.id);
                    ui::render_project_line(project, is_current, today);
                }
                println!();
            }
        }
        ProjectCommands::Archived => {
            let projects: Vec<_> = store.get_archived_projects().collect();
            if projects.is_empty() {
                println!("No archived projects");
            } else {
                ui::render_view_header("Archive", projects.len(), "project");
                ui::render_archive_summary(&archive_summary(store));
                ui::render_section_header("Projects");
                for project in projects {
                    ui::render_project_line(project, false, today);
                }
                println!();
            }
        }
        ProjectCommands::View { name } => {
            let project_id = resolve_project(store, &name)?;
            let project = store
                .get_project(project_id)
                .ok_or_else(|| CliError::ProjectNotFound(name.clone()))?;
            let summary = entries_summary(store.entries_for_project(project_id));
            let is_current = store.current_project_id == Some(project_id);
            ui::render_project_details(project, &summary, is_current, today);
        }
        ProjectCommands::Select { name } => {
            let project_id = resolve_project(store, &name)?;
            let project = select_project(store, project_id)?.clone();
            storage.save(store)?;
            println!("Current project: {}", project.name.bold());
        }
        ProjectCommands::Archive { name } => {
            let project_id = resolve_project(store, &name)?;
            let project = archive_project(store, project_id)?;
            storage.save(store)?;
            println!("Archived {}", project.name.bold());
            match store.current_project() {
                Some(current) => println!("Current project: {}", current.name),
                None => println!("{}", "No active project".dimmed()),
            }
        }
        ProjectCommands::Unarchive { name } => {
            let project_id = resolve_project(store, &name)?;
            let project = unarchive_project(store, project_id)?;
            storage.save(store)?;
            println!("Restored {}", project.name.bold());
        }
        ProjectCommands::Tags { name, tag } => {
            let project_id = resolve_project(store, &name)?;
            let project = update_tags(store, project_id, tag)?.clone();
            storage.save(store)?;
            if project.tags().is_empty() {
                println!("Cleared tags on {}", project.name.bold());
            } else {
                println!(
                    "Tagged {} with {}",
                    project.name.bold(),
                    project.tags().join(", ").blue()
                );
            }
        }
    }

    Ok(())
}

/// Exact name or slug wins; otherwise a single fuzzy match
fn resolve_project(store: &Store, query: &str) -> Result<Uuid, CliError> {
    let query_slug = slugify(query);
    let matching_projects: Vec<&Project> = store.find_projects(query).collect();

    if let Some(exact) = matching_projects
        .iter()
        .find(|p| p.slug == query_slug || p.name.eq_ignore_ascii_case(query))
    {
        return Ok(exact.id);
    }

    match matching_projects.len() {
        0 => Err(CliError::ProjectNotFound(query.to_string())),
        1 => Ok(matching_projects[0].id),
        _ => {
            let names: Vec<String> = matching_projects.iter().map(|p| p.name.clone()).collect();
            Err(CliError::AmbiguousProjectName(names))
        }
    }
}

fn resolve_project_or_current(store: &Store, query: Option<&str>) -> Result<Uuid, CliError> {
    match query {
        Some(query) => resolve_project(store, query),
        None => store
            .current_project_id
            .ok_or(CliError::Core(CoreError::NoActiveProject)),
    }
}

/// Full UUID, or any unique run of its hex digits
fn resolve_entry(store: &Store, query: &str) -> Result<Uuid, CliError> {
    if let Ok(id) = query.parse::<Uuid>() {
        return Ok(id);
    }

    let needle = query.to_lowercase().replace('-', "");
    let matching: Vec<Uuid> = store
        .time_entries()
        .iter()
        .filter(|e| !needle.is_empty() && e.id.simple().to_string().contains(&needle))
        .map(|e| e.id)
        .collect();

    match matching.as_slice() {
        [] => Err(CliError::EntryNotFound(query.to_string())),
        [id] => Ok(*id),
        _ => Err(CliError::AmbiguousEntryId(query.to_string())),
    }
}

/// RFC 3339 timestamp, or a civil date-time in the system time zone
fn parse_timestamp(input: &str, tz: &TimeZone) -> Result<Timestamp, CliError> {
    if let Ok(timestamp) = input.parse::<Timestamp>() {
        return Ok(timestamp);
    }

    input
        .parse::<DateTime>()
        .and_then(|dt| dt.to_zoned(tz.clone()))
        .map(|zoned| zoned.timestamp())
        .map_err(|e| CliError::InvalidDateTime(input.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[&str]) -> Store {
        let mut store = Store::default();
        for name in names {
            create_project(
                &mut store,
                CreateProjectParameters {
                    name: name.to_string(),
                    description: None,
                    total_budget: 100.0,
                    expenses: 0.0,
                    estimated_time: 1.0,
                    due_date: jiff::civil::date(2024, 1, 1),
                    tags: vec![],
                },
            )
            .unwrap();
        }
        store
    }

    #[test]
    fn test_resolve_project_exact_name_beats_fuzzy() {
        let store = store_with(&["Miller", "Miller Wedding"]);

        let id = resolve_project(&store, "miller").unwrap();

        assert_eq!(store.get_project(id).unwrap().name, "Miller");
    }

    #[test]
    fn test_resolve_project_ambiguous() {
        let store = store_with(&["Bloom Coffee", "Bloom Bakery"]);

        assert!(matches!(
            resolve_project(&store, "bloom"),
            Err(CliError::AmbiguousProjectName(names)) if names.len() == 2
        ));
    }

    #[test]
    fn test_parse_timestamp_accepts_civil_and_rfc3339() {
        let tz = TimeZone::UTC;

        assert_eq!(
            parse_timestamp("2024-01-01T10:00", &tz).unwrap(),
            "2024-01-01T10:00:00Z".parse::<Timestamp>().unwrap()
        );
        assert_eq!(
            parse_timestamp("2024-01-01T10:00:00+02:00", &tz).unwrap(),
            "2024-01-01T08:00:00Z".parse::<Timestamp>().unwrap()
        );
        assert!(parse_timestamp("yesterday-ish", &tz).is_err());
    }
}
