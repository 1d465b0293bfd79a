use colored::*;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};

use truerate::{
    models::{
        project::{EfficiencyStatus, Project},
        session::Session,
        store::Store,
        time_entry::TimeEntry,
        user::User,
    },
    services::reporting::{
        ArchiveSummary, DayGroup, EntriesSummary, PortfolioOverview, TagTrend, format_duration,
        project_metrics,
    },
};

const PROGRESS_BAR_CELLS: usize = 20;

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Colored badge matching the efficiency status
pub fn status_badge(status: EfficiencyStatus) -> ColoredString {
    let label = format!("[{}]", status);
    match status {
        EfficiencyStatus::Behind => label.red(),
        EfficiencyStatus::Slow => label.yellow(),
        EfficiencyStatus::OnTrack => label.green(),
        EfficiencyStatus::Ahead => label.green().bold(),
    }
}

pub fn format_money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.0}", amount.abs())
    } else {
        format!("${:.0}", amount)
    }
}

/// Bar of fixed width; `width_percent` is expected in [0, 100]
pub fn progress_bar(width_percent: f64, status: EfficiencyStatus) -> String {
    let filled = ((width_percent / 100.0) * PROGRESS_BAR_CELLS as f64).round() as usize;
    let filled = filled.min(PROGRESS_BAR_CELLS);
    let bar = "█".repeat(filled);
    let rest = "░".repeat(PROGRESS_BAR_CELLS - filled);
    let bar = match status {
        EfficiencyStatus::Behind => bar.red(),
        EfficiencyStatus::Slow => bar.yellow(),
        _ => bar.green(),
    };
    format!("{}{}", bar, rest.dimmed())
}

/// Print `left` and `right` on one line, right-aligned when there is room
fn print_aligned(styled_left: ColoredString, left_visible_len: usize, right: &str) {
    let terminal_width = get_terminal_width();
    let right_visible_len = right.chars().count();
    let total_content = left_visible_len + right_visible_len;

    if !right.is_empty() && total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!("{}{}{}", styled_left, " ".repeat(padding), right.dimmed());
    } else if !right.is_empty() {
        println!("{}  {}", styled_left, right.dimmed());
    } else {
        println!("{}", styled_left);
    }
}

/// One line per project: marker, name, badge and rate on the right
pub fn render_project_line(project: &Project, is_current: bool, today: Date) {
    let metrics = project_metrics(project, today);
    let marker = if is_current { "▶" } else { " " };
    let left = format!("  {}  {}", marker, project.name);
    let styled_left = if project.is_archived() {
        left.dimmed()
    } else {
        left.bold()
    };

    let right = format!(
        "{}/hr  ·  {:.2}/{}h  ·  {}",
        format_money(metrics.hourly_rate),
        project.time_spent(),
        project.estimated_time(),
        metrics.status
    );
    let left_visible_len = left.chars().count();

    print_aligned(styled_left, left_visible_len, &right);
}

pub fn render_project_details(
    project: &Project,
    summary: &EntriesSummary,
    is_current: bool,
    today: Date,
) {
    let metrics = project_metrics(project, today);

    println!(
        "\n  {} {}{}\n",
        project.name.cyan().bold(),
        status_badge(metrics.status),
        if is_current { "  (current)".dimmed() } else { "".normal() }
    );
    if let Some(description) = &project.description {
        println!("  {}\n", description);
    }
    if !project.tags().is_empty() {
        println!("  {}\n", project.tags().join(", ").blue());
    }

    println!(
        "  {}  {:.0}%",
        progress_bar(metrics.progress_bar_width, metrics.status),
        metrics.progress_percentage
    );
    println!(
        "  {:.2}h of {}h estimated  ·  due {}\n",
        project.time_spent(),
        project.estimated_time(),
        project.due_date.strftime("%b %d, %Y")
    );

    println!("  {:<16}{}", "Budget", format_money(project.total_budget()));
    println!("  {:<16}{}", "Expenses", format_money(project.expenses()));
    println!("  {:<16}{}", "Earnings", format_money(project.earnings()));
    println!(
        "  {:<16}{}/hr",
        "Hourly rate",
        format_money(metrics.hourly_rate)
    );
    println!(
        "  {:<16}{} ({} h)",
        "Time entries",
        summary.entry_count,
        summary.display_hours()
    );
    if project.is_archived() {
        println!("\n  {}", "Archived".dimmed());
    }
    println!();
}

pub fn render_entry_line(entry: &TimeEntry, tz: &TimeZone) {
    let start = entry.start_time().to_zoned(tz.clone());
    let end = entry.end_time().to_zoned(tz.clone());
    let short_id = short_entry_id(entry);

    let left = format!(
        "    {} – {}  {}",
        start.strftime("%H:%M"),
        end.strftime("%H:%M"),
        format_duration(entry.duration())
    );
    let left_visible_len = left.chars().count();
    let right = match entry.notes() {
        Some(notes) => format!("{}  ·  {}", notes, short_id),
        None => short_id,
    };

    print_aligned(left.normal(), left_visible_len, &right);
}

/// Last 8 hex digits; the leading ones of a v7 id are the creation time
pub fn short_entry_id(entry: &TimeEntry) -> String {
    let simple = entry.id.simple().to_string();
    simple[simple.len() - 8..].to_string()
}

pub fn render_day_groups(groups: &[DayGroup<'_>], tz: &TimeZone) {
    for group in groups {
        render_section_header(&format_date_header(group.date));
        for entry in &group.entries {
            render_entry_line(entry, tz);
        }
    }
    println!();
}

pub fn render_archive_summary(summary: &ArchiveSummary) {
    println!(
        "  {:<20}{}",
        "Total earnings",
        format_money(summary.total_earnings)
    );
    println!("  {:<20}{:.1}h", "Total hours", summary.total_hours);
    println!(
        "  {:<20}{}/hr",
        "Average hourly rate",
        format_money(summary.average_hourly_rate)
    );
}

pub fn render_overview(title: &str, overview: &PortfolioOverview, trends: &[TagTrend]) {
    println!("\n  {}\n", title.cyan().bold());
    println!("  {:<20}{:.1} hrs", "Hours worked", overview.hours_worked);
    println!("  {:<20}{}", "Gross earned", format_money(overview.gross_earned));
    println!("  {:<20}{}", "Net earned", format_money(overview.net_earned));
    println!(
        "  {:<20}{}/hr",
        "Avg hourly rate",
        format_money(overview.average_hourly_rate)
    );

    if let Some(best) = &overview.best_project {
        println!(
            "\n  {} {} ({}/hr)",
            "Best:".green(),
            best.name,
            format_money(best.hourly_rate)
        );
    }
    if let Some(worst) = &overview.worst_project {
        println!(
            "  {} {} ({}/hr)",
            "Needs attention:".yellow(),
            worst.name,
            format_money(worst.hourly_rate)
        );
    }

    if !trends.is_empty() {
        render_section_header("Average hourly rate by project type");
        for trend in trends {
            let projects = if trend.project_count == 1 {
                "project"
            } else {
                "projects"
            };
            println!(
                "  {:<20}{}/hr  ({} {})",
                trend.tag,
                format_money(trend.average_hourly_rate),
                trend.project_count,
                projects
            );
        }
    }
    println!();
}

pub fn render_session(store: &Store, now: Timestamp) {
    match &store.session {
        Session::Idle => println!("Timer is idle"),
        Session::Running { project_id, .. } => {
            let name = store
                .get_project(*project_id)
                .map(|p| p.name.as_str())
                .unwrap_or("unknown project");
            println!(
                "{} {} on {}",
                "●".red(),
                format_duration(store.session.elapsed_since(now)).bold(),
                name
            );
        }
        Session::Stopped {
            completed_duration, ..
        } => println!(
            "Timer stopped at {}, waiting to be saved (run `stop` again or `cancel`)",
            format_duration(*completed_duration)
        ),
    }
}

pub fn render_profile(user: &User) {
    let on_off = |enabled: bool| if enabled { "on".green() } else { "off".dimmed() };

    println!("\n  {}", user.name.cyan().bold());
    println!("  {}", user.email);
    println!("  {}\n", user.industry.dimmed());
    let prefs = &user.notification_preferences;
    println!("  {:<20}{}", "Project reminders", on_off(prefs.project_reminders));
    println!("  {:<20}{}", "Weekly reports", on_off(prefs.weekly_reports));
    println!("  {:<20}{}\n", "Insights", on_off(prefs.insights));
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize, noun: &str) {
    let noun = if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, noun);
}

/// Render a section header (e.g., "Today", "Monday, Feb 17")
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}

/// Format a date as a human-readable header (e.g., "Today", "Monday, Feb 17")
pub fn format_date_header(date: Date) -> String {
    let today = Zoned::now().date();

    if date == today {
        "Today".to_string()
    } else if today.yesterday().ok() == Some(date) {
        "Yesterday".to_string()
    } else {
        date.strftime("%A, %b %d, %Y").to_string()
    }
}
