//! Read-only summaries derived from the store. Nothing here is cached;
//! every call recomputes from the current projects and entries.

use std::collections::{BTreeMap, HashSet};

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use uuid::Uuid;

use crate::{
    models::{
        project::{EfficiencyStatus, Project},
        store::Store,
        time_entry::TimeEntry,
    },
    services::efficiency::adjust_for_schedule,
};

/// Earnings per tracked hour, 0 until time has been tracked
pub fn hourly_rate(project: &Project) -> f64 {
    if project.time_spent() > 0.0 {
        project.earnings() / project.time_spent()
    } else {
        0.0
    }
}

/// Share of the estimate used so far. Exceeds 100 on overrun.
pub fn progress_percentage(project: &Project) -> f64 {
    if project.estimated_time() > 0.0 {
        project.time_spent() / project.estimated_time() * 100.0
    } else {
        0.0
    }
}

/// `progress_percentage` clamped for drawing a bar
pub fn progress_bar_width(project: &Project) -> f64 {
    progress_percentage(project).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMetrics {
    pub hourly_rate: f64,
    pub progress_percentage: f64,
    pub progress_bar_width: f64,
    /// Stored status adjusted for the due date
    pub status: EfficiencyStatus,
}

pub fn project_metrics(project: &Project, today: Date) -> ProjectMetrics {
    ProjectMetrics {
        hourly_rate: hourly_rate(project),
        progress_percentage: progress_percentage(project),
        progress_bar_width: progress_bar_width(project),
        status: adjust_for_schedule(
            project.status(),
            project.due_date,
            today,
            project.is_active(),
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSummary {
    pub project_count: usize,
    pub total_earnings: f64,
    pub total_hours: f64,
    pub average_hourly_rate: f64,
}

pub fn archive_summary(store: &Store) -> ArchiveSummary {
    let mut summary = ArchiveSummary {
        project_count: 0,
        total_earnings: 0.0,
        total_hours: 0.0,
        average_hourly_rate: 0.0,
    };

    for project in store.get_archived_projects() {
        summary.project_count += 1;
        summary.total_earnings += project.earnings();
        summary.total_hours += project.time_spent();
    }

    if summary.total_hours > 0.0 {
        summary.average_hourly_rate = summary.total_earnings / summary.total_hours;
    }

    summary
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagTrend {
    pub tag: String,
    pub average_hourly_rate: f64,
    pub project_count: usize,
}

/// Average hourly rate per tag, in the order tags are first seen. Projects
/// without tracked time have no rate yet and are left out.
pub fn tag_trends<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Vec<TagTrend> {
    let mut order: Vec<&str> = vec![];
    let mut rates: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for project in projects.into_iter().filter(|p| p.time_spent() > 0.0) {
        let rate = hourly_rate(project);
        for tag in project.tags() {
            let tag = tag.as_str();
            if !rates.contains_key(tag) {
                order.push(tag);
            }
            rates.entry(tag).or_default().push(rate);
        }
    }

    order
        .into_iter()
        .map(|tag| {
            let group = &rates[tag];
            TagTrend {
                tag: tag.to_string(),
                average_hourly_rate: group.iter().sum::<f64>() / group.len() as f64,
                project_count: group.len(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntriesSummary {
    pub entry_count: usize,
    /// Seconds
    pub total_duration: u64,
    pub total_hours: f64,
}

impl EntriesSummary {
    pub fn display_hours(&self) -> String {
        format!("{:.1}", self.total_hours)
    }
}

pub fn entries_summary<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> EntriesSummary {
    let (entry_count, total_duration) = entries
        .into_iter()
        .fold((0, 0), |(count, total), e| (count + 1, total + e.duration));

    EntriesSummary {
        entry_count,
        total_duration,
        total_hours: total_duration as f64 / 3600.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<'a> {
    pub date: Date,
    pub entries: Vec<&'a TimeEntry>,
}

/// Group entries by the calendar day they started on in `tz`.
///
/// Days are returned most recent first; entries keep their input order.
pub fn group_entries_by_day<'a>(
    entries: impl IntoIterator<Item = &'a TimeEntry>,
    tz: &TimeZone,
) -> Vec<DayGroup<'a>> {
    let mut days: BTreeMap<Date, Vec<&'a TimeEntry>> = BTreeMap::new();
    for entry in entries {
        let date = entry.start_time.to_zoned(tz.clone()).date();
        days.entry(date).or_default().push(entry);
    }

    days.into_iter()
        .rev()
        .map(|(date, entries)| DayGroup { date, entries })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Day,
    Week,
    Month,
    Year,
    Total,
}

impl Timeframe {
    /// Whether `date` falls in the same calendar period as `today`
    pub fn contains(&self, date: Date, today: Date) -> bool {
        match self {
            Timeframe::Day => date == today,
            Timeframe::Week => {
                let (a, b) = (date.iso_week_date(), today.iso_week_date());
                a.year() == b.year() && a.week() == b.week()
            }
            Timeframe::Month => date.year() == today.year() && date.month() == today.month(),
            Timeframe::Year => date.year() == today.year(),
            Timeframe::Total => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatedProject {
    pub project_id: Uuid,
    pub name: String,
    pub hourly_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioOverview {
    pub hours_worked: f64,
    pub gross_earned: f64,
    pub net_earned: f64,
    pub average_hourly_rate: f64,
    pub best_project: Option<RatedProject>,
    pub worst_project: Option<RatedProject>,
}

/// Headline numbers across every project with work inside `timeframe`.
///
/// Hours come from the entries inside the period; money and rates come from
/// the projects those entries belong to. `Total` covers every project.
pub fn portfolio_overview(
    store: &Store,
    timeframe: Timeframe,
    now: Timestamp,
    tz: &TimeZone,
) -> PortfolioOverview {
    let today = now.to_zoned(tz.clone()).date();

    let mut seconds: u64 = 0;
    let mut touched: HashSet<Uuid> = HashSet::new();
    for entry in &store.time_entries {
        let date = entry.start_time.to_zoned(tz.clone()).date();
        if timeframe.contains(date, today) {
            seconds += entry.duration;
            touched.insert(entry.project_id);
        }
    }

    let projects: Vec<&Project> = store
        .projects
        .iter()
        .filter(|p| timeframe == Timeframe::Total || touched.contains(&p.id))
        .collect();

    let gross_earned: f64 = projects.iter().map(|p| p.total_budget()).sum();
    let net_earned: f64 = projects.iter().map(|p| p.earnings()).sum();
    let project_hours: f64 = projects.iter().map(|p| p.time_spent()).sum();

    let mut rated: Vec<RatedProject> = projects
        .iter()
        .filter(|p| p.time_spent() > 0.0)
        .map(|p| RatedProject {
            project_id: p.id,
            name: p.name.clone(),
            hourly_rate: hourly_rate(p),
        })
        .collect();
    rated.sort_by(|a, b| b.hourly_rate.total_cmp(&a.hourly_rate));

    PortfolioOverview {
        hours_worked: seconds as f64 / 3600.0,
        gross_earned,
        net_earned,
        average_hourly_rate: if project_hours > 0.0 {
            net_earned / project_hours
        } else {
            0.0
        },
        worst_project: if rated.len() > 1 { rated.last().cloned() } else { None },
        best_project: rated.into_iter().next(),
    }
}

/// `1h 2m 3s`, `2m 3s` or `3s`
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
