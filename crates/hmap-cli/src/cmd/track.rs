use super::{task::{task_rows, TASK_HEADERS}, Workspace};
use crate::output::{or_dash, print_json, print_table, truncate};
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use hmap_core::{
    project::Project,
    views::{self, GanttChart, TrackingView},
};
use std::path::Path;

/// Widest Gantt bar area, in characters.
const GANTT_WIDTH: i64 = 60;

#[derive(Subcommand)]
pub enum TrackSubcommand {
    /// Show the remembered tracking view (default: gantt)
    Show { project: String },
    /// Tasks grouped by status
    Kanban { project: String },
    /// Timeline of dated tasks
    Gantt { project: String },
    /// Planned days and open tasks per role
    Workload { project: String },
    /// Milestones by date with health
    Milestones { project: String },
    /// Flat task list
    Tasks { project: String },
}

pub fn run(root: &Path, subcmd: TrackSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let (id, view) = match subcmd {
        TrackSubcommand::Show { project } => {
            let view = ws.preferences().tracking_view(&project).unwrap_or_default();
            (project, view)
        }
        TrackSubcommand::Kanban { project } => (project, TrackingView::Kanban),
        TrackSubcommand::Gantt { project } => (project, TrackingView::Gantt),
        TrackSubcommand::Workload { project } => (project, TrackingView::Workload),
        TrackSubcommand::Milestones { project } => (project, TrackingView::Milestones),
        TrackSubcommand::Tasks { project } => (project, TrackingView::List),
    };
    let project = ws.load(&id)?;
    ws.preferences().set_tracking_view(&id, view);
    render(&project, view, Utc::now().date_naive(), json)
}

pub fn render(project: &Project, view: TrackingView, today: NaiveDate, json: bool) -> anyhow::Result<()> {
    match view {
        TrackingView::Kanban => kanban(project, json),
        TrackingView::Gantt => gantt(project, json),
        TrackingView::Workload => workload(project, json),
        TrackingView::Milestones => milestones(project, today, json),
        TrackingView::List => {
            let tasks = views::task_list(&project.tasks);
            if json {
                return print_json(&tasks);
            }
            print_table(TASK_HEADERS, task_rows(&tasks));
            Ok(())
        }
    }
}

fn kanban(project: &Project, json: bool) -> anyhow::Result<()> {
    let columns = views::kanban(&project.tasks);
    if json {
        return print_json(&columns);
    }
    for col in &columns {
        println!("== {} ({}) ==", col.status, col.tasks.len());
        for t in &col.tasks {
            println!("  [{}] {}  {}", t.id, truncate(&t.name, 40), or_dash(t.role.as_deref()));
        }
    }
    Ok(())
}

/// One bar per dated task, scaled so the whole span fits `GANTT_WIDTH`.
fn bar(chart: &GanttChart, offset: Option<i64>, duration: Option<i64>) -> String {
    let (Some(start), Some(end), Some(offset), Some(duration)) =
        (chart.start, chart.end, offset, duration)
    else {
        return String::new();
    };
    let span = (end - start).num_days() + 1;
    let scale = |days: i64| days * GANTT_WIDTH / span.max(GANTT_WIDTH);
    let lead = scale(offset) as usize;
    let len = scale(duration).max(1) as usize;
    format!("{}{}", " ".repeat(lead), "█".repeat(len))
}

fn gantt(project: &Project, json: bool) -> anyhow::Result<()> {
    let chart = views::gantt(&project.tasks);
    if json {
        return print_json(&chart);
    }
    if chart.has_cycle {
        for cycle in &chart.cycles {
            println!("warning: dependency cycle {}; showing plan order", cycle.join(" → "));
        }
    }
    if let (Some(start), Some(end)) = (chart.start, chart.end) {
        println!("{start} → {end}");
    }
    let rows = chart
        .rows
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                truncate(&r.name, 28),
                r.status.to_string(),
                or_dash(r.start),
                or_dash(r.end),
                bar(&chart, r.offset_days, r.duration_days),
            ]
        })
        .collect();
    print_table(&["ID", "TASK", "STATUS", "START", "END", "TIMELINE"], rows);
    Ok(())
}

fn workload(project: &Project, json: bool) -> anyhow::Result<()> {
    let loads = views::workload(&project.tasks);
    if json {
        return print_json(&loads);
    }
    let rows = loads
        .iter()
        .map(|l| {
            let who = hmap_core::team::assignment_for(&project.team, &l.role)
                .map(|a| a.name.clone())
                .filter(|n| !n.is_empty());
            vec![
                l.role.clone(),
                or_dash(who),
                l.tasks.to_string(),
                l.open.to_string(),
                l.planned_days.to_string(),
                l.subcontracted.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ROLE", "ASSIGNEE", "TASKS", "OPEN", "DAYS", "SUBCONTRACTED"],
        rows,
    );
    Ok(())
}

pub fn milestones(project: &Project, today: NaiveDate, json: bool) -> anyhow::Result<()> {
    let rows = views::milestone_view(&project.milestones, today);
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No milestones.");
        return Ok(());
    }
    let table = rows
        .iter()
        .map(|m| {
            vec![
                m.id.clone(),
                truncate(&m.name, 36),
                or_dash(m.date),
                m.health.to_string(),
                match m.days_remaining {
                    Some(_) if m.overdue => "overdue".to_string(),
                    Some(d) => format!("{d}d"),
                    None => "-".to_string(),
                },
                or_dash(m.dependency.as_deref()),
            ]
        })
        .collect();
    print_table(&["ID", "MILESTONE", "DATE", "HEALTH", "DUE", "DEPENDS"], table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmap_core::task::Task;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn short_spans_are_not_scaled() {
        let mut a = Task::new("T1", "Design");
        a.start_date = Some(date(2025, 1, 1));
        a.end_date = Some(date(2025, 1, 3));
        let mut b = Task::new("T2", "Build");
        b.start_date = Some(date(2025, 1, 4));
        b.end_date = Some(date(2025, 1, 5));
        let chart = views::gantt(&[a, b]);
        let row = &chart.rows[1];
        assert_eq!(bar(&chart, row.offset_days, row.duration_days), "   ██");
    }

    #[test]
    fn undated_rows_have_no_bar() {
        let chart = views::gantt(&[Task::new("T1", "Design")]);
        assert_eq!(bar(&chart, None, None), "");
    }
}
