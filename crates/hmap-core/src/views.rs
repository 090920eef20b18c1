//! Tracking views derived from tasks and milestones. Nothing here is stored.

use crate::error::HmapError;
use crate::graph;
use crate::milestone::{self, Milestone};
use crate::task::Task;
use crate::types::{MilestoneHealth, TaskStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const UNASSIGNED_ROLE: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingView {
    #[default]
    Gantt,
    Kanban,
    List,
    Milestones,
    Workload,
}

impl TrackingView {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingView::Gantt => "gantt",
            TrackingView::Kanban => "kanban",
            TrackingView::List => "list",
            TrackingView::Milestones => "milestones",
            TrackingView::Workload => "workload",
        }
    }
}

impl fmt::Display for TrackingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackingView {
    type Err = HmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gantt" => Ok(TrackingView::Gantt),
            "kanban" => Ok(TrackingView::Kanban),
            "list" | "tasks" => Ok(TrackingView::List),
            "milestones" => Ok(TrackingView::Milestones),
            "workload" => Ok(TrackingView::Workload),
            _ => Err(HmapError::InvalidValue {
                field: "tracking_view",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Kanban and list
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct KanbanColumn<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

/// One column per status, in workflow order, each in list order.
pub fn kanban(tasks: &[Task]) -> Vec<KanbanColumn<'_>> {
    TaskStatus::all()
        .iter()
        .map(|&status| KanbanColumn {
            status,
            tasks: tasks.iter().filter(|t| t.status == status).collect(),
        })
        .collect()
}

/// Tasks by start date; undated tasks last in list order.
pub fn task_list(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|t| (t.start_date.is_none(), t.start_date));
    sorted
}

// ---------------------------------------------------------------------------
// Gantt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttRow {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub status: TaskStatus,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Days from the chart start to this task's start.
    pub offset_days: Option<i64>,
    pub duration_days: Option<i64>,
    pub sprint_id: Option<String>,
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttChart {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub rows: Vec<GanttRow>,
    /// Set when dependencies loop; rows are then in list order.
    pub has_cycle: bool,
    pub cycles: Vec<Vec<String>>,
}

pub fn gantt(tasks: &[Task]) -> GanttChart {
    let (order, cycles) = match graph::topological_order(tasks) {
        Ok(order) => (order, Vec::new()),
        Err(e) => {
            tracing::warn!(error = %e, "gantt falls back to list order");
            (tasks.iter().map(|t| t.id.clone()).collect(), e.cycles)
        }
    };

    let start = tasks.iter().filter_map(|t| t.start_date).min();
    let end = tasks.iter().filter_map(|t| t.end_date).max();
    let by_id: BTreeMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();

    let rows = order
        .iter()
        .filter_map(|id| by_id.get(id.as_str()))
        .map(|t| GanttRow {
            id: t.id.clone(),
            name: t.name.clone(),
            role: t.role.clone(),
            status: t.status,
            start: t.start_date,
            end: t.end_date,
            offset_days: t
                .start_date
                .zip(start)
                .map(|(s, chart)| (s - chart).num_days()),
            duration_days: t.planned_days(),
            sprint_id: t.sprint_id.clone(),
            depends_on: t.depends_on.clone(),
        })
        .collect();

    GanttChart {
        start,
        end,
        rows,
        has_cycle: !cycles.is_empty(),
        cycles,
    }
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneRow {
    pub id: String,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub health: MilestoneHealth,
    pub dependency: Option<String>,
    pub overdue: bool,
    pub days_remaining: Option<i64>,
}

pub fn milestone_view(milestones: &[Milestone], today: NaiveDate) -> Vec<MilestoneRow> {
    milestone::by_date(milestones)
        .into_iter()
        .map(|m| MilestoneRow {
            id: m.id.clone(),
            name: m.name.clone(),
            date: m.date,
            health: m.health,
            dependency: m.dependency.clone(),
            overdue: m.is_overdue(today),
            days_remaining: m.date.map(|d| (d - today).num_days()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Workload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleLoad {
    pub role: String,
    pub tasks: usize,
    pub open: usize,
    pub planned_days: i64,
    pub subcontracted: usize,
}

/// Per-role totals, roles in name order with unassigned tasks last.
pub fn workload(tasks: &[Task]) -> Vec<RoleLoad> {
    let mut by_role: BTreeMap<&str, RoleLoad> = BTreeMap::new();
    let mut unassigned = RoleLoad {
        role: UNASSIGNED_ROLE.to_string(),
        ..Default::default()
    };

    for t in tasks {
        let load = match t.role.as_deref() {
            Some(role) => by_role.entry(role).or_insert_with(|| RoleLoad {
                role: role.to_string(),
                ..Default::default()
            }),
            None => &mut unassigned,
        };
        load.tasks += 1;
        if !t.is_done() {
            load.open += 1;
        }
        load.planned_days += t.planned_days().unwrap_or(0);
        if t.is_subcontracted {
            load.subcontracted += 1;
        }
    }

    let mut out: Vec<RoleLoad> = by_role.into_values().collect();
    if unassigned.tasks > 0 {
        out.push(unassigned);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn task(id: &str, role: Option<&str>, start: Option<u32>, end: Option<u32>, deps: &[&str]) -> Task {
        let mut t = Task::new(id, format!("Task {id}"));
        t.role = role.map(str::to_string);
        t.start_date = start.map(date);
        t.end_date = end.map(date);
        t.depends_on = deps.iter().map(|d| d.to_string()).collect();
        t
    }

    #[test]
    fn kanban_has_all_columns() {
        let mut tasks = vec![task("T1", None, None, None, &[]), task("T2", None, None, None, &[])];
        tasks[1].status = TaskStatus::Review;
        let cols = kanban(&tasks);
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0].tasks.len(), 1);
        assert_eq!(cols[2].status, TaskStatus::Review);
        assert_eq!(cols[2].tasks[0].id, "T2");
        assert!(cols[3].tasks.is_empty());
    }

    #[test]
    fn list_sorts_by_start_with_undated_last() {
        let tasks = vec![
            task("T1", None, None, None, &[]),
            task("T2", None, Some(9), None, &[]),
            task("T3", None, Some(2), None, &[]),
        ];
        let ids: Vec<&str> = task_list(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T3", "T2", "T1"]);
    }

    #[test]
    fn gantt_orders_by_dependency_and_offsets() {
        let tasks = vec![
            task("T1", None, Some(10), Some(12), &["T2"]),
            task("T2", None, Some(1), Some(5), &[]),
        ];
        let chart = gantt(&tasks);
        assert!(!chart.has_cycle);
        assert_eq!(chart.start, Some(date(1)));
        assert_eq!(chart.end, Some(date(12)));
        assert_eq!(chart.rows[0].id, "T2");
        assert_eq!(chart.rows[1].offset_days, Some(9));
        assert_eq!(chart.rows[1].duration_days, Some(3));
    }

    #[test]
    fn gantt_with_cycle_falls_back_to_list_order() {
        let tasks = vec![
            task("T1", None, None, None, &["T2"]),
            task("T2", None, None, None, &["T1"]),
        ];
        let chart = gantt(&tasks);
        assert!(chart.has_cycle);
        let ids: Vec<&str> = chart.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2"]);
    }

    #[test]
    fn workload_groups_by_role() {
        let mut tasks = vec![
            task("T1", Some("Dev"), Some(1), Some(5), &[]),
            task("T2", Some("Dev"), Some(6), Some(7), &[]),
            task("T3", None, None, None, &[]),
            task("T4", Some("Architect"), None, None, &[]),
        ];
        tasks[0].status = TaskStatus::Done;
        tasks[1].is_subcontracted = true;
        let load = workload(&tasks);
        let roles: Vec<&str> = load.iter().map(|l| l.role.as_str()).collect();
        assert_eq!(roles, vec!["Architect", "Dev", UNASSIGNED_ROLE]);
        assert_eq!(load[1].tasks, 2);
        assert_eq!(load[1].open, 1);
        assert_eq!(load[1].planned_days, 7);
        assert_eq!(load[1].subcontracted, 1);
    }

    #[test]
    fn milestones_flag_overdue() {
        let mut a = Milestone::new("M1", "Beta");
        a.date = Some(date(20));
        let mut b = Milestone::new("M2", "Alpha");
        b.date = Some(date(5));
        let rows = milestone_view(&[a, b], date(10));
        assert_eq!(rows[0].id, "M2");
        assert!(rows[0].overdue);
        assert_eq!(rows[1].days_remaining, Some(10));
        assert!(!rows[1].overdue);
    }

    #[test]
    fn tracking_view_parses() {
        assert_eq!("Kanban".parse::<TrackingView>().unwrap(), TrackingView::Kanban);
        assert_eq!("tasks".parse::<TrackingView>().unwrap(), TrackingView::List);
        assert!("calendar".parse::<TrackingView>().is_err());
    }
}
