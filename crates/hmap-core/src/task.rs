use crate::error::{HmapError, Result};
use crate::types::TaskStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_end_date: Option<NaiveDate>,
    /// Hours actually spent.
    #[serde(default)]
    pub actual_time: Option<f64>,
    #[serde(default)]
    pub actual_cost: Option<f64>,
    #[serde(default)]
    pub sprint_id: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub is_subcontracted: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: None,
            start_date: None,
            end_date: None,
            actual_end_date: None,
            actual_time: None,
            actual_cost: None,
            sprint_id: None,
            status: TaskStatus::Todo,
            is_subcontracted: false,
            depends_on: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Inclusive planned duration in days, when both dates are known.
    pub fn planned_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(s), Some(e)) if e >= s => Some((e - s).num_days() + 1),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Field edits
// ---------------------------------------------------------------------------

/// A partial edit. `None` leaves the field untouched. Status changes go
/// through `Project::set_task_status` so the completion cascade runs.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub role: Option<Option<String>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub actual_end_date: Option<Option<NaiveDate>>,
    pub actual_time: Option<Option<f64>>,
    pub actual_cost: Option<Option<f64>>,
    pub sprint_id: Option<Option<String>>,
    pub is_subcontracted: Option<bool>,
    pub depends_on: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn apply(self, task: &mut Task) {
        if let Some(v) = self.name {
            task.name = v;
        }
        if let Some(v) = self.role {
            task.role = v;
        }
        if let Some(v) = self.start_date {
            task.start_date = v;
        }
        if let Some(v) = self.end_date {
            task.end_date = v;
        }
        if let Some(v) = self.actual_end_date {
            task.actual_end_date = v;
        }
        if let Some(v) = self.actual_time {
            task.actual_time = v;
        }
        if let Some(v) = self.actual_cost {
            task.actual_cost = v;
        }
        if let Some(v) = self.sprint_id {
            task.sprint_id = v;
        }
        if let Some(v) = self.is_subcontracted {
            task.is_subcontracted = v;
        }
        if let Some(v) = self.depends_on {
            task.depends_on = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Task list operations (operate on a slice of tasks)
// ---------------------------------------------------------------------------

pub fn find<'a>(tasks: &'a [Task], id: &str) -> Result<&'a Task> {
    tasks
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| HmapError::TaskNotFound(id.to_string()))
}

pub fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Result<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| HmapError::TaskNotFound(id.to_string()))
}

pub fn update_task(tasks: &mut [Task], id: &str, update: TaskUpdate) -> Result<()> {
    let task = find_mut(tasks, id)?;
    update.apply(task);
    Ok(())
}

/// Open tasks whose dependencies are all done, in list order.
pub fn ready_tasks(tasks: &[Task]) -> Vec<&Task> {
    let done: HashSet<&str> = tasks
        .iter()
        .filter(|t| t.is_done())
        .map(|t| t.id.as_str())
        .collect();

    tasks
        .iter()
        .filter(|t| !t.is_done() && t.depends_on.iter().all(|d| done.contains(d.as_str())))
        .collect()
}

/// Human-readable summary: "3/5 done, 1 in progress, 1 in review"
pub fn summarize(tasks: &[Task]) -> String {
    let count = |s: TaskStatus| tasks.iter().filter(|t| t.status == s).count();
    format!(
        "{}/{} done, {} in progress, {} in review",
        count(TaskStatus::Done),
        tasks.len(),
        count(TaskStatus::InProgress),
        count(TaskStatus::Review)
    )
}

/// Lenient date parsing for AI-authored table cells.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let t = text.trim().trim_matches('*').trim();
    if t.is_empty() {
        return None;
    }
    ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(t, fmt).ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
