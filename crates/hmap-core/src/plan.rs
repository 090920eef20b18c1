//! Turns the tables in the approved plan documents into tasks and milestones.
//!
//! The AI only knows task names, so dependencies arrive as names and are
//! resolved to ids here. Names that resolve to nothing, and tasks that list
//! themselves, are dropped and reported as [`DependencyIssue`]s.

use crate::markdown::{self, field, ParseOutcome, Record};
use crate::milestone::Milestone;
use crate::sprint::{self, Sprint};
use crate::task::{self, Task};
use crate::types::{MilestoneHealth, ProjectScope};
use serde::Serialize;
use std::collections::HashMap;

const NAME_KEYS: &[&str] = &["task_name", "task", "name", "activity", "work_item"];
const ROLE_KEYS: &[&str] = &["role", "assigned_role", "responsible", "owner", "resource"];
const START_KEYS: &[&str] = &["start_date", "start"];
const END_KEYS: &[&str] = &["end_date", "end", "due_date", "finish"];
const DEPENDENCY_KEYS: &[&str] = &["dependencies", "depends_on", "dependency", "predecessors"];
const SUBCONTRACTED_KEYS: &[&str] = &["subcontracted", "is_subcontracted"];

const MILESTONE_NAME_KEYS: &[&str] = &["milestone", "milestone_name", "name"];
const MILESTONE_DATE_KEYS: &[&str] = &["date", "target_date", "due_date"];
const MILESTONE_DEPENDENCY_KEYS: &[&str] = &["dependency", "dependencies", "depends_on"];
const MILESTONE_HEALTH_KEYS: &[&str] = &["health", "status"];

/// Cell values that mean "no dependency".
const NO_DEPENDENCY: &[&str] = &["none", "n/a", "na", "-", "\u{2014}", "\u{2013}"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyIssue {
    /// The dependency name matched no task in the plan.
    Unknown {
        task_id: String,
        task: String,
        dependency: String,
    },
    /// The task lists itself as a dependency.
    SelfReference { task_id: String, task: String },
}

pub struct PlanContext<'a> {
    pub sprints: &'a [Sprint],
    pub scope: ProjectScope,
    /// Highest task number already used by the project. New ids continue
    /// from here so a re-import never reuses an id.
    pub last_task_seq: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PlanTasks {
    pub tasks: Vec<Task>,
    pub issues: Vec<DependencyIssue>,
    /// Rows skipped because no name column had a value.
    pub unnamed_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub tasks_table_found: bool,
    pub milestones_table_found: bool,
    pub tasks: usize,
    pub milestones: usize,
    /// Rows dropped for a cell-count mismatch or a missing name.
    pub skipped_rows: usize,
    pub issues: Vec<DependencyIssue>,
    /// False when existing tasks were kept and nothing was imported.
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedPlan {
    pub tasks: Vec<Task>,
    pub milestones: Vec<Milestone>,
    pub report: ImportReport,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "x" | "✓" => Some(true),
        "no" | "n" | "false" => Some(false),
        _ => None,
    }
}

fn dependency_names(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty() && !NO_DEPENDENCY.iter().any(|x| n.eq_ignore_ascii_case(x)))
}

/// Build tasks from table rows, assigning ids in row order after
/// `ctx.last_task_seq` and resolving dependency names to those ids.
pub fn build_tasks(records: &[Record], ctx: &PlanContext) -> PlanTasks {
    let mut out = PlanTasks::default();
    let mut rows: Vec<(&Record, usize)> = Vec::with_capacity(records.len());

    for record in records {
        let Some(name) = field(record, NAME_KEYS) else {
            out.unnamed_rows += 1;
            continue;
        };
        let id = format!("T{}", ctx.last_task_seq + out.tasks.len() + 1);
        let mut t = Task::new(id, name.replace("**", "").trim());
        t.role = field(record, ROLE_KEYS)
            .filter(|r| !NO_DEPENDENCY.contains(r))
            .map(str::to_string);
        t.start_date = field(record, START_KEYS).and_then(task::parse_date);
        t.end_date = field(record, END_KEYS).and_then(task::parse_date);
        t.is_subcontracted = field(record, SUBCONTRACTED_KEYS)
            .and_then(parse_flag)
            .unwrap_or(ctx.scope == ProjectScope::Subcontracted);
        t.sprint_id = t
            .start_date
            .and_then(|d| sprint::sprint_for(ctx.sprints, d))
            .map(|s| s.id.clone());
        rows.push((record, out.tasks.len()));
        out.tasks.push(t);
    }

    // First occurrence wins for duplicate names.
    let mut exact: HashMap<&str, String> = HashMap::new();
    let mut folded: HashMap<String, String> = HashMap::new();
    for t in &out.tasks {
        exact.entry(t.name.as_str()).or_insert_with(|| t.id.clone());
        folded
            .entry(t.name.to_lowercase())
            .or_insert_with(|| t.id.clone());
    }

    let mut resolved: Vec<Vec<String>> = vec![Vec::new(); out.tasks.len()];
    for (record, idx) in &rows {
        let task = &out.tasks[*idx];
        let Some(cell) = field(record, DEPENDENCY_KEYS) else {
            continue;
        };
        for dep in dependency_names(cell) {
            let dep = dep.replace("**", "");
            let dep = dep.trim();
            let target = exact
                .get(dep)
                .or_else(|| folded.get(&dep.to_lowercase()))
                .cloned();
            match target {
                Some(id) if id == task.id => {
                    tracing::debug!(task = %task.name, "dropping self dependency");
                    out.issues.push(DependencyIssue::SelfReference {
                        task_id: task.id.clone(),
                        task: task.name.clone(),
                    });
                }
                Some(id) => {
                    if !resolved[*idx].contains(&id) {
                        resolved[*idx].push(id);
                    }
                }
                None => {
                    tracing::debug!(task = %task.name, dependency = dep, "unknown dependency");
                    out.issues.push(DependencyIssue::Unknown {
                        task_id: task.id.clone(),
                        task: task.name.clone(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }
    }

    for (task, deps) in out.tasks.iter_mut().zip(resolved) {
        task.depends_on = deps;
    }
    out
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

pub fn build_milestones(records: &[Record]) -> Vec<Milestone> {
    records
        .iter()
        .filter_map(|r| {
            let name = field(r, MILESTONE_NAME_KEYS)?;
            Some((r, name.replace("**", "").trim().to_string()))
        })
        .enumerate()
        .map(|(i, (r, name))| {
            let mut m = Milestone::new(format!("M{}", i + 1), name);
            m.date = field(r, MILESTONE_DATE_KEYS).and_then(task::parse_date);
            m.dependency = field(r, MILESTONE_DEPENDENCY_KEYS)
                .filter(|d| !NO_DEPENDENCY.iter().any(|x| d.eq_ignore_ascii_case(x)))
                .map(str::to_string);
            m.health = field(r, MILESTONE_HEALTH_KEYS)
                .and_then(MilestoneHealth::parse_loose)
                .unwrap_or_default();
            m
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Whole plan
// ---------------------------------------------------------------------------

/// Parse tasks (from the `Tasks` section, else `WBS`) and milestones from
/// the combined plan text.
pub fn parse_plan(text: &str, ctx: &PlanContext) -> ParsedPlan {
    let mut task_table = markdown::parse_section_table(text, "tasks");
    if !task_table.found() {
        task_table = markdown::parse_section_table(text, "wbs");
    }
    let milestone_table = markdown::parse_section_table(text, "milestones");

    let plan_tasks = build_tasks(task_table.records(), ctx);
    let milestones = build_milestones(milestone_table.records());
    let unnamed_milestones = milestone_table.records().len() - milestones.len();

    let report = ImportReport {
        tasks_table_found: task_table.found(),
        milestones_table_found: milestone_table.found(),
        tasks: plan_tasks.tasks.len(),
        milestones: milestones.len(),
        skipped_rows: task_table.skipped()
            + milestone_table.skipped()
            + plan_tasks.unnamed_rows
            + unnamed_milestones,
        issues: plan_tasks.issues,
        applied: true,
    };

    if matches!(task_table, ParseOutcome::NoTable) {
        tracing::warn!("plan documents contain no task table");
    }

    ParsedPlan {
        tasks: plan_tasks.tasks,
        milestones,
        report,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprint::default_sprints;
    use chrono::NaiveDate;

    fn ctx(sprints: &[Sprint]) -> PlanContext<'_> {
        PlanContext {
            sprints,
            scope: ProjectScope::Internal,
            last_task_seq: 0,
        }
    }

    fn rows(text: &str) -> Vec<Record> {
        markdown::parse_table(text).into_records()
    }

    #[test]
    fn resolves_dependency_names_to_ids() {
        let records = rows(
            "| Task | Role | Dependencies |\n|---|---|---|\n\
             | Design | Architect | None |\n\
             | Build | Developer | design |\n\
             | Test | QA | Build, Design |\n",
        );
        let plan = build_tasks(&records, &ctx(&[]));
        assert!(plan.issues.is_empty());
        assert_eq!(plan.tasks[0].id, "T1");
        assert!(plan.tasks[0].depends_on.is_empty());
        assert_eq!(plan.tasks[1].depends_on, vec!["T1"]);
        assert_eq!(plan.tasks[2].depends_on, vec!["T2", "T1"]);
    }

    #[test]
    fn unknown_and_self_references_are_reported() {
        let records = rows(
            "| Task | Dependencies |\n|---|---|\n\
             | Build | Build, Procure servers |\n",
        );
        let plan = build_tasks(&records, &ctx(&[]));
        assert!(plan.tasks[0].depends_on.is_empty());
        assert_eq!(
            plan.issues,
            vec![
                DependencyIssue::SelfReference {
                    task_id: "T1".into(),
                    task: "Build".into()
                },
                DependencyIssue::Unknown {
                    task_id: "T1".into(),
                    task: "Build".into(),
                    dependency: "Procure servers".into()
                },
            ]
        );
    }

    #[test]
    fn dates_sprints_and_scope() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let sprints = default_sprints(start, 3, 14);
        let records = rows(
            "| Task Name | Start Date | End Date | Subcontracted |\n|---|---|---|---|\n\
             | Kickoff | 2025-01-07 | 2025-01-08 | no |\n\
             | Vendor build | 2025-01-21 | 2025-02-10 | |\n",
        );
        let plan = build_tasks(
            &records,
            &PlanContext {
                sprints: &sprints,
                scope: ProjectScope::Subcontracted,
                last_task_seq: 0,
            },
        );
        assert_eq!(plan.tasks[0].sprint_id.as_deref(), Some("S1"));
        assert!(!plan.tasks[0].is_subcontracted);
        assert_eq!(plan.tasks[1].sprint_id.as_deref(), Some("S2"));
        assert!(plan.tasks[1].is_subcontracted);
        assert_eq!(plan.tasks[1].planned_days(), Some(21));
    }

    #[test]
    fn ids_continue_after_last_seq() {
        let records = rows("| Task | Dependencies |\n|---|---|\n| Design | |\n| Build | Design |\n");
        let plan = build_tasks(
            &records,
            &PlanContext {
                sprints: &[],
                scope: ProjectScope::Internal,
                last_task_seq: 4,
            },
        );
        assert_eq!(plan.tasks[0].id, "T5");
        assert_eq!(plan.tasks[1].id, "T6");
        assert_eq!(plan.tasks[1].depends_on, vec!["T5"]);
    }

    #[test]
    fn unnamed_rows_skipped() {
        let records = rows("| Task | Role |\n|---|---|\n|  | Dev |\n| Ship | Dev |\n");
        let plan = build_tasks(&records, &ctx(&[]));
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].id, "T1");
        assert_eq!(plan.unnamed_rows, 1);
    }

    #[test]
    fn milestones_from_rows() {
        let records = rows(
            "| Milestone | Target Date | Dependency | Status |\n|---|---|---|---|\n\
             | Beta | 2025-04-01 | Build | At Risk |\n\
             | Launch | TBD | - | |\n",
        );
        let ms = build_milestones(&records);
        assert_eq!(ms.len(), 2);
        assert_eq!(ms[0].id, "M1");
        assert_eq!(ms[0].health, MilestoneHealth::AtRisk);
        assert_eq!(ms[0].dependency.as_deref(), Some("Build"));
        assert_eq!(ms[1].date, None);
        assert_eq!(ms[1].dependency, None);
        assert_eq!(ms[1].health, MilestoneHealth::OnTrack);
    }

    #[test]
    fn parse_plan_falls_back_to_wbs() {
        let text = "## WBS\n| Task | Role |\n|---|---|\n| Plan | PM |\n";
        let plan = parse_plan(text, &ctx(&[]));
        assert!(plan.report.tasks_table_found);
        assert!(!plan.report.milestones_table_found);
        assert_eq!(plan.tasks.len(), 1);
    }

    #[test]
    fn parse_plan_without_tables() {
        let plan = parse_plan("The AI wrote prose only.", &ctx(&[]));
        assert!(!plan.report.tasks_table_found);
        assert_eq!(plan.report.tasks, 0);
        assert!(plan.tasks.is_empty() && plan.milestones.is_empty());
    }
}
