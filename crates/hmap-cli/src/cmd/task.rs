use super::{parse_optional_date, parse_optional_text, Workspace};
use crate::output::{or_dash, print_json, print_table, truncate};
use clap::Subcommand;
use hmap_core::{
    cascade::CascadeOutcome,
    task::{self as task_ops, Task, TaskUpdate},
    types::TaskStatus,
    views,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// List imported tasks
    List {
        project: String,
        /// Only tasks in this status
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Show full details for a single task
    Show { project: String, task_id: String },
    /// Edit task fields; pass `none` to clear an optional field
    Edit {
        project: String,
        task_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        actual_end: Option<String>,
        /// Hours spent
        #[arg(long)]
        actual_time: Option<f64>,
        #[arg(long)]
        actual_cost: Option<f64>,
        #[arg(long)]
        sprint: Option<String>,
        #[arg(long)]
        subcontracted: Option<bool>,
        /// Dependencies as comma-separated IDs (e.g. T1,T2)
        #[arg(long)]
        depends: Option<String>,
    },
    /// Move a task to todo, in_progress, review or done
    Status {
        project: String,
        task_id: String,
        status: TaskStatus,
    },
}

pub fn run(root: &Path, subcmd: TaskSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        TaskSubcommand::List { project, status } => list(&ws, &project, status, json),
        TaskSubcommand::Show { project, task_id } => show(&ws, &project, &task_id, json),
        TaskSubcommand::Edit {
            project,
            task_id,
            name,
            role,
            start,
            end,
            actual_end,
            actual_time,
            actual_cost,
            sprint,
            subcontracted,
            depends,
        } => {
            let update = TaskUpdate {
                name,
                role: role.as_deref().map(parse_optional_text),
                start_date: start
                    .as_deref()
                    .map(|s| parse_optional_date("start", s))
                    .transpose()?,
                end_date: end
                    .as_deref()
                    .map(|s| parse_optional_date("end", s))
                    .transpose()?,
                actual_end_date: actual_end
                    .as_deref()
                    .map(|s| parse_optional_date("actual end", s))
                    .transpose()?,
                actual_time: actual_time.map(Some),
                actual_cost: actual_cost.map(Some),
                sprint_id: sprint.as_deref().map(parse_optional_text),
                is_subcontracted: subcontracted,
                depends_on: depends.map(|d| {
                    d.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
                        .collect()
                }),
            };
            edit(&ws, &project, &task_id, update, json)
        }
        TaskSubcommand::Status {
            project,
            task_id,
            status,
        } => set_status(&ws, &project, &task_id, status, json),
    }
}

pub fn task_rows(tasks: &[&Task]) -> Vec<Vec<String>> {
    tasks
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                truncate(&t.name, 36),
                t.status.to_string(),
                or_dash(t.role.as_deref()),
                or_dash(t.start_date),
                or_dash(t.end_date),
                or_dash(t.sprint_id.as_deref()),
                if t.depends_on.is_empty() {
                    "-".to_string()
                } else {
                    t.depends_on.join(",")
                },
            ]
        })
        .collect()
}

pub const TASK_HEADERS: &[&str] = &["ID", "TASK", "STATUS", "ROLE", "START", "END", "SPRINT", "DEPENDS"];

fn list(ws: &Workspace, id: &str, status: Option<TaskStatus>, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let tasks: Vec<&Task> = views::task_list(&project.tasks)
        .into_iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .collect();

    if json {
        return print_json(&tasks);
    }
    if tasks.is_empty() {
        println!("No tasks. Import them with: hmap plan import {id}");
        return Ok(());
    }
    print_table(TASK_HEADERS, task_rows(&tasks));
    Ok(())
}

fn show(ws: &Workspace, id: &str, task_id: &str, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let t = task_ops::find(&project.tasks, task_id)?;

    if json {
        return print_json(t);
    }

    println!("[{}] {}", t.id, t.name);
    println!("  status:        {}", t.status);
    println!("  role:          {}", or_dash(t.role.as_deref()));
    println!("  start:         {}", or_dash(t.start_date));
    println!("  end:           {}", or_dash(t.end_date));
    println!("  planned days:  {}", or_dash(t.planned_days()));
    println!("  actual end:    {}", or_dash(t.actual_end_date));
    println!("  actual time:   {}", or_dash(t.actual_time));
    println!("  actual cost:   {}", or_dash(t.actual_cost));
    println!("  sprint:        {}", or_dash(t.sprint_id.as_deref()));
    println!("  subcontracted: {}", t.is_subcontracted);
    if !t.depends_on.is_empty() {
        println!("  depends on:    {}", t.depends_on.join(", "));
    }
    Ok(())
}

fn edit(ws: &Workspace, id: &str, task_id: &str, update: TaskUpdate, json: bool) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    project.update_task(task_id, update)?;
    ws.save(&project)?;

    if json {
        print_json(task_ops::find(&project.tasks, task_id)?)?;
    } else {
        println!("Updated task [{task_id}]");
    }
    Ok(())
}

fn print_outcome(outcome: &CascadeOutcome) {
    if !outcome.unblocked.is_empty() {
        println!("  ready now: {}", outcome.unblocked.join(", "));
    }
    if !outcome.queued.is_empty() {
        println!("  notifications queued: {}", outcome.queued.len());
    }
    if !outcome.unassigned.is_empty() {
        println!("  no one assigned for: {}", outcome.unassigned.join(", "));
    }
}

fn set_status(
    ws: &Workspace,
    id: &str,
    task_id: &str,
    status: TaskStatus,
    json: bool,
) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    let outcome = project.set_task_status(task_id, status)?;
    ws.save(&project)?;

    if json {
        print_json(&serde_json::json!({
            "task_id": task_id,
            "status": status,
            "cascade": outcome,
        }))?;
    } else {
        println!("Task [{task_id}] is now {status}");
        print_outcome(&outcome);
        if !outcome.queued.is_empty() {
            println!("Review with: hmap notify next {id}");
        }
    }
    Ok(())
}
