use super::Workspace;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use hmap_core::{
    graph,
    plan::{self as plan_ops, DependencyIssue, ImportReport},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Import tasks and milestones from Detailed Plans and Project Timeline
    Import {
        project: String,
        /// Replace tasks and milestones that were already imported
        #[arg(long)]
        force: bool,
    },
    /// Check the task graph for cycles, dangling references and date conflicts
    Check { project: String },
}

pub fn run(root: &Path, subcmd: PlanSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        PlanSubcommand::Import { project, force } => import(&ws, &project, force, json),
        PlanSubcommand::Check { project } => check(&ws, &project, json),
    }
}

fn describe(issue: &DependencyIssue) -> String {
    match issue {
        DependencyIssue::Unknown {
            task_id,
            task,
            dependency,
        } => format!("{task_id} '{task}': unknown dependency '{dependency}' dropped"),
        DependencyIssue::SelfReference { task_id, task } => {
            format!("{task_id} '{task}': depends on itself, dropped")
        }
    }
}

fn print_report(report: &ImportReport) {
    if !report.tasks_table_found {
        println!("No task table found in the plan documents.");
    }
    if !report.milestones_table_found {
        println!("No milestone table found in the plan documents.");
    }
    println!(
        "{} task(s), {} milestone(s), {} row(s) skipped",
        report.tasks, report.milestones, report.skipped_rows
    );
    for issue in &report.issues {
        println!("  warning: {}", describe(issue));
    }
}

fn import(ws: &Workspace, id: &str, force: bool, json: bool) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    let report = project.import_plan(force)?;
    if report.applied {
        ws.save(&project)?;
    }

    if json {
        return print_json(&report);
    }
    if !report.applied {
        println!(
            "Project '{id}' already has {} task(s); nothing imported. Use --force to replace them.",
            project.tasks.len()
        );
        return Ok(());
    }
    println!("Imported plan for '{id}'");
    print_report(&report);
    Ok(())
}

fn check(ws: &Workspace, id: &str, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;

    // Tasks already imported, or a dry run over the approved plan
    let (tasks, preview) = if project.tasks.is_empty() && project.plan_ready().is_ok() {
        let parsed = plan_ops::parse_plan(&project.plan_text(), &project.plan_context());
        (parsed.tasks, Some(parsed.report))
    } else {
        (project.tasks.clone(), None)
    };

    let cycles = graph::find_cycles(&tasks);
    let dangling = graph::dangling_references(&tasks);
    let conflicts = graph::schedule_conflicts(&tasks);
    let order = graph::topological_order(&tasks).ok();

    if json {
        print_json(&serde_json::json!({
            "tasks": tasks.len(),
            "preview": preview,
            "cycles": cycles,
            "dangling": dangling,
            "conflicts": conflicts,
            "order": order,
        }))?;
        return Ok(());
    }

    if let Some(report) = &preview {
        println!("Preview of the approved plan (not imported):");
        print_report(report);
        println!();
    }
    if tasks.is_empty() {
        println!("No tasks to check.");
        return Ok(());
    }

    if cycles.is_empty() && dangling.is_empty() && conflicts.is_empty() {
        println!("{} task(s): no cycles, dangling references or date conflicts", tasks.len());
    }
    for cycle in &cycles {
        println!("cycle: {}", cycle.join(" → "));
    }
    for d in &dangling {
        println!("dangling: {} depends on missing {}", d.task_id, d.missing);
    }
    if !conflicts.is_empty() {
        let rows = conflicts
            .iter()
            .map(|c| {
                vec![
                    c.task_id.clone(),
                    c.task_start.to_string(),
                    c.dependency_id.clone(),
                    c.dependency_end.to_string(),
                ]
            })
            .collect();
        print_table(&["TASK", "STARTS", "DEPENDS ON", "WHICH ENDS"], rows);
    }
    if let Some(order) = order {
        println!("order: {}", order.join(", "));
    }
    Ok(())
}
