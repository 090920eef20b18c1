use super::{track, Workspace};
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use hmap_core::{
    project::{self as project_ops, NewProject, Project},
    task,
    types::{ProjectMode, ProjectScope},
    unlock::PhaseState,
    views::TrackingView,
};
use std::path::Path;

const TABS: &[&str] = &["overview", "phases", "tracking"];

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Create a project from a document template or an AI-proposed list
    Create {
        /// Project id (lowercase letters, digits and hyphens)
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0.0)]
        budget: f64,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// fullscale or minimal
        #[arg(long, default_value = "fullscale")]
        mode: ProjectMode,
        /// internal or subcontracted
        #[arg(long, default_value = "internal")]
        scope: ProjectScope,
        /// Document template (standard, minimal)
        #[arg(long, default_value = "standard")]
        template: String,
        /// Ask the AI service for a tailored document list instead of a template
        #[arg(long)]
        ai_documents: bool,
        #[arg(long, env = "HMAP_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// List projects
    List,
    /// Show a project
    Show {
        id: String,
        /// overview, phases or tracking (remembered per project)
        #[arg(long)]
        tab: Option<String>,
    },
    /// Delete a project and its preferences
    Delete { id: String },
    /// Remember the default tracking view for a project
    SetView { id: String, view: TrackingView },
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        ProjectSubcommand::Create {
            id,
            name,
            description,
            budget,
            start,
            end,
            mode,
            scope,
            template,
            ai_documents,
            api_key,
        } => {
            let new = NewProject {
                id,
                name,
                description,
                budget,
                start_date: start,
                end_date: end,
                mode,
                scope,
            };
            let source = if ai_documents {
                None
            } else {
                Some(template.as_str())
            };
            create(&ws, new, source, api_key.as_deref(), json)
        }
        ProjectSubcommand::List => list(&ws, json),
        ProjectSubcommand::Show { id, tab } => show(&ws, &id, tab.as_deref(), json),
        ProjectSubcommand::Delete { id } => delete(&ws, &id, json),
        ProjectSubcommand::SetView { id, view } => set_view(&ws, &id, view, json),
    }
}

fn create(
    ws: &Workspace,
    new: NewProject,
    template: Option<&str>,
    api_key: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    new.validate()?;
    if ws.repo.exists(&new.id)? {
        anyhow::bail!("project '{}' already exists", new.id);
    }

    let project = match template {
        Some(name) => Project::from_template(new, name, &ws.config)?,
        None => {
            let generator = ws.generator(api_key)?;
            let docs = project_ops::propose_documents(&new, &generator, &ws.config.ai.model)
                .context("failed to get a document list from the AI service")?;
            Project::create(new, docs, &ws.config)?
        }
    };
    ws.repo
        .create(&project)
        .with_context(|| format!("failed to store project '{}'", project.id))?;

    if json {
        print_json(&project)?;
    } else {
        println!(
            "Created project '{}' with {} documents and {} sprints",
            project.id,
            project.documents.len(),
            project.sprints.len()
        );
        println!("Next: hmap next {}", project.id);
    }
    Ok(())
}

fn approved_count(project: &Project) -> usize {
    project.documents.iter().filter(|d| d.is_approved()).count()
}

fn list(ws: &Workspace, json: bool) -> anyhow::Result<()> {
    let projects = ws.repo.list().context("failed to read projects")?;

    if json {
        let items: Vec<serde_json::Value> = projects
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "name": p.name,
                    "start_date": p.start_date,
                    "end_date": p.end_date,
                    "budget": p.budget,
                    "documents": p.documents.len(),
                    "approved": approved_count(p),
                    "tasks": p.tasks.len(),
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects. Create one with: hmap project create <id> --name <name>");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.name.clone(),
                p.start_date.to_string(),
                p.end_date.to_string(),
                format!("{:.0}", p.budget),
                format!("{}/{}", approved_count(p), p.documents.len()),
                if p.tasks.is_empty() {
                    "-".to_string()
                } else {
                    task::summarize(&p.tasks)
                },
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "START", "END", "BUDGET", "APPROVED", "TASKS"],
        rows,
    );
    Ok(())
}

fn show(ws: &Workspace, id: &str, tab: Option<&str>, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let prefs = ws.preferences();

    let tab = match tab {
        Some(t) if TABS.contains(&t) => {
            prefs.set_active_tab(id, t);
            t.to_string()
        }
        Some(t) => anyhow::bail!("unknown tab '{t}': expected one of {}", TABS.join(", ")),
        None => prefs
            .active_tab(id)
            .filter(|t| TABS.contains(&t.as_str()))
            .unwrap_or_else(|| TABS[0].to_string()),
    };

    if json {
        return print_json(&project);
    }

    match tab.as_str() {
        "phases" => super::phase::print_phases(ws, &project),
        "tracking" => {
            let view = prefs.tracking_view(id).unwrap_or_default();
            track::render(&project, view, Utc::now().date_naive(), false)
        }
        _ => {
            print_overview(ws, &project);
            Ok(())
        }
    }
}

fn print_overview(ws: &Workspace, p: &Project) {
    println!("Project: {} ({})", p.name, p.id);
    if !p.description.is_empty() {
        println!("  {}", p.description);
    }
    println!("Dates:   {} → {}", p.start_date, p.end_date);
    println!("Budget:  {:.2}", p.budget);
    println!("Mode:    {}  Scope: {}", p.mode, p.scope);
    println!(
        "Docs:    {}/{} approved",
        approved_count(p),
        p.documents.len()
    );

    let statuses = p.phase_statuses(&ws.config.phases);
    let current = statuses
        .iter()
        .find(|s| matches!(s.state, PhaseState::Todo))
        .map(|s| format!("{} {}", s.number, s.name))
        .unwrap_or_else(|| "-".to_string());
    println!("Phase:   {current}");

    if !p.tasks.is_empty() {
        println!("Tasks:   {}", task::summarize(&p.tasks));
        println!("Miles:   {}", p.milestones.len());
    }
    if let Some(cr) = p.change_request.as_ref().filter(|c| c.is_pending()) {
        println!("Change:  {} '{}' ({}) pending", cr.id, cr.title, cr.parsed_impact());
    }
    if !p.notifications.is_empty() {
        println!("Notify:  {} queued", p.notifications.len());
    }
}

fn delete(ws: &Workspace, id: &str, json: bool) -> anyhow::Result<()> {
    ws.repo
        .delete(id)
        .with_context(|| format!("failed to delete project '{id}'"))?;

    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))?;
    } else {
        println!("Deleted project '{id}'");
    }
    Ok(())
}

fn set_view(ws: &Workspace, id: &str, view: TrackingView, json: bool) -> anyhow::Result<()> {
    ws.load(id)?;
    let saved = ws.preferences().set_tracking_view(id, view);

    if json {
        print_json(&serde_json::json!({ "id": id, "view": view, "saved": saved }))?;
    } else if saved {
        println!("Tracking view for '{id}': {view}");
    } else {
        println!("Could not save the tracking view (see log)");
    }
    Ok(())
}
