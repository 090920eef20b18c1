use super::Workspace;
use crate::output::{print_json, print_table, truncate};
use clap::Subcommand;
use hmap_core::{project::Project, template, types::PHASE_COUNT};
use std::path::Path;

#[derive(Subcommand)]
pub enum PhaseSubcommand {
    /// List the nine phases with lock state; expanded phases show their documents
    List { project: String },
    /// Show one phase and expand it in `phase list`
    Show {
        project: String,
        phase: u8,
        /// Collapse the phase instead
        #[arg(long)]
        collapse: bool,
    },
}

pub fn run(root: &Path, subcmd: PhaseSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        PhaseSubcommand::List { project } => {
            let project = ws.load(&project)?;
            if json {
                print_json(&project.phase_statuses(&ws.config.phases))
            } else {
                print_phases(&ws, &project)
            }
        }
        PhaseSubcommand::Show {
            project,
            phase,
            collapse,
        } => show(&ws, &project, phase, collapse, json),
    }
}

/// Phase table; phases marked open in preferences list their documents too.
pub fn print_phases(ws: &Workspace, project: &Project) -> anyhow::Result<()> {
    let open = ws.preferences().open_phases(&project.id);
    let mut rows = Vec::new();
    for s in project.phase_statuses(&ws.config.phases) {
        let marker = if open.contains(&s.number) { "v" } else { ">" };
        rows.push(vec![
            format!("{marker} {}", s.number),
            s.name.to_string(),
            s.state.label().to_string(),
            s.documents.len().to_string(),
            s.state.reason().unwrap_or("").to_string(),
        ]);
        if open.contains(&s.number) {
            for d in project.documents_in_phase(s.number) {
                rows.push(vec![
                    String::new(),
                    format!("  {} {}", d.id, truncate(&d.title, 30)),
                    d.status.to_string(),
                    String::new(),
                    String::new(),
                ]);
            }
        }
    }
    print_table(&["PHASE", "NAME", "STATE", "DOCS", "REASON"], rows);
    Ok(())
}

fn show(ws: &Workspace, id: &str, phase: u8, collapse: bool, json: bool) -> anyhow::Result<()> {
    if phase == 0 || phase > PHASE_COUNT {
        anyhow::bail!("phase must be between 1 and {PHASE_COUNT}");
    }
    let project = ws.load(id)?;
    let prefs = ws.preferences();
    let mut open = prefs.open_phases(id);
    let changed = if collapse {
        open.remove(&phase)
    } else {
        open.insert(phase)
    };
    if changed {
        prefs.set_open_phases(id, &open);
    }

    let state = project.phase_state(phase, &ws.config.phases);
    let docs = project.documents_in_phase(phase);

    if json {
        print_json(&serde_json::json!({
            "number": phase,
            "name": template::phase_name(phase),
            "state": state,
            "documents": docs,
        }))?;
        return Ok(());
    }

    println!("Phase {phase}: {}", template::phase_name(phase));
    if let Some(info) = template::phase_info(phase) {
        println!("  {}", info.summary);
    }
    println!("State: {}", state.label());
    if let Some(reason) = state.reason() {
        println!("  {reason}");
    }
    if docs.is_empty() {
        println!("\nNo documents in this phase.");
        return Ok(());
    }
    println!();
    let rows = docs
        .iter()
        .map(|d| {
            let has = project
                .content(&d.id)
                .map(|c| c.has_content())
                .unwrap_or(false);
            vec![
                d.id.clone(),
                d.title.clone(),
                d.status.to_string(),
                if has { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "STATUS", "CONTENT"], rows);
    Ok(())
}
