use super::Workspace;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use hmap_core::impact::ChangeRequest;
use std::path::Path;

#[derive(Subcommand)]
pub enum ChangeSubcommand {
    /// Submit a change request (one may be pending at a time)
    Submit {
        project: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Schedule and cost impact, e.g. "+10d +5000c"
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        impact: String,
    },
    /// Approve the pending change request and apply its impact
    Approve { project: String },
    /// Reject the pending change request
    Reject { project: String },
    /// Show the current change request and decided ones
    Show { project: String },
}

pub fn run(root: &Path, subcmd: ChangeSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        ChangeSubcommand::Submit {
            project,
            title,
            description,
            impact,
        } => submit(&ws, &project, &title, &description, &impact, json),
        ChangeSubcommand::Approve { project } => decide(&ws, &project, true, json),
        ChangeSubcommand::Reject { project } => decide(&ws, &project, false, json),
        ChangeSubcommand::Show { project } => show(&ws, &project, json),
    }
}

fn submit(
    ws: &Workspace,
    id: &str,
    title: &str,
    description: &str,
    impact: &str,
    json: bool,
) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    let cr = project
        .submit_change_request(title, description, impact)?
        .clone();
    ws.save(&project)?;

    if json {
        print_json(&cr)?;
    } else {
        println!("Submitted {} '{}' ({})", cr.id, cr.title, cr.parsed_impact());
        println!("Decide with: hmap change approve {id}  or  hmap change reject {id}");
    }
    Ok(())
}

fn decide(ws: &Workspace, id: &str, approve: bool, json: bool) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    let impact = if approve {
        Some(project.approve_change_request()?)
    } else {
        project.reject_change_request()?;
        None
    };
    ws.save(&project)?;

    if json {
        print_json(&serde_json::json!({
            "change_request": project.change_request,
            "end_date": project.end_date,
            "budget": project.budget,
        }))?;
        return Ok(());
    }
    match impact {
        Some(impact) => {
            println!("Approved ({impact})");
            println!("  end date: {}", project.end_date);
            println!("  budget:   {:.2}", project.budget);
        }
        None => println!("Rejected"),
    }
    Ok(())
}

fn show(ws: &Workspace, id: &str, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let all: Vec<&ChangeRequest> = project
        .change_history
        .iter()
        .chain(project.change_request.iter())
        .collect();

    if json {
        return print_json(&serde_json::json!({
            "current": project.change_request,
            "history": project.change_history,
        }));
    }

    if let Some(cr) = project.change_request.as_ref().filter(|c| c.is_pending()) {
        println!("Pending: {} '{}'", cr.id, cr.title);
        if !cr.description.is_empty() {
            println!("  {}", cr.description);
        }
        println!("  impact: {}", cr.parsed_impact());
        println!(
            "  if approved: end {} budget {:.2}",
            cr.parsed_impact().shift_date(project.end_date),
            cr.parsed_impact().adjust_budget(project.budget)
        );
        println!();
    }
    if all.is_empty() {
        println!("No change requests.");
        return Ok(());
    }
    let rows = all
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.title.clone(),
                c.parsed_impact().to_string(),
                c.status.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "IMPACT", "STATUS"], rows);
    Ok(())
}
