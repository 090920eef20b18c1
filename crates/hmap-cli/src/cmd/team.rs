use super::Workspace;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use hmap_core::team::assignment_for;
use std::path::Path;

#[derive(Subcommand)]
pub enum TeamSubcommand {
    /// Roles listed in the Resources & Skills List, with their assignees
    Roles { project: String },
    /// Assign a person to a role
    Assign {
        project: String,
        role: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// List team assignments
    List { project: String },
}

pub fn run(root: &Path, subcmd: TeamSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        TeamSubcommand::Roles { project } => roles(&ws, &project, json),
        TeamSubcommand::Assign {
            project,
            role,
            name,
            email,
        } => assign(&ws, &project, &role, &name, &email, json),
        TeamSubcommand::List { project } => list(&ws, &project, json),
    }
}

fn roles(ws: &Workspace, id: &str, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let roles = project.roles();

    if json {
        let items: Vec<serde_json::Value> = roles
            .iter()
            .map(|r| {
                serde_json::json!({
                    "role": r,
                    "assignment": assignment_for(&project.team, r),
                })
            })
            .collect();
        return print_json(&items);
    }

    if roles.is_empty() {
        println!("No roles found. Add a roles or personnel list to the Resources & Skills List.");
        return Ok(());
    }
    let rows = roles
        .iter()
        .map(|r| match assignment_for(&project.team, r) {
            Some(a) => vec![r.clone(), a.name.clone(), a.email.clone()],
            None => vec![r.clone(), "-".to_string(), "-".to_string()],
        })
        .collect();
    print_table(&["ROLE", "NAME", "EMAIL"], rows);
    Ok(())
}

fn assign(
    ws: &Workspace,
    id: &str,
    role: &str,
    name: &str,
    email: &str,
    json: bool,
) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    let known = project.roles().iter().any(|r| r == role);
    project.assign_role(role, name, email);
    ws.save(&project)?;

    if json {
        print_json(&serde_json::json!({
            "role": role,
            "name": name,
            "email": email,
            "known_role": known,
        }))?;
    } else {
        println!("Assigned {name} to '{role}'");
        if !known {
            println!("  note: '{role}' is not listed in the resources document");
        }
        if email.trim().is_empty() {
            println!("  note: no email, so no notifications will be queued for this role");
        }
    }
    Ok(())
}

fn list(ws: &Workspace, id: &str, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    if json {
        return print_json(&project.team);
    }
    if project.team.is_empty() {
        println!("No assignments.");
        return Ok(());
    }
    let rows = project
        .team
        .iter()
        .map(|a| vec![a.role.clone(), a.name.clone(), a.email.clone()])
        .collect();
    print_table(&["ROLE", "NAME", "EMAIL"], rows);
    Ok(())
}
