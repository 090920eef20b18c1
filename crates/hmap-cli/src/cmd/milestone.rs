use super::{track, Workspace};
use crate::output::print_json;
use chrono::Utc;
use clap::Subcommand;
use hmap_core::types::MilestoneHealth;
use std::path::Path;

#[derive(Subcommand)]
pub enum MilestoneSubcommand {
    /// List milestones by date
    List { project: String },
    /// Set a milestone's health (on-track, at-risk, delayed)
    Health {
        project: String,
        milestone_id: String,
        health: MilestoneHealth,
    },
}

pub fn run(root: &Path, subcmd: MilestoneSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        MilestoneSubcommand::List { project } => {
            let project = ws.load(&project)?;
            track::milestones(&project, Utc::now().date_naive(), json)
        }
        MilestoneSubcommand::Health {
            project,
            milestone_id,
            health,
        } => {
            let mut p = ws.load(&project)?;
            p.set_milestone_health(&milestone_id, health)?;
            ws.save(&p)?;
            if json {
                print_json(&serde_json::json!({
                    "milestone_id": milestone_id,
                    "health": health,
                }))?;
            } else {
                println!("Milestone [{milestone_id}] is {health}");
            }
            Ok(())
        }
    }
}
