use super::Workspace;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use hmap_core::impact::parse_impact;
use std::path::Path;

#[derive(Subcommand)]
pub enum ScenarioSubcommand {
    /// Record a what-if scenario
    Add {
        project: String,
        #[arg(long)]
        name: String,
        /// Schedule and cost impact, e.g. "+10d -2000c"
        #[arg(long, allow_hyphen_values = true)]
        impact: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List scenarios with their projected end date and budget
    List { project: String },
    /// Project one scenario onto the current plan
    Project { project: String, scenario: String },
}

pub fn run(root: &Path, subcmd: ScenarioSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        ScenarioSubcommand::Add {
            project,
            name,
            impact,
            description,
        } => {
            let mut p = ws.load(&project)?;
            let sc = p.add_scenario(&name, &description, &impact).clone();
            ws.save(&p)?;
            if json {
                print_json(&sc)?;
            } else {
                println!("Added scenario {} '{}' ({})", sc.id, sc.name, parse_impact(&sc.impact));
            }
            Ok(())
        }
        ScenarioSubcommand::List { project } => {
            let p = ws.load(&project)?;
            let projections = p
                .scenarios
                .iter()
                .map(|s| p.project_scenario(&s.id).map(|proj| (s, proj)))
                .collect::<Result<Vec<_>, _>>()?;

            if json {
                let items: Vec<serde_json::Value> = projections
                    .iter()
                    .map(|(s, proj)| serde_json::json!({ "scenario": s, "projection": proj }))
                    .collect();
                return print_json(&items);
            }
            if projections.is_empty() {
                println!("No scenarios.");
                return Ok(());
            }
            let rows = projections
                .iter()
                .map(|(s, proj)| {
                    vec![
                        s.id.clone(),
                        s.name.clone(),
                        proj.impact.to_string(),
                        proj.end_date.to_string(),
                        format!("{:.2}", proj.budget),
                    ]
                })
                .collect();
            println!("Current: end {} budget {:.2}", p.end_date, p.budget);
            print_table(&["ID", "SCENARIO", "IMPACT", "END", "BUDGET"], rows);
            Ok(())
        }
        ScenarioSubcommand::Project { project, scenario } => {
            let p = ws.load(&project)?;
            let proj = p.project_scenario(&scenario)?;
            if json {
                print_json(&proj)?;
            } else {
                println!("Scenario: {} ({})", proj.scenario, proj.impact);
                println!("  end date: {} → {}", p.end_date, proj.end_date);
                println!("  budget:   {:.2} → {:.2}", p.budget, proj.budget);
            }
            Ok(())
        }
    }
}
