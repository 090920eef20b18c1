//! Prompt text for document generation.

use crate::document::Document;
use crate::project::{NewProject, Project};
use crate::template::{self, DETAILED_PLANS, PROJECT_TIMELINE, RESOURCES_LIST};
use crate::types::{ProjectMode, ProjectScope, PHASE_COUNT};
use serde_json::{json, Value};
use std::fmt::Write as _;

const TASK_TABLE: &str = "\
## Tasks
| Task Name | Role | Start Date | End Date | Dependencies | Subcontracted |
|---|---|---|---|---|---|
";

const MILESTONE_TABLE: &str = "\
## Milestones
| Milestone | Date | Dependency | Health |
|---|---|---|---|
";

fn mode_guidance(mode: ProjectMode) -> &'static str {
    match mode {
        ProjectMode::Fullscale => "Write a complete, detailed document suitable for formal review.",
        ProjectMode::Minimal => "Keep the document short: one page, essentials only.",
    }
}

fn scope_guidance(scope: ProjectScope) -> &'static str {
    match scope {
        ProjectScope::Internal => "The work is delivered by an internal team.",
        ProjectScope::Subcontracted => {
            "The work is delivered by an external vendor under contract; \
             cover vendor management and contractual deliverables."
        }
    }
}

fn format_instructions(title: &str) -> String {
    match title {
        DETAILED_PLANS => format!(
            "Include a work breakdown and a task table using exactly this \
             Markdown layout. Dates are YYYY-MM-DD; Dependencies lists other task \
             names separated by commas, or None; Subcontracted is Yes or No.\n\n{TASK_TABLE}"
        ),
        PROJECT_TIMELINE => format!(
            "Include a milestone table using exactly this Markdown layout. \
             Health is one of On Track, At Risk, Delayed.\n\n{MILESTONE_TABLE}"
        ),
        RESOURCES_LIST => "List the team under a `## Roles` heading as Markdown \
             bullets, one role per bullet, in the form `- Role Name: responsibilities`. \
             Follow with `## Tools` and `## Partners` bullet lists where relevant."
            .to_string(),
        _ => "Use Markdown with `##` section headings.".to_string(),
    }
}

fn write_brief(out: &mut String, name: &str, description: &str, budget: f64, dates: &str) {
    let _ = writeln!(out, "Project: {name}");
    if !description.trim().is_empty() {
        let _ = writeln!(out, "Description: {}", description.trim());
    }
    let _ = writeln!(out, "Budget: {budget:.2}");
    let _ = writeln!(out, "Schedule: {dates}");
}

/// Prompt for one document: project brief, approved earlier work and the
/// layout the plan parser expects.
pub fn document_prompt(project: &Project, doc: &Document) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are an experienced project manager following the HMAP planning \
         methodology. Write the \"{}\" document for phase {} ({}).\n",
        doc.title,
        doc.phase,
        template::phase_name(doc.phase)
    );
    write_brief(
        &mut out,
        &project.name,
        &project.description,
        project.budget,
        &format!("{} to {}", project.start_date, project.end_date),
    );
    let _ = writeln!(out, "{}", scope_guidance(project.scope));
    let _ = writeln!(out, "{}\n", mode_guidance(project.mode));

    let earlier: Vec<(&Document, &str)> = project
        .documents
        .iter()
        .filter(|d| d.phase < doc.phase && d.is_approved())
        .filter_map(|d| {
            project
                .content(&d.id)
                .filter(|c| c.has_content())
                .map(|c| (d, c.content.as_str()))
        })
        .collect();
    if !earlier.is_empty() {
        out.push_str("Approved documents from earlier phases:\n\n");
        for (d, content) in earlier {
            let _ = writeln!(out, "=== {} ===\n{}\n", d.title, content.trim());
        }
    }

    out.push_str(&format_instructions(&doc.title));
    out.push('\n');
    out
}

/// Prompt asking for a tailored document list for a new project.
pub fn document_list_prompt(new: &NewProject) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Propose the planning documents for this project under the nine-phase \
         HMAP methodology.\n"
    );
    let dates = match (new.start_date, new.end_date) {
        (Some(s), Some(e)) => format!("{s} to {e}"),
        _ => "not fixed".to_string(),
    };
    write_brief(&mut out, &new.name, &new.description, new.budget, &dates);
    let _ = writeln!(out, "{}", scope_guidance(new.scope));
    let _ = writeln!(out, "{}\n", mode_guidance(new.mode));

    out.push_str("Phases:\n");
    for p in &template::PHASES {
        let _ = writeln!(out, "{}. {}: {}", p.number, p.name, p.summary);
    }
    let _ = writeln!(
        out,
        "\nInclude documents titled exactly \"{DETAILED_PLANS}\", \"{PROJECT_TIMELINE}\" \
         and \"{RESOURCES_LIST}\". Answer with a JSON array of objects with a \
         \"title\" string and a \"phase\" number from 1 to {PHASE_COUNT}."
    );
    out
}

/// Structured-output schema matching [`document_list_prompt`].
pub fn document_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "phase": { "type": "INTEGER" }
            },
            "required": ["title", "phase"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PhaseConfig};
    use chrono::NaiveDate;

    fn project() -> Project {
        let new = NewProject {
            id: "apollo".into(),
            name: "Apollo".into(),
            description: "Portal".into(),
            budget: 1000.0,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            mode: ProjectMode::Minimal,
            scope: ProjectScope::Subcontracted,
        };
        Project::from_template(new, "standard", &Config::new()).unwrap()
    }

    #[test]
    fn plan_prompt_carries_table_layout_and_earlier_work() {
        let rules = PhaseConfig::default();
        let mut p = project();
        p.update_content("Concept Proposal", "A customer portal.", &rules)
            .unwrap();
        p.approve_document("Concept Proposal", &rules).unwrap();

        let doc = p.document(DETAILED_PLANS).unwrap().clone();
        let text = document_prompt(&p, &doc);
        assert!(text.contains("phase 5 (Planning)"));
        assert!(text.contains("=== Concept Proposal ===\nA customer portal."));
        assert!(text.contains("| Task Name | Role | Start Date |"));
        assert!(text.contains("external vendor"));
        assert!(text.contains("one page"));
    }

    #[test]
    fn unapproved_content_is_not_quoted() {
        let rules = PhaseConfig::default();
        let mut p = project();
        p.update_content("Concept Proposal", "Draft idea", &rules)
            .unwrap();
        let doc = p.document("Project Charter").unwrap().clone();
        assert!(!document_prompt(&p, &doc).contains("Draft idea"));
    }

    #[test]
    fn list_prompt_names_required_titles() {
        let p = document_list_prompt(&NewProject {
            name: "Apollo".into(),
            ..Default::default()
        });
        assert!(p.contains("\"Detailed Plans\""));
        assert!(p.contains("9. Review"));
        assert_eq!(document_list_schema()["items"]["required"][1], "phase");
    }
}
