use super::Workspace;
use crate::output::{print_json, print_table};
use hmap_core::{
    classifier::{Classification, Classifier, EvalContext},
    project::Project,
    rules::default_rules,
};
use std::path::Path;

pub fn run(root: &Path, id: Option<&str>, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let classifier = Classifier::new(default_rules());
    let classify = |p: &Project| -> Classification {
        classifier.classify(&EvalContext {
            project: p,
            rules: &ws.config.phases,
        })
    };

    match id {
        Some(id) => {
            let project = ws.load(id)?;
            let c = classify(&project);
            if json {
                print_json(&c)?;
            } else {
                println!("{}: {}", c.action, c.message);
                if !c.next_command.is_empty() {
                    println!("Next: {}", c.next_command);
                }
                if c.calls_model {
                    println!("(calls the AI service)");
                }
            }
        }
        None => {
            let all: Vec<Classification> = ws.repo.list()?.iter().map(classify).collect();
            if json {
                return print_json(&all);
            }
            if all.is_empty() {
                println!("No projects.");
                return Ok(());
            }
            let rows = all
                .iter()
                .map(|c| {
                    vec![
                        c.project.clone(),
                        c.action.to_string(),
                        c.next_command.clone(),
                    ]
                })
                .collect();
            print_table(&["PROJECT", "ACTION", "NEXT"], rows);
        }
    }
    Ok(())
}
