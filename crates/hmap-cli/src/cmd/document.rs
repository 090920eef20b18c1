use super::Workspace;
use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use clap::Subcommand;
use hmap_core::{
    document::{Document, PhaseContent},
    generate::GenerationTracker,
    project::Project,
    types::{ContentStatus, DocumentStatus},
    unlock::PhaseState,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum DocumentSubcommand {
    /// List a project's documents with status and lock state
    List { project: String },
    /// Show a document's content
    Show { project: String, document: String },
    /// Approve a document (its phase must be unlocked)
    Approve { project: String, document: String },
    /// Reject a document
    Reject { project: String, document: String },
    /// Set a document's status directly (working, approved, rejected, failed)
    Status {
        project: String,
        document: String,
        status: DocumentStatus,
    },
    /// Replace a document's content from a file, a string or stdin
    Edit {
        project: String,
        document: String,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(long)]
        text: Option<String>,
    },
    /// Attach a file to a document
    Attach {
        project: String,
        document: String,
        path: PathBuf,
        /// Attachment name (default: the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Generate a document's content with the AI service
    Generate {
        project: String,
        document: String,
        #[arg(long, env = "HMAP_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Override ai.model from config
        #[arg(long)]
        model: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: DocumentSubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        DocumentSubcommand::List { project } => list(&ws, &project, json),
        DocumentSubcommand::Show { project, document } => show(&ws, &project, &document, json),
        DocumentSubcommand::Approve { project, document } => {
            set_status(&ws, &project, &document, DocumentStatus::Approved, json)
        }
        DocumentSubcommand::Reject { project, document } => {
            set_status(&ws, &project, &document, DocumentStatus::Rejected, json)
        }
        DocumentSubcommand::Status {
            project,
            document,
            status,
        } => set_status(&ws, &project, &document, status, json),
        DocumentSubcommand::Edit {
            project,
            document,
            file,
            text,
        } => edit(&ws, &project, &document, file.as_deref(), text, json),
        DocumentSubcommand::Attach {
            project,
            document,
            path,
            name,
        } => attach(&ws, &project, &document, &path, name.as_deref(), json),
        DocumentSubcommand::Generate {
            project,
            document,
            api_key,
            model,
        } => generate(
            &ws,
            &project,
            &document,
            api_key.as_deref(),
            model.as_deref(),
            json,
        ),
    }
}

#[derive(Serialize)]
struct DocumentRow<'a> {
    #[serde(flatten)]
    document: &'a Document,
    content_status: ContentStatus,
    has_content: bool,
    attachments: usize,
    #[serde(flatten)]
    state: PhaseState,
}

fn row<'a>(ws: &Workspace, project: &'a Project, doc: &'a Document) -> DocumentRow<'a> {
    let content = project.content(&doc.id);
    DocumentRow {
        document: doc,
        content_status: content.map(|c| c.status).unwrap_or_default(),
        has_content: content.is_some_and(PhaseContent::has_content),
        attachments: content.map(|c| c.attachments.len()).unwrap_or(0),
        state: hmap_core::unlock::document_state(doc, &project.documents, &ws.config.phases),
    }
}

fn list(ws: &Workspace, id: &str, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let rows: Vec<DocumentRow> = project
        .documents
        .iter()
        .map(|d| row(ws, &project, d))
        .collect();

    if json {
        return print_json(&rows);
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.document.id.clone(),
                truncate(&r.document.title, 32),
                r.document.phase.to_string(),
                r.document.status.to_string(),
                if r.has_content { "yes" } else { "no" }.to_string(),
                r.state.label().to_string(),
                r.state.reason().unwrap_or("").to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "TITLE", "PHASE", "STATUS", "CONTENT", "STATE", "REASON"],
        table,
    );
    Ok(())
}

fn show(ws: &Workspace, id: &str, key: &str, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let doc = project.document(key)?;
    let content = project.content(&doc.id).cloned().unwrap_or_default();

    if json {
        print_json(&serde_json::json!({
            "document": row(ws, &project, doc),
            "content": content.content,
            "attachments": content.attachments.iter().map(|a| &a.name).collect::<Vec<_>>(),
        }))?;
        return Ok(());
    }

    let state = hmap_core::unlock::document_state(doc, &project.documents, &ws.config.phases);
    println!("{} {} (phase {}, v{})", doc.id, doc.title, doc.phase, doc.version);
    println!("Status: {}  Owner: {}  State: {}", doc.status, doc.owner, state.label());
    if let Some(reason) = state.reason() {
        println!("Locked: {reason}");
    }
    for a in &content.attachments {
        println!("Attachment: {}", a.name);
    }
    println!();
    if content.has_content() {
        println!("{}", content.content);
    } else {
        println!("(no content)");
    }
    Ok(())
}

fn set_status(
    ws: &Workspace,
    id: &str,
    key: &str,
    status: DocumentStatus,
    json: bool,
) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    let before = project.phase_statuses(&ws.config.phases);
    project.set_document_status(key, status, &ws.config.phases)?;
    ws.save(&project)?;
    let doc = project.document(key)?;

    if json {
        print_json(&row(ws, &project, doc))?;
    } else {
        println!("{} '{}' is now {}", doc.id, doc.title, doc.status);
        for (was, now) in before.iter().zip(project.phase_statuses(&ws.config.phases)) {
            match (was.state.is_locked(), now.state.is_locked()) {
                (true, false) => println!("  unlocked: phase {} {}", now.number, now.name),
                (false, true) => println!("  locked:   phase {} {}", now.number, now.name),
                _ => {}
            }
        }
    }
    Ok(())
}

fn edit(
    ws: &Workspace,
    id: &str,
    key: &str,
    file: Option<&Path>,
    text: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let content = match (file, text) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(text)) => text,
        (None, None) => {
            std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
        }
    };

    let mut project = ws.load(id)?;
    project.update_content(key, &content, &ws.config.phases)?;
    ws.save(&project)?;
    let doc = project.document(key)?;

    if json {
        print_json(&row(ws, &project, doc))?;
    } else {
        println!("Updated {} '{}' ({} bytes)", doc.id, doc.title, content.len());
    }
    Ok(())
}

fn attach(
    ws: &Workspace,
    id: &str,
    key: &str,
    path: &Path,
    name: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = match name {
        Some(n) => n.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("attachment path has no file name")?,
    };

    let mut project = ws.load(id)?;
    project.attach(key, &name, &bytes)?;
    ws.save(&project)?;
    let doc = project.document(key)?;

    if json {
        print_json(&serde_json::json!({
            "document": doc.id,
            "attachment": name,
            "bytes": bytes.len(),
        }))?;
    } else {
        println!("Attached '{}' to {} ({} bytes)", name, doc.id, bytes.len());
    }
    Ok(())
}

fn generate(
    ws: &Workspace,
    id: &str,
    key: &str,
    api_key: Option<&str>,
    model: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    let generator = ws.generator(api_key)?;
    let tracker = GenerationTracker::new();
    let model = model.unwrap_or(ws.config.ai.model.as_str()).to_string();

    let outcome = project.generate_document(key, &generator, &tracker, &model, &ws.config.phases);
    // A failed generation still changes the document's status
    ws.save(&project)?;
    outcome.with_context(|| format!("failed to generate '{key}'"))?;

    let doc = project.document(key)?;
    if json {
        print_json(&row(ws, &project, doc))?;
    } else {
        let len = project.content(&doc.id).map(|c| c.content.len()).unwrap_or(0);
        println!("Generated {} '{}' ({} bytes) with {}", doc.id, doc.title, len, model);
        println!("Review with: hmap document show {} {}", project.id, doc.id);
    }
    Ok(())
}
