use super::Workspace;
use crate::output::print_json;
use anyhow::Context;
use hmap_core::{export, paths};
use std::path::Path;

pub fn run(root: &Path, id: &str, output: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let project = ws.load(id)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths::default_export_path(root, id));

    let summary = export::export_to_path(&project, &path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "files": summary.files,
        }))?;
    } else if summary.files.is_empty() {
        println!("Wrote {} (no documents have content yet)", path.display());
    } else {
        println!("Wrote {} ({} documents)", path.display(), summary.files.len());
        for f in &summary.files {
            println!("  {f}");
        }
    }
    Ok(())
}
