use crate::error::Result;
use crate::io;
use crate::project::Project;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportSummary {
    /// Archive paths written, in document order.
    pub files: Vec<String>,
}

/// Every character that is not ASCII alphanumeric becomes `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn archive_path(phase: u8, title: &str) -> String {
    format!("Phase_{phase}/{}.md", sanitize_title(title))
}

/// `archive_path`, with `_2`, `_3`... appended when an earlier document
/// already took the name.
fn unique_archive_path(phase: u8, title: &str, used: &mut HashSet<String>) -> String {
    let base = format!("Phase_{phase}/{}", sanitize_title(title));
    let mut name = format!("{base}.md");
    let mut n = 1;
    while !used.insert(name.clone()) {
        n += 1;
        name = format!("{base}_{n}.md");
    }
    name
}

/// Write one Markdown file per document with content, grouped in one folder
/// per phase. Documents without content are left out.
pub fn export_zip<W: Write + Seek>(project: &Project, writer: W) -> Result<ExportSummary> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut summary = ExportSummary::default();
    let mut folders: Vec<u8> = Vec::new();
    let mut used = HashSet::new();

    for doc in &project.documents {
        let Some(content) = project.content(&doc.id).filter(|c| c.has_content()) else {
            continue;
        };
        if !folders.contains(&doc.phase) {
            zip.add_directory(format!("Phase_{}/", doc.phase), options)?;
            folders.push(doc.phase);
        }
        let name = unique_archive_path(doc.phase, &doc.title, &mut used);
        zip.start_file(name.clone(), options)?;
        zip.write_all(content.content.as_bytes())?;
        summary.files.push(name);
    }

    zip.finish()?;
    tracing::info!(project = %project.id, files = summary.files.len(), "exported documents");
    Ok(summary)
}

pub fn export_to_path(project: &Project, path: &Path) -> Result<ExportSummary> {
    if let Some(parent) = path.parent() {
        io::ensure_dir(parent)?;
    }
    let file = File::create(path)?;
    export_zip(project, file)
}
