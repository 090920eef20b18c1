pub mod change;
pub mod config;
pub mod document;
pub mod export;
pub mod init;
pub mod milestone;
pub mod next;
pub mod notify;
pub mod phase;
pub mod plan;
pub mod project;
pub mod scenario;
pub mod task;
pub mod team;
pub mod track;

use anyhow::Context;
use chrono::NaiveDate;
use hmap_core::{
    config::{Config, WarnLevel},
    generate::HttpGenerator,
    paths,
    project::Project,
    repository::{Preferences, ProjectRepository},
    store::DirStore,
};
use std::path::{Path, PathBuf};

/// An initialized workspace: config plus the project store under `.hmap/`.
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    pub repo: ProjectRepository<DirStore>,
}

impl Workspace {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load .hmap/config.yaml")?;
        for w in config.validate() {
            match w.level {
                WarnLevel::Error => tracing::error!("config: {}", w.message),
                WarnLevel::Warning => tracing::warn!("config: {}", w.message),
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            config,
            repo: ProjectRepository::new(DirStore::new(paths::store_dir(root))),
        })
    }

    pub fn load(&self, id: &str) -> anyhow::Result<Project> {
        self.repo
            .load(id)
            .with_context(|| format!("project '{id}' not found"))
    }

    pub fn save(&self, project: &Project) -> anyhow::Result<()> {
        self.repo
            .save(project)
            .with_context(|| format!("failed to save project '{}'", project.id))
    }

    pub fn preferences(&self) -> Preferences<'_, DirStore> {
        self.repo.preferences()
    }

    /// Flag or `HMAP_API_KEY` first, then the stored key.
    pub fn api_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.preferences().api_key())
    }

    pub fn generator(&self, explicit_key: Option<&str>) -> anyhow::Result<HttpGenerator> {
        let key = self.api_key(explicit_key).unwrap_or_default();
        HttpGenerator::new(&self.config.ai, key).context("cannot reach the AI service")
    }
}

/// Parse `YYYY-MM-DD`; `none` or an empty string clears the value.
pub fn parse_optional_date(field: &str, text: &str) -> anyhow::Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .with_context(|| format!("invalid {field} '{text}': expected YYYY-MM-DD"))
}

/// `none` or an empty string clears the value.
pub fn parse_optional_text(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_dates() {
        assert_eq!(parse_optional_date("start", "none").unwrap(), None);
        assert_eq!(
            parse_optional_date("start", "2025-02-03").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 3)
        );
        assert!(parse_optional_date("start", "03/02/2025").is_err());
    }

    #[test]
    fn optional_text() {
        assert_eq!(parse_optional_text(" Dev "), Some("Dev".to_string()));
        assert_eq!(parse_optional_text("NONE"), None);
    }

    #[test]
    fn open_requires_init() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Workspace::open(dir.path()).err().unwrap();
        assert!(format!("{err:#}").contains("not initialized"));
    }
}
