//! Typed access to the key-value store.
//!
//! All projects live in one JSON array under [`PROJECTS_KEY`]; every save
//! rewrites that whole array. There is no versioning or migration. Per-user
//! and per-project UI preferences sit in their own keys and are written
//! best-effort.

use crate::error::{HmapError, Result};
use crate::project::Project;
use crate::store::KeyValueStore;
use crate::views::TrackingView;
use std::collections::BTreeSet;

pub const PROJECTS_KEY: &str = "hmap.projects";
pub const API_KEY_KEY: &str = "hmap.api_key";

const ACTIVE_TAB: &str = "active_tab";
const OPEN_PHASES: &str = "open_phases";
const TRACKING_VIEW: &str = "tracking_view";

pub fn project_key(project_id: &str, suffix: &str) -> String {
    format!("hmap.{project_id}.{suffix}")
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub struct ProjectRepository<S> {
    store: S,
}

impl<S: KeyValueStore> ProjectRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn preferences(&self) -> Preferences<'_, S> {
        Preferences { store: &self.store }
    }

    /// Every stored project, in save order. A missing key is an empty list.
    pub fn list(&self) -> Result<Vec<Project>> {
        match self.store.get(PROJECTS_KEY)? {
            Some(blob) if !blob.trim().is_empty() => Ok(serde_json::from_str(&blob)?),
            _ => Ok(Vec::new()),
        }
    }

    pub fn load(&self, id: &str) -> Result<Project> {
        self.list()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| HmapError::ProjectNotFound(id.to_string()))
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|p| p.id == id))
    }

    fn write_all(&self, projects: &[Project]) -> Result<()> {
        let blob = serde_json::to_string(projects)?;
        self.store.set(PROJECTS_KEY, &blob)
    }

    /// Store a new project; fails if the id is taken.
    pub fn create(&self, project: &Project) -> Result<()> {
        let mut projects = self.list()?;
        if projects.iter().any(|p| p.id == project.id) {
            return Err(HmapError::ProjectExists(project.id.clone()));
        }
        projects.push(project.clone());
        self.write_all(&projects)?;
        tracing::info!(project = %project.id, "project stored");
        Ok(())
    }

    /// Replace the stored record with the same id, or append it.
    pub fn save(&self, project: &Project) -> Result<()> {
        let mut projects = self.list()?;
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.push(project.clone()),
        }
        self.write_all(&projects)?;
        tracing::debug!(project = %project.id, "project saved");
        Ok(())
    }

    /// Remove a project and its preference keys.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut projects = self.list()?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Err(HmapError::ProjectNotFound(id.to_string()));
        }
        self.write_all(&projects)?;
        for suffix in [ACTIVE_TAB, OPEN_PHASES, TRACKING_VIEW] {
            if let Err(e) = self.store.remove(&project_key(id, suffix)) {
                tracing::warn!(project = id, key = suffix, error = %e, "could not remove preference");
            }
        }
        tracing::info!(project = id, "project deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Reads return `None` when the value is missing or unreadable. Writes
/// return whether the value was stored; failures are logged, not raised.
pub struct Preferences<'a, S> {
    store: &'a S,
}

impl<'a, S: KeyValueStore> Preferences<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "preference read failed");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "preference write failed");
                false
            }
        }
    }

    pub fn api_key(&self) -> Option<String> {
        self.read(API_KEY_KEY).filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&self, key: &str) -> bool {
        self.write(API_KEY_KEY, key.trim())
    }

    pub fn active_tab(&self, project_id: &str) -> Option<String> {
        self.read(&project_key(project_id, ACTIVE_TAB))
    }

    pub fn set_active_tab(&self, project_id: &str, tab: &str) -> bool {
        self.write(&project_key(project_id, ACTIVE_TAB), tab)
    }

    /// Phases whose cards are expanded. Unparseable data reads as none.
    pub fn open_phases(&self, project_id: &str) -> BTreeSet<u8> {
        self.read(&project_key(project_id, OPEN_PHASES))
            .and_then(|blob| match serde_json::from_str(&blob) {
                Ok(set) => Some(set),
                Err(e) => {
                    tracing::warn!(project = project_id, error = %e, "ignoring bad open_phases");
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn set_open_phases(&self, project_id: &str, phases: &BTreeSet<u8>) -> bool {
        match serde_json::to_string(phases) {
            Ok(blob) => self.write(&project_key(project_id, OPEN_PHASES), &blob),
            Err(e) => {
                tracing::warn!(project = project_id, error = %e, "could not encode open_phases");
                false
            }
        }
    }

    pub fn tracking_view(&self, project_id: &str) -> Option<TrackingView> {
        self.read(&project_key(project_id, TRACKING_VIEW))
            .and_then(|v| v.parse().ok())
    }

    pub fn set_tracking_view(&self, project_id: &str, view: TrackingView) -> bool {
        self.write(&project_key(project_id, TRACKING_VIEW), view.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PhaseConfig};
    use crate::project::NewProject;
    use crate::store::{DirStore, MemoryStore};
    use crate::types::TaskStatus;
    use chrono::NaiveDate;

    fn project(id: &str) -> Project {
        let new = NewProject {
            id: id.into(),
            name: id.to_uppercase(),
            budget: 10_000.0,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            ..Default::default()
        };
        Project::from_template(new, "standard", &Config::new()).unwrap()
    }

    /// A store whose writes always fail.
    struct ReadOnly;

    impl KeyValueStore for ReadOnly {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn save_and_reload_is_deep_equal() {
        let rules = PhaseConfig::default();
        let mut p = project("apollo");
        p.update_content("Concept Proposal", "Idea", &rules).unwrap();
        p.approve_document("Concept Proposal", &rules).unwrap();
        p.attach("Concept Proposal", "a.bin", &[0, 1, 2]).unwrap();
        p.tasks.push(crate::task::Task::new("T1", "Design"));
        p.tasks[0].status = TaskStatus::InProgress;
        p.milestones.push(crate::milestone::Milestone::new("M1", "Beta"));

        let repo = ProjectRepository::new(MemoryStore::new());
        repo.create(&p).unwrap();
        let loaded = repo.load("apollo").unwrap();

        assert_eq!(loaded.documents, p.documents);
        assert_eq!(loaded.tasks, p.tasks);
        assert_eq!(loaded.milestones, p.milestones);
        assert_eq!(loaded.phase_contents, p.phase_contents);
        assert_eq!(loaded, p);
    }

    #[test]
    fn save_overwrites_whole_record() {
        let repo = ProjectRepository::new(MemoryStore::new());
        let mut p = project("apollo");
        repo.create(&p).unwrap();
        repo.create(&project("zeus")).unwrap();

        p.budget = 1.0;
        repo.save(&p).unwrap();
        let all = repo.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].budget, 1.0);
        assert!(matches!(repo.create(&p), Err(HmapError::ProjectExists(_))));
    }

    #[test]
    fn delete_removes_project_and_preferences() {
        let repo = ProjectRepository::new(MemoryStore::new());
        repo.create(&project("apollo")).unwrap();
        let prefs = repo.preferences();
        assert!(prefs.set_active_tab("apollo", "tracking"));
        assert!(prefs.set_tracking_view("apollo", TrackingView::Kanban));

        repo.delete("apollo").unwrap();
        assert!(repo.list().unwrap().is_empty());
        assert_eq!(repo.store().keys(), vec![PROJECTS_KEY]);
        assert!(matches!(
            repo.delete("apollo"),
            Err(HmapError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn preferences_round_trip() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(&store);
        assert_eq!(prefs.api_key(), None);
        prefs.set_api_key("  abc  ");
        assert_eq!(prefs.api_key().as_deref(), Some("abc"));

        let phases: BTreeSet<u8> = [1, 3].into_iter().collect();
        prefs.set_open_phases("apollo", &phases);
        assert_eq!(prefs.open_phases("apollo"), phases);
        assert_eq!(
            store.get("hmap.apollo.open_phases").unwrap().as_deref(),
            Some("[1,3]")
        );

        store.set("hmap.apollo.open_phases", "garbage").unwrap();
        assert!(prefs.open_phases("apollo").is_empty());
        assert_eq!(prefs.tracking_view("apollo"), None);
    }

    #[test]
    fn preference_write_failures_are_swallowed() {
        let prefs = Preferences::new(&ReadOnly);
        assert!(!prefs.set_active_tab("apollo", "phases"));
        assert_eq!(prefs.active_tab("apollo"), None);
    }

    #[test]
    fn project_save_failures_surface() {
        let repo = ProjectRepository::new(ReadOnly);
        assert!(matches!(repo.save(&project("apollo")), Err(HmapError::Io(_))));
    }

    #[test]
    fn dir_store_backed_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = ProjectRepository::new(DirStore::new(dir.path()));
        repo.create(&project("apollo")).unwrap();
        let again = ProjectRepository::new(DirStore::new(dir.path()));
        assert_eq!(again.load("apollo").unwrap().name, "APOLLO");
    }
}
