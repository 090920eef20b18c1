use crate::cascade::{self, CascadeOutcome, NotificationQueue};
use crate::config::{Config, PhaseConfig};
use crate::document::{Attachment, Document, PhaseContent};
use crate::error::{HmapError, Result};
use crate::generate::{GenerationRequest, GenerationTracker, TextGenerator};
use crate::impact::{
    parse_impact, ChangeRequest, ChangeRequestStatus, Impact, Scenario, ScenarioProjection,
};
use crate::milestone::{self, Milestone};
use crate::paths;
use crate::plan::{self, ImportReport, PlanContext};
use crate::prompt;
use crate::sprint::{self, Sprint};
use crate::task::{self, Task, TaskUpdate};
use crate::team::{self, TeamAssignment};
use crate::template::{self, DETAILED_PLANS, PROJECT_TIMELINE, RESOURCES_LIST};
use crate::types::{DocumentStatus, MilestoneHealth, ProjectMode, ProjectScope, TaskStatus};
use crate::unlock::{self, PhaseState, PhaseStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Creation input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

/// Project creation form. Dates are optional here so a missing one can be
/// reported alongside every other problem.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub budget: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub mode: ProjectMode,
    pub scope: ProjectScope,
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();
        let mut issue = |field: &'static str, message: &str| {
            issues.push(ValidationIssue {
                field,
                message: message.to_string(),
            })
        };

        if self.name.trim().is_empty() {
            issue("name", "is required");
        }
        if paths::validate_slug(&self.id).is_err() {
            issue("id", "must be lowercase alphanumeric with hyphens");
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            issue("budget", "must be zero or more");
        }
        match (self.start_date, self.end_date) {
            (None, _) => issue("start_date", "is required"),
            (_, None) => issue("end_date", "is required"),
            (Some(s), Some(e)) if e < s => issue("end_date", "must not be before the start date"),
            _ => {}
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(HmapError::Validation(issues))
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub budget: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub mode: ProjectMode,
    pub scope: ProjectScope,
    pub documents: Vec<Document>,
    /// Keyed by document id.
    #[serde(default)]
    pub phase_contents: BTreeMap<String, PhaseContent>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Highest task number ever issued.
    #[serde(default)]
    pub task_seq: usize,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub sprints: Vec<Sprint>,
    #[serde(default)]
    pub team: Vec<TeamAssignment>,
    #[serde(default)]
    pub change_request: Option<ChangeRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_history: Vec<ChangeRequest>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub notifications: NotificationQueue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Validate `new` and build a project around `documents`, seeding empty
    /// content for each document and the configured sprints.
    pub fn create(new: NewProject, documents: Vec<Document>, cfg: &Config) -> Result<Self> {
        new.validate()?;
        let (Some(start_date), Some(end_date)) = (new.start_date, new.end_date) else {
            return Err(HmapError::InvalidValue {
                field: "start_date",
                value: String::new(),
            });
        };

        let phase_contents = documents
            .iter()
            .map(|d| (d.id.clone(), PhaseContent::default()))
            .collect();
        let now = Utc::now();
        tracing::info!(project = %new.id, documents = documents.len(), "creating project");

        Ok(Self {
            id: new.id,
            name: new.name.trim().to_string(),
            description: new.description,
            budget: new.budget,
            start_date,
            end_date,
            mode: new.mode,
            scope: new.scope,
            documents,
            phase_contents,
            tasks: Vec::new(),
            task_seq: 0,
            milestones: Vec::new(),
            sprints: sprint::default_sprints(start_date, cfg.sprints.count, cfg.sprints.length_days),
            team: Vec::new(),
            change_request: None,
            change_history: Vec::new(),
            scenarios: Vec::new(),
            notifications: NotificationQueue::default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn from_template(new: NewProject, template_name: &str, cfg: &Config) -> Result<Self> {
        let template = template::find_template(template_name)?;
        Self::create(new, template.instantiate(), cfg)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Look a document up by id or title.
    pub fn document(&self, key: &str) -> Result<&Document> {
        self.documents
            .iter()
            .find(|d| d.matches(key))
            .ok_or_else(|| HmapError::DocumentNotFound(key.to_string()))
    }

    fn document_index(&self, key: &str) -> Result<usize> {
        self.documents
            .iter()
            .position(|d| d.matches(key))
            .ok_or_else(|| HmapError::DocumentNotFound(key.to_string()))
    }

    pub fn documents_in_phase(&self, phase: u8) -> Vec<&Document> {
        self.documents.iter().filter(|d| d.phase == phase).collect()
    }

    pub fn content(&self, doc_id: &str) -> Option<&PhaseContent> {
        self.phase_contents.get(doc_id)
    }

    /// Content of the first document with `title`, empty when absent.
    pub fn content_by_title(&self, title: &str) -> &str {
        self.documents
            .iter()
            .find(|d| d.title == title)
            .and_then(|d| self.phase_contents.get(&d.id))
            .map(|c| c.content.as_str())
            .unwrap_or("")
    }

    fn content_mut(&mut self, doc_id: &str) -> &mut PhaseContent {
        self.phase_contents.entry(doc_id.to_string()).or_default()
    }

    pub fn phase_state(&self, phase: u8, rules: &PhaseConfig) -> PhaseState {
        unlock::phase_state(phase, &self.documents, rules)
    }

    pub fn document_state(&self, key: &str, rules: &PhaseConfig) -> Result<PhaseState> {
        let doc = self.document(key)?;
        Ok(unlock::document_state(doc, &self.documents, rules))
    }

    pub fn phase_statuses(&self, rules: &PhaseConfig) -> Vec<PhaseStatus> {
        unlock::phase_statuses(&self.documents, rules)
    }

    pub fn approve_document(&mut self, key: &str, rules: &PhaseConfig) -> Result<()> {
        let idx = self.document_index(key)?;
        unlock::ensure_unlocked(self.documents[idx].phase, &self.documents, rules)?;

        self.documents[idx].status = DocumentStatus::Approved;
        let id = self.documents[idx].id.clone();
        self.content_mut(&id).mark_completed();
        self.touch();
        tracing::info!(project = %self.id, document = %id, "document approved");
        Ok(())
    }

    pub fn reject_document(&mut self, key: &str, rules: &PhaseConfig) -> Result<()> {
        self.set_document_status(key, DocumentStatus::Rejected, rules)
    }

    /// Every status change goes through the phase gate. Leaving `Approved`
    /// resets the content to `todo`.
    pub fn set_document_status(
        &mut self,
        key: &str,
        status: DocumentStatus,
        rules: &PhaseConfig,
    ) -> Result<()> {
        if status == DocumentStatus::Approved {
            return self.approve_document(key, rules);
        }
        let idx = self.document_index(key)?;
        unlock::ensure_unlocked(self.documents[idx].phase, &self.documents, rules)?;
        let was_approved = self.documents[idx].is_approved();
        self.documents[idx].status = status;
        let id = self.documents[idx].id.clone();
        if was_approved {
            self.content_mut(&id).reset();
        }
        self.touch();
        tracing::info!(project = %self.id, document = %id, %status, "document status changed");
        Ok(())
    }

    /// Replace a document's content. The phase must be open.
    pub fn update_content(&mut self, key: &str, content: &str, rules: &PhaseConfig) -> Result<()> {
        let idx = self.document_index(key)?;
        unlock::ensure_unlocked(self.documents[idx].phase, &self.documents, rules)?;
        let id = self.documents[idx].id.clone();
        self.content_mut(&id).set_content(content);
        self.touch();
        Ok(())
    }

    pub fn attach(&mut self, key: &str, name: &str, bytes: &[u8]) -> Result<()> {
        let id = self.document(key)?.id.clone();
        self.content_mut(&id)
            .attachments
            .push(Attachment::from_bytes(name, bytes));
        self.touch();
        Ok(())
    }

    /// Generate a document's content. On failure the document is marked
    /// `Failed` and the error is returned.
    pub fn generate_document(
        &mut self,
        key: &str,
        generator: &dyn TextGenerator,
        tracker: &GenerationTracker,
        model: &str,
        rules: &PhaseConfig,
    ) -> Result<()> {
        let idx = self.document_index(key)?;
        let doc = self.documents[idx].clone();
        unlock::ensure_unlocked(doc.phase, &self.documents, rules)?;
        let _guard = tracker.begin(&doc.id)?;

        let request = GenerationRequest::text(model, prompt::document_prompt(self, &doc));
        let result = generator.generate(&request);
        self.touch();
        match result {
            Ok(text) => {
                self.content_mut(&doc.id).set_content(text);
                if doc.status == DocumentStatus::Failed {
                    self.documents[idx].status = DocumentStatus::Working;
                }
                tracing::info!(project = %self.id, document = %doc.id, "document generated");
                Ok(())
            }
            Err(e) => {
                self.documents[idx].status = DocumentStatus::Failed;
                tracing::warn!(project = %self.id, document = %doc.id, error = %e, "generation failed");
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Plan import
    // -----------------------------------------------------------------------

    /// Both plan documents must exist and be approved.
    pub fn plan_ready(&self) -> Result<()> {
        let missing: Vec<&str> = [DETAILED_PLANS, PROJECT_TIMELINE]
            .into_iter()
            .filter(|t| !self.documents.iter().any(|d| d.title == *t && d.is_approved()))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HmapError::PlanNotReady(format!(
                "requires approved: {}",
                missing.join(", ")
            )))
        }
    }

    /// Detailed Plans followed by Project Timeline.
    pub fn plan_text(&self) -> String {
        format!(
            "{}\n\n{}",
            self.content_by_title(DETAILED_PLANS),
            self.content_by_title(PROJECT_TIMELINE)
        )
    }

    /// Highest task number in use, counting tasks a forced re-import
    /// replaced.
    pub fn last_task_seq(&self) -> usize {
        self.tasks
            .iter()
            .filter_map(|t| t.id.strip_prefix('T')?.parse::<usize>().ok())
            .fold(self.task_seq, usize::max)
    }

    pub fn plan_context(&self) -> PlanContext<'_> {
        PlanContext {
            sprints: &self.sprints,
            scope: self.scope,
            last_task_seq: self.last_task_seq(),
        }
    }

    /// Parse the approved plan documents into tasks and milestones. Existing
    /// tasks are kept unless `force` is set; the report is returned either
    /// way with `applied` telling which happened. Replacement tasks get
    /// fresh ids.
    pub fn import_plan(&mut self, force: bool) -> Result<ImportReport> {
        self.plan_ready()?;
        let text = self.plan_text();
        let parsed = plan::parse_plan(&text, &self.plan_context());
        let mut report = parsed.report;

        if !self.tasks.is_empty() && !force {
            tracing::info!(project = %self.id, existing = self.tasks.len(), "keeping existing tasks");
            report.applied = false;
            return Ok(report);
        }

        self.task_seq = self.last_task_seq() + parsed.tasks.len();
        self.tasks = parsed.tasks;
        self.milestones = parsed.milestones;
        self.touch();
        tracing::info!(
            project = %self.id,
            tasks = report.tasks,
            milestones = report.milestones,
            issues = report.issues.len(),
            "plan imported"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Tasks and milestones
    // -----------------------------------------------------------------------

    /// Change a task's status. A move from not-done to done stamps the
    /// actual end date and runs the completion cascade; anything else
    /// returns an empty outcome.
    pub fn set_task_status(&mut self, id: &str, status: TaskStatus) -> Result<CascadeOutcome> {
        let today = Utc::now().date_naive();
        let t = task::find_mut(&mut self.tasks, id)?;
        let was_done = t.is_done();
        t.status = status;
        let completed = !was_done && status == TaskStatus::Done;
        if completed && t.actual_end_date.is_none() {
            t.actual_end_date = Some(today);
        }
        self.touch();

        if !completed {
            return Ok(CascadeOutcome::default());
        }
        tracing::info!(project = %self.id, task = %id, "task completed");
        Ok(cascade::cascade(
            &self.name,
            &self.tasks,
            id,
            &self.team,
            &mut self.notifications,
            self.updated_at,
        ))
    }

    /// Edit task fields. New dependencies must name other tasks of this
    /// project.
    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<()> {
        task::find(&self.tasks, id)?;
        if let Some(deps) = &update.depends_on {
            for dep in deps {
                let reason = if dep == id {
                    "a task cannot depend on itself"
                } else if task::find(&self.tasks, dep).is_err() {
                    "no such task"
                } else {
                    continue;
                };
                return Err(HmapError::InvalidDependency {
                    task: id.to_string(),
                    dependency: dep.clone(),
                    reason,
                });
            }
        }
        task::update_task(&mut self.tasks, id, update)?;
        self.touch();
        Ok(())
    }

    pub fn set_milestone_health(&mut self, id: &str, health: MilestoneHealth) -> Result<()> {
        milestone::set_health(&mut self.milestones, id, health)?;
        self.touch();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Team
    // -----------------------------------------------------------------------

    /// Roles listed in the resources document.
    pub fn roles(&self) -> Vec<String> {
        team::derive_roles(self.content_by_title(RESOURCES_LIST))
    }

    pub fn assign_role(&mut self, role: &str, name: &str, email: &str) {
        team::assign(&mut self.team, role, name, email);
        self.touch();
    }

    // -----------------------------------------------------------------------
    // Change requests and scenarios
    // -----------------------------------------------------------------------

    pub fn submit_change_request(
        &mut self,
        title: &str,
        description: &str,
        impact: &str,
    ) -> Result<&ChangeRequest> {
        if let Some(open) = self.change_request.as_ref().filter(|c| c.is_pending()) {
            return Err(HmapError::InvalidValue {
                field: "change_request",
                value: format!("{} is still pending", open.id),
            });
        }
        if let Some(decided) = self.change_request.take() {
            self.change_history.push(decided);
        }
        let cr = ChangeRequest {
            id: format!("CR{}", self.change_history.len() + 1),
            title: title.to_string(),
            description: description.to_string(),
            impact: impact.to_string(),
            status: ChangeRequestStatus::Pending,
        };
        self.touch();
        Ok(self.change_request.insert(cr))
    }

    fn pending_change_request(&mut self) -> Result<&mut ChangeRequest> {
        self.change_request
            .as_mut()
            .filter(|c| c.is_pending())
            .ok_or_else(|| HmapError::NoChangeRequest("nothing pending".to_string()))
    }

    /// Approve the pending change request and apply its impact to the end
    /// date and budget.
    pub fn approve_change_request(&mut self) -> Result<Impact> {
        let cr = self.pending_change_request()?;
        cr.status = ChangeRequestStatus::Approved;
        let impact = cr.parsed_impact();
        self.end_date = impact.shift_date(self.end_date);
        self.budget = impact.adjust_budget(self.budget);
        self.touch();
        tracing::info!(project = %self.id, %impact, "change request approved");
        Ok(impact)
    }

    pub fn reject_change_request(&mut self) -> Result<()> {
        self.pending_change_request()?.status = ChangeRequestStatus::Rejected;
        self.touch();
        Ok(())
    }

    pub fn add_scenario(&mut self, name: &str, description: &str, impact: &str) -> &Scenario {
        let sc = Scenario {
            id: format!("SC{}", self.scenarios.len() + 1),
            name: name.to_string(),
            description: description.to_string(),
            impact: impact.to_string(),
        };
        self.scenarios.push(sc);
        self.touch();
        &self.scenarios[self.scenarios.len() - 1]
    }

    /// End date and budget if the scenario happened. Nothing is mutated.
    pub fn project_scenario(&self, id: &str) -> Result<ScenarioProjection> {
        let sc = self
            .scenarios
            .iter()
            .find(|s| s.id == id || s.name.eq_ignore_ascii_case(id))
            .ok_or_else(|| HmapError::ScenarioNotFound(id.to_string()))?;
        let impact = parse_impact(&sc.impact);
        Ok(ScenarioProjection {
            scenario: sc.name.clone(),
            impact,
            end_date: impact.shift_date(self.end_date),
            budget: impact.adjust_budget(self.budget),
        })
    }
}

/// Ask the model for a custom document list for `new`.
pub fn propose_documents(
    new: &NewProject,
    generator: &dyn TextGenerator,
    model: &str,
) -> Result<Vec<Document>> {
    let request = GenerationRequest {
        model: model.to_string(),
        prompt: prompt::document_list_prompt(new),
        schema: Some(prompt::document_list_schema()),
    };
    let text = generator.generate(&request)?;
    template::parse_document_list(&text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::STATEMENT_OF_WORK;
    use std::cell::RefCell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_project() -> NewProject {
        NewProject {
            id: "apollo".into(),
            name: "Apollo".into(),
            description: "Customer portal rebuild".into(),
            budget: 50_000.0,
            start_date: Some(date(2025, 1, 6)),
            end_date: Some(date(2025, 6, 30)),
            mode: ProjectMode::Fullscale,
            scope: ProjectScope::Internal,
        }
    }

    fn standard() -> Project {
        Project::from_template(new_project(), "Standard Software Project", &Config::new()).unwrap()
    }

    struct Canned {
        reply: Result<String>,
        prompts: RefCell<Vec<String>>,
    }

    impl Canned {
        fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }
        fn failing() -> Self {
            Self {
                reply: Err(HmapError::Generation("quota exceeded".into())),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Canned {
        fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.prompts.borrow_mut().push(request.prompt.clone());
            match &self.reply {
                Ok(t) => Ok(t.clone()),
                Err(e) => Err(HmapError::Generation(e.to_string())),
            }
        }
    }

    const PLAN: &str = "\
# Detailed Plans

## Tasks
| Task Name | Role | Start Date | End Date | Dependencies |
|---|---|---|---|---|
| Design | Architect | 2025-01-06 | 2025-01-17 | None |
| Build API | Developer | 2025-01-20 | 2025-02-14 | Design |
| Build UI | Developer | 2025-01-20 | 2025-02-21 | Design |
| Test | QA Engineer | 2025-02-24 | 2025-03-07 | Build API, Build UI |
";

    const TIMELINE: &str = "\
# Project Timeline

## Milestones
| Milestone | Date | Dependency | Health |
|---|---|---|---|
| Beta | 2025-03-07 | Test | On Track |
";

    fn approve_through_phase_five(p: &mut Project, rules: &PhaseConfig) {
        for title in [
            "Concept Proposal",
            "Project Charter",
            "Requirements Specification",
            RESOURCES_LIST,
        ] {
            p.approve_document(title, rules).unwrap();
        }
        p.update_content(DETAILED_PLANS, PLAN, rules).unwrap();
        p.update_content(PROJECT_TIMELINE, TIMELINE, rules).unwrap();
        p.approve_document(DETAILED_PLANS, rules).unwrap();
        p.approve_document(PROJECT_TIMELINE, rules).unwrap();
    }

    #[test]
    fn validation_collects_every_issue() {
        let bad = NewProject {
            id: "Not A Slug".into(),
            name: " ".into(),
            budget: -1.0,
            start_date: Some(date(2025, 2, 1)),
            end_date: Some(date(2025, 1, 1)),
            ..Default::default()
        };
        match bad.validate().unwrap_err() {
            HmapError::Validation(issues) => {
                let fields: Vec<&str> = issues.iter().map(|i| i.field).collect();
                assert_eq!(fields, vec!["name", "id", "budget", "end_date"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(new_project().validate().is_ok());
    }

    #[test]
    fn create_seeds_contents_and_sprints() {
        let p = standard();
        assert_eq!(p.documents.len(), 10);
        assert_eq!(p.phase_contents.len(), 10);
        assert_eq!(p.sprints.len(), 3);
        assert_eq!(p.sprints[0].start_date, date(2025, 1, 6));
        assert!(p.tasks.is_empty());
    }

    /// Phase 6 opens only once the SOW is approved, whatever the state of
    /// the other Planning documents.
    #[test]
    fn standard_template_end_to_end_unlock() {
        let rules = PhaseConfig::default();
        let mut p = standard();

        for phase in 1..=4u8 {
            assert!(!p.phase_state(phase, &rules).is_locked(), "phase {phase}");
            let titles: Vec<String> = p
                .documents_in_phase(phase)
                .iter()
                .map(|d| d.title.clone())
                .collect();
            for t in titles {
                p.approve_document(&t, &rules).unwrap();
            }
            assert_eq!(p.phase_state(phase, &rules), PhaseState::Completed);
        }

        assert!(!p.phase_state(5, &rules).is_locked());
        p.approve_document(DETAILED_PLANS, &rules).unwrap();
        p.approve_document(PROJECT_TIMELINE, &rules).unwrap();
        assert_eq!(
            p.phase_state(6, &rules).reason(),
            Some("Requires approved: Statement of Work (SOW)")
        );
        assert!(matches!(
            p.approve_document("Risk Management Plan", &rules),
            Err(HmapError::PhaseLocked { phase: 6, .. })
        ));

        p.approve_document(STATEMENT_OF_WORK, &rules).unwrap();
        assert_eq!(p.phase_state(5, &rules), PhaseState::Completed);
        assert_eq!(p.phase_state(6, &rules), PhaseState::Todo);

        p.set_document_status(STATEMENT_OF_WORK, DocumentStatus::Rejected, &rules)
            .unwrap();
        assert!(p.phase_state(6, &rules).is_locked());
    }

    #[test]
    fn locked_phase_refuses_edits() {
        let rules = PhaseConfig::default();
        let mut p = standard();
        let err = p.update_content("Project Charter", "text", &rules).unwrap_err();
        assert!(matches!(err, HmapError::PhaseLocked { phase: 2, .. }));
        p.update_content("Concept Proposal", "text", &rules).unwrap();
        assert!(p.content("D1").unwrap().has_content());
    }

    #[test]
    fn leaving_approved_resets_content_status() {
        use crate::types::ContentStatus;
        let rules = PhaseConfig::default();
        let mut p = standard();
        p.approve_document("D1", &rules).unwrap();
        assert_eq!(p.content("D1").unwrap().status, ContentStatus::Completed);
        p.set_document_status("D1", DocumentStatus::Working, &rules)
            .unwrap();
        assert_eq!(p.content("D1").unwrap().status, ContentStatus::Todo);
    }

    #[test]
    fn attachments_are_stored_as_base64() {
        let mut p = standard();
        p.attach("Concept Proposal", "notes.txt", b"hello").unwrap();
        let att = &p.content("D1").unwrap().attachments[0];
        assert_eq!(att.data, "aGVsbG8=");
        assert_eq!(att.decode().unwrap(), b"hello");
    }

    #[test]
    fn generation_success_and_failure() {
        let rules = PhaseConfig::default();
        let tracker = GenerationTracker::new();
        let mut p = standard();

        let failing = Canned::failing();
        let err = p
            .generate_document("D1", &failing, &tracker, "m", &rules)
            .unwrap_err();
        assert!(matches!(err, HmapError::Generation(_)));
        assert_eq!(p.documents[0].status, DocumentStatus::Failed);
        assert!(!tracker.is_busy("D1"));

        let ok = Canned::ok("# Concept\nA portal.");
        p.generate_document("D1", &ok, &tracker, "m", &rules).unwrap();
        assert_eq!(p.documents[0].status, DocumentStatus::Working);
        assert_eq!(p.content("D1").unwrap().content, "# Concept\nA portal.");
        assert!(ok.prompts.borrow()[0].contains("Apollo"));

        assert!(matches!(
            p.generate_document("D2", &ok, &tracker, "m", &rules),
            Err(HmapError::PhaseLocked { .. })
        ));
    }

    #[test]
    fn import_requires_approved_plans() {
        let mut p = standard();
        assert!(matches!(p.import_plan(false), Err(HmapError::PlanNotReady(_))));
    }

    #[test]
    fn import_then_cascade_notifies_once() {
        let rules = PhaseConfig::default();
        let mut p = standard();
        approve_through_phase_five(&mut p, &rules);

        let report = p.import_plan(false).unwrap();
        assert!(report.applied);
        assert_eq!(report.tasks, 4);
        assert_eq!(report.milestones, 1);
        assert!(report.issues.is_empty());
        assert_eq!(p.tasks[3].depends_on, vec!["T2", "T3"]);
        assert_eq!(p.tasks[0].sprint_id.as_deref(), Some("S1"));

        p.assign_role("QA Engineer", "Quinn", "quinn@example.com");
        p.set_task_status("T1", TaskStatus::Done).unwrap();
        p.set_task_status("T2", TaskStatus::Done).unwrap();
        assert!(p.notifications.is_empty());

        let out = p.set_task_status("T3", TaskStatus::Done).unwrap();
        assert_eq!(out.unblocked, vec!["T4"]);
        assert_eq!(p.notifications.len(), 1);
        assert!(p.tasks[2].actual_end_date.is_some());

        let again = p.set_task_status("T3", TaskStatus::Done).unwrap();
        assert!(again.unblocked.is_empty());
        assert_eq!(p.notifications.len(), 1);

        let kept = p.import_plan(false).unwrap();
        assert!(!kept.applied);
        assert!(p.tasks[0].is_done());
        let forced = p.import_plan(true).unwrap();
        assert!(forced.applied);
        assert!(!p.tasks[0].is_done());
    }

    #[test]
    fn forced_reimport_uses_fresh_ids_and_notifies() {
        let rules = PhaseConfig::default();
        let mut p = standard();
        approve_through_phase_five(&mut p, &rules);
        p.assign_role("Developer", "Dana", "dana@example.com");
        p.import_plan(false).unwrap();
        p.set_task_status("T1", TaskStatus::Done).unwrap();
        assert_eq!(p.notifications.len(), 2);

        p.import_plan(true).unwrap();
        let ids: Vec<&str> = p.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T5", "T6", "T7", "T8"]);
        assert_eq!(p.tasks[1].depends_on, vec!["T5"]);
        assert_eq!(p.task_seq, 8);

        let out = p.set_task_status("T5", TaskStatus::Done).unwrap();
        assert_eq!(out.unblocked, vec!["T6", "T7"]);
        assert_eq!(out.queued.len(), 2);
        assert_eq!(p.notifications.len(), 4);
    }

    #[test]
    fn dependency_edits_must_name_other_tasks() {
        let rules = PhaseConfig::default();
        let mut p = standard();
        approve_through_phase_five(&mut p, &rules);
        p.import_plan(false).unwrap();

        let deps = |ids: &[&str]| TaskUpdate {
            depends_on: Some(ids.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        };
        assert!(matches!(
            p.update_task("T1", deps(&["T1"])),
            Err(HmapError::InvalidDependency { ref dependency, .. }) if dependency == "T1"
        ));
        assert!(matches!(
            p.update_task("T1", deps(&["T2", "T99"])),
            Err(HmapError::InvalidDependency { ref dependency, reason: "no such task", .. }) if dependency == "T99"
        ));
        assert!(p.tasks[0].depends_on.is_empty());

        p.update_task("T4", deps(&["T1"])).unwrap();
        assert_eq!(p.tasks[3].depends_on, vec!["T1"]);
    }

    #[test]
    fn status_changes_respect_the_phase_gate() {
        let rules = PhaseConfig::default();
        let mut p = standard();
        assert!(matches!(
            p.reject_document("Project Charter", &rules),
            Err(HmapError::PhaseLocked { phase: 2, .. })
        ));
        assert_eq!(p.document("D2").unwrap().status, DocumentStatus::Working);
        p.reject_document("Concept Proposal", &rules).unwrap();
    }

    #[test]
    fn change_request_lifecycle() {
        let mut p = standard();
        assert!(matches!(
            p.approve_change_request(),
            Err(HmapError::NoChangeRequest(_))
        ));

        p.submit_change_request("Add SSO", "Customer ask", "+10d +2,500c")
            .unwrap();
        assert!(p.submit_change_request("Another", "", "+1d").is_err());

        let impact = p.approve_change_request().unwrap();
        assert_eq!(impact, Impact { days: 10, cost: 2500 });
        assert_eq!(p.end_date, date(2025, 7, 10));
        assert_eq!(p.budget, 52_500.0);

        let next = p.submit_change_request("Drop reports", "", "-5d -1000c").unwrap();
        assert_eq!(next.id, "CR2");
        p.reject_change_request().unwrap();
        assert_eq!(p.budget, 52_500.0);
        assert_eq!(p.change_history.len(), 1);
    }

    #[test]
    fn scenarios_do_not_mutate() {
        let mut p = standard();
        let id = p.add_scenario("Vendor slip", "", "+20d +8000c").id.clone();
        let proj = p.project_scenario(&id).unwrap();
        assert_eq!(proj.end_date, date(2025, 7, 20));
        assert_eq!(proj.budget, 58_000.0);
        assert_eq!(p.budget, 50_000.0);
        assert!(p.project_scenario("SC9").is_err());
    }

    #[test]
    fn roles_come_from_resources_document() {
        let rules = PhaseConfig::default();
        let mut p = standard();
        for t in ["Concept Proposal", "Project Charter", "Requirements Specification"] {
            p.approve_document(t, &rules).unwrap();
        }
        p.update_content(
            RESOURCES_LIST,
            "# Resources & Skills List\n\n## Roles\n- **Architect**: system design\n- Developer (2)\n",
            &rules,
        )
        .unwrap();
        assert_eq!(p.roles(), vec!["Architect", "Developer"]);
    }

    #[test]
    fn propose_documents_parses_model_reply() {
        let gen = Canned::ok(r#"[{"title":"Vision","phase":1},{"title":"Backlog","phase":3}]"#);
        let docs = propose_documents(&new_project(), &gen, "m").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id, "D2");
        assert_eq!(docs[1].phase, 3);
    }
}
