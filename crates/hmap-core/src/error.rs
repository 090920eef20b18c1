use crate::project::ValidationIssue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HmapError {
    #[error("not initialized: run 'hmap init'")]
    NotInitialized,

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("milestone not found: {0}")]
    MilestoneNotFound(String),

    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("invalid dependency {dependency} for {task}: {reason}")]
    InvalidDependency {
        task: String,
        dependency: String,
        reason: &'static str,
    },

    #[error("phase {phase} is locked: {reason}")]
    PhaseLocked { phase: u8, reason: String },

    #[error("plan not ready: {0}")]
    PlanNotReady(String),

    #[error("no change request: {0}")]
    NoChangeRequest(String),

    #[error("validation failed: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("generation already running for document {0}")]
    GenerationInFlight(String),

    #[error("malformed document list: {0}")]
    MalformedDocumentList(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, HmapError>;
