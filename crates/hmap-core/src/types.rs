use crate::error::HmapError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of phases in the HMAP methodology.
pub const PHASE_COUNT: u8 = 9;

// ---------------------------------------------------------------------------
// DocumentStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Working,
    Approved,
    Rejected,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Working => "working",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = HmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working" => Ok(DocumentStatus::Working),
            "approved" => Ok(DocumentStatus::Approved),
            "rejected" => Ok(DocumentStatus::Rejected),
            "failed" => Ok(DocumentStatus::Failed),
            _ => Err(HmapError::InvalidValue {
                field: "document status",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Todo,
    Completed,
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStatus::Todo => f.write_str("todo"),
            ContentStatus::Completed => f.write_str("completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Review,
            TaskStatus::Done,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inprogress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = HmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" | "to do" => Ok(TaskStatus::Todo),
            "inprogress" | "in_progress" | "in-progress" | "in progress" => {
                Ok(TaskStatus::InProgress)
            }
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            _ => Err(HmapError::InvalidValue {
                field: "task status",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MilestoneHealth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneHealth {
    #[default]
    OnTrack,
    AtRisk,
    Delayed,
}

impl MilestoneHealth {
    /// Lenient parse used for AI-authored table cells. Unknown text maps to `None`.
    pub fn parse_loose(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "ontrack" => Some(MilestoneHealth::OnTrack),
            "atrisk" => Some(MilestoneHealth::AtRisk),
            "delayed" | "late" => Some(MilestoneHealth::Delayed),
            _ => None,
        }
    }
}

impl fmt::Display for MilestoneHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MilestoneHealth::OnTrack => "On Track",
            MilestoneHealth::AtRisk => "At Risk",
            MilestoneHealth::Delayed => "Delayed",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for MilestoneHealth {
    type Err = HmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| HmapError::InvalidValue {
            field: "milestone health",
            value: s.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// ProjectMode / ProjectScope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectMode {
    #[default]
    Fullscale,
    Minimal,
}

impl fmt::Display for ProjectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectMode::Fullscale => f.write_str("fullscale"),
            ProjectMode::Minimal => f.write_str("minimal"),
        }
    }
}

impl std::str::FromStr for ProjectMode {
    type Err = HmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fullscale" => Ok(ProjectMode::Fullscale),
            "minimal" => Ok(ProjectMode::Minimal),
            _ => Err(HmapError::InvalidValue {
                field: "mode",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectScope {
    #[default]
    Internal,
    Subcontracted,
}

impl fmt::Display for ProjectScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectScope::Internal => f.write_str("internal"),
            ProjectScope::Subcontracted => f.write_str("subcontracted"),
        }
    }
}

impl std::str::FromStr for ProjectScope {
    type Err = HmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(ProjectScope::Internal),
            "subcontracted" => Ok(ProjectScope::Subcontracted),
            _ => Err(HmapError::InvalidValue {
                field: "scope",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// What the advisor suggests doing next on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ReviewNotification,
    DecideChangeRequest,
    RetryGeneration,
    ReviseDocument,
    ImportPlan,
    GenerateDocument,
    ApproveDocument,
    WorkTasks,
    Done,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::ReviewNotification => "review_notification",
            ActionType::DecideChangeRequest => "decide_change_request",
            ActionType::RetryGeneration => "retry_generation",
            ActionType::ReviseDocument => "revise_document",
            ActionType::ImportPlan => "import_plan",
            ActionType::GenerateDocument => "generate_document",
            ActionType::ApproveDocument => "approve_document",
            ActionType::WorkTasks => "work_tasks",
            ActionType::Done => "done",
        }
    }

    /// True for actions that call the AI service.
    pub fn calls_model(self) -> bool {
        matches!(
            self,
            ActionType::RetryGeneration | ActionType::GenerateDocument
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
