//! Phase and document gating.
//!
//! A phase is either locked (with the titles still outstanding), open with
//! work left (`Todo`), or `Completed` when it holds at least one document
//! and every one of them is approved. Exactly one [`UnlockRule`] decides
//! locking per evaluation.

use crate::config::{PhaseConfig, UnlockRule};
use crate::document::Document;
use crate::error::{HmapError, Result};
use crate::template;
use crate::types::PHASE_COUNT;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PhaseState {
    Locked {
        reason: String,
        outstanding: Vec<String>,
    },
    Todo,
    Completed,
}

impl PhaseState {
    pub fn is_locked(&self) -> bool {
        matches!(self, PhaseState::Locked { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhaseState::Locked { .. } => "locked",
            PhaseState::Todo => "todo",
            PhaseState::Completed => "completed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            PhaseState::Locked { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStatus {
    pub number: u8,
    pub name: &'static str,
    #[serde(flatten)]
    pub state: PhaseState,
    pub documents: Vec<String>,
}

fn title_approved(documents: &[Document], title: &str) -> bool {
    documents.iter().any(|d| d.title == title && d.is_approved())
}

/// Titles blocking `phase`, in requirement order. Empty means unlocked.
pub fn outstanding_titles(phase: u8, documents: &[Document], rules: &PhaseConfig) -> Vec<String> {
    match rules.unlock_rule {
        UnlockRule::RequiredDocuments => rules
            .required_for(phase)
            .iter()
            .filter(|title| !title_approved(documents, title))
            .cloned()
            .collect(),
        UnlockRule::PreviousPhase => {
            if phase <= 1 {
                return Vec::new();
            }
            documents
                .iter()
                .filter(|d| d.phase == phase - 1 && !d.is_approved())
                .map(|d| d.title.clone())
                .collect()
        }
    }
}

pub fn phase_state(phase: u8, documents: &[Document], rules: &PhaseConfig) -> PhaseState {
    let outstanding = outstanding_titles(phase, documents, rules);
    if !outstanding.is_empty() {
        return PhaseState::Locked {
            reason: format!("Requires approved: {}", outstanding.join(", ")),
            outstanding,
        };
    }

    let mut in_phase = documents.iter().filter(|d| d.phase == phase).peekable();
    if in_phase.peek().is_some() && in_phase.all(Document::is_approved) {
        PhaseState::Completed
    } else {
        PhaseState::Todo
    }
}

/// Locked with the phase's reason, `Completed` once approved, else `Todo`.
pub fn document_state(doc: &Document, documents: &[Document], rules: &PhaseConfig) -> PhaseState {
    match phase_state(doc.phase, documents, rules) {
        locked @ PhaseState::Locked { .. } => locked,
        _ if doc.is_approved() => PhaseState::Completed,
        _ => PhaseState::Todo,
    }
}

pub fn phase_statuses(documents: &[Document], rules: &PhaseConfig) -> Vec<PhaseStatus> {
    (1..=PHASE_COUNT)
        .map(|number| PhaseStatus {
            number,
            name: template::phase_name(number),
            state: phase_state(number, documents, rules),
            documents: documents
                .iter()
                .filter(|d| d.phase == number)
                .map(|d| d.id.clone())
                .collect(),
        })
        .collect()
}

/// Error with the lock reason when `phase` is not open for edits.
pub fn ensure_unlocked(phase: u8, documents: &[Document], rules: &PhaseConfig) -> Result<()> {
    match phase_state(phase, documents, rules) {
        PhaseState::Locked { reason, .. } => Err(HmapError::PhaseLocked { phase, reason }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
