//! HMAP phase catalogue, phase gating defaults and project templates.

use crate::document::Document;
use crate::error::{HmapError, Result};
use crate::types::PHASE_COUNT;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DETAILED_PLANS: &str = "Detailed Plans";
pub const PROJECT_TIMELINE: &str = "Project Timeline";
pub const RESOURCES_LIST: &str = "Resources & Skills List";
pub const STATEMENT_OF_WORK: &str = "Statement of Work (SOW)";

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PhaseInfo {
    pub number: u8,
    pub name: &'static str,
    pub summary: &'static str,
}

pub const PHASES: [PhaseInfo; PHASE_COUNT as usize] = [
    PhaseInfo {
        number: 1,
        name: "Initiation",
        summary: "Frame the idea, the business case and the sponsor",
    },
    PhaseInfo {
        number: 2,
        name: "Definition",
        summary: "Charter the project: objectives, scope, governance",
    },
    PhaseInfo {
        number: 3,
        name: "Requirements",
        summary: "Capture functional and non-functional requirements",
    },
    PhaseInfo {
        number: 4,
        name: "Resourcing",
        summary: "Identify roles, skills, tools and partners",
    },
    PhaseInfo {
        number: 5,
        name: "Planning",
        summary: "Break the work down, schedule it and contract it",
    },
    PhaseInfo {
        number: 6,
        name: "Risk Management",
        summary: "Identify, rate and mitigate delivery risks",
    },
    PhaseInfo {
        number: 7,
        name: "Quality",
        summary: "Define acceptance criteria and the QA approach",
    },
    PhaseInfo {
        number: 8,
        name: "Closure",
        summary: "Hand over deliverables and close contracts",
    },
    PhaseInfo {
        number: 9,
        name: "Review",
        summary: "Retrospective and lessons learned",
    },
];

pub fn phase_info(number: u8) -> Option<&'static PhaseInfo> {
    PHASES.iter().find(|p| p.number == number)
}

pub fn phase_name(number: u8) -> &'static str {
    phase_info(number).map(|p| p.name).unwrap_or("Unknown")
}

/// Titles that must be approved before each phase opens.
pub fn default_phase_requirements() -> BTreeMap<u8, Vec<String>> {
    let table: [(u8, &[&str]); PHASE_COUNT as usize] = [
        (1, &[]),
        (2, &["Concept Proposal"]),
        (3, &["Project Charter"]),
        (4, &["Requirements Specification"]),
        (5, &[RESOURCES_LIST]),
        (6, &[STATEMENT_OF_WORK]),
        (7, &["Risk Management Plan"]),
        (8, &["Quality Assurance Plan"]),
        (9, &["Project Closure Report"]),
    ];
    table
        .iter()
        .map(|(phase, titles)| (*phase, titles.iter().map(|t| t.to_string()).collect()))
        .collect()
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Template {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub documents: &'static [(&'static str, u8)],
}

const STANDARD_DOCUMENTS: &[(&str, u8)] = &[
    ("Concept Proposal", 1),
    ("Project Charter", 2),
    ("Requirements Specification", 3),
    (RESOURCES_LIST, 4),
    (DETAILED_PLANS, 5),
    (PROJECT_TIMELINE, 5),
    (STATEMENT_OF_WORK, 5),
    ("Risk Management Plan", 6),
    ("Quality Assurance Plan", 7),
    ("Project Closure Report", 8),
];

const MINIMAL_DOCUMENTS: &[(&str, u8)] = &[
    ("Concept Proposal", 1),
    ("Project Charter", 2),
    ("Requirements Specification", 3),
    (RESOURCES_LIST, 4),
    (DETAILED_PLANS, 5),
    (PROJECT_TIMELINE, 5),
];

pub const TEMPLATES: &[Template] = &[
    Template {
        key: "standard",
        name: "Standard Software Project",
        description: "Full document set for a software delivery project",
        documents: STANDARD_DOCUMENTS,
    },
    Template {
        key: "minimal",
        name: "Minimal Project",
        description: "Core planning documents only",
        documents: MINIMAL_DOCUMENTS,
    },
];

/// Look a template up by key or by display name (case-insensitive).
pub fn find_template(name: &str) -> Result<&'static Template> {
    let name = name.trim();
    TEMPLATES
        .iter()
        .find(|t| t.key.eq_ignore_ascii_case(name) || t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| HmapError::TemplateNotFound(name.to_string()))
}

impl Template {
    pub fn instantiate(&self) -> Vec<Document> {
        documents_from_list(self.documents.iter().map(|(t, p)| (t.to_string(), *p)))
    }
}

pub fn documents_from_list(entries: impl IntoIterator<Item = (String, u8)>) -> Vec<Document> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (title, phase))| Document::new(format!("D{}", i + 1), title, phase))
        .collect()
}

// ---------------------------------------------------------------------------
// AI-generated document lists
// ---------------------------------------------------------------------------

/// Parse an AI-generated document list: a JSON array of `{ "title", "phase" }`,
/// optionally fenced in a code block or wrapped in `{ "documents": [...] }`.
pub fn parse_document_list(text: &str) -> Result<Vec<Document>> {
    let json = strip_code_fence(text);
    let value: Value = serde_json::from_str(json)
        .map_err(|e| HmapError::MalformedDocumentList(e.to_string()))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("documents") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(HmapError::MalformedDocumentList(
                    "expected an array or an object with a 'documents' array".to_string(),
                ))
            }
        },
        _ => {
            return Err(HmapError::MalformedDocumentList(
                "expected a JSON array".to_string(),
            ))
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let title = item
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if title.is_empty() {
            return Err(HmapError::MalformedDocumentList(format!(
                "entry {} has no title",
                i + 1
            )));
        }
        let phase = item.get("phase").and_then(|p| match p {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        match phase {
            Some(p) if (1..=PHASE_COUNT as u64).contains(&p) => {
                entries.push((title.to_string(), p as u8))
            }
            _ => {
                return Err(HmapError::MalformedDocumentList(format!(
                    "entry '{title}' has no phase in 1..={PHASE_COUNT}"
                )))
            }
        }
    }

    if entries.is_empty() {
        return Err(HmapError::MalformedDocumentList(
            "document list is empty".to_string(),
        ));
    }
    Ok(documents_from_list(entries))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_template_shape() {
        let t = find_template("Standard Software Project").unwrap();
        let docs = t.instantiate();
        assert_eq!(docs.len(), 10);
        let phases: std::collections::BTreeSet<u8> = docs.iter().map(|d| d.phase).collect();
        assert_eq!(phases, (1..=8).collect());
        assert_eq!(docs[0].id, "D1");
        assert_eq!(docs[9].id, "D10");
    }

    #[test]
    fn find_template_by_key() {
        assert_eq!(find_template("minimal").unwrap().documents.len(), 6);
        assert!(find_template("waterfall").is_err());
    }

    #[test]
    fn requirements_cover_all_phases() {
        let req = default_phase_requirements();
        assert_eq!(req.len(), 9);
        assert!(req[&1].is_empty());
        assert_eq!(req[&6], vec![STATEMENT_OF_WORK.to_string()]);
    }

    #[test]
    fn phase_names() {
        assert_eq!(phase_name(5), "Planning");
        assert_eq!(phase_name(42), "Unknown");
    }

    #[test]
    fn parse_document_list_plain_and_fenced() {
        let plain = r#"[{"title":"Vision","phase":1},{"title":"Budget","phase":"2"}]"#;
        let docs = parse_document_list(plain).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].phase, 2);

        let fenced = "```json\n{\"documents\":[{\"title\":\"Vision\",\"phase\":1}]}\n```";
        let docs = parse_document_list(fenced).unwrap();
        assert_eq!(docs[0].title, "Vision");
    }

    #[test]
    fn parse_document_list_rejects_bad_entries() {
        assert!(parse_document_list("not json").is_err());
        assert!(parse_document_list("[]").is_err());
        assert!(parse_document_list(r#"[{"title":"X","phase":10}]"#).is_err());
        assert!(parse_document_list(r#"[{"title":"  ","phase":1}]"#).is_err());
    }
}
