use crate::types::{ContentStatus, DocumentStatus};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OWNER: &str = "Project Manager";
pub const DEFAULT_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub version: String,
    pub status: DocumentStatus,
    pub owner: String,
    pub phase: u8,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, phase: u8) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            version: DEFAULT_VERSION.to_string(),
            status: DocumentStatus::Working,
            owner: DEFAULT_OWNER.to_string(),
            phase,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == DocumentStatus::Approved
    }

    /// Case-insensitive match on id or title, used for CLI lookups.
    pub fn matches(&self, key: &str) -> bool {
        self.id.eq_ignore_ascii_case(key) || self.title.eq_ignore_ascii_case(key.trim())
    }
}

// ---------------------------------------------------------------------------
// PhaseContent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    /// Base64-encoded file bytes.
    pub data: String,
}

impl Attachment {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Option<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseContent {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl PhaseContent {
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Replace the content. Any edit invalidates earlier completion.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.status = ContentStatus::Todo;
    }

    pub fn mark_completed(&mut self) {
        self.status = ContentStatus::Completed;
    }

    pub fn reset(&mut self) {
        self.status = ContentStatus::Todo;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_defaults() {
        let d = Document::new("D1", "Concept Proposal", 1);
        assert_eq!(d.status, DocumentStatus::Working);
        assert_eq!(d.version, "1.0");
        assert_eq!(d.owner, DEFAULT_OWNER);
        assert!(!d.is_approved());
    }

    #[test]
    fn matches_id_or_title() {
        let d = Document::new("D7", "Statement of Work (SOW)", 5);
        assert!(d.matches("d7"));
        assert!(d.matches("statement of work (sow)"));
        assert!(!d.matches("SOW"));
    }

    #[test]
    fn content_edit_resets_completion() {
        let mut pc = PhaseContent::default();
        pc.set_content("draft");
        pc.mark_completed();
        assert_eq!(pc.status, ContentStatus::Completed);

        pc.set_content("revised");
        assert_eq!(pc.status, ContentStatus::Todo);
        assert_eq!(pc.content, "revised");
    }

    #[test]
    fn attachment_base64() {
        let a = Attachment::from_bytes("notes.txt", b"hello");
        assert_eq!(a.data, "aGVsbG8=");
        assert_eq!(a.decode().unwrap(), b"hello");
    }
}
