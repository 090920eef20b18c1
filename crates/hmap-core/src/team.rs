use crate::markdown::{self, ROLE_KEYWORDS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAssignment {
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl TeamAssignment {
    /// Both a name and an email are needed to notify someone.
    pub fn is_reachable(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }
}

/// Role names listed in the resources document.
pub fn derive_roles(resources_content: &str) -> Vec<String> {
    markdown::extract_list_items(resources_content, ROLE_KEYWORDS)
}

/// Exact, case-sensitive role match.
pub fn assignment_for<'a>(team: &'a [TeamAssignment], role: &str) -> Option<&'a TeamAssignment> {
    team.iter().find(|a| a.role == role)
}

/// Insert or replace the assignment for `role`.
pub fn assign(team: &mut Vec<TeamAssignment>, role: &str, name: &str, email: &str) {
    let entry = TeamAssignment {
        role: role.to_string(),
        name: name.to_string(),
        email: email.to_string(),
    };
    match team.iter_mut().find(|a| a.role == role) {
        Some(existing) => *existing = entry,
        None => team.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_match_is_case_sensitive() {
        let mut team = Vec::new();
        assign(&mut team, "Developer", "Ada", "ada@example.com");
        assert!(assignment_for(&team, "Developer").is_some());
        assert!(assignment_for(&team, "developer").is_none());
    }

    #[test]
    fn assign_replaces_existing() {
        let mut team = Vec::new();
        assign(&mut team, "QA", "Bo", "");
        assign(&mut team, "QA", "Cy", "cy@example.com");
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].name, "Cy");
        assert!(team[0].is_reachable());
    }

    #[test]
    fn roles_from_resources_document() {
        let doc = "## Personnel\n- **Architect**: design\n- Tester (0.5 FTE)\n";
        assert_eq!(derive_roles(doc), vec!["Architect", "Tester"]);
    }
}
