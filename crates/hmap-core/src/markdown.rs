//! Lenient extraction of tables and bullet lists from AI-authored Markdown.
//!
//! Nothing in this module fails: text that does not have the expected shape
//! degrades to an empty result. [`ParseOutcome`] keeps "no table at all"
//! apart from "a table with zero usable rows" so callers can report the two
//! cases differently.

use serde::Serialize;
use std::collections::BTreeMap;

/// One table row keyed by normalized column header.
pub type Record = BTreeMap<String, String>;

/// Heading keywords that introduce a roles/resources bullet list.
pub const ROLE_KEYWORDS: &[&str] = &[
    "roles",
    "personnel",
    "team members",
    "resources",
    "software",
    "hardware",
    "partners",
    "tools",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseOutcome {
    /// A header and separator were found. `skipped` counts data rows whose
    /// cell count did not match the header.
    Table { records: Vec<Record>, skipped: usize },
    NoTable,
}

impl ParseOutcome {
    pub fn records(&self) -> &[Record] {
        match self {
            ParseOutcome::Table { records, .. } => records,
            ParseOutcome::NoTable => &[],
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            ParseOutcome::Table { records, .. } => records,
            ParseOutcome::NoTable => Vec::new(),
        }
    }

    pub fn skipped(&self) -> usize {
        match self {
            ParseOutcome::Table { skipped, .. } => *skipped,
            ParseOutcome::NoTable => 0,
        }
    }

    pub fn found(&self) -> bool {
        matches!(self, ParseOutcome::Table { .. })
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Lowercase, collapse every run of non-alphanumerics to `_`, trim `_`.
pub fn normalize_header(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut pending_sep = false;
    for c in cell.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

fn is_separator(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty()
        && t.contains('-')
        && t.chars()
            .all(|c| matches!(c, '|' | '-' | ':') || c.is_whitespace())
}

fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn split_row(line: &str) -> Vec<String> {
    let t = line.trim();
    let t = t.strip_prefix('|').unwrap_or(t);
    let t = t.strip_suffix('|').unwrap_or(t);
    t.split('|').map(|c| c.trim().to_string()).collect()
}

/// Parse the first Markdown table in `text`.
pub fn parse_table(text: &str) -> ParseOutcome {
    let lines: Vec<&str> = text.lines().collect();

    let Some(header_idx) = lines
        .windows(2)
        .position(|w| w[0].contains('|') && is_separator(w[1]))
    else {
        tracing::debug!("no markdown table found");
        return ParseOutcome::NoTable;
    };

    let header: Vec<String> = split_row(lines[header_idx])
        .iter()
        .map(|c| normalize_header(c))
        .collect();

    let mut records = Vec::new();
    let mut skipped = 0;
    for line in &lines[header_idx + 2..] {
        let t = line.trim();
        if t.is_empty() || is_heading(t) || !t.contains('|') {
            break;
        }
        let cells = split_row(t);
        if cells.len() != header.len() {
            skipped += 1;
            continue;
        }
        records.push(header.iter().cloned().zip(cells).collect());
    }

    if skipped > 0 {
        tracing::debug!(skipped, kept = records.len(), "skipped malformed table rows");
    }
    ParseOutcome::Table { records, skipped }
}

/// First non-empty value among `keys`.
pub fn field<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn heading_text(line: &str) -> String {
    line.trim_start()
        .trim_start_matches('#')
        .replace("**", "")
        .trim_start_matches(|c: char| !c.is_alphabetic())
        .trim()
        .to_lowercase()
}

/// Body of the first `##` section whose heading starts with `keyword`.
pub fn extract_section<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let keyword = keyword.to_lowercase();
    let mut offset = 0;
    let mut body_start: Option<usize> = None;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if !line.trim_start().starts_with("##") {
            continue;
        }
        if let Some(start) = body_start {
            return Some(&text[start..line_start]);
        }
        if heading_text(line).starts_with(&keyword) {
            body_start = Some(offset);
        }
    }

    body_start.map(|start| &text[start..])
}

/// Table from the first section matching `keyword`; `NoTable` if the
/// section is missing.
pub fn parse_section_table(text: &str, keyword: &str) -> ParseOutcome {
    match extract_section(text, keyword) {
        Some(section) => parse_table(section),
        None => {
            tracing::debug!(keyword, "section not found");
            ParseOutcome::NoTable
        }
    }
}

// ---------------------------------------------------------------------------
// Bullet lists
// ---------------------------------------------------------------------------

fn bullet_body(line: &str) -> Option<&str> {
    let t = line.trim_start();
    t.strip_prefix("- ")
        .or_else(|| t.strip_prefix("* "))
        .or_else(|| t.strip_prefix("-\t"))
        .or_else(|| t.strip_prefix("*\t"))
}

fn item_name(body: &str) -> String {
    body.split([':', '('])
        .next()
        .unwrap_or_default()
        .replace("**", "")
        .trim()
        .to_string()
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !name.is_empty() && !names.contains(&name) {
        names.push(name);
    }
}

/// Names from the bullet list under the first heading that contains one of
/// `keywords` and has bullets beneath it. Without such a heading, the first
/// contiguous bullet list in the text is used instead.
pub fn extract_list_items(text: &str, keywords: &[&str]) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut names = Vec::new();

    let matching_headings = lines.iter().enumerate().filter(|(_, l)| {
        is_heading(l) && {
            let h = l
                .trim_start_matches(|c: char| c == '#' || c.is_whitespace())
                .to_lowercase();
            keywords.iter().any(|k| h.contains(k))
        }
    });

    for (idx, _) in matching_headings {
        for line in &lines[idx + 1..] {
            if is_heading(line) {
                break;
            }
            if let Some(body) = bullet_body(line) {
                push_unique(&mut names, item_name(body));
            }
        }
        if !names.is_empty() {
            return names;
        }
    }

    let Some(first) = lines.iter().position(|l| bullet_body(l).is_some()) else {
        return names;
    };
    for line in &lines[first..] {
        if line.trim().is_empty() {
            break;
        }
        if let Some(body) = bullet_body(line) {
            push_unique(&mut names, item_name(body));
        }
    }
    names
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PLAN: &str = "\
# Detailed Plans

Intro paragraph.

## WBS
1. Discovery
2. Build

## Tasks
| Task Name | Role | Dependencies |
|-----------|:----:|--------------|
| Gather requirements | Business Analyst | |
| Design schema | Architect | Gather requirements |
| Broken row | only two |
| Build API | Developer | Design schema, Gather requirements |

## Milestones
| Milestone | Date |
|---|---|
| Design sign-off | 2025-03-01 |
";

    #[test]
    fn normalize_headers() {
        assert_eq!(normalize_header("Task Name"), "task_name");
        assert_eq!(normalize_header("  A "), "a");
        assert_eq!(normalize_header("Start Date (planned)"), "start_date_planned");
        assert_eq!(normalize_header("**Role**"), "role");
    }

    #[test]
    fn simple_table() {
        let text = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n";
        let outcome = parse_table(text);
        let records = outcome.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["a"], "1");
        assert_eq!(records[1]["b"], "4");
        assert_eq!(outcome.skipped(), 0);
    }

    #[test]
    fn no_table_is_distinct_from_empty_table() {
        assert_eq!(parse_table("just prose\nno pipes"), ParseOutcome::NoTable);

        let header_only = parse_table("| A | B |\n| --- | --- |\n\nafter");
        assert!(header_only.found());
        assert!(header_only.records().is_empty());
    }

    #[test]
    fn pipe_line_without_separator_is_not_a_header() {
        let text = "a | b\nnot a separator\n| X |\n|:--|\n| y |\n";
        let records = parse_table(text).into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["x"], "y");
    }

    #[test]
    fn rows_stop_at_blank_heading_or_prose() {
        let text = "| A |\n|---|\n| 1 |\n\n| 2 |\n";
        assert_eq!(parse_table(text).records().len(), 1);

        let text = "| A |\n|---|\n| 1 |\n## Next\n| 2 |\n";
        assert_eq!(parse_table(text).records().len(), 1);
    }

    #[test]
    fn empty_cells_count_as_fields() {
        let text = "| A | B |\n|---|---|\n| 1 | |\n";
        let records = parse_table(text).into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["b"], "");
    }

    #[test]
    fn section_table_selects_by_heading() {
        let tasks = parse_section_table(PLAN, "tasks");
        assert_eq!(tasks.records().len(), 3);
        assert_eq!(tasks.skipped(), 1);
        assert_eq!(tasks.records()[2]["task_name"], "Build API");

        let milestones = parse_section_table(PLAN, "milestones");
        assert_eq!(milestones.records().len(), 1);
        assert_eq!(milestones.records()[0]["date"], "2025-03-01");

        assert_eq!(parse_section_table(PLAN, "risks"), ParseOutcome::NoTable);
        assert_eq!(parse_section_table(PLAN, "wbs"), ParseOutcome::NoTable);
    }

    #[test]
    fn section_heading_tolerates_numbering_and_bold() {
        let text = "## 2. **Tasks**\n| A |\n|---|\n| x |\n";
        assert_eq!(parse_section_table(text, "tasks").records().len(), 1);
    }

    #[test]
    fn first_matching_section_wins() {
        let text = "## Tasks\n| A |\n|---|\n| first |\n## Tasks (again)\n| A |\n|---|\n| second |\n";
        let records = parse_section_table(text, "tasks").into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["a"], "first");
    }

    #[test]
    fn section_extends_to_eof() {
        let body = extract_section("## Milestones\nline one\nline two", "milestones").unwrap();
        assert_eq!(body, "line one\nline two");
    }

    #[test]
    fn field_prefers_first_non_empty_alias() {
        let mut r = Record::new();
        r.insert("task".into(), " ".into());
        r.insert("name".into(), "Deploy".into());
        assert_eq!(field(&r, &["task_name", "task", "name"]), Some("Deploy"));
        assert_eq!(field(&r, &["role"]), None);
    }

    #[test]
    fn role_list_under_heading() {
        let text = "\
# Resources & Skills List

Some intro.

## Roles
- **Project Manager**: owns the schedule
- Backend Developer (2 FTE)
* QA Engineer
- Project Manager: duplicate

## Software
- PostgreSQL
";
        let roles = extract_list_items(text, ROLE_KEYWORDS);
        assert_eq!(roles, vec!["Project Manager", "Backend Developer", "QA Engineer"]);
    }

    #[test]
    fn role_list_falls_back_to_first_bullets() {
        let text = "Team:\n- Designer: UX\n- Tester\n\n- Not included\n";
        assert_eq!(extract_list_items(text, ROLE_KEYWORDS), vec!["Designer", "Tester"]);
    }

    #[test]
    fn role_list_empty_input() {
        assert!(extract_list_items("", ROLE_KEYWORDS).is_empty());
        assert!(extract_list_items("## Roles\nnone listed\n", ROLE_KEYWORDS).is_empty());
    }

    fn cell() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9][a-zA-Z0-9 ]{0,10}".prop_map(|s| s.trim().to_string())
    }

    proptest! {
        #[test]
        fn well_formed_rows_all_parse(rows in prop::collection::vec((cell(), cell()), 0..20)) {
            let mut text = String::from("| A | B |\n| --- | --- |\n");
            for (a, b) in &rows {
                text.push_str(&format!("| {a} | {b} |\n"));
            }
            let records = parse_table(&text).into_records();
            prop_assert_eq!(records.len(), rows.len());
            for (record, (a, b)) in records.iter().zip(&rows) {
                prop_assert_eq!(record.len(), 2);
                prop_assert_eq!(&record["a"], a);
                prop_assert_eq!(&record["b"], b);
            }
        }

        #[test]
        fn malformed_rows_are_dropped(
            good in 0usize..10,
            bad in 0usize..10,
        ) {
            let mut text = String::from("| A | B |\n|---|---|\n");
            for i in 0..good.max(bad) {
                if i < good {
                    text.push_str(&format!("| g{i} | x |\n"));
                }
                if i < bad {
                    text.push_str(&format!("| b{i} | x | extra |\n"));
                }
            }
            let outcome = parse_table(&text);
            prop_assert_eq!(outcome.records().len(), good);
            prop_assert_eq!(outcome.skipped(), bad);
        }
    }
}
