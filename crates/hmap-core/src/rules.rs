use crate::classifier::{EvalContext, Rule};
use crate::document::Document;
use crate::task;
use crate::types::{ActionType, DocumentStatus, PHASE_COUNT};
use crate::unlock;

// ---------------------------------------------------------------------------
// Helper macros for concise rule definitions
// ---------------------------------------------------------------------------

macro_rules! rule {
    (
        id: $id:expr,
        condition: $cond:expr,
        action: $action:expr,
        message: $msg:expr,
        next_command: $cmd:expr
        $(, document_id: $doc:expr)?
        $(, task_id: $tid:expr)?
    ) => {
        Rule {
            id: $id,
            condition: $cond,
            action: $action,
            message: $msg,
            next_command: $cmd,
            document_id: {
                #[allow(unused_assignments, unused_mut)]
                let mut v: Option<fn(&EvalContext) -> String> = None;
                $(v = Some($doc);)?
                v
            },
            task_id: {
                #[allow(unused_assignments, unused_mut)]
                let mut v: Option<fn(&EvalContext) -> String> = None;
                $(v = Some($tid);)?
                v
            },
        }
    };
}

// ---------------------------------------------------------------------------
// Condition helpers
// ---------------------------------------------------------------------------

/// First document, in phase order, that sits in an open phase and matches.
fn open_document<'a>(ctx: &EvalContext<'a>, pred: fn(&EvalContext, &Document) -> bool) -> Option<&'a Document> {
    let docs = &ctx.project.documents;
    (1..=PHASE_COUNT)
        .filter(|p| !unlock::phase_state(*p, docs, ctx.rules).is_locked())
        .find_map(|p| docs.iter().find(|d| d.phase == p && pred(ctx, d)))
}

fn has_content(ctx: &EvalContext, doc: &Document) -> bool {
    ctx.project
        .content(&doc.id)
        .map(|c| c.has_content())
        .unwrap_or(false)
}

fn is_failed(_: &EvalContext, doc: &Document) -> bool {
    doc.status == DocumentStatus::Failed
}

fn is_rejected(_: &EvalContext, doc: &Document) -> bool {
    doc.status == DocumentStatus::Rejected
}

fn needs_content(ctx: &EvalContext, doc: &Document) -> bool {
    doc.status == DocumentStatus::Working && !has_content(ctx, doc)
}

fn needs_approval(ctx: &EvalContext, doc: &Document) -> bool {
    doc.status == DocumentStatus::Working && has_content(ctx, doc)
}

fn doc_id(ctx: &EvalContext, pred: fn(&EvalContext, &Document) -> bool) -> String {
    open_document(ctx, pred)
        .map(|d| d.id.clone())
        .unwrap_or_default()
}

fn doc_title(ctx: &EvalContext, pred: fn(&EvalContext, &Document) -> bool) -> String {
    open_document(ctx, pred)
        .map(|d| d.title.clone())
        .unwrap_or_default()
}

fn plan_needs_import(ctx: &EvalContext) -> bool {
    ctx.project.plan_ready().is_ok() && ctx.project.tasks.is_empty()
}

fn first_ready_task(ctx: &EvalContext) -> String {
    task::ready_tasks(&ctx.project.tasks)
        .first()
        .map(|t| t.id.clone())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Default rule table
// ---------------------------------------------------------------------------

pub fn default_rules() -> Vec<Rule> {
    vec![
        // 1. Queued notifications are shown one at a time before anything else
        rule! {
            id: "pending_notification",
            condition: |ctx| !ctx.project.notifications.is_empty(),
            action: ActionType::ReviewNotification,
            message: |ctx| {
                let n = ctx.project.notifications.current();
                format!(
                    "{} notification(s) queued; next: {} for '{}'.",
                    ctx.project.notifications.len(),
                    n.map(|n| n.recipient_name.as_str()).unwrap_or_default(),
                    n.map(|n| n.task_name.as_str()).unwrap_or_default()
                )
            },
            next_command: |ctx| format!("hmap notify next {}", ctx.project.id)
        },
        // 2. A pending change request waits for a decision
        rule! {
            id: "pending_change_request",
            condition: |ctx| ctx.project.change_request.as_ref().is_some_and(|c| c.is_pending()),
            action: ActionType::DecideChangeRequest,
            message: |ctx| match &ctx.project.change_request {
                Some(cr) => format!("Change request {} '{}' ({}) awaits a decision.", cr.id, cr.title, cr.parsed_impact()),
                None => String::new(),
            },
            next_command: |ctx| format!("hmap change show {}", ctx.project.id)
        },
        // 3. Generation failed
        rule! {
            id: "generation_failed",
            condition: |ctx| open_document(ctx, is_failed).is_some(),
            action: ActionType::RetryGeneration,
            message: |ctx| format!("Generating '{}' failed. Try again.", doc_title(ctx, is_failed)),
            next_command: |ctx| format!("hmap document generate {} {}", ctx.project.id, doc_id(ctx, is_failed)),
            document_id: |ctx| doc_id(ctx, is_failed)
        },
        // 4. Rejected document needs another draft
        rule! {
            id: "document_rejected",
            condition: |ctx| open_document(ctx, is_rejected).is_some(),
            action: ActionType::ReviseDocument,
            message: |ctx| format!("'{}' was rejected. Revise or regenerate it.", doc_title(ctx, is_rejected)),
            next_command: |ctx| format!("hmap document generate {} {}", ctx.project.id, doc_id(ctx, is_rejected)),
            document_id: |ctx| doc_id(ctx, is_rejected)
        },
        // 5. Plan documents approved, no tasks yet
        rule! {
            id: "needs_plan_import",
            condition: plan_needs_import,
            action: ActionType::ImportPlan,
            message: |_| "Detailed Plans and Project Timeline are approved. Import tasks and milestones.".to_string(),
            next_command: |ctx| format!("hmap plan import {}", ctx.project.id)
        },
        // 6. Open document without content
        rule! {
            id: "needs_content",
            condition: |ctx| open_document(ctx, needs_content).is_some(),
            action: ActionType::GenerateDocument,
            message: |ctx| format!("'{}' has no content yet.", doc_title(ctx, needs_content)),
            next_command: |ctx| format!("hmap document generate {} {}", ctx.project.id, doc_id(ctx, needs_content)),
            document_id: |ctx| doc_id(ctx, needs_content)
        },
        // 7. Drafted document awaiting approval
        rule! {
            id: "needs_approval",
            condition: |ctx| open_document(ctx, needs_approval).is_some(),
            action: ActionType::ApproveDocument,
            message: |ctx| format!("'{}' is ready for review.", doc_title(ctx, needs_approval)),
            next_command: |ctx| format!("hmap document approve {} {}", ctx.project.id, doc_id(ctx, needs_approval)),
            document_id: |ctx| doc_id(ctx, needs_approval)
        },
        // 8. Tasks ready to be worked
        rule! {
            id: "ready_tasks",
            condition: |ctx| !task::ready_tasks(&ctx.project.tasks).is_empty(),
            action: ActionType::WorkTasks,
            message: |ctx| format!("Tasks: {}.", task::summarize(&ctx.project.tasks)),
            next_command: |ctx| format!("hmap task status {} {} done", ctx.project.id, first_ready_task(ctx)),
            task_id: first_ready_task
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::config::{Config, PhaseConfig};
    use crate::project::{NewProject, Project};
    use crate::template::{DETAILED_PLANS, PROJECT_TIMELINE};
    use crate::types::TaskStatus;
    use chrono::NaiveDate;

    fn project(template: &str) -> Project {
        let new = NewProject {
            id: "apollo".into(),
            name: "Apollo".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            ..Default::default()
        };
        Project::from_template(new, template, &Config::new()).unwrap()
    }

    fn classify(p: &Project, rules: &PhaseConfig) -> crate::classifier::Classification {
        let ctx = EvalContext { project: p, rules };
        Classifier::new(default_rules()).classify(&ctx)
    }

    #[test]
    fn fresh_project_asks_for_first_document() {
        let rules = PhaseConfig::default();
        let c = classify(&project("standard"), &rules);
        assert_eq!(c.action, ActionType::GenerateDocument);
        assert_eq!(c.document_id.as_deref(), Some("D1"));
        assert_eq!(c.next_command, "hmap document generate apollo D1");
        assert!(c.calls_model);
    }

    #[test]
    fn drafted_document_needs_approval() {
        let rules = PhaseConfig::default();
        let mut p = project("standard");
        p.update_content("D1", "draft", &rules).unwrap();
        let c = classify(&p, &rules);
        assert_eq!(c.action, ActionType::ApproveDocument);
        assert_eq!(c.rule, "needs_approval");
    }

    #[test]
    fn failed_generation_comes_first() {
        let rules = PhaseConfig::default();
        let mut p = project("standard");
        p.documents[0].status = DocumentStatus::Failed;
        assert_eq!(classify(&p, &rules).action, ActionType::RetryGeneration);
    }

    #[test]
    fn change_request_outranks_documents() {
        let rules = PhaseConfig::default();
        let mut p = project("standard");
        p.submit_change_request("Scope", "", "+3d").unwrap();
        let c = classify(&p, &rules);
        assert_eq!(c.action, ActionType::DecideChangeRequest);
        assert!(c.message.contains("+3d +0c"));
    }

    #[test]
    fn approved_plans_lead_to_import_then_tasks() {
        let rules = PhaseConfig::default();
        let mut p = project("minimal");
        for d in p.documents.clone() {
            p.update_content(&d.id, "x", &rules).unwrap();
            p.approve_document(&d.id, &rules).unwrap();
        }
        assert_eq!(classify(&p, &rules).action, ActionType::ImportPlan);

        p.update_content(
            DETAILED_PLANS,
            "## Tasks\n| Task | Role |\n|---|---|\n| Build | Dev |\n",
            &rules,
        )
        .unwrap();
        p.approve_document(DETAILED_PLANS, &rules).unwrap();
        p.approve_document(PROJECT_TIMELINE, &rules).unwrap();
        p.import_plan(true).unwrap();
        let c = classify(&p, &rules);
        assert_eq!(c.action, ActionType::WorkTasks);
        assert_eq!(c.task_id.as_deref(), Some("T1"));

        p.set_task_status("T1", TaskStatus::Done).unwrap();
        assert_eq!(classify(&p, &rules).action, ActionType::Done);
    }
}
