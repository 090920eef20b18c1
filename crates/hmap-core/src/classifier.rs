use crate::config::PhaseConfig;
use crate::project::Project;
use crate::types::ActionType;
use serde::Serialize;

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

pub struct EvalContext<'a> {
    pub project: &'a Project,
    pub rules: &'a PhaseConfig,
}

// ---------------------------------------------------------------------------
// Classification (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub project: String,
    pub rule: &'static str,
    pub action: ActionType,
    pub message: String,
    pub next_command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Advisory hint: the action calls the AI service.
    pub calls_model: bool,
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule, evaluated in list order; the first match wins.
pub struct Rule {
    pub id: &'static str,
    pub condition: fn(&EvalContext) -> bool,
    pub action: ActionType,
    pub message: fn(&EvalContext) -> String,
    pub next_command: fn(&EvalContext) -> String,
    pub document_id: Option<fn(&EvalContext) -> String>,
    pub task_id: Option<fn(&EvalContext) -> String>,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, ctx: &EvalContext) -> Classification {
        for rule in &self.rules {
            if (rule.condition)(ctx) {
                return Classification {
                    project: ctx.project.id.clone(),
                    rule: rule.id,
                    action: rule.action,
                    message: (rule.message)(ctx),
                    next_command: (rule.next_command)(ctx),
                    document_id: rule.document_id.map(|f| f(ctx)),
                    task_id: rule.task_id.map(|f| f(ctx)),
                    calls_model: rule.action.calls_model(),
                };
            }
        }

        // Fallback: done
        Classification {
            project: ctx.project.id.clone(),
            rule: "done",
            action: ActionType::Done,
            message: format!("Project '{}' has no pending actions", ctx.project.id),
            next_command: String::new(),
            document_id: None,
            task_id: None,
            calls_model: false,
        }
    }
}
