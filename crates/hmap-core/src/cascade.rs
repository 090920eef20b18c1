//! Completion cascade: when a task is finished, the tasks it was the last
//! blocker for are handed to whoever holds their role.

use crate::task::Task;
use crate::team::{self, TeamAssignment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub task_id: String,
    pub task_name: String,
    pub role: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// FIFO of notifications shown one at a time. A task is only ever queued
/// once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationQueue {
    #[serde(default)]
    pending: VecDeque<Notification>,
    #[serde(default)]
    sent: Vec<Notification>,
    #[serde(default)]
    notified: BTreeSet<String>,
    #[serde(default)]
    next_seq: u32,
}

impl NotificationQueue {
    /// Returns false when the task was already notified.
    pub fn enqueue(&mut self, mut n: Notification) -> bool {
        if !self.notified.insert(n.task_id.clone()) {
            tracing::debug!(task = %n.task_id, "notification already queued");
            return false;
        }
        self.next_seq += 1;
        n.id = format!("N{}", self.next_seq);
        self.pending.push_back(n);
        true
    }

    pub fn current(&self) -> Option<&Notification> {
        self.pending.front()
    }

    pub fn dismiss(&mut self) -> Option<Notification> {
        self.pending.pop_front()
    }

    /// Pop the head and record it as sent.
    pub fn send(&mut self) -> Option<Notification> {
        let n = self.pending.pop_front()?;
        self.sent.push(n.clone());
        Some(n)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Notification> {
        self.pending.iter()
    }

    pub fn sent(&self) -> &[Notification] {
        &self.sent
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeOutcome {
    /// Tasks whose dependencies are now all done.
    pub unblocked: Vec<String>,
    /// Notification ids queued by this run.
    pub queued: Vec<String>,
    /// Unblocked tasks with no role or no reachable assignee.
    pub unassigned: Vec<String>,
}

/// Tasks that list `completed_id` and have every dependency done.
pub fn newly_ready<'a>(tasks: &'a [Task], completed_id: &str) -> Vec<&'a Task> {
    let done: HashSet<&str> = tasks
        .iter()
        .filter(|t| t.is_done())
        .map(|t| t.id.as_str())
        .collect();
    tasks
        .iter()
        .filter(|t| t.depends_on.iter().any(|d| d == completed_id))
        .filter(|t| t.depends_on.iter().all(|d| done.contains(d.as_str())))
        .collect()
}

/// Run only when `completed_id` moved from not-done to done.
pub fn cascade(
    project_name: &str,
    tasks: &[Task],
    completed_id: &str,
    team: &[TeamAssignment],
    queue: &mut NotificationQueue,
    now: DateTime<Utc>,
) -> CascadeOutcome {
    let mut outcome = CascadeOutcome::default();
    let completed_name = tasks
        .iter()
        .find(|t| t.id == completed_id)
        .map(|t| t.name.as_str())
        .unwrap_or(completed_id);

    for task in newly_ready(tasks, completed_id) {
        outcome.unblocked.push(task.id.clone());

        let assignee = task
            .role
            .as_deref()
            .and_then(|role| team::assignment_for(team, role))
            .filter(|a| a.is_reachable());
        let Some(assignee) = assignee else {
            tracing::debug!(task = %task.id, role = ?task.role, "no reachable assignee");
            outcome.unassigned.push(task.id.clone());
            continue;
        };

        let n = Notification {
            id: String::new(),
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            role: assignee.role.clone(),
            recipient_name: assignee.name.clone(),
            recipient_email: assignee.email.clone(),
            subject: format!("[{project_name}] Ready to start: {}", task.name),
            body: format!(
                "Hi {},\n\n\"{completed_name}\" is complete, so \"{}\" ({}) has no open \
                 dependencies left. As {}, you can start it now.\n",
                assignee.name, task.name, task.id, assignee.role
            ),
            created_at: now,
        };
        if queue.enqueue(n) {
            if let Some(last) = queue.pending.back() {
                tracing::info!(task = %task.id, to = %assignee.email, "queued notification");
                outcome.queued.push(last.id.clone());
            }
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
