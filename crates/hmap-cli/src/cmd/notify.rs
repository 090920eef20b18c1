use super::Workspace;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use hmap_core::cascade::Notification;
use std::path::Path;

#[derive(Subcommand)]
pub enum NotifySubcommand {
    /// List queued notifications
    List {
        project: String,
        /// Show sent notifications instead
        #[arg(long)]
        sent: bool,
    },
    /// Show the notification at the head of the queue
    Next { project: String },
    /// Drop the current notification without sending it
    Dismiss { project: String },
    /// Mark the current notification as sent and print it as a mailto link
    Send { project: String },
}

pub fn run(root: &Path, subcmd: NotifySubcommand, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    match subcmd {
        NotifySubcommand::List { project, sent } => list(&ws, &project, sent, json),
        NotifySubcommand::Next { project } => next(&ws, &project, json),
        NotifySubcommand::Dismiss { project } => pop(&ws, &project, false, json),
        NotifySubcommand::Send { project } => pop(&ws, &project, true, json),
    }
}

fn list(ws: &Workspace, id: &str, sent: bool, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let items: Vec<&Notification> = if sent {
        project.notifications.sent().iter().collect()
    } else {
        project.notifications.pending().collect()
    };

    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("No notifications.");
        return Ok(());
    }
    let rows = items
        .iter()
        .map(|n| {
            vec![
                n.id.clone(),
                n.task_id.clone(),
                n.role.clone(),
                n.recipient_name.clone(),
                n.recipient_email.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "TASK", "ROLE", "TO", "EMAIL"], rows);
    Ok(())
}

fn print_notification(n: &Notification) {
    println!("[{}] To: {} <{}>", n.id, n.recipient_name, n.recipient_email);
    println!("Subject: {}", n.subject);
    println!();
    println!("{}", n.body);
}

/// Subject and body percent-encoded for a `mailto:` link.
fn mailto(n: &Notification) -> String {
    fn encode(text: &str) -> String {
        text.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{b:02X}"),
            })
            .collect()
    }
    format!(
        "mailto:{}?subject={}&body={}",
        n.recipient_email,
        encode(&n.subject),
        encode(&n.body)
    )
}

fn next(ws: &Workspace, id: &str, json: bool) -> anyhow::Result<()> {
    let project = ws.load(id)?;
    let current = project.notifications.current();

    if json {
        return print_json(&serde_json::json!({
            "notification": current,
            "remaining": project.notifications.len(),
        }));
    }
    match current {
        Some(n) => {
            print_notification(n);
            println!();
            println!(
                "{} queued. Send with: hmap notify send {id}  or skip: hmap notify dismiss {id}",
                project.notifications.len()
            );
        }
        None => println!("No notifications queued."),
    }
    Ok(())
}

fn pop(ws: &Workspace, id: &str, send: bool, json: bool) -> anyhow::Result<()> {
    let mut project = ws.load(id)?;
    let popped = if send {
        project.notifications.send()
    } else {
        project.notifications.dismiss()
    };
    let Some(n) = popped else {
        anyhow::bail!("no notifications queued for '{id}'");
    };
    ws.save(&project)?;

    if json {
        print_json(&serde_json::json!({
            "notification": n,
            "sent": send,
            "mailto": send.then(|| mailto(&n)),
            "remaining": project.notifications.len(),
        }))?;
    } else if send {
        println!("Sent [{}] to {}", n.id, n.recipient_email);
        println!("{}", mailto(&n));
    } else {
        println!("Dismissed [{}]", n.id);
    }
    Ok(())
}
