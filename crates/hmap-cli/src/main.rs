mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    change::ChangeSubcommand, config::ConfigSubcommand, document::DocumentSubcommand,
    milestone::MilestoneSubcommand, notify::NotifySubcommand, phase::PhaseSubcommand,
    plan::PlanSubcommand, project::ProjectSubcommand, scenario::ScenarioSubcommand,
    task::TaskSubcommand, team::TeamSubcommand, track::TrackSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "hmap",
    about = "HMAP project planner: phase-gated planning documents, plan import and tracking",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .hmap/)
    #[arg(long, global = true, env = "HMAP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize an hmap workspace in the current directory
    Init,

    /// Create, list and inspect projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Work with a project's planning documents
    Document {
        #[command(subcommand)]
        subcommand: DocumentSubcommand,
    },

    /// Show phase lock state
    Phase {
        #[command(subcommand)]
        subcommand: PhaseSubcommand,
    },

    /// Import tasks and milestones from the approved plan documents
    Plan {
        #[command(subcommand)]
        subcommand: PlanSubcommand,
    },

    /// Manage imported tasks
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Manage imported milestones
    Milestone {
        #[command(subcommand)]
        subcommand: MilestoneSubcommand,
    },

    /// Roles and team assignments
    Team {
        #[command(subcommand)]
        subcommand: TeamSubcommand,
    },

    /// Work through queued task-ready notifications
    Notify {
        #[command(subcommand)]
        subcommand: NotifySubcommand,
    },

    /// Submit and decide change requests
    Change {
        #[command(subcommand)]
        subcommand: ChangeSubcommand,
    },

    /// What-if schedule and budget scenarios
    Scenario {
        #[command(subcommand)]
        subcommand: ScenarioSubcommand,
    },

    /// Tracking views: kanban, gantt, workload, milestones, task list
    Track {
        #[command(subcommand)]
        subcommand: TrackSubcommand,
    },

    /// Export documents with content as a zip archive
    Export {
        project: String,
        /// Output file (default: .hmap/exports/<project>.zip)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Suggest the next action for a project
    Next {
        /// Project id (omit to show every project)
        project: Option<String>,
    },

    /// Show or change workspace configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
        Commands::Document { subcommand } => cmd::document::run(&root, subcommand, cli.json),
        Commands::Phase { subcommand } => cmd::phase::run(&root, subcommand, cli.json),
        Commands::Plan { subcommand } => cmd::plan::run(&root, subcommand, cli.json),
        Commands::Task { subcommand } => cmd::task::run(&root, subcommand, cli.json),
        Commands::Milestone { subcommand } => cmd::milestone::run(&root, subcommand, cli.json),
        Commands::Team { subcommand } => cmd::team::run(&root, subcommand, cli.json),
        Commands::Notify { subcommand } => cmd::notify::run(&root, subcommand, cli.json),
        Commands::Change { subcommand } => cmd::change::run(&root, subcommand, cli.json),
        Commands::Scenario { subcommand } => cmd::scenario::run(&root, subcommand, cli.json),
        Commands::Track { subcommand } => cmd::track::run(&root, subcommand, cli.json),
        Commands::Export { project, output } => {
            cmd::export::run(&root, &project, output.as_deref(), cli.json)
        }
        Commands::Next { project } => cmd::next::run(&root, project.as_deref(), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
