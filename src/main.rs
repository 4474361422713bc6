//! taskboard - a board over plain-text checklist documents.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};

use taskboard::board::{
    ArchivedTask, BoardView, NewPhase, NewTask, PhasePreview, TaskBoard, TaskDetail, TaskSummary,
};
use taskboard::config::{BoardConfig, ConfigValidator};
use taskboard::document::{
    current_phase, extract_phases, format_timestamp, Parser as DocumentParser, Status,
    SystemClock, TaskPatch, TransitionTarget,
};
use taskboard::store::{FsTaskStore, JobRecord, NewJob, Shelf};
use taskboard::TaskboardError;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version)]
#[command(about = "Kanban board over plain-text checklist documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Board root holding .taskboard/settings.json (defaults to current directory)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Tasks directory, overriding the settings file
    #[arg(long, global = true, env = "TASKS_DIR")]
    tasks_dir: Option<PathBuf>,

    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the board grouped by status
    List,

    /// Show one task with its full document
    Show {
        id: String,

        /// Look on the archive shelf
        #[arg(long)]
        archived: bool,
    },

    /// Create a task document
    Create {
        id: String,

        #[arg(short, long)]
        title: String,

        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        agent: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        sort: Option<i64>,

        /// planned, in_progress or completed
        #[arg(long)]
        status: Option<TransitionTarget>,

        #[arg(long)]
        description: Option<String>,

        /// Phase as NAME or NAME:ITEM;ITEM (repeatable)
        #[arg(long = "phase", value_name = "PHASE")]
        phases: Vec<String>,
    },

    /// Change fields of a task
    Update {
        id: String,

        /// Assignment such as owner=bob, sort=3, check=<item> (repeatable)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        assignments: Vec<String>,

        /// Patch as a JSON object
        #[arg(long, conflicts_with = "assignments")]
        patch: Option<String>,
    },

    /// Move a task to planned, in_progress or completed
    Status {
        id: String,
        target: TransitionTarget,

        /// Note appended to the execution log
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Log a message to a task and reopen it
    Message { id: String, text: String },

    /// Delete a task
    Delete { id: String },

    /// Move a task to the archive shelf
    Archive {
        id: String,

        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Bring an archived task back
    Restore { id: String },

    /// List archived tasks
    Archived,

    /// Show the phases of a checklist file (stdin when omitted or "-")
    Phases { file: Option<PathBuf> },

    /// Parse a checklist file and print the record
    Parse {
        file: Option<PathBuf>,

        /// Id used for title and agent fallbacks
        #[arg(long, default_value = "")]
        id: String,
    },

    /// Manage job records
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum JobsAction {
    /// List jobs
    List,

    /// Show one job with its run history
    Show { id: String },

    /// Add a job record
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        command: String,

        /// Cron-like schedule, stored verbatim
        #[arg(long, default_value = "")]
        schedule: String,

        #[arg(long)]
        disabled: bool,
    },

    /// Record a manual run
    Run {
        id: String,

        #[arg(long)]
        output: Option<String>,
    },

    Enable { id: String },

    Disable { id: String },

    Remove { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show resolved file locations
    Paths,

    /// Validate the settings file
    Validate,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "taskboard=debug,info"
    } else {
        "taskboard=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        let code = e
            .downcast_ref::<TaskboardError>()
            .map_or(1, TaskboardError::exit_code);
        std::process::exit(code);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<BoardConfig> {
    let config = BoardConfig::load(&cli.root)?;
    Ok(match &cli.tasks_dir {
        Some(dir) => config.with_tasks_dir(dir.clone()),
        None => config,
    })
}

fn open_board(cli: &Cli) -> anyhow::Result<TaskBoard<FsTaskStore, SystemClock>> {
    let config = load_config(cli)?;
    Ok(TaskBoard::open(&config, &cli.root)?)
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_phase(arg: &str) -> NewPhase {
    match arg.split_once(':') {
        Some((name, items)) => NewPhase {
            name: name.trim().to_string(),
            items: items
                .split(';')
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .map(str::to_string)
                .collect(),
        },
        None => NewPhase {
            name: arg.trim().to_string(),
            items: Vec::new(),
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::List => {
            let view = open_board(&cli)?.list()?;
            if cli.json {
                print_json(&view)?;
            } else {
                print_board(&view);
            }
        }

        Commands::Show { id, archived } => {
            let board = open_board(&cli)?;
            let detail = if *archived {
                board.archived_detail(id)?
            } else {
                board.detail(id)?
            };
            if cli.json {
                print_json(&detail)?;
            } else {
                print_detail(&detail);
            }
        }

        Commands::Create {
            id,
            title,
            owner,
            agent,
            sort,
            status,
            description,
            phases,
        } => {
            let mut task = NewTask::new(id.clone(), title.clone());
            task.owner = owner.clone();
            task.agent = agent.clone();
            task.sort_order = *sort;
            task.status = *status;
            task.description = description.clone();
            task.phases = phases.iter().map(|p| parse_phase(p)).collect();

            let detail = open_board(&cli)?.create(task)?;
            report_detail(&cli, &detail, "Created")?;
        }

        Commands::Update {
            id,
            assignments,
            patch,
        } => {
            let patch = match patch {
                Some(json) => TaskPatch::from_json(json)?,
                None => TaskPatch::from_assignments(assignments)?,
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to update: pass --set KEY=VALUE or --patch JSON");
            }
            let detail = open_board(&cli)?.update(id, &patch)?;
            report_detail(&cli, &detail, "Updated")?;
        }

        Commands::Status { id, target, note } => {
            let detail = open_board(&cli)?.transition(id, *target, note.as_deref())?;
            report_detail(&cli, &detail, "Moved")?;
        }

        Commands::Message { id, text } => {
            let detail = open_board(&cli)?.send_message(id, text)?;
            report_detail(&cli, &detail, "Reopened")?;
        }

        Commands::Delete { id } => {
            open_board(&cli)?.delete(id)?;
            if cli.json {
                print_json(&serde_json::json!({ "success": true, "id": id }))?;
            } else {
                println!("{} Deleted {}", "OK".green().bold(), id);
            }
        }

        Commands::Archive { id, reason } => {
            let archived = open_board(&cli)?.archive(id, reason.as_deref())?;
            if cli.json {
                print_json(&archived)?;
            } else {
                println!("{} Archived {} ({})", "OK".green().bold(), archived.id, archived.title);
            }
        }

        Commands::Restore { id } => {
            let detail = open_board(&cli)?.restore(id)?;
            report_detail(&cli, &detail, "Restored")?;
        }

        Commands::Archived => {
            let tasks = open_board(&cli)?.archived()?;
            if cli.json {
                print_json(&tasks)?;
            } else {
                print_archived(&tasks);
            }
        }

        Commands::Phases { file } => {
            let text = read_input(file.as_deref())?;
            let phases = extract_phases(&text);
            let preview = PhasePreview {
                current_phase: current_phase(&phases),
                phases,
            };
            if cli.json {
                print_json(&preview)?;
            } else {
                for phase in &preview.phases {
                    println!(
                        "{} {}  {}/{} ({}%)",
                        if phase.is_closed() { "✓".green() } else { "·".yellow() },
                        phase.label().bold(),
                        phase.completed(),
                        phase.items.len(),
                        phase.percent()
                    );
                }
                println!("Current: {}", preview.current_phase.cyan());
            }
        }

        Commands::Parse { file, id } => {
            let text = read_input(file.as_deref())?;
            let config = load_config(&cli)?;
            let grammar = config.grammar()?;
            let record = DocumentParser::new(&grammar, &SystemClock).parse(&text, id);
            if cli.json {
                print_json(&record)?;
            } else {
                let detail = TaskDetail::new(record, Shelf::Active, text);
                print_detail(&detail);
            }
        }

        Commands::Jobs { action } => {
            let board = open_board(&cli)?;
            match action {
                JobsAction::List => {
                    let jobs = board.jobs()?;
                    if cli.json {
                        print_json(&jobs)?;
                    } else if jobs.is_empty() {
                        println!("No jobs.");
                    } else {
                        for job in &jobs {
                            print_job_line(job);
                        }
                    }
                }
                JobsAction::Show { id } => {
                    let job = board.job(id)?;
                    if cli.json {
                        print_json(&job)?;
                    } else {
                        print_job_line(&job);
                        println!("  command: {}", job.command);
                        for run in &job.history {
                            println!(
                                "  {} {} {}",
                                format_timestamp(run.run_at).dimmed(),
                                run.status,
                                run.output
                            );
                        }
                    }
                }
                JobsAction::Add {
                    name,
                    command,
                    schedule,
                    disabled,
                } => {
                    let job = board.add_job(NewJob {
                        name: name.clone(),
                        command: command.clone(),
                        schedule: schedule.clone(),
                        enabled: !disabled,
                    })?;
                    report_job(&cli, &job, "Added")?;
                }
                JobsAction::Run { id, output } => {
                    let job = board.run_job(id, output.as_deref())?;
                    report_job(&cli, &job, "Recorded run of")?;
                }
                JobsAction::Enable { id } => {
                    let job = board.set_job_enabled(id, true)?;
                    report_job(&cli, &job, "Enabled")?;
                }
                JobsAction::Disable { id } => {
                    let job = board.set_job_enabled(id, false)?;
                    report_job(&cli, &job, "Disabled")?;
                }
                JobsAction::Remove { id } => {
                    board.remove_job(id)?;
                    if cli.json {
                        print_json(&serde_json::json!({ "success": true, "id": id }))?;
                    } else {
                        println!("{} Removed job {}", "OK".green().bold(), id);
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(&cli)?;
                if cli.json {
                    print_json(&config)?;
                } else {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Paths => {
                let paths = load_config(&cli)?.paths(&cli.root);
                if cli.json {
                    print_json(&paths)?;
                } else {
                    println!("settings:  {}", paths.settings.display());
                    println!("tasks:     {}", paths.tasks_dir.display());
                    println!("archive:   {}", paths.archive_dir.display());
                    println!("jobs:      {}", paths.jobs_file.display());
                }
            }
            ConfigAction::Validate => {
                let report = ConfigValidator::new(&cli.root)
                    .with_tasks_dir(cli.tasks_dir.clone())
                    .validate();
                println!("{}", report.verbose_report());
                if !report.is_valid() {
                    std::process::exit(report.exit_code());
                }
            }
        },
    }

    Ok(())
}

// ============================================================================
// Human-readable output
// ============================================================================

fn status_label(status: Status) -> colored::ColoredString {
    let pair = status.display_pair();
    match status {
        Status::Planned => pair.blue(),
        Status::InProgress => pair.yellow(),
        Status::Completed => pair.green(),
        Status::Paused => pair.red(),
    }
}

fn print_summary(summary: &TaskSummary) {
    println!(
        "  {} {}  {} {}%  {} {}",
        summary.id.bold(),
        summary.title,
        summary.progress,
        summary.progress_percent,
        format!("{} {}", summary.agent_icon, summary.agent_name).dimmed(),
        summary.owner.dimmed()
    );
    if summary.status == Status::Paused {
        println!("    {}", status_label(summary.status));
    }
    println!("    {}", summary.current_phase.cyan());
}

fn print_board(view: &BoardView) {
    let columns = [
        (Status::Planned, &view.planned),
        (Status::InProgress, &view.in_progress),
        (Status::Completed, &view.completed),
    ];
    for (status, summaries) in columns {
        println!("{} ({})", status_label(status).bold(), summaries.len());
        for summary in summaries.iter() {
            print_summary(summary);
        }
        println!();
    }
}

fn print_detail(detail: &TaskDetail) {
    let record = &detail.record;
    println!("{} {}", record.title.bold(), format!("[{}]", record.id).dimmed());
    println!("  status:   {}", status_label(record.status));
    println!("  agent:    {} {}", record.agent_icon, record.agent_name);
    println!("  owner:    {}", record.owner);
    println!("  progress: {} ({}%)", record.progress, detail.progress_percent);
    println!("  phase:    {}", record.current_phase.cyan());
    if let Some(blocker) = &record.blocker {
        println!("  {} {}", "blocker:".red(), blocker);
    }
    if !record.defaulted.is_empty() {
        let fields: Vec<String> = record.defaulted.iter().map(ToString::to_string).collect();
        println!("  {} {}", "defaulted:".dimmed(), fields.join(", ").dimmed());
    }
    println!();
    println!("{}", detail.full_content);
}

fn report_detail(cli: &Cli, detail: &TaskDetail, verb: &str) -> anyhow::Result<()> {
    if cli.json {
        print_json(detail)
    } else {
        println!(
            "{} {} {} ({})",
            "OK".green().bold(),
            verb,
            detail.record.id,
            status_label(detail.record.status)
        );
        Ok(())
    }
}

fn print_archived(tasks: &[ArchivedTask]) {
    if tasks.is_empty() {
        println!("No archived tasks.");
        return;
    }
    for task in tasks {
        let when = task
            .header
            .as_ref()
            .map(|h| h.archived_at.clone())
            .unwrap_or_else(|| "?".to_string());
        let reason = task
            .header
            .as_ref()
            .and_then(|h| h.reason.clone())
            .unwrap_or_default();
        println!(
            "  {} {}  {} {}",
            task.id.bold(),
            task.title,
            when.dimmed(),
            reason.dimmed()
        );
    }
}

fn print_job_line(job: &JobRecord) {
    let state = if job.enabled {
        "enabled".green()
    } else {
        "disabled".red()
    };
    println!(
        "  {} {}  {}  {}",
        job.id.dimmed(),
        job.name.bold(),
        job.schedule,
        state
    );
}

fn report_job(cli: &Cli, job: &JobRecord, verb: &str) -> anyhow::Result<()> {
    if cli.json {
        print_json(job)
    } else {
        println!("{} {} job {} ({})", "OK".green().bold(), verb, job.name, job.id);
        Ok(())
    }
}
