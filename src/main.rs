use anyhow::{Context, Result};
use prgate::actions::SubprocessRunner;
use prgate::cli::commands::{RunCommand, ValidateCommand};
use prgate::cli::output::*;
use prgate::cli::{Cli, Command};
use prgate::core::config::WorkflowConfig;
use prgate::core::{RepoEvent, RunStatus, StepState, Workflow};
use prgate::runner::{RunEvent, RunnerEngine};
use std::path::PathBuf;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_workflow(cmd).await?,
        Command::Validate(cmd) => validate_workflow(cmd)?,
    }

    Ok(())
}

async fn run_workflow(cmd: &RunCommand) -> Result<()> {
    let config = WorkflowConfig::from_file(&cmd.file)
        .context("Failed to load workflow definition")?;
    let event = RepoEvent::parse(&cmd.event)?;

    println!(
        "{} Loaded workflow: {} (event: {})",
        INFO,
        style(&config.name).bold(),
        style(&event).cyan()
    );

    let mut workflow = config.to_workflow()?;
    let run_id = workflow.state.run_id;

    // Each run gets an exclusive, freshly provisioned workspace
    let (workspace_root, scratch) = match &cmd.workspace {
        Some(dir) => (PathBuf::from(dir), false),
        None => (
            std::env::temp_dir().join(format!("prgate-{}", run_id)),
            true,
        ),
    };
    std::fs::create_dir_all(&workspace_root).context("Failed to create run workspace")?;

    let engine = RunnerEngine::with_timeout(SubprocessRunner::new(), cmd.timeout);

    let progress = create_progress_bar(workflow.total_steps());
    let bar = progress.clone();
    engine
        .add_event_handler(move |event| {
            bar.println(format_run_event(&event));
            if matches!(
                event,
                RunEvent::StepCompleted { .. }
                    | RunEvent::StepFailed { .. }
                    | RunEvent::StepSkipped { .. }
            ) {
                bar.inc(1);
            }
        })
        .await;

    println!();
    let result = engine.execute(&mut workflow, &event, &workspace_root).await;
    progress.finish_and_clear();

    if scratch && !cmd.keep_workspace {
        if let Err(e) = std::fs::remove_dir_all(&workspace_root) {
            warn!("Failed to remove workspace {}: {}", workspace_root.display(), e);
        }
    } else {
        println!(
            "{} Workspace kept at {}",
            INFO,
            style(workspace_root.display()).dim()
        );
    }

    let status = result?;

    print_failed_step_output(&workflow);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&run_report(&workflow))?);
    }

    match status {
        RunStatus::Succeeded => {
            println!(
                "\n{} {} completed {}",
                CHECK,
                style(&workflow.name).bold(),
                style("successfully").green()
            );
        }
        RunStatus::Skipped => {
            println!(
                "\n{} {} {} (event {} does not match its triggers)",
                INFO,
                style(&workflow.name).bold(),
                style("skipped").dim(),
                style(&event).cyan()
            );
        }
        _ => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&workflow.name).bold(),
                style("failed").red()
            );
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Show what the failing tools reported
fn print_failed_step_output(workflow: &Workflow) {
    for job_id in workflow.job_order() {
        let Some(job) = workflow.job(job_id) else {
            continue;
        };
        for step in &job.steps {
            if let StepState::Failed { output, .. } = &step.state {
                if !output.trim().is_empty() {
                    println!(
                        "\n{} Output from {}/{}:",
                        INFO,
                        style(job_id).dim(),
                        style(&step.id).red()
                    );
                    println!("{}", format_output(output, 20));
                }
            }
        }
    }
}

fn validate_workflow(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating workflow...", INFO);

    let result = WorkflowConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Workflow definition is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!(
                "  Triggers: {}",
                style(config.on.declared_kinds().join(", ")).cyan()
            );
            println!("  Jobs: {}", style(config.jobs.len()).cyan());
            println!("  Steps: {}", style(config.total_steps()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

/// Build a JSON report of the finished run
fn run_report(workflow: &Workflow) -> serde_json::Value {
    let mut jobs = serde_json::Map::new();
    for job_id in workflow.job_order() {
        if let Some(job) = workflow.job(job_id) {
            let steps: Vec<serde_json::Value> = job
                .steps
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "name": s.display_name(),
                        "state": s.state,
                    })
                })
                .collect();
            jobs.insert(
                job_id.clone(),
                serde_json::json!({ "runs_on": job.runs_on, "steps": steps }),
            );
        }
    }

    serde_json::json!({
        "run_id": workflow.state.run_id,
        "workflow": workflow.name,
        "status": workflow.state.status,
        "started_at": workflow.state.started_at,
        "completed_at": workflow.state.completed_at,
        "progress": workflow.state.progress(),
        "jobs": jobs,
    })
}
