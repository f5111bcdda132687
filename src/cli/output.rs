//! CLI output formatting

use crate::core::{RunStatus, StepState};
use crate::runner::RunEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over the run's steps
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
        RunStatus::Skipped => style("SKIPPED").dim().to_string(),
    }
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::RunStarted {
            run_id,
            workflow_name,
        } => format!(
            "{} Starting workflow {} ({})",
            ROCKET,
            style(workflow_name).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        RunEvent::RunSkipped { event, .. } => format!(
            "{} Trigger does not match event {}; nothing to do",
            INFO,
            style(event).cyan()
        ),
        RunEvent::JobStarted { job_id, runs_on } => format!(
            "{} Job {} (runs-on: {})",
            INFO,
            style(job_id).bold(),
            style(runs_on).dim()
        ),
        RunEvent::StepStarted { job_id, step_id } => {
            format!("{} {}/{}", SPINNER, style(job_id).dim(), style(step_id).cyan())
        }
        RunEvent::StepCompleted { job_id, step_id } => {
            format!("{} {}/{}", CHECK, style(job_id).dim(), style(step_id).green())
        }
        RunEvent::StepFailed {
            job_id,
            step_id,
            error,
        } => format!(
            "{} {}/{}: {}",
            CROSS,
            style(job_id).dim(),
            style(step_id).red(),
            style(error).dim()
        ),
        RunEvent::StepSkipped {
            job_id,
            step_id,
            reason,
        } => format!(
            "{} {}/{} skipped ({})",
            WARN,
            style(job_id).dim(),
            style(step_id).yellow(),
            reason
        ),
        RunEvent::AnnotationEmitted { annotation, .. } => annotation.workflow_command(),
        RunEvent::RunCompleted { run_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Format tool output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{} ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
