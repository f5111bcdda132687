//! Test utility functions for prgate

use prgate::actions::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use prgate::core::config::WorkflowConfig;
use prgate::core::{RepoEvent, RunStatus, StepState, Workflow};
use prgate::runner::{Annotation, RunEvent, RunnerEngine};

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// The workflow definition this repository ships
pub fn canonical_yaml() -> &'static str {
    include_str!("../workflows/pull-request.yml")
}

/// Shorthand output constructors
pub fn ok() -> CommandOutput {
    ok_with("")
}

pub fn ok_with(stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

#[derive(Clone)]
enum ScriptedResult {
    Output(CommandOutput),
    Error(CommandError),
}

/// Mock command runner with per-command scripted results
///
/// Rules are matched by substring against the rendered command line, in
/// the order they were added; unmatched commands succeed with empty
/// output. Every invocation is recorded for ordering assertions.
pub struct ScriptedRunner {
    rules: Vec<(String, ScriptedResult)>,
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the output for commands whose line contains `needle`
    pub fn on(mut self, needle: &str, output: CommandOutput) -> Self {
        self.rules
            .push((needle.to_string(), ScriptedResult::Output(output)));
        self
    }

    /// Script a command error for commands whose line contains `needle`
    pub fn on_error(mut self, needle: &str, error: CommandError) -> Self {
        self.rules
            .push((needle.to_string(), ScriptedResult::Error(error)));
        self
    }

    /// Handle to the shared call log (grab before moving the runner)
    pub fn call_log(&self) -> Arc<Mutex<Vec<CommandSpec>>> {
        self.calls.clone()
    }
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        _timeout_secs: u64,
    ) -> Result<CommandOutput, CommandError> {
        let line = spec.display_line();
        self.calls.lock().unwrap().push(spec.clone());

        for (needle, result) in &self.rules {
            if line.contains(needle.as_str()) {
                return match result {
                    ScriptedResult::Output(output) => Ok(output.clone()),
                    ScriptedResult::Error(error) => Err(error.clone()),
                };
            }
        }

        Ok(ok())
    }
}

/// Everything a scenario needs to assert on after a run
#[derive(Debug, Clone)]
pub struct WorkflowTestResult {
    pub workflow: Workflow,
    pub status: RunStatus,
    pub events: Vec<RunEvent>,
    pub calls: Vec<CommandSpec>,
}

impl WorkflowTestResult {
    /// Rendered command lines in invocation order
    pub fn call_lines(&self) -> Vec<String> {
        self.calls.iter().map(|c| c.display_line()).collect()
    }

    /// Annotations surfaced through run events, in emission order
    pub fn annotations(&self) -> Vec<Annotation> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RunEvent::AnnotationEmitted { annotation, .. } => Some(annotation.clone()),
                _ => None,
            })
            .collect()
    }

    /// Get the state of a step
    pub fn step_state(&self, job_id: &str, step_id: &str) -> &StepState {
        &self
            .workflow
            .job(job_id)
            .unwrap_or_else(|| panic!("Job '{}' not found", job_id))
            .step(step_id)
            .unwrap_or_else(|| panic!("Step '{}' not found in job '{}'", step_id, job_id))
            .state
    }
}

/// Run a workflow defined by `yaml` for `event` against a scripted runner
pub async fn run_workflow_with(
    runner: ScriptedRunner,
    yaml: &str,
    event: &str,
) -> anyhow::Result<WorkflowTestResult> {
    let config = WorkflowConfig::from_yaml(yaml)?;
    let mut workflow = config.to_workflow()?;
    let event = RepoEvent::parse(event)?;

    let call_log = runner.call_log();
    let engine = RunnerEngine::new(runner);

    let events: Arc<Mutex<Vec<RunEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine
        .add_event_handler(move |e| sink.lock().unwrap().push(e))
        .await;

    let workspace = tempfile::tempdir()?;
    let status = engine
        .execute(&mut workflow, &event, workspace.path())
        .await?;

    let events = events.lock().unwrap().clone();
    let calls = call_log.lock().unwrap().clone();

    Ok(WorkflowTestResult {
        workflow,
        status,
        events,
        calls,
    })
}

/// Assert the run succeeded
pub fn assert_run_succeeded(result: &WorkflowTestResult) {
    assert_eq!(
        result.status,
        RunStatus::Succeeded,
        "Run should have succeeded, was {:?}",
        result.status
    );
}

/// Assert the run failed
pub fn assert_run_failed(result: &WorkflowTestResult) {
    assert_eq!(
        result.status,
        RunStatus::Failed,
        "Run should have failed, was {:?}",
        result.status
    );
}

/// Assert the trigger gated the run out
pub fn assert_run_skipped(result: &WorkflowTestResult) {
    assert_eq!(
        result.status,
        RunStatus::Skipped,
        "Run should have been skipped, was {:?}",
        result.status
    );
}

/// Assert a step completed successfully
pub fn assert_step_completed(result: &WorkflowTestResult, job_id: &str, step_id: &str) {
    let state = result.step_state(job_id, step_id);
    assert!(
        matches!(state, StepState::Completed { .. }),
        "Step '{}' should be completed, but was in state: {:?}",
        step_id,
        state
    );
}

/// Assert a step failed and check its error message
pub fn assert_step_failed(
    result: &WorkflowTestResult,
    job_id: &str,
    step_id: &str,
    expected_error: &str,
) {
    let state = result.step_state(job_id, step_id);
    match state {
        StepState::Failed { error, .. } => {
            assert!(
                error.contains(expected_error),
                "Step '{}' error:\n{}\n\ndoes not contain:\n{}",
                step_id,
                error,
                expected_error
            );
        }
        other => panic!(
            "Step '{}' should have failed, but was in state: {:?}",
            step_id, other
        ),
    }
}

/// Assert a step was skipped
pub fn assert_step_skipped(result: &WorkflowTestResult, job_id: &str, step_id: &str) {
    let state = result.step_state(job_id, step_id);
    assert!(
        matches!(state, StepState::Skipped { .. }),
        "Step '{}' should be skipped, but was in state: {:?}",
        step_id,
        state
    );
}

/// Assert a step never left Pending (it was not reached at all)
pub fn assert_step_pending(result: &WorkflowTestResult, job_id: &str, step_id: &str) {
    let state = result.step_state(job_id, step_id);
    assert!(
        matches!(state, StepState::Pending),
        "Step '{}' should still be pending, but was in state: {:?}",
        step_id,
        state
    );
}

/// Assert the given needles appear in the call log, in order
pub fn assert_call_order(result: &WorkflowTestResult, needles: &[&str]) {
    let lines = result.call_lines();
    let mut position = 0;

    for needle in needles {
        match lines[position..]
            .iter()
            .position(|line| line.contains(needle))
        {
            Some(offset) => position += offset + 1,
            None => panic!(
                "Expected a command containing '{}' after position {}.\nCall log:\n{}",
                needle,
                position,
                lines.join("\n")
            ),
        }
    }
}

/// Assert no executed command line contains the needle
pub fn assert_never_called(result: &WorkflowTestResult, needle: &str) {
    let lines = result.call_lines();
    assert!(
        !lines.iter().any(|line| line.contains(needle)),
        "No command containing '{}' should have run.\nCall log:\n{}",
        needle,
        lines.join("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_scripted_runner_matches_rules() {
        let runner = ScriptedRunner::new()
            .on("flake8", failed(1, "findings", ""))
            .on("codespell", ok_with("clean"));

        let lint = CommandSpec::shell("flake8 .", Path::new("/tmp"));
        let output = runner.run(&lint, 10).await.unwrap();
        assert_eq!(output.exit_code, Some(1));

        let spell = CommandSpec::shell("codespell", Path::new("/tmp"));
        let output = runner.run(&spell, 10).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "clean");
    }

    #[tokio::test]
    async fn test_scripted_runner_defaults_to_success() {
        let runner = ScriptedRunner::new();
        let spec = CommandSpec::new("git", Path::new("/tmp")).arg("clone");
        let output = runner.run(&spec, 10).await.unwrap();
        assert!(output.success());
        assert_eq!(runner.call_log().lock().unwrap().len(), 1);
    }
}
