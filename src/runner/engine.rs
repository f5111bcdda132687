//! Run engine - gates on the trigger and drives jobs step by step

use crate::{
    actions::CommandRunner,
    core::{JobContext, RepoEvent, RunStatus, StepOutcome, StepState, Workflow},
    runner::{
        annotations::Annotation,
        executor::{ExecutionResult, StepExecutor},
    },
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Events that occur during a run
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        workflow_name: String,
    },
    /// The trigger did not match; zero steps will run
    RunSkipped {
        run_id: Uuid,
        event: String,
    },
    JobStarted {
        job_id: String,
        runs_on: String,
    },
    StepStarted {
        job_id: String,
        step_id: String,
    },
    StepCompleted {
        job_id: String,
        step_id: String,
    },
    StepFailed {
        job_id: String,
        step_id: String,
        error: String,
    },
    StepSkipped {
        job_id: String,
        step_id: String,
        reason: String,
    },
    AnnotationEmitted {
        step_id: String,
        annotation: Annotation,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Drives a whole run: trigger gate, then every job's steps in order
pub struct RunnerEngine<C> {
    executor: StepExecutor<C>,
    event_handlers: Mutex<Vec<EventHandler>>,
}

impl<C: CommandRunner> RunnerEngine<C> {
    pub fn new(runner: C) -> Self {
        Self {
            executor: StepExecutor::new(runner),
            event_handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_timeout(runner: C, timeout_secs: u64) -> Self {
        Self {
            executor: StepExecutor::with_timeout(runner, timeout_secs),
            event_handlers: Mutex::new(Vec::new()),
        }
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(RunEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit(&self, event: RunEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Execute the workflow for the given event
    ///
    /// Each job gets a fresh subdirectory of `workspace_root`. Returns the
    /// final run status; orchestration errors (not step failures) come
    /// back as `Err`.
    pub async fn execute(
        &self,
        workflow: &mut Workflow,
        event: &RepoEvent,
        workspace_root: &Path,
    ) -> Result<RunStatus> {
        let run_id = workflow.state.run_id;

        if !workflow.on.matches(event) {
            info!(
                "Event {} does not match triggers of '{}'; nothing to do",
                event, workflow.name
            );
            workflow.state.skip();
            self.emit(RunEvent::RunSkipped {
                run_id,
                event: event.to_string(),
            })
            .await;
            self.emit(RunEvent::RunCompleted {
                run_id,
                status: RunStatus::Skipped,
            })
            .await;
            return Ok(RunStatus::Skipped);
        }

        info!("Starting run of '{}' ({})", workflow.name, run_id);
        self.emit(RunEvent::RunStarted {
            run_id,
            workflow_name: workflow.name.clone(),
        })
        .await;

        workflow.state.start(workflow.total_steps());

        for job_id in workflow.job_order().to_vec() {
            let Some(job) = workflow.job(&job_id) else {
                continue;
            };
            let runs_on = job.runs_on.clone();
            let step_count = job.steps.len();

            info!("Starting job '{}' (runs-on: {})", job_id, runs_on);
            self.emit(RunEvent::JobStarted {
                job_id: job_id.clone(),
                runs_on,
            })
            .await;

            let job_workspace = workspace_root.join(&job_id);
            std::fs::create_dir_all(&job_workspace)
                .with_context(|| format!("Failed to create workspace for job '{}'", job_id))?;
            let mut ctx = JobContext::new(job_workspace);

            for index in 0..step_count {
                self.execute_step(workflow, &job_id, index, &mut ctx).await;
            }
        }

        let (completed, failed, skipped) = workflow.terminal_counts();
        workflow.state.update_counts(completed, failed, skipped);

        let status = if failed > 0 {
            workflow.state.fail();
            RunStatus::Failed
        } else {
            workflow.state.succeed();
            RunStatus::Succeeded
        };

        info!("Run of '{}' finished: {:?}", workflow.name, status);
        self.emit(RunEvent::RunCompleted { run_id, status }).await;

        Ok(status)
    }

    /// Execute one step of a job, or skip it when its condition says so
    async fn execute_step(
        &self,
        workflow: &mut Workflow,
        job_id: &str,
        index: usize,
        ctx: &mut JobContext,
    ) {
        let Some(step) = workflow
            .job(job_id)
            .and_then(|j| j.steps.get(index))
            .cloned()
        else {
            return;
        };
        let step_id = step.id.clone();

        if !step.condition.should_run(ctx.failed) {
            let reason = if ctx.failed {
                "An earlier step failed".to_string()
            } else {
                "No earlier step failed".to_string()
            };
            warn!("Skipping step {} ({})", step_id, reason);
            self.set_step_state(
                workflow,
                job_id,
                index,
                StepState::Skipped {
                    reason: reason.clone(),
                },
            );
            self.emit(RunEvent::StepSkipped {
                job_id: job_id.to_string(),
                step_id,
                reason,
            })
            .await;
            return;
        }

        let started_at = chrono::Utc::now();
        self.set_step_state(workflow, job_id, index, StepState::Running { started_at });
        self.emit(RunEvent::StepStarted {
            job_id: job_id.to_string(),
            step_id: step_id.clone(),
        })
        .await;

        let result = self.executor.execute(&step, ctx).await;

        for annotation in result.annotations() {
            self.emit(RunEvent::AnnotationEmitted {
                step_id: step_id.clone(),
                annotation: annotation.clone(),
            })
            .await;
        }

        match result {
            ExecutionResult::Success { output, .. } => {
                ctx.record(StepOutcome {
                    step_id: step_id.clone(),
                    success: true,
                    exit_code: Some(0),
                    output: output.clone(),
                });
                self.set_step_state(
                    workflow,
                    job_id,
                    index,
                    StepState::Completed {
                        output,
                        started_at,
                        completed_at: chrono::Utc::now(),
                    },
                );
                self.emit(RunEvent::StepCompleted {
                    job_id: job_id.to_string(),
                    step_id,
                })
                .await;
            }
            ExecutionResult::Failed {
                error,
                exit_code,
                output,
                ..
            } => {
                ctx.record(StepOutcome {
                    step_id: step_id.clone(),
                    success: false,
                    exit_code,
                    output: output.clone(),
                });
                self.set_step_state(
                    workflow,
                    job_id,
                    index,
                    StepState::Failed {
                        error: error.clone(),
                        exit_code,
                        output,
                        started_at,
                        failed_at: chrono::Utc::now(),
                    },
                );
                self.emit(RunEvent::StepFailed {
                    job_id: job_id.to_string(),
                    step_id,
                    error,
                })
                .await;
            }
        }
    }

    fn set_step_state(
        &self,
        workflow: &mut Workflow,
        job_id: &str,
        index: usize,
        state: StepState,
    ) {
        if let Some(step) = workflow
            .job_mut(job_id)
            .and_then(|j| j.steps.get_mut(index))
        {
            step.state = state;
        }
    }
}
