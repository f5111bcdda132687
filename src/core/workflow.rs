//! Workflow domain model

use crate::core::{
    config::WorkflowConfig,
    event::TriggerConfig,
    state::{RunState, RunStatus, StepState},
    step::Step,
};
use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};

/// A job: an ordered sequence of steps sharing one environment
#[derive(Debug, Clone)]
pub struct Job {
    /// Job name (the key in the definition's jobs mapping)
    pub id: String,

    /// Runner image identifier from the definition
    pub runs_on: String,

    /// Steps in declared order
    pub steps: Vec<Step>,
}

impl Job {
    /// Get a step by id
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Get a mutable step by id
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Whether any step in the job failed
    pub fn has_failed(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.state, StepState::Failed { .. }))
    }
}

/// A workflow: triggers plus jobs, with run state
#[derive(Debug, Clone)]
pub struct Workflow {
    /// Workflow name
    pub name: String,

    /// Declared triggers
    pub on: TriggerConfig,

    /// Jobs by name
    pub jobs: HashMap<String, Job>,

    /// Run state
    pub state: RunState,

    /// Job execution order (sorted by name for determinism)
    job_order: Vec<String>,
}

impl Workflow {
    /// Build the domain model from a parsed definition
    pub fn from_config(config: &WorkflowConfig) -> Result<Self> {
        let mut jobs = HashMap::new();
        for (name, job_config) in &config.jobs {
            let steps = job_config
                .steps
                .iter()
                .enumerate()
                .map(|(index, step_config)| Step::from_config(step_config, index))
                .collect::<Result<Vec<_>>>()?;

            let mut seen_ids = HashSet::new();
            for step in &steps {
                if !seen_ids.insert(step.id.clone()) {
                    bail!("Duplicate step id '{}' in job '{}'", step.id, name);
                }
            }

            jobs.insert(
                name.clone(),
                Job {
                    id: name.clone(),
                    runs_on: job_config.runs_on.clone(),
                    steps,
                },
            );
        }

        let mut job_order: Vec<String> = jobs.keys().cloned().collect();
        job_order.sort();

        Ok(Workflow {
            name: config.name.clone(),
            on: config.on.clone(),
            jobs,
            state: RunState::new(),
            job_order,
        })
    }

    /// Get a job by name
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Get a mutable job by name
    pub fn job_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    /// Job execution order
    pub fn job_order(&self) -> &[String] {
        &self.job_order
    }

    /// Total number of steps across all jobs
    pub fn total_steps(&self) -> usize {
        self.jobs.values().map(|j| j.steps.len()).sum()
    }

    /// Whether any job failed
    pub fn has_failed(&self) -> bool {
        self.jobs.values().any(|j| j.has_failed())
    }

    /// Whether every step is in a terminal state
    pub fn is_complete(&self) -> bool {
        self.jobs
            .values()
            .flat_map(|j| j.steps.iter())
            .all(|s| s.state.is_terminal())
    }

    /// Whether the run was gated out by the trigger
    pub fn was_skipped(&self) -> bool {
        self.state.status == RunStatus::Skipped
    }

    /// Count steps in each terminal state: (completed, failed, skipped)
    pub fn terminal_counts(&self) -> (usize, usize, usize) {
        let mut completed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for step in self.jobs.values().flat_map(|j| j.steps.iter()) {
            match step.state {
                StepState::Completed { .. } => completed += 1,
                StepState::Failed { .. } => failed += 1,
                StepState::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }
        (completed, failed, skipped)
    }
}
