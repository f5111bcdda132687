//! Workflow configuration from YAML

use crate::core::event::TriggerConfig;
use crate::core::step::BuiltinAction;
use crate::core::condition::StepCondition;
use crate::core::Workflow;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Top-level workflow definition loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Events that activate the workflow
    #[serde(rename = "on")]
    pub on: TriggerConfig,

    /// Jobs by name
    pub jobs: HashMap<String, JobConfig>,
}

/// Job definition as declared in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Runner image identifier (recorded, not interpreted locally)
    #[serde(rename = "runs-on")]
    pub runs_on: String,

    /// Ordered steps
    pub steps: Vec<StepConfig>,
}

/// Step definition as declared in YAML
///
/// Exactly one of `uses` and `run` must be present; `validate` enforces
/// this along with the rest of the step invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Human-readable step label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Reference to a reusable action, with a version pin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    /// Inline shell command sequence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    /// Parameters for a `uses` step
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub with: HashMap<String, String>,

    /// Condition expression gating execution
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl WorkflowConfig {
    /// Load a workflow definition from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a workflow definition from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the workflow definition
    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            bail!("Workflow '{}' declares no jobs", self.name);
        }

        for (job_name, job) in &self.jobs {
            if job.steps.is_empty() {
                bail!("Job '{}' has no steps", job_name);
            }

            for (index, step) in job.steps.iter().enumerate() {
                self.validate_step(job_name, index, step)?;
            }
        }

        Ok(())
    }

    fn validate_step(&self, job_name: &str, index: usize, step: &StepConfig) -> Result<()> {
        let position = index + 1;

        match (&step.uses, &step.run) {
            (Some(_), Some(_)) => bail!(
                "Job '{}' step {} has both 'uses' and 'run'",
                job_name,
                position
            ),
            (None, None) => bail!(
                "Job '{}' step {} has neither 'uses' nor 'run'",
                job_name,
                position
            ),
            (Some(reference), None) => {
                let (action, _version) = BuiltinAction::resolve(reference)?;

                for param in step.with.keys() {
                    if !action.allowed_params().contains(&param.as_str()) {
                        bail!(
                            "Job '{}' step {}: action '{}' does not accept parameter '{}'",
                            job_name,
                            position,
                            action.name(),
                            param
                        );
                    }
                }

                if action == BuiltinAction::SetupPython
                    && !step.with.contains_key("python-version")
                {
                    bail!(
                        "Job '{}' step {}: setup-python requires a 'python-version' parameter",
                        job_name,
                        position
                    );
                }
            }
            (None, Some(command)) => {
                if command.trim().is_empty() {
                    bail!("Job '{}' step {} has an empty 'run' command", job_name, position);
                }
                if !step.with.is_empty() {
                    bail!(
                        "Job '{}' step {}: 'with' is only valid on 'uses' steps",
                        job_name,
                        position
                    );
                }
            }
        }

        if let Some(expr) = &step.condition {
            StepCondition::parse(expr)?;
        }

        Ok(())
    }

    /// Total number of declared steps across all jobs
    pub fn total_steps(&self) -> usize {
        self.jobs.values().map(|j| j.steps.len()).sum()
    }

    /// Convert the definition to a Workflow domain model
    pub fn to_workflow(&self) -> Result<Workflow> {
        Workflow::from_config(self)
    }
}
