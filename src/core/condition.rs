//! Step condition model

use anyhow::{bail, Result};

/// Condition gating whether a step executes
///
/// Evaluated against the job's failure flag just before the step would
/// start. The default is `Success`, which is what makes a failed step
/// skip everything after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepCondition {
    /// Run only while no earlier step in the job has failed
    #[default]
    Success,
    /// Run only after an earlier step in the job has failed
    Failure,
    /// Run unconditionally
    Always,
}

impl StepCondition {
    /// Parse a condition expression from the step's `if` field
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "success()" => Ok(StepCondition::Success),
            "failure()" => Ok(StepCondition::Failure),
            "always()" => Ok(StepCondition::Always),
            other => bail!(
                "Unknown condition '{}' (expected success(), failure() or always())",
                other
            ),
        }
    }

    /// Whether a step with this condition should run
    pub fn should_run(&self, job_failed: bool) -> bool {
        match self {
            StepCondition::Success => !job_failed,
            StepCondition::Failure => job_failed,
            StepCondition::Always => true,
        }
    }
}
