//! Step domain model

use crate::core::{condition::StepCondition, config::StepConfig, state::StepState};
use anyhow::{bail, Result};
use std::collections::HashMap;

/// A reusable action the runner implements locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinAction {
    /// Populate the workspace with the repository source tree
    Checkout,
    /// Provision a pinned Python interpreter in an isolated environment
    SetupPython,
}

impl BuiltinAction {
    /// Resolve a `uses:` reference into an action and its version pin
    ///
    /// Accepts an optional `actions/` owner prefix. The version pin after
    /// `@` is required.
    pub fn resolve(reference: &str) -> Result<(Self, String)> {
        let Some((name, version)) = reference.split_once('@') else {
            bail!(
                "Action reference '{}' is missing a version pin (expected name@version)",
                reference
            );
        };
        if version.is_empty() {
            bail!("Action reference '{}' has an empty version pin", reference);
        }

        let name = name.strip_prefix("actions/").unwrap_or(name);
        let action = match name {
            "checkout" => BuiltinAction::Checkout,
            "setup-python" => BuiltinAction::SetupPython,
            other => bail!("Unknown action '{}'", other),
        };

        Ok((action, version.to_string()))
    }

    /// Parameter names this action accepts in its `with:` mapping
    pub fn allowed_params(&self) -> &'static [&'static str] {
        match self {
            BuiltinAction::Checkout => &["path", "ref"],
            BuiltinAction::SetupPython => &["python-version"],
        }
    }

    /// The short name used in `uses:` references
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinAction::Checkout => "checkout",
            BuiltinAction::SetupPython => "setup-python",
        }
    }
}

/// What a step does: reference a builtin action, or run a shell command
#[derive(Debug, Clone)]
pub enum StepKind {
    /// `uses:` step bound to a builtin action with its parameters
    Uses {
        action: BuiltinAction,
        version: String,
        with: HashMap<String, String>,
    },
    /// `run:` step holding an inline shell command sequence
    Run { command: String },
}

/// A single step in a job
#[derive(Debug, Clone)]
pub struct Step {
    /// Stable step identifier (slug of the name, or step-<index>)
    pub id: String,

    /// Human-readable label, when the definition provides one
    pub label: Option<String>,

    /// What this step does
    pub kind: StepKind,

    /// Condition gating execution
    pub condition: StepCondition,

    /// Runtime state
    pub state: StepState,
}

impl Step {
    /// Create a step from a step config
    ///
    /// `index` is the zero-based position within the job, used to
    /// synthesize an id when no name is given.
    pub fn from_config(config: &StepConfig, index: usize) -> Result<Self> {
        let kind = match (&config.uses, &config.run) {
            (Some(reference), None) => {
                let (action, version) = BuiltinAction::resolve(reference)?;
                StepKind::Uses {
                    action,
                    version,
                    with: config.with.clone(),
                }
            }
            (None, Some(command)) => StepKind::Run {
                command: command.clone(),
            },
            _ => bail!("Step must have exactly one of 'uses' or 'run'"),
        };

        let condition = match &config.condition {
            Some(expr) => StepCondition::parse(expr)?,
            None => StepCondition::default(),
        };

        let id = match &config.name {
            Some(name) => slugify(name),
            None => match &kind {
                StepKind::Uses { action, .. } => action.name().to_string(),
                StepKind::Run { .. } => format!("step-{}", index + 1),
            },
        };

        Ok(Step {
            id,
            label: config.name.clone(),
            kind,
            condition,
            state: StepState::Pending,
        })
    }

    /// The name to show in logs and events
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Lowercase a human label into a stable identifier
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
