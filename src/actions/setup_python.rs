//! Builtin setup-python action - provisions a pinned interpreter

use crate::actions::{ActionError, CommandError, CommandRunner, CommandSpec};
use crate::core::JobContext;
use std::collections::HashMap;
use tracing::info;

/// Parameters accepted by the setup-python action
#[derive(Debug, Clone)]
pub struct SetupPythonParams {
    /// Interpreter version to provision, e.g. "3.11"
    pub version: String,
}

impl SetupPythonParams {
    /// Build params from a step's `with:` mapping
    pub fn from_with(with: &HashMap<String, String>) -> Self {
        Self {
            version: with.get("python-version").cloned().unwrap_or_default(),
        }
    }
}

/// Provision the pinned interpreter in an isolated environment
///
/// Probes `python<version>` on PATH, creates a venv inside the workspace
/// and prepends its bin directory to the PATH subsequent steps see.
/// Fails fatally (aborting the run) if the requested version is
/// unavailable.
pub async fn run(
    runner: &dyn CommandRunner,
    params: &SetupPythonParams,
    ctx: &mut JobContext,
    timeout_secs: u64,
) -> Result<String, ActionError> {
    if params.version.trim().is_empty() {
        return Err(ActionError::Tool {
            message: "setup-python: 'python-version' parameter is empty".to_string(),
            exit_code: None,
        });
    }

    let interpreter = format!("python{}", params.version);

    let probe = CommandSpec::new(&interpreter, &ctx.workspace)
        .arg("--version")
        .envs(&ctx.env);
    let probed = match runner.run(&probe, timeout_secs).await {
        Ok(output) => output,
        Err(CommandError::Spawn(_, _)) => {
            return Err(ActionError::Tool {
                message: format!("Requested interpreter {} is not available on PATH", interpreter),
                exit_code: None,
            });
        }
        Err(e) => return Err(e.into()),
    };
    if !probed.success() {
        return Err(ActionError::Tool {
            message: format!(
                "Interpreter probe {} --version failed: {}",
                interpreter,
                probed.combined()
            ),
            exit_code: probed.exit_code,
        });
    }

    let venv = ctx.workspace.join(".venv");
    let create = CommandSpec::new(&interpreter, &ctx.workspace)
        .args(["-m", "venv"])
        .arg(venv.display().to_string())
        .envs(&ctx.env);

    let output = runner.run(&create, timeout_secs).await?;
    if !output.success() {
        return Err(ActionError::Tool {
            message: format!("Creating the virtual environment failed: {}", output.combined()),
            exit_code: output.exit_code,
        });
    }

    ctx.prepend_path(&venv.join("bin"));
    info!("Provisioned {} at {}", interpreter, venv.display());

    Ok(format!(
        "Provisioned {} ({})",
        interpreter,
        probed.combined()
    ))
}
