//! Test: Clean Run - a tree with no findings passes every step in order

use crate::helpers::*;

fn clean_runner() -> ScriptedRunner {
    ScriptedRunner::new().on("python3.11 --version", ok_with("Python 3.11.9\n"))
}

/// The canonical workflow succeeds on a clean tree
#[tokio::test]
async fn test_canonical_workflow_succeeds() {
    let result = run_workflow_with(clean_runner(), canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    assert_run_succeeded(&result);

    for step_id in [
        "checkout",
        "setup-python",
        "install-dependencies",
        "lint-with-flake8",
        "spell-check",
    ] {
        assert_step_completed(&result, "lint", step_id);
    }

    assert_eq!(result.workflow.terminal_counts(), (5, 0, 0));
    assert_eq!(result.workflow.state.progress(), 1.0);
}

/// Steps run strictly in declared order: checkout, provision, install,
/// lint, spell check
#[tokio::test]
async fn test_steps_execute_in_declared_order() {
    let result = run_workflow_with(clean_runner(), canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    assert_call_order(
        &result,
        &[
            "git clone",
            "python3.11 --version",
            "-m venv",
            "pip install --upgrade pip",
            "flake8 .",
            "codespell",
        ],
    );
}

/// The install step upgrades the installer before installing the manifest
#[tokio::test]
async fn test_install_step_upgrades_pip_first() {
    let result = run_workflow_with(clean_runner(), canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    let install = result
        .call_lines()
        .into_iter()
        .find(|line| line.contains("pip install"))
        .expect("install step should have run");

    let upgrade = install.find("pip install --upgrade pip").unwrap();
    let manifest = install.find("pip install -r requirements.txt").unwrap();
    assert!(upgrade < manifest);
}

/// Running twice on an unchanged tree yields the same verdict
#[tokio::test]
async fn test_rerun_is_idempotent() {
    let first = run_workflow_with(clean_runner(), canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();
    let second = run_workflow_with(clean_runner(), canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(
        first.workflow.terminal_counts(),
        second.workflow.terminal_counts()
    );

    // Same for a failing tree
    let failing = || {
        clean_runner().on(
            "flake8",
            failed(1, "./app.py:1:1: F401 'os' imported but unused\n", ""),
        )
    };
    let first = run_workflow_with(failing(), canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();
    let second = run_workflow_with(failing(), canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    assert_run_failed(&first);
    assert_run_failed(&second);
}

/// Run steps inherit the job environment (CI marker and provisioned PATH)
#[tokio::test]
async fn test_run_steps_inherit_job_env() {
    let result = run_workflow_with(clean_runner(), canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    let lint = result
        .calls
        .iter()
        .find(|c| c.display_line().contains("flake8"))
        .expect("lint step should have run");

    assert_eq!(lint.env.get("CI").map(String::as_str), Some("true"));
    assert!(lint
        .env
        .get("PATH")
        .is_some_and(|p| p.contains("/.venv/bin")));
}
