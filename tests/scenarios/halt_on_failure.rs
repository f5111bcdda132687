//! Test: Halt on Failure - a failing step aborts everything after it

use crate::helpers::*;

/// An unresolvable dependency fails the install step before either check
/// step begins
#[tokio::test]
async fn test_install_failure_skips_both_checks() {
    let runner = ScriptedRunner::new().on(
        "pip install",
        failed(
            1,
            "",
            "ERROR: No matching distribution found for nonexistent-package==1.0",
        ),
    );

    let result = run_workflow_with(runner, canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_completed(&result, "lint", "checkout");
    assert_step_completed(&result, "lint", "setup-python");
    assert_step_failed(
        &result,
        "lint",
        "install-dependencies",
        "exit code 1",
    );
    assert_step_skipped(&result, "lint", "lint-with-flake8");
    assert_step_skipped(&result, "lint", "spell-check");

    assert_never_called(&result, "flake8");
    assert_never_called(&result, "codespell");
}

/// A lint violation fails the run and the spell check never runs
#[tokio::test]
async fn test_lint_failure_skips_spell_check() {
    let runner = ScriptedRunner::new().on(
        "flake8",
        failed(1, "./app.py:3:1: E302 expected 2 blank lines, found 1\n", ""),
    );

    let result = run_workflow_with(runner, canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_failed(&result, "lint", "lint-with-flake8", "exit code 1");
    assert_step_skipped(&result, "lint", "spell-check");
    assert_never_called(&result, "codespell");
}

/// A misspelling with a clean lint pass fails at the spell-check step,
/// and the lint step is reported as having succeeded
#[tokio::test]
async fn test_spell_failure_after_clean_lint() {
    let runner = ScriptedRunner::new().on(
        "codespell",
        failed(65, "./README.md:12: teh ==> the\n", ""),
    );

    let result = run_workflow_with(runner, canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_completed(&result, "lint", "lint-with-flake8");
    assert_step_failed(&result, "lint", "spell-check", "exit code 65");
    assert_eq!(result.workflow.terminal_counts(), (4, 1, 0));
}

/// A checkout failure aborts the whole job before provisioning
#[tokio::test]
async fn test_checkout_failure_halts_everything() {
    let runner = ScriptedRunner::new().on(
        "git clone",
        failed(128, "", "fatal: repository not found"),
    );

    let result = run_workflow_with(runner, canonical_yaml(), "pull_request:opened")
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_failed(&result, "lint", "checkout", "git clone");
    assert_step_skipped(&result, "lint", "setup-python");
    assert_step_skipped(&result, "lint", "install-dependencies");
    assert_step_skipped(&result, "lint", "lint-with-flake8");
    assert_step_skipped(&result, "lint", "spell-check");

    assert_never_called(&result, "python3.11");
    assert_never_called(&result, "pip install");
}

const CONDITIONAL_YAML: &str = r#"
name: Conditions
on: pull_request
jobs:
  checks:
    runs-on: ubuntu-latest
    steps:
      - name: Lint
        run: flake8 .
      - name: Report failure
        if: failure()
        run: echo lint failed
      - name: Cleanup
        if: always()
        run: rm -rf scratch
"#;

/// A failure() step only runs after an earlier step failed; always()
/// steps run regardless
#[tokio::test]
async fn test_failure_and_always_conditions_after_failure() {
    let runner = ScriptedRunner::new().on("flake8", failed(1, "", ""));

    let result = run_workflow_with(runner, CONDITIONAL_YAML, "pull_request:opened")
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_failed(&result, "checks", "lint", "exit code 1");
    assert_step_completed(&result, "checks", "report-failure");
    assert_step_completed(&result, "checks", "cleanup");
}

/// On a clean run the failure() step is skipped and always() still runs
#[tokio::test]
async fn test_failure_condition_skipped_on_clean_run() {
    let result = run_workflow_with(ScriptedRunner::new(), CONDITIONAL_YAML, "pull_request:opened")
        .await
        .unwrap();

    assert_run_succeeded(&result);
    assert_step_completed(&result, "checks", "lint");
    assert_step_skipped(&result, "checks", "report-failure");
    assert_step_completed(&result, "checks", "cleanup");
}

/// With default conditions, if step i fails no step j > i executes
#[tokio::test]
async fn test_no_later_step_executes_after_failure() {
    let yaml = r#"
name: Chain
on: pull_request
jobs:
  chain:
    runs-on: ubuntu-latest
    steps:
      - name: One
        run: echo one
      - name: Two
        run: exit 1
      - name: Three
        run: echo three
      - name: Four
        run: echo four
"#;

    let runner = ScriptedRunner::new().on("exit 1", failed(1, "", ""));
    let result = run_workflow_with(runner, yaml, "pull_request:opened")
        .await
        .unwrap();

    assert_run_failed(&result);
    assert_step_completed(&result, "chain", "one");
    assert_step_failed(&result, "chain", "two", "exit code 1");
    assert_step_skipped(&result, "chain", "three");
    assert_step_skipped(&result, "chain", "four");

    assert_never_called(&result, "echo three");
    assert_never_called(&result, "echo four");
}
