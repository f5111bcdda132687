//! Run orchestration

pub mod annotations;
pub mod engine;
pub mod executor;

pub use annotations::{parse_findings, Annotation, Severity};
pub use engine::{EventHandler, RunEvent, RunnerEngine};
pub use executor::{ExecutionResult, StepExecutor, DEFAULT_STEP_TIMEOUT_SECS};
