//! Result model: the outcome tree of a feature run.
//!
//! Step results are mutated only while their step executes; scenario results
//! are assembled once when a scenario finishes and are read-only afterwards.
//! Feature results accumulate scenario results as scenarios complete.

use std::time::{Duration, SystemTime};

use crate::status::ExecutionStatus;
use crate::types::{FeatureInfo, ScenarioInfo, StepInfo, StepNameInfo};

/// Start and duration of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExecutionTime {
    start: SystemTime,
    duration: Duration,
}

impl ExecutionTime {
    /// Record an execution window.
    #[must_use]
    pub const fn new(start: SystemTime, duration: Duration) -> Self {
        Self { start, duration }
    }

    /// Wall-clock start time.
    #[must_use]
    pub const fn start(&self) -> SystemTime {
        self.start
    }

    /// Elapsed time.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Wall-clock end time.
    #[must_use]
    pub fn end(&self) -> SystemTime {
        self.start + self.duration
    }
}

/// Outcome of a single step, including its sub-steps.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StepResult {
    info: StepInfo,
    status: ExecutionStatus,
    status_details: Option<String>,
    execution_time: Option<ExecutionTime>,
    comments: Vec<String>,
    sub_steps: Vec<StepResult>,
}

impl StepResult {
    pub(crate) fn new(info: StepInfo) -> Self {
        Self {
            info,
            status: ExecutionStatus::NotRun,
            status_details: None,
            execution_time: None,
            comments: Vec::new(),
            sub_steps: Vec::new(),
        }
    }

    /// Step number and name.
    #[must_use]
    pub fn info(&self) -> &StepInfo {
        &self.info
    }

    /// Execution status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Failure message or bypass/ignore reason.
    #[must_use]
    pub fn status_details(&self) -> Option<&str> {
        self.status_details.as_deref()
    }

    /// Execution window; `None` while the step has not run.
    #[must_use]
    pub const fn execution_time(&self) -> Option<ExecutionTime> {
        self.execution_time
    }

    /// Comments recorded while the step ran, in order.
    #[must_use]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Results of composite sub-steps.
    #[must_use]
    pub fn sub_steps(&self) -> &[Self] {
        &self.sub_steps
    }

    pub(crate) fn set_name(&mut self, name: StepNameInfo) {
        self.info.set_name(name);
    }

    pub(crate) fn set_status(&mut self, status: ExecutionStatus, details: Option<String>) {
        self.status = status;
        self.status_details = details;
    }

    pub(crate) fn set_execution_time(&mut self, time: ExecutionTime) {
        self.execution_time = Some(time);
    }

    pub(crate) fn add_comment(&mut self, comment: String) {
        self.comments.push(comment);
    }

    pub(crate) fn set_sub_steps(&mut self, sub_steps: Vec<Self>) {
        self.sub_steps = sub_steps;
    }
}

/// Outcome of a scenario.
///
/// The status is the most severe step status, or
/// [`ExecutionStatus::Failed`] when the scenario could not be initialised.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScenarioResult {
    info: ScenarioInfo,
    steps: Vec<StepResult>,
    status: ExecutionStatus,
    status_details: Option<String>,
    execution_time: ExecutionTime,
}

impl ScenarioResult {
    /// Assemble the result of a scenario run.
    ///
    /// `initialization_failure` carries the wrapped message of a failed step
    /// or context initialisation and forces the status to failed.
    pub(crate) fn new(
        info: ScenarioInfo,
        steps: Vec<StepResult>,
        execution_time: ExecutionTime,
        initialization_failure: Option<String>,
    ) -> Self {
        let (status, status_details) = match initialization_failure {
            Some(message) => (ExecutionStatus::Failed, Some(message)),
            None => (
                ExecutionStatus::aggregate(steps.iter().map(StepResult::status)),
                collect_details(&steps),
            ),
        };
        Self {
            info,
            steps,
            status,
            status_details,
            execution_time,
        }
    }

    /// Scenario name, labels and categories.
    #[must_use]
    pub fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    /// Step results in execution order.
    #[must_use]
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// Aggregate status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// One `Step {number}: {details}` line per step carrying details, or the
    /// initialisation failure message.
    #[must_use]
    pub fn status_details(&self) -> Option<&str> {
        self.status_details.as_deref()
    }

    /// Execution window of the whole scenario.
    #[must_use]
    pub const fn execution_time(&self) -> ExecutionTime {
        self.execution_time
    }
}

fn collect_details(steps: &[StepResult]) -> Option<String> {
    let lines: Vec<String> = steps
        .iter()
        .filter_map(|step| {
            step.status_details()
                .map(|details| format!("Step {}: {details}", step.info().number()))
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Scenario results collected for one feature.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureResult {
    info: FeatureInfo,
    scenarios: Vec<ScenarioResult>,
}

impl FeatureResult {
    pub(crate) fn new(info: FeatureInfo) -> Self {
        Self {
            info,
            scenarios: Vec::new(),
        }
    }

    /// Feature name, description and labels.
    #[must_use]
    pub fn info(&self) -> &FeatureInfo {
        &self.info
    }

    /// Scenario results in completion order.
    #[must_use]
    pub fn scenarios(&self) -> &[ScenarioResult] {
        &self.scenarios
    }

    /// Most severe scenario status.
    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        ExecutionStatus::aggregate(self.scenarios.iter().map(ScenarioResult::status))
    }

    pub(crate) fn add_scenario(&mut self, scenario: ScenarioResult) {
        self.scenarios.push(scenario);
    }
}
