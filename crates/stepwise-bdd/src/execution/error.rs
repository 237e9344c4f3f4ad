//! Error types for step and scenario execution failures.

use std::error::Error;
use std::sync::Arc;

use thiserror::Error;

use super::scope::CommentError;
use crate::context::ArgumentError;
use crate::result::ScenarioResult;
use crate::runner::RunnerError;
use crate::status::ExecutionStatus;

/// Boxed error type accepted from step bodies and parameter evaluators.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Error raised by a step.
///
/// The enum distinguishes control flow signals ([`Bypassed`](Self::Bypassed),
/// [`Ignored`](Self::Ignored)) from genuine failures. Only the bypass signal is
/// absorbed at the step boundary; every other variant is mapped to a status by
/// the configured [`StatusMapper`] and returned to the caller.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::StepError;
///
/// let bypass = StepError::bypass("not implemented yet");
/// assert!(bypass.is_bypass());
/// assert_eq!(bypass.to_string(), "not implemented yet");
///
/// let failure = StepError::failed("connection refused");
/// assert!(!failure.is_bypass());
/// assert_eq!(failure.to_string(), "connection refused");
/// ```
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StepError {
    /// The step was intentionally skipped; not a failure.
    #[error("{message}")]
    Bypassed {
        /// Reason for bypassing the step.
        message: String,
    },
    /// The step asked to be ignored, e.g. by an inconclusive assertion.
    #[error("{message}")]
    Ignored {
        /// Reason for ignoring the step.
        message: String,
    },
    /// The step body panicked.
    #[error("{message}")]
    Panicked {
        /// Rendered panic payload.
        message: String,
    },
    /// The step body returned an error.
    #[error("{0}")]
    Failed(Arc<dyn Error + Send + Sync + 'static>),
    /// A step argument could not be read.
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// A comment could not be recorded.
    #[error(transparent)]
    Comment(#[from] CommentError),
    /// A parameter evaluator failed before the step could be invoked.
    #[error("Unable to evaluate parameter '{parameter}': {message}")]
    ParameterEvaluation {
        /// Raw parameter name.
        parameter: String,
        /// Message of the evaluator failure.
        message: String,
    },
    /// A parameter value could not be rendered into the step name.
    #[error("Unable to format '{parameter}' parameter of step '{step}': {message}")]
    ParameterFormatting {
        /// Raw parameter name.
        parameter: String,
        /// Raw name of the step owning the parameter.
        step: String,
        /// Message of the formatter failure.
        message: String,
    },
    /// The runnable step was invoked more than once.
    #[error("step {number} has already been invoked")]
    AlreadyInvoked {
        /// Number of the offending step.
        number: String,
    },
}

impl StepError {
    /// Signal that the step is intentionally bypassed.
    #[must_use]
    pub fn bypass(message: impl Into<String>) -> Self {
        Self::Bypassed {
            message: message.into(),
        }
    }

    /// Signal that the step should be reported as ignored.
    #[must_use]
    pub fn ignore(message: impl Into<String>) -> Self {
        Self::Ignored {
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error (or message) as a step failure.
    #[must_use]
    pub fn failed(error: impl Into<BoxError>) -> Self {
        let boxed: BoxError = error.into();
        Self::Failed(Arc::from(boxed))
    }

    /// Returns `true` for the bypass signal.
    #[must_use]
    pub fn is_bypass(&self) -> bool {
        matches!(self, Self::Bypassed { .. })
    }

    /// Returns `true` for the ignore signal.
    #[must_use]
    pub fn is_ignore(&self) -> bool {
        matches!(self, Self::Ignored { .. })
    }
}

/// Maps a step error onto the status recorded for the step.
pub type StatusMapper = Arc<dyn Fn(&StepError) -> ExecutionStatus + Send + Sync>;

/// Status mapping used when no integration-specific mapper is configured.
///
/// Ignore signals map to [`ExecutionStatus::Ignored`], bypass signals to
/// [`ExecutionStatus::Bypassed`], and everything else to
/// [`ExecutionStatus::Failed`].
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{map_status, ExecutionStatus, StepError};
///
/// assert_eq!(map_status(&StepError::ignore("flaky")), ExecutionStatus::Ignored);
/// assert_eq!(map_status(&StepError::failed("boom")), ExecutionStatus::Failed);
/// ```
#[must_use]
pub fn map_status(error: &StepError) -> ExecutionStatus {
    match error {
        StepError::Bypassed { .. } => ExecutionStatus::Bypassed,
        StepError::Ignored { .. } => ExecutionStatus::Ignored,
        _ => ExecutionStatus::Failed,
    }
}

/// The default [`StatusMapper`], wrapping [`map_status`].
#[must_use]
pub fn default_status_mapper() -> StatusMapper {
    Arc::new(map_status)
}

/// Error returned from a scenario run.
///
/// Every variant produced by an executed scenario carries the
/// [`ScenarioResult`], which has also been delivered to the feature result
/// and the progress notifier.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScenarioError {
    /// Materialising the steps or the context failed; no step ran.
    #[error("{message}")]
    Initialization {
        /// Wrapped initialisation failure message.
        message: String,
        /// Result of the scenario.
        result: Box<ScenarioResult>,
    },
    /// A step returned an error and stopped the scenario.
    #[error("{source}")]
    Step {
        /// The step error, unchanged.
        source: StepError,
        /// Result of the scenario.
        result: Box<ScenarioResult>,
    },
    /// The scenario could not be started by its runner.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl ScenarioError {
    /// The scenario result, when the scenario was executed.
    #[must_use]
    pub fn result(&self) -> Option<&ScenarioResult> {
        match self {
            Self::Initialization { result, .. } | Self::Step { result, .. } => Some(result),
            Self::Runner(_) => None,
        }
    }

    /// The step error that stopped the scenario, if any.
    #[must_use]
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            Self::Step { source, .. } => Some(source),
            _ => None,
        }
    }
}
