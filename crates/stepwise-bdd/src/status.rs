//! Execution status of steps and scenarios.

use std::fmt;

/// Outcome of a step or scenario execution.
///
/// Variants are declared in ascending severity, so the derived [`Ord`]
/// implements the aggregation order
/// `Failed > Ignored > Bypassed > Passed > NotRun`.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::ExecutionStatus;
///
/// let status = ExecutionStatus::aggregate([
///     ExecutionStatus::Passed,
///     ExecutionStatus::Bypassed,
/// ]);
/// assert_eq!(status, ExecutionStatus::Bypassed);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ExecutionStatus {
    /// The step or scenario has not been executed.
    #[default]
    NotRun,
    /// Execution completed successfully.
    Passed,
    /// Execution was intentionally bypassed; not a failure.
    Bypassed,
    /// Execution was ignored, typically by an inconclusive assertion.
    Ignored,
    /// Execution failed.
    Failed,
}

impl ExecutionStatus {
    /// Most severe status in `statuses`, or [`NotRun`](Self::NotRun) when
    /// empty.
    #[must_use]
    pub fn aggregate(statuses: impl IntoIterator<Item = Self>) -> Self {
        statuses.into_iter().max().unwrap_or_default()
    }

    /// Lowercase label for the status.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NotRun => "not run",
            Self::Passed => "passed",
            Self::Bypassed => "bypassed",
            Self::Ignored => "ignored",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionStatus::{self, Bypassed, Failed, Ignored, NotRun, Passed};
    use rstest::rstest;

    #[rstest]
    #[case::empty(vec![], NotRun)]
    #[case::only_not_run(vec![NotRun], NotRun)]
    #[case::passed(vec![Passed, Passed], Passed)]
    #[case::bypass_beats_pass(vec![Passed, Bypassed], Bypassed)]
    #[case::ignore_beats_bypass(vec![Bypassed, Ignored, Passed], Ignored)]
    #[case::fail_wins(vec![Passed, Ignored, Failed], Failed)]
    #[case::pass_beats_not_run(vec![Passed, NotRun], Passed)]
    fn aggregates_by_severity(
        #[case] statuses: Vec<ExecutionStatus>,
        #[case] expected: ExecutionStatus,
    ) {
        assert_eq!(ExecutionStatus::aggregate(statuses), expected);
    }
}
