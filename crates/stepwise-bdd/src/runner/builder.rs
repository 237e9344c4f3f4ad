//! Fluent configuration of one scenario run.

use std::any::Any;
use std::fmt;

use stepwise_bdd_harness::{
    HarnessAdapter, ScenarioMetadata, ScenarioRunRequest, ScenarioRunner, StdHarness,
};

use super::{FeatureRunner, RunnerError};
use crate::context::ScenarioContext;
use crate::descriptor::StepDescriptor;
use crate::execution::{BoxError, ContextProvider, ScenarioError, StepsProvider};
use crate::result::ScenarioResult;
use crate::types::ScenarioInfo;

/// Builder for a scenario of one feature.
///
/// Configuring the builder has no side effects; the scenario starts when
/// [`run`](Self::run), [`run_with`](Self::run_with) or
/// [`run_sync`](Self::run_sync) is called.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{ExecutionStatus, FeatureRunnerRepository, StepDescriptor};
///
/// struct CheckoutFeature;
///
/// let repository = FeatureRunnerRepository::default();
/// let runner = repository.get_runner_for::<CheckoutFeature>();
/// let result = runner
///     .new_scenario()
///     .unwrap()
///     .with_name("Paying_by_card")
///     .with_labels(["Ticket-7"])
///     .with_context(0_u32)
///     .with_steps(vec![
///         StepDescriptor::from_fn("Given_a_basket", |_, _| Ok(())).unwrap(),
///         StepDescriptor::from_fn("When_paying", |_, _| Ok(())).unwrap(),
///     ])
///     .run_sync()
///     .unwrap();
/// assert_eq!(result.info().name(), "Paying by card");
/// assert_eq!(result.status(), ExecutionStatus::Passed);
/// ```
#[must_use = "a scenario builder does nothing until it is run"]
pub struct ScenarioBuilder<'r> {
    runner: &'r FeatureRunner,
    name: Option<String>,
    labels: Vec<String>,
    categories: Vec<String>,
    steps: Option<StepsProvider>,
    context: Option<ContextProvider>,
}

impl<'r> ScenarioBuilder<'r> {
    pub(crate) fn new(runner: &'r FeatureRunner) -> Self {
        Self {
            runner,
            name: None,
            labels: Vec::new(),
            categories: Vec::new(),
            steps: None,
            context: None,
        }
    }

    /// Raw scenario name, formatted by the metadata provider.
    pub fn with_name(mut self, raw_name: impl Into<String>) -> Self {
        self.name = Some(raw_name.into());
        self
    }

    /// Scenario labels, such as ticket identifiers.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Scenario categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    /// Fixed list of steps.
    pub fn with_steps(self, steps: Vec<StepDescriptor>) -> Self {
        self.with_steps_provider(move || Ok(steps))
    }

    /// Steps produced when the scenario starts; a failure fails the scenario
    /// before any step runs.
    pub fn with_steps_provider<F>(mut self, provider: F) -> Self
    where
        F: FnOnce() -> Result<Vec<StepDescriptor>, BoxError> + Send + 'static,
    {
        self.steps = Some(Box::new(provider));
        self
    }

    /// Fixed context value shared by every step.
    pub fn with_context<T: Any + Send + Sync>(self, value: T) -> Self {
        self.with_context_provider(move || Ok(ScenarioContext::new(value)))
    }

    /// Context produced when the scenario starts; a failure fails the
    /// scenario before any step runs.
    pub fn with_context_provider<F>(mut self, provider: F) -> Self
    where
        F: FnOnce() -> Result<ScenarioContext, BoxError> + Send + 'static,
    {
        self.context = Some(Box::new(provider));
        self
    }

    /// Run the scenario on the caller's executor.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Runner`] when the runner is disposed or no
    /// name was given, and otherwise the errors of
    /// [`ScenarioExecutor::execute`](crate::ScenarioExecutor::execute).
    pub async fn run(self) -> Result<ScenarioResult, ScenarioError> {
        let Self {
            runner,
            name,
            labels,
            categories,
            steps,
            context,
        } = self;
        let _running = runner.begin_scenario()?;
        let raw_name = name
            .filter(|name| !name.trim().is_empty())
            .ok_or(RunnerError::MissingScenarioName)?;
        let executor = runner.executor();
        let name = executor.config().metadata().scenario_name(&raw_name);
        let info = ScenarioInfo::new(name, labels, categories);
        let steps = steps.unwrap_or_else(|| Box::new(|| Ok(Vec::new())));
        let context = context.unwrap_or_else(|| Box::new(|| Ok(ScenarioContext::empty())));
        executor.execute(info, steps, context).await
    }

    /// Run the scenario to completion inside `harness`.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with<H: HarnessAdapter>(self, harness: &H) -> Result<ScenarioResult, ScenarioError> {
        let metadata = self.metadata();
        harness.run(ScenarioRunRequest::new(
            metadata,
            ScenarioRunner::new(self.run()),
        ))
    }

    /// Run the scenario to completion on the calling thread with
    /// [`StdHarness`].
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_sync(self) -> Result<ScenarioResult, ScenarioError> {
        self.run_with(&StdHarness::new())
    }

    /// Metadata for the harness, named as the scenario result will be.
    fn metadata(&self) -> ScenarioMetadata {
        let scenario_name = self.name.as_deref().map_or_else(String::new, |raw| {
            self.runner.executor().config().metadata().scenario_name(raw)
        });
        ScenarioMetadata::new(
            self.runner.feature_info().name(),
            scenario_name,
            self.labels.clone(),
        )
    }
}

impl fmt::Debug for ScenarioBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioBuilder")
            .field("feature", &self.runner.feature_type())
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}
