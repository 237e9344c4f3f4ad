//! Scenario executor: runs the steps of one scenario and builds its result.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use super::error::{BoxError, ScenarioError};
use super::step::{RunnableStep, prepare_steps, run_steps};
use crate::config::Configuration;
use crate::context::ScenarioContext;
use crate::descriptor::StepDescriptor;
use crate::panic::panic_message;
use crate::result::{ExecutionTime, ScenarioResult};
use crate::types::ScenarioInfo;

/// Produces the scenario's step descriptors when the scenario starts.
pub type StepsProvider = Box<dyn FnOnce() -> Result<Vec<StepDescriptor>, BoxError> + Send>;

/// Produces the scenario context when the scenario starts.
pub type ContextProvider = Box<dyn FnOnce() -> Result<ScenarioContext, BoxError> + Send>;

/// Callback receiving every executed scenario's result.
pub type ScenarioSubscriber = Arc<dyn Fn(&ScenarioResult) + Send + Sync>;

/// Executes scenarios one step at a time.
///
/// Each call to [`execute`](Self::execute) owns its steps and context, so an
/// executor may run several scenarios concurrently.
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use stepwise_bdd::{
///     Configuration, ExecutionStatus, ScenarioContext, ScenarioExecutor, ScenarioInfo,
///     StepDescriptor,
/// };
///
/// let executor = ScenarioExecutor::new(Configuration::default());
/// let steps = vec![StepDescriptor::from_fn("Given_a_cart", |_, _| Ok(())).unwrap()];
/// let result = block_on(executor.execute(
///     ScenarioInfo::new("empty cart", Vec::new(), Vec::new()),
///     Box::new(move || Ok(steps)),
///     Box::new(|| Ok(ScenarioContext::empty())),
/// ))
/// .unwrap();
/// assert_eq!(result.status(), ExecutionStatus::Passed);
/// assert_eq!(result.steps()[0].info().to_string(), "1. GIVEN a cart");
/// ```
#[derive(Clone)]
pub struct ScenarioExecutor {
    config: Configuration,
    subscribers: Vec<ScenarioSubscriber>,
}

struct Prepared {
    steps: Vec<RunnableStep>,
    context: ScenarioContext,
}

impl ScenarioExecutor {
    /// Executor using the collaborators in `config`.
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            subscribers: Vec::new(),
        }
    }

    /// Register a callback fired with every scenario result, before the
    /// scenario finish notification.
    pub fn on_scenario_executed(&mut self, subscriber: ScenarioSubscriber) {
        self.subscribers.push(subscriber);
    }

    /// The configuration used by this executor.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Run one scenario.
    ///
    /// The providers are called once the scenario has started; a failure in
    /// either fails the scenario before any step runs. Steps run in order and
    /// the first returned error stops the scenario, leaving later steps not
    /// run. Subscribers and the scenario finish notification fire in every
    /// case.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Initialization`] when a provider fails and
    /// [`ScenarioError::Step`] when a step fails. Both carry the scenario
    /// result.
    pub async fn execute(
        &self,
        info: ScenarioInfo,
        steps_provider: StepsProvider,
        context_provider: ContextProvider,
    ) -> Result<ScenarioResult, ScenarioError> {
        let notifier = self.config.notifier();
        log::debug!("starting scenario '{}'", info.name());
        notifier.notify_scenario_start(&info);

        let start = SystemTime::now();
        let timer = Instant::now();
        let mut step_error = None;
        let mut initialization_failure = None;
        let mut steps = Vec::new();
        match self.initialize(steps_provider, context_provider) {
            Ok(mut prepared) => {
                if let Err(err) = run_steps(&mut prepared.steps, &prepared.context).await {
                    step_error = Some(err);
                }
                steps = prepared.steps;
            }
            Err(message) => {
                log::warn!("scenario '{}' failed to initialise: {message}", info.name());
                initialization_failure = Some(message);
            }
        }

        let result = ScenarioResult::new(
            info,
            steps.iter().map(RunnableStep::result).collect(),
            ExecutionTime::new(start, timer.elapsed()),
            initialization_failure.clone(),
        );
        for subscriber in &self.subscribers {
            subscriber(&result);
        }
        log::debug!(
            "finished scenario '{}' with {}",
            result.info().name(),
            result.status()
        );
        notifier.notify_scenario_finished(&result);

        match (initialization_failure, step_error) {
            (Some(message), _) => Err(ScenarioError::Initialization {
                message,
                result: Box::new(result),
            }),
            (None, Some(source)) => Err(ScenarioError::Step {
                source,
                result: Box::new(result),
            }),
            (None, None) => Ok(result),
        }
    }

    fn initialize(
        &self,
        steps_provider: StepsProvider,
        context_provider: ContextProvider,
    ) -> Result<Prepared, String> {
        let steps = guarded(steps_provider)
            .and_then(|descriptors| guarded(|| prepare_steps(&descriptors, None, &self.config)))
            .map_err(|message| format!("Step initialization failed: {message}"))?;
        let context = guarded(context_provider)
            .map_err(|message| format!("Context initialization failed: {message}"))?;
        Ok(Prepared { steps, context })
    }
}

impl fmt::Debug for ScenarioExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioExecutor")
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

/// Run an initialisation stage, rendering its error or panic as a message.
fn guarded<T, E: fmt::Display>(stage: impl FnOnce() -> Result<T, E>) -> Result<T, String> {
    match catch_unwind(AssertUnwindSafe(stage)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}
