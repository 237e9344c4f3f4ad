//! Runnable steps: a descriptor bound to one scenario run.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Instant, SystemTime};

use futures::FutureExt as _;
use futures::future::BoxFuture;

use super::error::{StatusMapper, StepError};
use super::scope::StepScoped;
use super::signal;
use crate::config::Configuration;
use crate::context::{ParameterValue, ScenarioContext, StepArguments};
use crate::descriptor::{
    CompositeStep, ParameterDescriptor, StepDescriptor, StepInvocation, StepOutcome,
    ValueFormatter, format_with,
};
use crate::notify::ProgressNotifier;
use crate::result::{ExecutionTime, StepResult};
use crate::status::ExecutionStatus;
use crate::types::{NameParameterInfo, StepInfo, StepNameFormat, StepNameInfo, StepType};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State of an executing step shared with the ambient scope.
pub(crate) struct StepState {
    result: Mutex<StepResult>,
    notifier: Arc<dyn ProgressNotifier>,
}

impl StepState {
    pub(crate) fn info(&self) -> StepInfo {
        lock(&self.result).info().clone()
    }

    pub(crate) fn comment(&self, text: String) {
        let info = {
            let mut result = lock(&self.result);
            result.add_comment(text.clone());
            result.info().clone()
        };
        self.notifier.notify_step_comment(&info, &text);
    }

    fn snapshot(&self) -> StepResult {
        lock(&self.result).clone()
    }
}

struct BoundParameter {
    descriptor: ParameterDescriptor,
    formatter: ValueFormatter,
    value: Option<ParameterValue>,
}

impl BoundParameter {
    fn render(&self, step: &str) -> Result<NameParameterInfo, StepError> {
        let Some(value) = &self.value else {
            return Ok(NameParameterInfo::unknown());
        };
        format_with(&self.formatter, value)
            .map(NameParameterInfo::evaluated)
            .map_err(|err| StepError::ParameterFormatting {
                parameter: self.descriptor.info().raw_name().to_owned(),
                step: step.to_owned(),
                message: err.to_string(),
            })
    }
}

/// A step descriptor bound to a scenario run.
///
/// A runnable step owns its [`StepResult`] and can be invoked exactly once.
/// Running the same declaration again requires a fresh `RunnableStep` built
/// from the same [`StepDescriptor`].
pub struct RunnableStep {
    state: Arc<StepState>,
    raw_name: String,
    name_format: StepNameFormat,
    parameters: Vec<BoundParameter>,
    invocation: StepInvocation,
    status_mapper: StatusMapper,
    config: Configuration,
    invoked: bool,
}

impl RunnableStep {
    /// Bind `descriptor` as step `number`.
    ///
    /// `previous_step_type` is the resolved type of the preceding step, used
    /// to collapse repeated types into `AND`. Constant parameters are rendered
    /// immediately; deferred ones show as `<?>` until invoked.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::ParameterFormatting`] when a constant parameter
    /// cannot be rendered.
    pub fn new(
        number: impl Into<String>,
        descriptor: &StepDescriptor,
        previous_step_type: Option<StepType>,
        config: &Configuration,
    ) -> Result<Self, StepError> {
        let metadata = config.metadata();
        let name_format = metadata.step_name_format(descriptor, previous_step_type);
        let parameters = descriptor
            .parameters()
            .iter()
            .map(|parameter| BoundParameter {
                descriptor: parameter.clone(),
                formatter: metadata
                    .parameter_formatter(parameter.info())
                    .unwrap_or_else(|| Arc::clone(parameter.formatter())),
                value: parameter
                    .is_constant()
                    .then(|| parameter.evaluate(&ScenarioContext::empty()).ok())
                    .flatten(),
            })
            .collect();
        let mut step = Self {
            state: Arc::new(StepState {
                result: Mutex::new(StepResult::new(StepInfo::new(
                    number,
                    StepNameInfo::new(None, String::new(), Vec::new()),
                ))),
                notifier: Arc::clone(config.notifier()),
            }),
            raw_name: descriptor.raw_name().to_owned(),
            name_format,
            parameters,
            invocation: Arc::clone(descriptor.invocation()),
            status_mapper: Arc::clone(config.status_mapper()),
            config: config.clone(),
            invoked: false,
        };
        step.refresh_name()?;
        Ok(step)
    }

    /// Step number and current name.
    #[must_use]
    pub fn info(&self) -> StepInfo {
        self.state.info()
    }

    /// Snapshot of the step result.
    #[must_use]
    pub fn result(&self) -> StepResult {
        self.state.snapshot()
    }

    /// Resolved step type, used as the previous type of the next step.
    #[must_use]
    pub fn step_type(&self) -> Option<StepType> {
        self.name_format.step_type()
    }

    /// Record a comment against this step and notify it.
    pub fn comment(&self, text: impl Into<String>) {
        self.state.comment(text.into());
    }

    /// Execute the step against `context`.
    ///
    /// Parameters are evaluated first; a failed evaluation renders as `<?>`
    /// and fails the step without calling its body. A bypass signal is
    /// recorded as [`ExecutionStatus::Bypassed`] and is not returned. Every
    /// other failure is recorded with the mapped status and returned so the
    /// caller can stop the scenario. The finish notification fires exactly
    /// once in every case.
    ///
    /// # Errors
    ///
    /// Returns the step's failure, or [`StepError::AlreadyInvoked`] when the
    /// step has already run.
    pub async fn invoke(&mut self, context: &ScenarioContext) -> Result<(), StepError> {
        if self.invoked {
            return Err(StepError::AlreadyInvoked {
                number: self.info().number().to_owned(),
            });
        }
        self.invoked = true;

        let evaluation = self.evaluate_parameters(context);
        let naming = if self.parameters.is_empty() {
            Ok(())
        } else {
            self.refresh_name()
        };
        let info = self.state.info();
        log::trace!("starting step {info}");
        self.state.notifier.notify_step_start(&info);

        let start = SystemTime::now();
        let timer = Instant::now();
        let outcome = match evaluation.and(naming) {
            Ok(()) => self.run_body(context).await,
            Err(err) => Err(err),
        };
        lock(&self.state.result).set_execution_time(ExecutionTime::new(start, timer.elapsed()));

        let returned = self.record(outcome);
        let result = self.state.snapshot();
        log::trace!("finished step {} with {}", result.info(), result.status());
        self.state.notifier.notify_step_finished(&result);
        returned
    }

    /// Evaluate every parameter, returning the first failure.
    fn evaluate_parameters(&mut self, context: &ScenarioContext) -> Result<(), StepError> {
        let mut first_failure = None;
        for parameter in &mut self.parameters {
            match parameter.descriptor.evaluate(context) {
                Ok(value) => parameter.value = Some(value),
                Err(err) => {
                    parameter.value = None;
                    first_failure.get_or_insert_with(|| StepError::ParameterEvaluation {
                        parameter: parameter.descriptor.info().raw_name().to_owned(),
                        message: err.to_string(),
                    });
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    fn refresh_name(&mut self) -> Result<(), StepError> {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| parameter.render(&self.raw_name))
            .collect::<Result<Vec<_>, _>>()?;
        let name = StepNameInfo::new(
            self.name_format.step_type_label().map(str::to_owned),
            self.name_format.format(),
            parameters,
        );
        lock(&self.state.result).set_name(name);
        Ok(())
    }

    async fn run_body(&self, context: &ScenarioContext) -> Result<ExecutionStatus, StepError> {
        let arguments = StepArguments::new(
            self.parameters
                .iter()
                .filter_map(|parameter| parameter.value.clone())
                .collect(),
        );
        let invocation = Arc::clone(&self.invocation);
        let body_context = context.clone();
        let body = async move { invocation(body_context, arguments).await };
        let caught =
            StepScoped::new(Arc::clone(&self.state), AssertUnwindSafe(body).catch_unwind()).await;
        match caught {
            Ok(Ok(StepOutcome::Completed)) => Ok(ExecutionStatus::Passed),
            Ok(Ok(StepOutcome::Composite(composite))) => {
                self.run_sub_steps(composite, context).await
            }
            Ok(Err(err)) => Err(err),
            Err(payload) => Err(signal::error_from_panic(payload)),
        }
    }

    async fn run_sub_steps(
        &self,
        composite: CompositeStep,
        parent_context: &ScenarioContext,
    ) -> Result<ExecutionStatus, StepError> {
        let (descriptors, context) = composite.into_parts();
        let context = context.unwrap_or_else(|| parent_context.clone());
        let number = self.info().number().to_owned();
        let mut steps = catch_unwind(AssertUnwindSafe(|| {
            prepare_steps(&descriptors, Some(&number), &self.config)
        }))
        .unwrap_or_else(|payload| Err(signal::error_from_panic(payload)))?;
        let outcome = run_steps(&mut steps, &context).await;
        let results: Vec<StepResult> = steps.iter().map(Self::result).collect();
        let status = ExecutionStatus::aggregate(results.iter().map(StepResult::status))
            .max(ExecutionStatus::Passed);
        lock(&self.state.result).set_sub_steps(results);
        outcome.map(|()| status)
    }

    fn record(&self, outcome: Result<ExecutionStatus, StepError>) -> Result<(), StepError> {
        let mut result = lock(&self.state.result);
        match outcome {
            Ok(status) => {
                result.set_status(status, None);
                Ok(())
            }
            Err(err) if err.is_bypass() => {
                result.set_status(ExecutionStatus::Bypassed, Some(err.to_string()));
                Ok(())
            }
            Err(err) => {
                result.set_status((self.status_mapper)(&err), Some(err.to_string()));
                Err(err)
            }
        }
    }
}

impl fmt::Debug for RunnableStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableStep")
            .field("info", &self.info())
            .field("invoked", &self.invoked)
            .finish_non_exhaustive()
    }
}

/// Bind `descriptors` in order, numbering them `1..` or `{parent}.1..`.
pub(crate) fn prepare_steps(
    descriptors: &[StepDescriptor],
    parent: Option<&str>,
    config: &Configuration,
) -> Result<Vec<RunnableStep>, StepError> {
    let mut previous = None;
    let mut steps = Vec::with_capacity(descriptors.len());
    for (index, descriptor) in descriptors.iter().enumerate() {
        let ordinal = index + 1;
        let number = match parent {
            Some(parent) => format!("{parent}.{ordinal}"),
            None => ordinal.to_string(),
        };
        let step = RunnableStep::new(number, descriptor, previous, config)?;
        previous = step.step_type();
        steps.push(step);
    }
    Ok(steps)
}

/// Invoke `steps` sequentially, stopping at the first error.
pub(crate) fn run_steps<'a>(
    steps: &'a mut [RunnableStep],
    context: &'a ScenarioContext,
) -> BoxFuture<'a, Result<(), StepError>> {
    async move {
        for step in steps.iter_mut() {
            step.invoke(context).await?;
        }
        Ok(())
    }
    .boxed()
}
