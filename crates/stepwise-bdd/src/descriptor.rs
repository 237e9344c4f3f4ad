//! Step descriptors: the immutable declaration of a step.
//!
//! A [`StepDescriptor`] is produced once per step declaration and can be
//! turned into any number of runnable steps across repeated scenario runs.
//! Descriptor producers (macros, fluent builders, test adapters) only depend on
//! this module.

mod parameter;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt as _;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::context::{ScenarioContext, StepArguments};
use crate::execution::StepError;
use crate::types::StepType;

pub(crate) use parameter::format_with;
pub use parameter::{ParameterDescriptor, ParameterInfo, ValueFormatter};

/// Future returned by a step invocation.
pub type StepFuture = BoxFuture<'static, Result<StepOutcome, StepError>>;

/// Type-erased step invocation function.
pub type StepInvocation = Arc<dyn Fn(ScenarioContext, StepArguments) -> StepFuture + Send + Sync>;

/// Errors raised when constructing descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DescriptorError {
    /// The step raw name is empty or whitespace.
    #[error("step raw name must not be blank")]
    BlankStepName,
    /// The parameter raw name is empty or whitespace.
    #[error("parameter raw name must not be blank")]
    BlankParameterName,
}

/// Successful outcome of a step invocation.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step body finished.
    Completed,
    /// The step expands into sub-steps executed after the body returns.
    Composite(CompositeStep),
}

/// Sub-steps produced by a composite step.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{CompositeStep, ScenarioContext, StepDescriptor};
///
/// let inner = StepDescriptor::from_fn("Then_it_works", |_, _| Ok(())).unwrap();
/// let composite = CompositeStep::new(vec![inner]).with_context(ScenarioContext::new(1_u8));
/// assert_eq!(composite.steps().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CompositeStep {
    steps: Vec<StepDescriptor>,
    context: Option<ScenarioContext>,
}

impl CompositeStep {
    /// Group `steps` as sub-steps sharing the parent's context.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = StepDescriptor>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            context: None,
        }
    }

    /// Run the sub-steps with a dedicated context.
    #[must_use]
    pub fn with_context(mut self, context: ScenarioContext) -> Self {
        self.context = Some(context);
        self
    }

    /// The sub-step descriptors.
    #[must_use]
    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub(crate) fn into_parts(self) -> (Vec<StepDescriptor>, Option<ScenarioContext>) {
        (self.steps, self.context)
    }
}

/// Immutable declaration of a single step.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{ParameterDescriptor, ParameterInfo, StepDescriptor, StepOutcome, StepType};
///
/// let step = StepDescriptor::new("customer_has_AMOUNT_money", |_ctx, args| async move {
///     let amount = args.cloned::<u32>(0)?;
///     assert_eq!(amount, 20);
///     Ok::<_, stepwise_bdd::StepError>(StepOutcome::Completed)
/// })
/// .unwrap()
/// .with_step_type(StepType::Given)
/// .with_parameter(ParameterDescriptor::from_constant(
///     ParameterInfo::new("amount").unwrap(),
///     20_u32,
/// ));
/// assert_eq!(step.raw_name(), "customer_has_AMOUNT_money");
/// assert_eq!(step.parameters().len(), 1);
///
/// assert!(StepDescriptor::from_fn("  ", |_, _| Ok(())).is_err());
/// ```
#[derive(Clone)]
pub struct StepDescriptor {
    raw_name: String,
    predefined_step_type: Option<StepType>,
    invocation: StepInvocation,
    parameters: Vec<ParameterDescriptor>,
}

impl StepDescriptor {
    /// Declare an asynchronous step.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::BlankStepName`] when `raw_name` is empty or
    /// whitespace.
    pub fn new<F, Fut>(raw_name: impl Into<String>, invocation: F) -> Result<Self, DescriptorError>
    where
        F: Fn(ScenarioContext, StepArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StepOutcome, StepError>> + Send + 'static,
    {
        let invocation: StepInvocation =
            Arc::new(move |ctx: ScenarioContext, args: StepArguments| {
                invocation(ctx, args).boxed()
            });
        Self::from_invocation(raw_name, invocation)
    }

    /// Declare a synchronous step whose body completes without sub-steps.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::BlankStepName`] when `raw_name` is empty or
    /// whitespace.
    pub fn from_fn<F>(raw_name: impl Into<String>, body: F) -> Result<Self, DescriptorError>
    where
        F: Fn(&ScenarioContext, &StepArguments) -> Result<(), StepError> + Send + Sync + 'static,
    {
        let invocation: StepInvocation = Arc::new(move |ctx: ScenarioContext, args: StepArguments| {
            let outcome = body(&ctx, &args).map(|()| StepOutcome::Completed);
            futures::future::ready(outcome).boxed()
        });
        Self::from_invocation(raw_name, invocation)
    }

    /// Declare a step from an already type-erased invocation.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::BlankStepName`] when `raw_name` is empty or
    /// whitespace.
    pub fn from_invocation(
        raw_name: impl Into<String>,
        invocation: StepInvocation,
    ) -> Result<Self, DescriptorError> {
        let raw_name = raw_name.into();
        if raw_name.trim().is_empty() {
            return Err(DescriptorError::BlankStepName);
        }
        Ok(Self {
            raw_name,
            predefined_step_type: None,
            invocation,
            parameters: Vec::new(),
        })
    }

    /// Set the predefined step type.
    #[must_use]
    pub fn with_step_type(mut self, step_type: StepType) -> Self {
        self.predefined_step_type = Some(step_type);
        self
    }

    /// Append one parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Append several parameters in order.
    #[must_use]
    pub fn with_parameters(
        mut self,
        parameters: impl IntoIterator<Item = ParameterDescriptor>,
    ) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// The declared raw name.
    #[must_use]
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// The predefined step type, if any.
    #[must_use]
    pub const fn predefined_step_type(&self) -> Option<StepType> {
        self.predefined_step_type
    }

    /// Parameter descriptors in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// The invocation function.
    #[must_use]
    pub fn invocation(&self) -> &StepInvocation {
        &self.invocation
    }
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("raw_name", &self.raw_name)
            .field("predefined_step_type", &self.predefined_step_type)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
