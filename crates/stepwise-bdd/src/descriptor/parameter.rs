//! Parameter descriptors: constant or context-dependent step arguments.

use std::any::{Any, type_name};
use std::fmt::{self, Display};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::DescriptorError;
use crate::context::{ParameterValue, ScenarioContext};
use crate::execution::BoxError;
use crate::panic::panic_message;

/// Renders a parameter value for display in a step name.
pub type ValueFormatter =
    Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<String, BoxError> + Send + Sync>;

type Evaluator = Arc<dyn Fn(&ScenarioContext) -> Result<ParameterValue, BoxError> + Send + Sync>;

/// Declared information about a step parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterInfo {
    raw_name: String,
}

impl ParameterInfo {
    /// Describe a parameter by its raw (declared) name.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::BlankParameterName`] when the name is empty
    /// or whitespace.
    pub fn new(raw_name: impl Into<String>) -> Result<Self, DescriptorError> {
        let raw_name = raw_name.into();
        if raw_name.trim().is_empty() {
            return Err(DescriptorError::BlankParameterName);
        }
        Ok(Self { raw_name })
    }

    /// The declared parameter name.
    #[must_use]
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }
}

#[derive(Clone)]
enum ParameterSource {
    Constant(ParameterValue),
    Invocation(Evaluator),
}

/// Immutable description of one step parameter.
///
/// A descriptor is either constant, always yielding its captured value, or
/// invocation based, evaluating a function against the scenario context when
/// the step runs.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{ParameterDescriptor, ParameterInfo, ScenarioContext};
///
/// let info = ParameterInfo::new("amount").unwrap();
/// let constant = ParameterDescriptor::from_constant(info.clone(), 20_u32);
/// assert!(constant.is_constant());
///
/// let lazy = ParameterDescriptor::from_invocation(info, |ctx: &ScenarioContext| {
///     ctx.get::<u32>().copied().ok_or_else(|| "no balance".into())
/// });
/// let value = lazy.evaluate(&ScenarioContext::new(7_u32)).unwrap();
/// assert_eq!(lazy.format_value(&value).unwrap(), "7");
/// ```
#[derive(Clone)]
pub struct ParameterDescriptor {
    info: ParameterInfo,
    source: ParameterSource,
    formatter: ValueFormatter,
}

impl ParameterDescriptor {
    /// Capture a fixed value.
    pub fn from_constant<T>(info: ParameterInfo, value: T) -> Self
    where
        T: Display + Send + Sync + 'static,
    {
        Self {
            info,
            source: ParameterSource::Constant(Arc::new(value)),
            formatter: display_formatter::<T>(),
        }
    }

    /// Defer the value to `evaluator`, called with the scenario context.
    pub fn from_invocation<T, F>(info: ParameterInfo, evaluator: F) -> Self
    where
        T: Display + Send + Sync + 'static,
        F: Fn(&ScenarioContext) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let evaluator: Evaluator = Arc::new(move |ctx: &ScenarioContext| {
            evaluator(ctx).map(|value| Arc::new(value) as ParameterValue)
        });
        Self {
            info,
            source: ParameterSource::Invocation(evaluator),
            formatter: display_formatter::<T>(),
        }
    }

    /// Replace the display formatter.
    ///
    /// The formatter fails when applied to a value that is not a `T`.
    #[must_use]
    pub fn with_formatter<T, F>(mut self, format: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.formatter = Arc::new(
            move |value: &(dyn Any + Send + Sync)| -> Result<String, BoxError> {
                let typed = value
                    .downcast_ref::<T>()
                    .ok_or_else(|| format!("value is not of type `{}`", type_name::<T>()))?;
                format(typed)
            },
        );
        self
    }

    /// Whether the descriptor holds a constant value.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self.source, ParameterSource::Constant(_))
    }

    /// Declared parameter information.
    #[must_use]
    pub fn info(&self) -> &ParameterInfo {
        &self.info
    }

    /// The formatter used to render values of this parameter.
    #[must_use]
    pub fn formatter(&self) -> &ValueFormatter {
        &self.formatter
    }

    /// Produce the parameter value for `ctx`.
    ///
    /// Constant descriptors ignore the context. Panics raised by an evaluator
    /// are converted into errors.
    ///
    /// # Errors
    ///
    /// Returns the evaluator's error, or the rendered panic message.
    pub fn evaluate(&self, ctx: &ScenarioContext) -> Result<ParameterValue, BoxError> {
        match &self.source {
            ParameterSource::Constant(value) => Ok(Arc::clone(value)),
            ParameterSource::Invocation(evaluator) => {
                catch_unwind(AssertUnwindSafe(|| evaluator(ctx)))
                    .unwrap_or_else(|payload| Err(panic_message(payload.as_ref()).into()))
            }
        }
    }

    /// Render `value` with this descriptor's formatter.
    ///
    /// # Errors
    ///
    /// Returns the formatter's error, or the rendered panic message.
    pub fn format_value(&self, value: &ParameterValue) -> Result<String, BoxError> {
        format_with(&self.formatter, value)
    }
}

impl fmt::Debug for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDescriptor")
            .field("info", &self.info)
            .field("is_constant", &self.is_constant())
            .finish_non_exhaustive()
    }
}

/// Apply `formatter` to `value`, converting panics into errors.
pub(crate) fn format_with(
    formatter: &ValueFormatter,
    value: &ParameterValue,
) -> Result<String, BoxError> {
    catch_unwind(AssertUnwindSafe(|| formatter(value.as_ref())))
        .unwrap_or_else(|payload| Err(panic_message(payload.as_ref()).into()))
}

fn display_formatter<T: Display + 'static>() -> ValueFormatter {
    Arc::new(|value: &(dyn Any + Send + Sync)| -> Result<String, BoxError> {
        value
            .downcast_ref::<T>()
            .map(ToString::to_string)
            .ok_or_else(|| format!("value is not of type `{}`", type_name::<T>()).into())
    })
}
