//! Scenario context and step argument access.
//!
//! `ScenarioContext` is the type-erased value shared by every step of one
//! scenario run. `StepArguments` carries the evaluated parameter values handed
//! to a step invocation. Both are cheap to clone: values live behind `Arc`.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use derive_more::{From, IntoIterator};
use thiserror::Error;

/// Type-erased parameter value.
pub type ParameterValue = Arc<dyn Any + Send + Sync>;

/// Shared execution context for the steps of one scenario.
///
/// Steps that need to mutate shared state store a type with interior
/// mutability (for example a `Mutex`) in the context.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::ScenarioContext;
///
/// let ctx = ScenarioContext::new(41_u32);
/// assert_eq!(ctx.get::<u32>(), Some(&41));
/// assert!(ctx.get::<String>().is_none());
/// assert!(ScenarioContext::empty().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct ScenarioContext {
    value: Option<Arc<dyn Any + Send + Sync>>,
}

impl ScenarioContext {
    /// Wrap `value` as the scenario context.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Arc::new(value)),
        }
    }

    /// Use an already shared value as the scenario context.
    #[must_use]
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self { value: Some(value) }
    }

    /// A context holding no value.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the context holds no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the context value as `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.as_deref()?.downcast_ref::<T>()
    }

    /// Obtain a shared handle to the context value as `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(self.value.as_ref()?).downcast::<T>().ok()
    }
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("is_empty", &self.is_empty())
            .finish()
    }
}

/// Errors raised when reading step arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ArgumentError {
    /// No argument exists at the requested position.
    #[error("step has no argument at position {index} (argument count: {count})")]
    Missing {
        /// Requested zero-based position.
        index: usize,
        /// Number of arguments supplied.
        count: usize,
    },
    /// The argument exists but has a different type.
    #[error("step argument at position {index} is not of type `{expected}`")]
    TypeMismatch {
        /// Requested zero-based position.
        index: usize,
        /// Name of the requested type.
        expected: &'static str,
    },
}

/// Evaluated parameter values passed to a step invocation.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stepwise_bdd::{ParameterValue, StepArguments};
///
/// let values: Vec<ParameterValue> = vec![Arc::new(5_i32), Arc::new("five")];
/// let args = StepArguments::new(values);
/// assert_eq!(args.get::<i32>(0).ok(), Some(&5));
/// assert!(args.get::<i32>(1).is_err());
/// assert_eq!(args.into_iter().count(), 2);
/// ```
#[derive(Clone, Default, From, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct StepArguments {
    values: Vec<ParameterValue>,
}

impl StepArguments {
    /// Wrap evaluated values in declaration order.
    #[must_use]
    pub fn new(values: Vec<ParameterValue>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the argument at `index` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] when `index` is out of range and
    /// [`ArgumentError::TypeMismatch`] when the value is not a `T`.
    pub fn get<T: Any>(&self, index: usize) -> Result<&T, ArgumentError> {
        let value = self.values.get(index).ok_or(ArgumentError::Missing {
            index,
            count: self.values.len(),
        })?;
        value
            .as_ref()
            .downcast_ref::<T>()
            .ok_or(ArgumentError::TypeMismatch {
                index,
                expected: type_name::<T>(),
            })
    }

    /// Clone the argument at `index` as `T`.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn cloned<T: Any + Clone>(&self, index: usize) -> Result<T, ArgumentError> {
        self.get::<T>(index).cloned()
    }
}

impl fmt::Debug for StepArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepArguments")
            .field("len", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn context_downcast_shares_value() {
        let ctx = ScenarioContext::new(Mutex::new(Vec::<u8>::new()));
        let Some(shared) = ctx.downcast::<Mutex<Vec<u8>>>() else {
            panic!("context should downcast to its stored type");
        };
        if let Ok(mut guard) = shared.lock() {
            guard.push(1);
        }
        let len = ctx
            .get::<Mutex<Vec<u8>>>()
            .and_then(|m| m.lock().ok().map(|g| g.len()));
        assert_eq!(len, Some(1));
    }

    #[test]
    fn empty_context_yields_nothing() {
        let ctx = ScenarioContext::empty();
        assert!(ctx.get::<u8>().is_none());
        assert!(ctx.downcast::<u8>().is_none());
    }

    #[test]
    fn missing_argument_reports_count() {
        let args = StepArguments::default();
        assert_eq!(
            args.get::<u8>(2),
            Err(ArgumentError::Missing { index: 2, count: 0 })
        );
    }
}
