//! Core library for `stepwise-bdd`.
//!
//! The crate implements a behaviour-driven scenario execution engine. Steps
//! are declared once as [`StepDescriptor`]s, bound to a scenario run as
//! [`RunnableStep`]s and executed in order by a [`ScenarioExecutor`], which
//! records an immutable [`ScenarioResult`]. Scenarios of one feature
//! accumulate into a [`FeatureResult`] owned by that feature's
//! [`FeatureRunner`].
//!
//! # Examples
//!
//! ```
//! use stepwise_bdd::{
//!     comment, ExecutionStatus, FeatureRunnerRepository, ParameterDescriptor, ParameterInfo,
//!     StepDescriptor,
//! };
//!
//! struct AccountFeature;
//!
//! let withdraw = StepDescriptor::from_fn("When_customer_withdraws_AMOUNT", |_, args| {
//!     let amount = args.cloned::<u32>(0)?;
//!     comment(format!("withdrawing {amount}"))?;
//!     Ok(())
//! })
//! .unwrap()
//! .with_parameter(ParameterDescriptor::from_constant(
//!     ParameterInfo::new("amount").unwrap(),
//!     20_u32,
//! ));
//!
//! let repository = FeatureRunnerRepository::default();
//! let result = repository
//!     .get_runner_for::<AccountFeature>()
//!     .new_scenario()
//!     .unwrap()
//!     .with_name("Cash_withdrawal")
//!     .with_steps(vec![withdraw])
//!     .run_sync()
//!     .unwrap();
//!
//! let step = &result.steps()[0];
//! assert_eq!(step.info().to_string(), "1. WHEN customer withdraws \"20\"");
//! assert_eq!(step.comments(), ["withdrawing 20"]);
//! assert_eq!(result.status(), ExecutionStatus::Passed);
//! ```

pub mod config;
mod context;
mod descriptor;
mod execution;
mod macros;
mod metadata;
mod notify;
mod panic;
mod result;
mod runner;
mod status;
mod types;

pub use config::Configuration;
pub use context::{ArgumentError, ParameterValue, ScenarioContext, StepArguments};
pub use descriptor::{
    CompositeStep, DescriptorError, ParameterDescriptor, ParameterInfo, StepDescriptor,
    StepFuture, StepInvocation, StepOutcome, ValueFormatter,
};
pub use execution::{
    BoxError, CommentError, ContextProvider, RunnableStep, ScenarioError, ScenarioExecutor,
    ScenarioSubscriber, StatusMapper, StepError, StepsProvider, comment, current_step,
    default_status_mapper, map_status,
};
pub use metadata::{DefaultMetadataProvider, MetadataProvider};
pub use notify::{
    DelegatingProgressNotifier, LoggingProgressNotifier, NoProgressNotifier, ProgressNotifier,
};
pub use panic::panic_message;
pub use result::{ExecutionTime, FeatureResult, ScenarioResult, StepResult};
pub use runner::{FeatureRunner, FeatureRunnerRepository, RunnerError, ScenarioBuilder};
pub use status::ExecutionStatus;
pub use types::{
    FeatureInfo, FeatureType, NameParameterInfo, ScenarioInfo, StepInfo, StepNameFormat,
    StepNameInfo, StepType, StepTypeParseError, UNKNOWN_PARAMETER_VALUE,
};

#[doc(hidden)]
pub use execution::signal::{
    request_bypass as __stepwise_bdd_request_bypass,
    request_ignore as __stepwise_bdd_request_ignore,
};
