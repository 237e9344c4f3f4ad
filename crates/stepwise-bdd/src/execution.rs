//! Step and scenario execution.
//!
//! [`RunnableStep`] binds a descriptor to one run and owns its result;
//! [`ScenarioExecutor`] runs an ordered list of runnable steps under one
//! scenario context and assembles the [`ScenarioResult`](crate::ScenarioResult).
//! Step bodies reach the step executing on their flow through [`comment`] and
//! [`current_step`], and unwind with [`bypass!`](crate::bypass!) or
//! [`ignore!`](crate::ignore!) to signal non-failure outcomes.

mod error;
mod scenario;
mod scope;
pub(crate) mod signal;
mod step;

pub use error::{
    BoxError, ScenarioError, StatusMapper, StepError, default_status_mapper, map_status,
};
pub use scenario::{ContextProvider, ScenarioExecutor, ScenarioSubscriber, StepsProvider};
pub use scope::{CommentError, comment, current_step};
pub use step::RunnableStep;

pub(crate) use step::lock;
