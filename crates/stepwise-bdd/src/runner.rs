//! Feature runners: one aggregation point per feature type.
//!
//! A [`FeatureRunnerRepository`] hands out exactly one [`FeatureRunner`] per
//! feature type. Every scenario started through a runner appends its result
//! to the runner's [`FeatureResult`], and disposing the runner reports the
//! feature as finished.

mod builder;
mod repository;

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::{Arc, Mutex, Once};

use thiserror::Error;

pub use builder::ScenarioBuilder;
pub use repository::FeatureRunnerRepository;

use crate::config::Configuration;
use crate::execution::{ScenarioExecutor, lock};
use crate::result::{FeatureResult, ScenarioResult};
use crate::types::{FeatureInfo, FeatureType};

/// Errors raised by feature runners and scenario builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RunnerError {
    /// The runner was used after [`FeatureRunner::dispose`].
    #[error("feature runner for '{feature}' has already been disposed")]
    Disposed {
        /// Type name of the runner's feature.
        feature: &'static str,
    },
    /// A fixture of the wrong type was supplied to a runner.
    #[error("fixture of type '{actual}' does not belong to feature '{expected}'")]
    FixtureTypeMismatch {
        /// Type name of the runner's feature.
        expected: &'static str,
        /// Type name of the supplied fixture.
        actual: &'static str,
    },
    /// A scenario was run without a name.
    #[error("scenario name must be set and not blank")]
    MissingScenarioName,
}

#[derive(Debug, Default)]
struct Lifecycle {
    disposed: bool,
    running: usize,
    finished: bool,
}

impl Lifecycle {
    /// Whether the feature finish is due now; marks it sent.
    fn take_finish(&mut self) -> bool {
        let due = self.disposed && self.running == 0 && !self.finished;
        self.finished |= due;
        due
    }
}

/// Keeps the feature open while a scenario runs.
pub(crate) struct RunningScenario<'r> {
    runner: &'r FeatureRunner,
}

impl Drop for RunningScenario<'_> {
    fn drop(&mut self) {
        let finish = {
            let mut lifecycle = lock(&self.runner.lifecycle);
            lifecycle.running = lifecycle.running.saturating_sub(1);
            lifecycle.take_finish()
        };
        if finish {
            self.runner.notify_finished();
        }
    }
}

/// Per-feature facade owning the scenario executor and feature result.
pub struct FeatureRunner {
    feature_type: FeatureType,
    info: FeatureInfo,
    executor: ScenarioExecutor,
    result: Arc<Mutex<FeatureResult>>,
    started: Once,
    lifecycle: Mutex<Lifecycle>,
}

impl FeatureRunner {
    /// Create the runner for `feature_type` and notify the feature start.
    ///
    /// Prefer [`FeatureRunnerRepository`], which guarantees a single runner
    /// per feature type.
    #[must_use]
    pub fn new(feature_type: FeatureType, config: Configuration) -> Self {
        let runner = Self::unannounced(feature_type, config);
        runner.announce();
        runner
    }

    /// Build the runner without notifying the feature start.
    pub(crate) fn unannounced(feature_type: FeatureType, config: Configuration) -> Self {
        let info = config.metadata().feature_info(&feature_type);
        let result = Arc::new(Mutex::new(FeatureResult::new(info.clone())));
        let mut executor = ScenarioExecutor::new(config);
        let sink = Arc::clone(&result);
        executor.on_scenario_executed(Arc::new(move |scenario: &ScenarioResult| {
            lock(&sink).add_scenario(scenario.clone());
        }));
        Self {
            feature_type,
            info,
            executor,
            result,
            started: Once::new(),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Notify the feature start, once.
    pub(crate) fn announce(&self) {
        self.started.call_once(|| {
            log::debug!("starting feature '{}'", self.info.name());
            self.executor
                .config()
                .notifier()
                .notify_feature_start(&self.info);
        });
    }

    /// The feature type this runner was created for.
    #[must_use]
    pub const fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    /// Feature name, description and labels.
    #[must_use]
    pub fn feature_info(&self) -> &FeatureInfo {
        &self.info
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        lock(&self.lifecycle).disposed
    }

    /// Start configuring a new scenario of this feature.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Disposed`] after disposal.
    pub fn new_scenario(&self) -> Result<ScenarioBuilder<'_>, RunnerError> {
        self.ensure_active()?;
        self.announce();
        Ok(ScenarioBuilder::new(self))
    }

    /// Start configuring a new scenario on behalf of `fixture`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::FixtureTypeMismatch`] when `F` is not the
    /// runner's feature type, and [`RunnerError::Disposed`] after disposal.
    pub fn new_scenario_for<F: Any>(&self, _fixture: &F) -> Result<ScenarioBuilder<'_>, RunnerError> {
        if TypeId::of::<F>() != self.feature_type.id() {
            return Err(RunnerError::FixtureTypeMismatch {
                expected: self.feature_type.type_name(),
                actual: type_name::<F>(),
            });
        }
        self.new_scenario()
    }

    /// Snapshot of the scenarios collected so far.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Disposed`] after disposal.
    pub fn feature_result(&self) -> Result<FeatureResult, RunnerError> {
        self.ensure_active()?;
        Ok(self.snapshot())
    }

    /// Finish the feature.
    ///
    /// New scenarios are refused from the first call on. The feature finish
    /// is notified once, with the collected result, as soon as no scenario
    /// of this runner is still running; scenarios already running when
    /// `dispose` is called are part of that result. Later calls do nothing.
    pub fn dispose(&self) {
        let finish = {
            let mut lifecycle = lock(&self.lifecycle);
            if lifecycle.disposed {
                return;
            }
            lifecycle.disposed = true;
            lifecycle.take_finish()
        };
        if finish {
            self.notify_finished();
        }
    }

    fn notify_finished(&self) {
        let result = self.snapshot();
        log::debug!(
            "finished feature '{}' after {} scenarios",
            result.info().name(),
            result.scenarios().len()
        );
        self.executor
            .config()
            .notifier()
            .notify_feature_finished(&result);
    }

    /// Register a running scenario, refusing it after disposal.
    pub(crate) fn begin_scenario(&self) -> Result<RunningScenario<'_>, RunnerError> {
        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.disposed {
            return Err(self.disposed_error());
        }
        lifecycle.running += 1;
        Ok(RunningScenario { runner: self })
    }

    pub(crate) fn executor(&self) -> &ScenarioExecutor {
        &self.executor
    }

    fn ensure_active(&self) -> Result<(), RunnerError> {
        if self.is_disposed() {
            return Err(self.disposed_error());
        }
        Ok(())
    }

    fn disposed_error(&self) -> RunnerError {
        RunnerError::Disposed {
            feature: self.feature_type.type_name(),
        }
    }

    pub(crate) fn snapshot(&self) -> FeatureResult {
        lock(&self.result).clone()
    }
}

impl fmt::Debug for FeatureRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRunner")
            .field("feature_type", &self.feature_type)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
