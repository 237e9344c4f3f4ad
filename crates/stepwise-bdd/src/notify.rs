//! Progress notification contract and the bundled notifiers.
//!
//! Notifiers are called synchronously on the executing flow at each lifecycle
//! point. Implementations must not panic: the engine does not guard notifier
//! calls.

use std::sync::Arc;

use derive_more::From;

use crate::result::{FeatureResult, ScenarioResult, StepResult};
use crate::types::{FeatureInfo, ScenarioInfo, StepInfo};

/// Receives feature, scenario and step lifecycle events.
///
/// Every method defaults to doing nothing, so implementations override only
/// the events they care about.
pub trait ProgressNotifier: Send + Sync {
    /// A feature runner was created.
    fn notify_feature_start(&self, _feature: &FeatureInfo) {}

    /// A feature runner was disposed.
    fn notify_feature_finished(&self, _feature: &FeatureResult) {}

    /// A scenario is about to initialise its steps and context.
    fn notify_scenario_start(&self, _scenario: &ScenarioInfo) {}

    /// A scenario finished, successfully or not.
    fn notify_scenario_finished(&self, _scenario: &ScenarioResult) {}

    /// A step is about to be invoked.
    fn notify_step_start(&self, _step: &StepInfo) {}

    /// A step finished; fires exactly once per started step.
    fn notify_step_finished(&self, _step: &StepResult) {}

    /// A step recorded a comment.
    fn notify_step_comment(&self, _step: &StepInfo, _comment: &str) {}
}

/// Notifier that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgressNotifier;

impl ProgressNotifier for NoProgressNotifier {}

/// Forwards every event to each inner notifier in order.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stepwise_bdd::{DelegatingProgressNotifier, LoggingProgressNotifier, NoProgressNotifier};
///
/// let notifier = DelegatingProgressNotifier::new(vec![
///     Arc::new(NoProgressNotifier),
///     Arc::new(LoggingProgressNotifier),
/// ]);
/// assert_eq!(notifier.len(), 2);
///
/// let empty = DelegatingProgressNotifier::from(Vec::new());
/// assert!(empty.is_empty());
/// ```
#[derive(Clone, Default, From)]
pub struct DelegatingProgressNotifier {
    notifiers: Vec<Arc<dyn ProgressNotifier>>,
}

impl DelegatingProgressNotifier {
    /// Fan out to `notifiers`.
    #[must_use]
    pub fn new(notifiers: Vec<Arc<dyn ProgressNotifier>>) -> Self {
        Self { notifiers }
    }

    /// Number of inner notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Whether there are no inner notifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    fn each(&self, f: impl Fn(&dyn ProgressNotifier)) {
        for notifier in &self.notifiers {
            f(notifier.as_ref());
        }
    }
}

impl std::fmt::Debug for DelegatingProgressNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatingProgressNotifier")
            .field("len", &self.notifiers.len())
            .finish()
    }
}

impl ProgressNotifier for DelegatingProgressNotifier {
    fn notify_feature_start(&self, feature: &FeatureInfo) {
        self.each(|n| n.notify_feature_start(feature));
    }

    fn notify_feature_finished(&self, feature: &FeatureResult) {
        self.each(|n| n.notify_feature_finished(feature));
    }

    fn notify_scenario_start(&self, scenario: &ScenarioInfo) {
        self.each(|n| n.notify_scenario_start(scenario));
    }

    fn notify_scenario_finished(&self, scenario: &ScenarioResult) {
        self.each(|n| n.notify_scenario_finished(scenario));
    }

    fn notify_step_start(&self, step: &StepInfo) {
        self.each(|n| n.notify_step_start(step));
    }

    fn notify_step_finished(&self, step: &StepResult) {
        self.each(|n| n.notify_step_finished(step));
    }

    fn notify_step_comment(&self, step: &StepInfo, comment: &str) {
        self.each(|n| n.notify_step_comment(step, comment));
    }
}

/// Writes progress through the `log` facade at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgressNotifier;

impl ProgressNotifier for LoggingProgressNotifier {
    fn notify_feature_start(&self, feature: &FeatureInfo) {
        match feature.description() {
            Some(description) => log::info!("FEATURE: {} - {description}", feature.name()),
            None => log::info!("FEATURE: {}", feature.name()),
        }
    }

    fn notify_feature_finished(&self, feature: &FeatureResult) {
        log::info!(
            "FEATURE FINISHED: {} ({} scenarios, {})",
            feature.info().name(),
            feature.scenarios().len(),
            feature.status()
        );
    }

    fn notify_scenario_start(&self, scenario: &ScenarioInfo) {
        log::info!("SCENARIO: {}", scenario.name());
    }

    fn notify_scenario_finished(&self, scenario: &ScenarioResult) {
        let elapsed = scenario.execution_time().duration();
        match scenario.status_details() {
            Some(details) => log::info!(
                "  SCENARIO RESULT: {} after {elapsed:?}\n    {}",
                scenario.status(),
                details.replace('\n', "\n    ")
            ),
            None => log::info!("  SCENARIO RESULT: {} after {elapsed:?}", scenario.status()),
        }
    }

    fn notify_step_start(&self, step: &StepInfo) {
        log::info!("  STEP {}...", step);
    }

    fn notify_step_finished(&self, step: &StepResult) {
        let elapsed = step
            .execution_time()
            .map(|time| time.duration())
            .unwrap_or_default();
        log::info!(
            "  STEP {}: {} ({} after {elapsed:?})",
            step.info().number(),
            step.info().name(),
            step.status()
        );
    }

    fn notify_step_comment(&self, step: &StepInfo, comment: &str) {
        log::info!("  STEP {}: /* {comment} */", step.number());
    }
}
