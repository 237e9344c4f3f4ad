//! Scenario run requests handed to harness adapters.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Scenario metadata provided to harness adapters.
///
/// # Examples
///
/// ```
/// use stepwise_bdd_harness::ScenarioMetadata;
///
/// let metadata = ScenarioMetadata::new("Login", "Successful login", vec!["smoke".into()]);
/// assert_eq!(metadata.feature_name(), "Login");
/// assert_eq!(metadata.scenario_name(), "Successful login");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioMetadata {
    feature_name: String,
    scenario_name: String,
    labels: Vec<String>,
}

impl ScenarioMetadata {
    /// Creates metadata for one scenario run.
    #[must_use]
    pub fn new(
        feature_name: impl Into<String>,
        scenario_name: impl Into<String>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            feature_name: feature_name.into(),
            scenario_name: scenario_name.into(),
            labels,
        }
    }

    /// Returns the feature name.
    #[must_use]
    pub fn feature_name(&self) -> &str {
        &self.feature_name
    }

    /// Returns the scenario name.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// Returns the scenario labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for ScenarioMetadata {
    fn default() -> Self {
        Self::new("<unknown>", "<unknown>", Vec::new())
    }
}

/// A scenario future owned by a harness.
///
/// The future need not be `Send`: harnesses drive it on the calling thread.
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use stepwise_bdd_harness::ScenarioRunner;
///
/// let runner = ScenarioRunner::new(async { 41 + 1 });
/// assert_eq!(block_on(runner.run()), 42);
/// ```
pub struct ScenarioRunner<'a, T> {
    inner: Pin<Box<dyn Future<Output = T> + 'a>>,
}

impl<'a, T> ScenarioRunner<'a, T> {
    /// Wraps a future as a scenario runner.
    #[must_use]
    pub fn new(inner: impl Future<Output = T> + 'a) -> Self {
        Self {
            inner: Box::pin(inner),
        }
    }

    /// Awaits the wrapped future.
    pub async fn run(self) -> T {
        self.inner.await
    }
}

impl<T> fmt::Debug for ScenarioRunner<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner").finish_non_exhaustive()
    }
}

/// A harness execution request for one scenario.
#[derive(Debug)]
pub struct ScenarioRunRequest<'a, T> {
    metadata: ScenarioMetadata,
    runner: ScenarioRunner<'a, T>,
}

impl<'a, T> ScenarioRunRequest<'a, T> {
    /// Creates a request from metadata and a runner.
    #[must_use]
    pub fn new(metadata: ScenarioMetadata, runner: ScenarioRunner<'a, T>) -> Self {
        Self { metadata, runner }
    }

    /// Returns immutable metadata for diagnostics or harness setup.
    #[must_use]
    pub fn metadata(&self) -> &ScenarioMetadata {
        &self.metadata
    }

    /// Consumes the request and returns metadata and runner separately.
    #[must_use]
    pub fn into_parts(self) -> (ScenarioMetadata, ScenarioRunner<'a, T>) {
        (self.metadata, self.runner)
    }

    /// Awaits the runner directly.
    pub async fn run(self) -> T {
        self.runner.run().await
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for scenario metadata and runner primitives.

    use super::{ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn metadata_default_is_unknown() {
        let metadata = ScenarioMetadata::default();
        assert_eq!(metadata.feature_name(), "<unknown>");
        assert_eq!(metadata.scenario_name(), "<unknown>");
        assert!(metadata.labels().is_empty());
    }

    #[test]
    fn runner_is_lazy_until_awaited() {
        let flag = Rc::new(Cell::new(false));
        let flag_clone = Rc::clone(&flag);
        let runner = ScenarioRunner::new(async move {
            flag_clone.set(true);
            7
        });
        assert!(!flag.get());
        assert_eq!(block_on(runner.run()), 7);
        assert!(flag.get());
    }

    #[test]
    fn runner_supports_non_static_borrows() {
        let value = 42;
        let runner = ScenarioRunner::new(async { value });
        assert_eq!(block_on(runner.run()), 42);
    }

    #[test]
    fn request_exposes_metadata_and_runs() {
        let request = ScenarioRunRequest::new(
            ScenarioMetadata::new("Auth", "Login succeeds", vec!["smoke".to_string()]),
            ScenarioRunner::new(async { 11 }),
        );
        assert_eq!(request.metadata().scenario_name(), "Login succeeds");
        assert_eq!(request.metadata().labels(), ["smoke"]);
        assert_eq!(block_on(request.run()), 11);
    }
}
