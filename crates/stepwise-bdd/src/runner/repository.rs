//! Registry of feature runners keyed by feature type.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Mutex};

use hashbrown::HashMap;

use super::FeatureRunner;
use crate::config::Configuration;
use crate::execution::lock;
use crate::result::FeatureResult;
use crate::types::FeatureType;

#[derive(Default)]
struct Registry {
    by_type: HashMap<TypeId, Arc<FeatureRunner>>,
    order: Vec<Arc<FeatureRunner>>,
}

/// Owns one [`FeatureRunner`] per feature type.
///
/// The repository is an explicit value owned by the integration layer:
/// runners are created on first access and live until the repository is
/// disposed.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stepwise_bdd::FeatureRunnerRepository;
///
/// struct LoginFeature;
///
/// let repository = FeatureRunnerRepository::default();
/// let first = repository.get_runner_for::<LoginFeature>();
/// let second = repository.get_runner(&LoginFeature);
/// assert!(Arc::ptr_eq(&first, &second));
///
/// let results = repository.dispose();
/// assert_eq!(results.len(), 1);
/// assert!(first.is_disposed());
/// ```
pub struct FeatureRunnerRepository {
    config: Configuration,
    registry: Mutex<Registry>,
}

impl FeatureRunnerRepository {
    /// Repository creating runners with `config`.
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// The runner for feature type `F`, created on first access.
    #[must_use]
    pub fn get_runner_for<F: Any>(&self) -> Arc<FeatureRunner> {
        self.get_runner_for_type(FeatureType::of::<F>())
    }

    /// The runner for `fixture`'s type, created on first access.
    #[must_use]
    pub fn get_runner<F: Any>(&self, _fixture: &F) -> Arc<FeatureRunner> {
        self.get_runner_for::<F>()
    }

    /// The runner for `feature_type`, created on first access.
    #[must_use]
    pub fn get_runner_for_type(&self, feature_type: FeatureType) -> Arc<FeatureRunner> {
        let runner = {
            let mut registry = lock(&self.registry);
            if let Some(runner) = registry.by_type.get(&feature_type.id()) {
                Arc::clone(runner)
            } else {
                let runner = Arc::new(FeatureRunner::unannounced(
                    feature_type,
                    self.config.clone(),
                ));
                registry
                    .by_type
                    .insert(feature_type.id(), Arc::clone(&runner));
                registry.order.push(Arc::clone(&runner));
                runner
            }
        };
        // Outside the registry lock so notifiers may use the repository.
        runner.announce();
        runner
    }

    /// Number of runners created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.registry).order.len()
    }

    /// Whether no runner has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispose every runner and return their feature results in creation
    /// order.
    ///
    /// A scenario still running on another task is not part of the returned
    /// snapshot; its runner reports it in the feature finish notification.
    /// Runners stay registered, so later lookups return the disposed runner
    /// and its operations fail with
    /// [`RunnerError::Disposed`](crate::RunnerError::Disposed).
    pub fn dispose(&self) -> Vec<FeatureResult> {
        let runners: Vec<Arc<FeatureRunner>> = lock(&self.registry).order.clone();
        runners
            .iter()
            .map(|runner| {
                runner.dispose();
                runner.snapshot()
            })
            .collect()
    }
}

impl Default for FeatureRunnerRepository {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl fmt::Debug for FeatureRunnerRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRunnerRepository")
            .field("runners", &self.len())
            .finish_non_exhaustive()
    }
}
