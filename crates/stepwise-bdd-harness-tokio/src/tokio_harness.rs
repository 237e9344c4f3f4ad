//! Tokio current-thread harness adapter for scenario execution.

use stepwise_bdd_harness::{HarnessAdapter, ScenarioRunRequest};

/// Drives scenario futures inside a Tokio current-thread runtime with a
/// [`LocalSet`](tokio::task::LocalSet).
///
/// `TokioHarness` builds a new single-threaded runtime and a `LocalSet` per
/// scenario, then blocks on the scenario future. Step bodies may therefore
/// await Tokio timers and channels and call `tokio::spawn` or
/// `tokio::task::spawn_local`.
///
/// After the scenario completes the harness yields once, letting
/// `spawn_local` tasks that finish in one poll run. It does not drain the
/// `LocalSet`; steps that need spawned work to finish must await it.
///
/// # Examples
///
/// ```
/// use stepwise_bdd_harness::{HarnessAdapter, ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
/// use stepwise_bdd_harness_tokio::TokioHarness;
///
/// let request = ScenarioRunRequest::new(
///     ScenarioMetadata::new("Reminders", "Async scenario", vec![]),
///     ScenarioRunner::new(async {
///         tokio::task::yield_now().await;
///         2 + 2
///     }),
/// );
/// let harness = TokioHarness::new();
/// assert_eq!(harness.run(request), 4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioHarness;

impl TokioHarness {
    /// Creates a new Tokio harness instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HarnessAdapter for TokioHarness {
    fn run<T>(&self, request: ScenarioRunRequest<'_, T>) -> T {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap_or_else(|err| {
                panic!("stepwise-bdd-harness-tokio: failed to build Tokio runtime: {err}")
            });
        let local_set = tokio::task::LocalSet::new();
        local_set.block_on(&runtime, async {
            let result = request.run().await;
            tokio::task::yield_now().await;
            result
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the Tokio current-thread harness.

    use super::TokioHarness;
    use rstest::{fixture, rstest};
    use stepwise_bdd_harness::{
        HarnessAdapter, ScenarioMetadata, ScenarioRunRequest, ScenarioRunner,
    };

    #[fixture]
    fn harness() -> TokioHarness {
        TokioHarness::new()
    }

    #[rstest]
    fn tokio_harness_runs_request(harness: TokioHarness) {
        let request = ScenarioRunRequest::new(
            ScenarioMetadata::new("Simple", "Runs in Tokio", vec!["async".to_string()]),
            ScenarioRunner::new(async { 21 * 2 }),
        );
        assert_eq!(harness.run(request), 42);
    }

    #[rstest]
    fn tokio_runtime_is_active_during_run(harness: TokioHarness) {
        let request = ScenarioRunRequest::new(
            ScenarioMetadata::default(),
            ScenarioRunner::new(async {
                // Panics if no Tokio runtime is active on the current thread.
                let _handle = tokio::runtime::Handle::current();
                true
            }),
        );
        assert!(harness.run(request));
    }
}
