//! Default blocking harness implementation.

use crate::adapter::HarnessAdapter;
use crate::runner::ScenarioRunRequest;

/// Framework-agnostic blocking harness.
///
/// `StdHarness` drives the scenario future on the calling thread with
/// [`futures::executor::block_on`]. Steps must not rely on a runtime such as
/// Tokio being present.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdHarness;

impl StdHarness {
    /// Creates a new standard harness instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HarnessAdapter for StdHarness {
    fn run<T>(&self, request: ScenarioRunRequest<'_, T>) -> T {
        futures::executor::block_on(request.run())
    }
}
