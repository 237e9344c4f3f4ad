//! Harness adapter contracts for `stepwise-bdd`.
//!
//! A harness owns the environment in which a scenario future is driven to
//! completion from synchronous test code. [`StdHarness`] blocks the calling
//! thread on a minimal executor; runtime specific harnesses live in their own
//! crates.

mod adapter;
mod runner;
mod std_harness;

pub use adapter::HarnessAdapter;
pub use runner::{ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
pub use std_harness::StdHarness;
