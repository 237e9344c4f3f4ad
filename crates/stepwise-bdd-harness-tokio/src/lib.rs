//! Tokio harness adapter for `stepwise-bdd`.
//!
//! This crate provides a Tokio-specific harness that drives scenario futures
//! inside a current-thread Tokio runtime.

mod tokio_harness;

pub use tokio_harness::TokioHarness;
