//! Ambient access to the step executing on the current flow.
//!
//! Each poll of a step body pushes the step's state onto a thread-local stack
//! and pops it when the poll returns. The association therefore follows the
//! step's future across suspension points and worker threads, and concurrent
//! scenarios polled on other threads never observe each other's steps.

use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use pin_project::pin_project;
use thiserror::Error;

use super::step::StepState;
use crate::types::StepInfo;

thread_local! {
    static CURRENT_STEPS: RefCell<Vec<Arc<StepState>>> = const { RefCell::new(Vec::new()) };
}

/// Errors raised by ambient step helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CommentError {
    /// Called while no step was executing on this flow.
    #[error("comments can only be recorded while a step is executing")]
    NoCurrentStep,
}

/// Marks the current thread as executing a step until dropped.
struct ScopeGuard {
    _not_send: PhantomData<Rc<()>>,
}

impl ScopeGuard {
    fn enter(state: Arc<StepState>) -> Self {
        CURRENT_STEPS.with(|stack| stack.borrow_mut().push(state));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        CURRENT_STEPS.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert!(popped.is_some(), "step scope stack must not be empty");
        });
    }
}

/// Future adapter that installs a step as current while `inner` is polled.
#[pin_project]
pub(crate) struct StepScoped<F> {
    state: Arc<StepState>,
    #[pin]
    inner: F,
}

impl<F> StepScoped<F> {
    pub(crate) fn new(state: Arc<StepState>, inner: F) -> Self {
        Self { state, inner }
    }
}

impl<F: Future> Future for StepScoped<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _guard = ScopeGuard::enter(Arc::clone(this.state));
        this.inner.poll(cx)
    }
}

fn with_current<R>(f: impl FnOnce(&StepState) -> R) -> Option<R> {
    let state = CURRENT_STEPS.with(|stack| stack.borrow().last().cloned())?;
    Some(f(&state))
}

pub(crate) fn in_step() -> bool {
    CURRENT_STEPS.with(|stack| !stack.borrow().is_empty())
}

/// Record a comment against the step executing on this flow.
///
/// The comment is appended to the step result and forwarded to the progress
/// notifier.
///
/// # Errors
///
/// Returns [`CommentError::NoCurrentStep`] when called outside a step body.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{comment, CommentError};
///
/// assert_eq!(comment("outside"), Err(CommentError::NoCurrentStep));
/// ```
pub fn comment(text: impl Into<String>) -> Result<(), CommentError> {
    let text = text.into();
    with_current(|state| state.comment(text)).ok_or(CommentError::NoCurrentStep)
}

/// Identity of the step executing on this flow, if any.
#[must_use]
pub fn current_step() -> Option<StepInfo> {
    with_current(StepState::info)
}
