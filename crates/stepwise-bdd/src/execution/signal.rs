//! Control-flow signals raised from deep inside step bodies.
//!
//! [`bypass!`](crate::bypass!) and [`ignore!`](crate::ignore!) unwind with a
//! private payload that the step boundary converts back into the matching
//! [`StepError`]. Ordinary panics become [`StepError::Panicked`].

use std::any::Any;
use std::panic;

use super::error::StepError;
use super::scope;
use crate::panic::panic_message;

#[derive(Debug)]
enum Signal {
    Bypass(String),
    Ignore(String),
}

impl Signal {
    #[track_caller]
    fn raise(self, origin: &str) -> ! {
        if !scope::in_step() {
            panic!("stepwise_bdd::{origin}! may only be used while a step is executing");
        }
        panic::resume_unwind(Box::new(self));
    }
}

#[doc(hidden)]
#[track_caller]
pub fn request_bypass(message: String) -> ! {
    Signal::Bypass(message).raise("bypass")
}

#[doc(hidden)]
#[track_caller]
pub fn request_ignore(message: String) -> ! {
    Signal::Ignore(message).raise("ignore")
}

/// Convert a payload caught at the step boundary into a step error.
pub(crate) fn error_from_panic(payload: Box<dyn Any + Send>) -> StepError {
    match payload.downcast::<Signal>() {
        Ok(signal) => match *signal {
            Signal::Bypass(message) => StepError::bypass(message),
            Signal::Ignore(message) => StepError::ignore(message),
        },
        Err(payload) => StepError::Panicked {
            message: panic_message(payload.as_ref()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::catch_unwind;

    #[test]
    fn plain_panics_keep_their_message() {
        let Err(payload) = catch_unwind(|| panic!("kaboom")) else {
            panic!("closure should panic");
        };
        let error = error_from_panic(payload);
        assert!(matches!(error, StepError::Panicked { ref message } if message == "kaboom"));
    }

    #[test]
    fn signals_outside_steps_are_rejected() {
        let Err(payload) = catch_unwind(|| request_bypass("nope".into())) else {
            panic!("bypass outside a step should panic");
        };
        let error = error_from_panic(payload);
        let StepError::Panicked { message } = error else {
            panic!("expected a plain panic, got {error:?}");
        };
        assert!(message.contains("bypass! may only be used"), "{message}");
    }
}
