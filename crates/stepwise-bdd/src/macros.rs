//! Macros available to step bodies.
//!
//! They remain available at the crate root via `#[macro_export]`.

/// Bypass the current step.
///
/// The step is recorded as bypassed with the given reason and the scenario
/// continues with the next step. Must be called while a step is executing.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{bypass, StepDescriptor};
///
/// let step = StepDescriptor::from_fn("Then_invoice_is_sent", |_, _| {
///     bypass!("invoicing is not implemented for {}", "EUR")
/// });
/// assert!(step.is_ok());
/// ```
#[macro_export]
macro_rules! bypass {
    () => {{
        $crate::__stepwise_bdd_request_bypass(::std::string::String::from("Step bypassed"))
    }};
    ($msg:expr $(,)?) => {{
        $crate::__stepwise_bdd_request_bypass(::std::convert::Into::<::std::string::String>::into(
            $msg,
        ))
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::__stepwise_bdd_request_bypass(::std::format!($fmt, $($arg)*))
    }};
}

/// Mark the current step as ignored and stop the scenario.
///
/// The step is reported with [`ExecutionStatus::Ignored`](crate::ExecutionStatus::Ignored)
/// under the default status mapper.
#[macro_export]
macro_rules! ignore {
    () => {{
        $crate::__stepwise_bdd_request_ignore(::std::string::String::from("Step ignored"))
    }};
    ($msg:expr $(,)?) => {{
        $crate::__stepwise_bdd_request_ignore(::std::convert::Into::<::std::string::String>::into(
            $msg,
        ))
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::__stepwise_bdd_request_ignore(::std::format!($fmt, $($arg)*))
    }};
}

/// Record a formatted comment against the current step.
///
/// Expands to a call to [`comment`](crate::comment) and evaluates to its
/// `Result`.
#[macro_export]
macro_rules! comment {
    ($($arg:tt)+) => {
        $crate::comment(::std::format!($($arg)+))
    };
}
