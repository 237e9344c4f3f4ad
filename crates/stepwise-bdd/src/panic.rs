//! Rendering of panic payloads caught at step and provider boundaries.

use std::any::Any;

/// Formats a panic payload into a readable message.
///
/// String payloads are returned as-is; anything else renders through its
/// `Debug` implementation.
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use stepwise_bdd::panic_message;
///
/// let payload: Box<dyn Any + Send> = Box::new(String::from("boom"));
/// assert_eq!(panic_message(payload.as_ref()), "boom");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| format!("{payload:?}"))
}

#[cfg(test)]
mod tests {
    use super::panic_message;
    use std::panic::catch_unwind;

    #[test]
    fn renders_formatted_panics() {
        let Err(payload) = catch_unwind(|| panic!("value {}", 3)) else {
            panic!("closure should panic");
        };
        assert_eq!(panic_message(payload.as_ref()), "value 3");
    }

    #[test]
    fn falls_back_to_debug() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(7_i32);
        assert_eq!(panic_message(payload.as_ref()), "Any { .. }");
    }
}
