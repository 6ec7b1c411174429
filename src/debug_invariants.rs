//! Structural self-checks for built navigator data.
//!
//! Aliases, the network, the path table, the locator map and the packed
//! arrays each know what a well-formed instance looks like. They expose that
//! knowledge through [`DebugInvariants`]. Builders call
//! [`debug_invariants!`](crate::debug_invariants!) right after construction.
//! The check runs in debug builds and in release builds compiled with
//! `check-invariants` or `strict-invariants`; elsewhere it compiles away.
//! Loaders call [`DebugInvariants::validate_invariants`] directly, because a
//! file read from disk is untrusted in every build.

use crate::nav_error::NavError;

/// A structure that can verify its own internal consistency.
pub trait DebugInvariants {
    /// Panic on the first broken invariant when checks are compiled in.
    fn debug_assert_invariants(&self);
    /// Return the first broken invariant as [`NavError::InvariantViolation`].
    fn validate_invariants(&self) -> Result<(), NavError>;
}

/// Run `$check` (a `Result<(), NavError>`) and panic with `$ctx` on failure,
/// only when checks are compiled in.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants", feature = "strict-invariants"))]
        if let Err(e) = $check {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Build an [`NavError::InvariantViolation`] from a message.
pub(crate) fn violation(msg: impl Into<String>) -> NavError {
    NavError::InvariantViolation(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sorted(Vec<u32>);

    impl DebugInvariants for Sorted {
        fn debug_assert_invariants(&self) {
            crate::debug_invariants!(self.validate_invariants(), "Sorted");
        }

        fn validate_invariants(&self) -> Result<(), NavError> {
            if self.0.windows(2).any(|w| w[0] > w[1]) {
                return Err(violation("values out of order"));
            }
            Ok(())
        }
    }

    #[test]
    fn valid_value_passes() {
        Sorted(vec![1, 2, 2, 5]).debug_assert_invariants();
    }

    #[test]
    fn violation_is_reported_with_message() {
        let err = Sorted(vec![3, 1]).validate_invariants().unwrap_err();
        assert_eq!(err, NavError::InvariantViolation("values out of order".into()));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "[invariants] Sorted")]
    fn debug_build_panics_on_violation() {
        Sorted(vec![3, 1]).debug_assert_invariants();
    }
}
