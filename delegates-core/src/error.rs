//! Error types for delegates.
//!
//! Every failure is returned to the calling thread at the point of the
//! failing operation:
//!
//! - [`DelegateError::EmptyCallable`] - a delegate had no live target
//! - [`DelegateError::EmptyRegistry`] - a registry was invoked with no subscribers
//! - [`DelegateError::UnsupportedComparison`] - a closure layout could not be compared
//! - [`DelegateError::Subscriber`] - a subscriber reported its own failure

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while invoking or comparing delegates.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DelegateError {
    /// The delegate has nothing to call, e.g. a weakly bound target was dropped.
    #[error("delegate has no live target to invoke")]
    EmptyCallable,

    /// A multicast registry was invoked with zero subscribers.
    #[error("multicast registry has no subscribers")]
    EmptyRegistry,

    /// A closure of this size has no entry in the layout table.
    #[error("byte-layout comparison is not supported for closures of {size} bytes")]
    UnsupportedComparison {
        /// Size in bytes of the closure that could not be compared.
        size: usize,
    },

    /// A subscriber returned an error; later subscribers were skipped.
    #[error("subscriber #{index} failed")]
    Subscriber {
        /// Position of the failing subscriber in invocation order.
        index: usize,
        /// The error the subscriber returned.
        #[source]
        source: BoxError,
    },
}

impl DelegateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use delegates_core::DelegateError;
    ///
    /// assert_eq!(DelegateError::EmptyRegistry.as_label(), "empty_registry");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DelegateError::EmptyCallable => "empty_callable",
            DelegateError::EmptyRegistry => "empty_registry",
            DelegateError::UnsupportedComparison { .. } => "unsupported_comparison",
            DelegateError::Subscriber { .. } => "subscriber_failed",
        }
    }

    /// Wraps a subscriber's own error with its position in the sweep.
    pub fn subscriber(index: usize, source: impl Into<BoxError>) -> Self {
        DelegateError::Subscriber {
            index,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(DelegateError::EmptyCallable.as_label(), "empty_callable");
        assert_eq!(
            DelegateError::UnsupportedComparison { size: 72 }.as_label(),
            "unsupported_comparison"
        );
        assert_eq!(
            DelegateError::subscriber(2, "boom").as_label(),
            "subscriber_failed"
        );
    }

    #[test]
    fn test_subscriber_error_keeps_source() {
        let err = DelegateError::subscriber(1, "disk full");
        assert_eq!(err.to_string(), "subscriber #1 failed");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk full"));
    }
}
