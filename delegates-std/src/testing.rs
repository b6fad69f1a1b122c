//! Testing utilities for delegates.
//!
//! - [`CallLog`]: a shared, ordered record of which subscribers ran
//! - [`CountingHandler`]: a bound-method target that counts its calls

use delegates_core::Delegate;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Call Log
// ============================================================================

/// Records values in the order subscribers push them.
///
/// Clones share the same record.
///
/// # Example
///
/// ```rust
/// use delegates_std::{MulticastDelegate, testing::CallLog};
///
/// let log = CallLog::new();
/// let registry = MulticastDelegate::new();
/// registry.add(log.recorder("first", 1));
/// registry.add(log.recorder("second", 2));
///
/// assert_eq!(registry.invoke(()).unwrap(), 2);
/// assert_eq!(log.entries(), vec!["first", "second"]);
/// ```
pub struct CallLog<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> CallLog<T> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append a value.
    pub fn record(&self, value: T) {
        self.entries.lock().unwrap().push(value);
    }

    /// Get a clone of the recorded values.
    pub fn entries(&self) -> Vec<T> {
        self.entries.lock().unwrap().clone()
    }

    /// Get the number of recorded values.
    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Clear all recorded values.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl<T: Clone + Send + Sync + 'static> CallLog<T> {
    /// A closure delegate that records `value` and returns `result`.
    ///
    /// Each call builds a new closure, so two recorders never compare equal.
    pub fn recorder<A, R>(&self, value: T, result: R) -> Delegate<A, R>
    where
        A: 'static,
        R: Clone + Send + Sync + 'static,
    {
        let log = self.clone();
        Delegate::from_closure(move |_: A| {
            log.record(value.clone());
            result.clone()
        })
    }
}

impl<T: Clone> Default for CallLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CallLog<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A target object for bound-method subscribers.
#[derive(Debug, Default)]
pub struct CountingHandler {
    calls: AtomicUsize,
}

impl CountingHandler {
    /// Create a shared handler.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Count a call and return the running total.
    pub fn hit<A>(&self, _args: A) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count a call and return zero.
    pub fn tick<A>(&self, _args: A) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        0
    }

    /// Number of calls so far.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_logs_and_returns() {
        let log = CallLog::new();
        let d: Delegate<u8, &str> = log.recorder(7, "done");
        assert_eq!(d.invoke(0).unwrap(), "done");
        assert_eq!(d.invoke(1).unwrap(), "done");
        assert_eq!(log.entries(), vec![7, 7]);

        log.clear();
        assert_eq!(log.count(), 0);
    }

    #[test]
    fn test_counting_handler() {
        let handler = CountingHandler::new();
        let hit = Delegate::from_method(Arc::clone(&handler), CountingHandler::hit);
        let tick = Delegate::from_method(Arc::clone(&handler), CountingHandler::tick);

        assert_eq!(hit.invoke(()).unwrap(), 1);
        assert_eq!(tick.invoke(()).unwrap(), 0);
        assert_eq!(handler.count(), 2);
        assert_ne!(hit, tick);
    }
}
