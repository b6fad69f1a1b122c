//! # Multicast Registry
//!
//! [`MulticastDelegate`] keeps an ordered list of [`Delegate`]s behind one
//! mutex and invokes all of them for a single call, returning the result of
//! the last one.
//!
//! ## What it guarantees
//! - Subscribers run in insertion order, on the caller's thread.
//! - No operation observes a partially mutated list.
//! - `remove` takes out the most recently added equal entry only.
//! - Operations on two registries lock them in [`RegistryId`] order, so
//!   copying two registries into each other from two threads cannot deadlock.
//!
//! ## What it does **not** guarantee
//! - No continuation after a failing subscriber: the first error ends the
//!   sweep and is returned.
//! - In [`DispatchMode::Locked`] a subscriber that calls back into its own
//!   registry blocks forever. Use [`DispatchMode::Snapshot`] for that.
//!
//! ## Example
//! ```
//! use delegates_core::Delegate;
//! use delegates_std::MulticastDelegate;
//!
//! fn square(x: i32) -> i32 {
//!     x * x
//! }
//!
//! let registry = MulticastDelegate::new();
//! registry.add(Delegate::from_closure(|x: i32| x + 1));
//! registry.add(square as fn(i32) -> i32);
//! assert_eq!(registry.invoke(4).unwrap(), 16);
//!
//! registry.remove(square as fn(i32) -> i32).unwrap();
//! assert_eq!(registry.invoke(4).unwrap(), 5);
//! ```

use crate::config::{DispatchMode, MulticastConfig};
use delegates_core::{BoxError, Delegate, DelegateError};
use std::fmt;
use std::sync::{
    Mutex, MutexGuard, PoisonError, TryLockError,
    atomic::{AtomicU64, Ordering},
};

static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(1);

/// Identity of a registry, issued in construction order.
///
/// Gives registries the total order used for locking two at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId(u64);

impl RegistryId {
    fn next() -> Self {
        Self(NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Handle for one entry added through [`MulticastDelegate::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping a subscription handle makes `unsubscribe` impossible"]
pub struct Subscription {
    registry: RegistryId,
    seq: u64,
}

impl Subscription {
    /// The registry that issued this handle.
    pub fn registry(&self) -> RegistryId {
        self.registry
    }
}

struct Entry<A, R> {
    seq: u64,
    delegate: Delegate<A, R>,
}

impl<A, R> Clone for Entry<A, R> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            delegate: self.delegate.clone(),
        }
    }
}

/// The state behind the registry's mutex.
struct Subscribers<A, R> {
    next_seq: u64,
    entries: Vec<Entry<A, R>>,
}

impl<A: 'static, R: 'static> Subscribers<A, R> {
    fn push(&mut self, delegate: Delegate<A, R>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { seq, delegate });
        seq
    }

    /// Replace every entry, issuing fresh sequence numbers so that handles
    /// to the old entries stop matching.
    fn refill(&mut self, delegates: impl IntoIterator<Item = Delegate<A, R>>) {
        self.entries.clear();
        for delegate in delegates {
            self.push(delegate);
        }
    }

    fn rposition(&self, delegate: &Delegate<A, R>) -> Result<Option<usize>, DelegateError> {
        for (position, entry) in self.entries.iter().enumerate().rev() {
            if entry.delegate.try_eq(delegate)? {
                return Ok(Some(position));
            }
        }
        Ok(None)
    }
}

impl<A, R> Clone for Subscribers<A, R> {
    fn clone(&self) -> Self {
        Self {
            next_seq: self.next_seq,
            entries: self.entries.clone(),
        }
    }
}

/// An ordered, thread-safe list of [`Delegate`]s invoked together.
///
/// All methods take `&self`; share a registry between threads with `Arc`.
pub struct MulticastDelegate<A, R = ()> {
    id: RegistryId,
    config: MulticastConfig,
    inner: Mutex<Subscribers<A, R>>,
}

impl<A: 'static, R: 'static> MulticastDelegate<A, R> {
    /// Create an empty registry with default settings.
    pub fn new() -> Self {
        Self::with_config(MulticastConfig::default())
    }

    /// Create an empty registry with the given settings.
    pub fn with_config(config: MulticastConfig) -> Self {
        Self {
            id: RegistryId::next(),
            inner: Mutex::new(Subscribers {
                next_seq: 0,
                entries: Vec::with_capacity(config.capacity),
            }),
            config,
        }
    }

    /// Create a registry holding one subscriber.
    pub fn from_delegate(delegate: impl Into<Delegate<A, R>>) -> Self {
        let registry = Self::new();
        registry.add(delegate);
        registry
    }

    /// This registry's identity.
    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// The settings the registry was built with.
    pub fn config(&self) -> &MulticastConfig {
        &self.config
    }

    // A panicking subscriber poisons the mutex mid-sweep, but a sweep
    // never mutates the list, so the state is still consistent.
    fn lock(&self) -> MutexGuard<'_, Subscribers<A, R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pair<'a>(
        &'a self,
        other: &'a Self,
    ) -> (
        MutexGuard<'a, Subscribers<A, R>>,
        MutexGuard<'a, Subscribers<A, R>>,
    ) {
        if self.id < other.id {
            let mine = self.lock();
            let theirs = other.lock();
            (mine, theirs)
        } else {
            let theirs = other.lock();
            let mine = self.lock();
            (mine, theirs)
        }
    }

    /// Append a subscriber.
    pub fn add(&self, delegate: impl Into<Delegate<A, R>>) {
        let delegate = delegate.into();
        let mut guard = self.lock();
        guard.push(delegate);
        #[cfg(feature = "tracing")]
        tracing::trace!(registry = self.id.0, len = guard.entries.len(), "subscriber added");
    }

    /// Append a subscriber and return a handle that removes exactly it.
    pub fn subscribe(&self, delegate: impl Into<Delegate<A, R>>) -> Subscription {
        let delegate = delegate.into();
        let seq = self.lock().push(delegate);
        #[cfg(feature = "tracing")]
        tracing::trace!(registry = self.id.0, seq, "subscription issued");
        Subscription {
            registry: self.id,
            seq,
        }
    }

    /// Remove the most recently added subscriber equal to `delegate`.
    ///
    /// Returns `Ok(false)` if nothing matched.
    ///
    /// # Errors
    ///
    /// [`DelegateError::UnsupportedComparison`] if a comparison could not be
    /// decided; the list is left unchanged.
    pub fn remove(&self, delegate: impl Into<Delegate<A, R>>) -> Result<bool, DelegateError> {
        let delegate = delegate.into();
        let mut guard = self.lock();
        let Some(position) = guard.rposition(&delegate)? else {
            return Ok(false);
        };
        guard.entries.remove(position);
        #[cfg(feature = "tracing")]
        tracing::trace!(registry = self.id.0, position, "subscriber removed");
        Ok(true)
    }

    /// Remove the entry `subscription` was issued for.
    ///
    /// Returns `false` if it was already removed or belongs to another
    /// registry.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        if subscription.registry != self.id {
            return false;
        }
        let mut guard = self.lock();
        let Some(position) = guard
            .entries
            .iter()
            .position(|entry| entry.seq == subscription.seq)
        else {
            return false;
        };
        guard.entries.remove(position);
        #[cfg(feature = "tracing")]
        tracing::trace!(registry = self.id.0, seq = subscription.seq, "subscription cancelled");
        true
    }

    /// Whether a subscriber equal to `delegate` is registered.
    pub fn contains(&self, delegate: &Delegate<A, R>) -> Result<bool, DelegateError> {
        Ok(self.lock().rposition(delegate)?.is_some())
    }

    /// Drop every subscriber and register `delegate` alone.
    pub fn replace(&self, delegate: impl Into<Delegate<A, R>>) {
        let delegate = delegate.into();
        self.lock().refill([delegate]);
    }

    /// Drop every subscriber.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True if there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Replace this registry's subscribers with a copy of `other`'s.
    ///
    /// Both locks are held for the copy. Handles issued by this registry
    /// before the copy no longer match.
    pub fn copy_from(&self, other: &Self) {
        if self.id == other.id {
            return;
        }
        let (mut mine, theirs) = self.lock_pair(other);
        mine.refill(theirs.entries.iter().map(|entry| entry.delegate.clone()));
        #[cfg(feature = "tracing")]
        tracing::trace!(registry = self.id.0, from = other.id.0, len = mine.entries.len(), "subscribers copied");
    }

    /// Move `other`'s subscribers into this registry, leaving `other` empty.
    pub fn take_from(&self, other: &Self) {
        if self.id == other.id {
            return;
        }
        let (mut mine, mut theirs) = self.lock_pair(other);
        let taken = std::mem::take(&mut theirs.entries);
        mine.refill(taken.into_iter().map(|entry| entry.delegate));
        #[cfg(feature = "tracing")]
        tracing::trace!(registry = self.id.0, from = other.id.0, len = mine.entries.len(), "subscribers moved");
    }

    /// Invoke every subscriber in order and return the last one's result.
    ///
    /// Every subscriber but the last receives a clone of `args`.
    ///
    /// # Errors
    ///
    /// - [`DelegateError::EmptyRegistry`] if there are no subscribers; nothing is called.
    /// - Any error from a subscriber's [`Delegate::invoke`]; later subscribers are skipped.
    pub fn invoke(&self, args: A) -> Result<R, DelegateError>
    where
        A: Clone,
    {
        self.dispatch(args, |_, delegate, args| delegate.invoke(args))
    }

    fn dispatch<T, F>(&self, args: A, call: F) -> Result<T, DelegateError>
    where
        A: Clone,
        F: Fn(usize, &Delegate<A, R>, A) -> Result<T, DelegateError>,
    {
        match self.config.dispatch {
            DispatchMode::Locked => {
                let guard = self.lock();
                self.sweep(&guard.entries, args, call)
            }
            DispatchMode::Snapshot => {
                let snapshot = self.lock().entries.clone();
                self.sweep(&snapshot, args, call)
            }
        }
    }

    fn sweep<T, F>(&self, entries: &[Entry<A, R>], args: A, call: F) -> Result<T, DelegateError>
    where
        A: Clone,
        F: Fn(usize, &Delegate<A, R>, A) -> Result<T, DelegateError>,
    {
        let Some((last, rest)) = entries.split_last() else {
            return Err(DelegateError::EmptyRegistry);
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(registry = self.id.0, subscribers = entries.len(), "dispatching");
        for (index, entry) in rest.iter().enumerate() {
            call(index, &entry.delegate, args.clone())?;
        }
        call(rest.len(), &last.delegate, args)
    }
}

impl<A: 'static, T: 'static, E: 'static> MulticastDelegate<A, Result<T, E>>
where
    E: Into<BoxError>,
{
    /// Invoke subscribers that return `Result`, stopping at the first `Err`.
    ///
    /// # Errors
    ///
    /// - [`DelegateError::EmptyRegistry`] if there are no subscribers.
    /// - [`DelegateError::Subscriber`] carrying the failing subscriber's
    ///   position and error; later subscribers are skipped.
    pub fn try_invoke(&self, args: A) -> Result<T, DelegateError>
    where
        A: Clone,
    {
        self.dispatch(args, |index, delegate, args| {
            delegate
                .invoke(args)?
                .map_err(|err| DelegateError::subscriber(index, err))
        })
    }
}

impl<A: 'static, R: 'static> Default for MulticastDelegate<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// The clone gets a new [`RegistryId`]; handles from the original do not
/// apply to it.
impl<A: 'static, R: 'static> Clone for MulticastDelegate<A, R> {
    fn clone(&self) -> Self {
        let subscribers = self.lock().clone();
        Self {
            id: RegistryId::next(),
            config: self.config.clone(),
            inner: Mutex::new(subscribers),
        }
    }
}

impl<A: 'static, R: 'static> From<Delegate<A, R>> for MulticastDelegate<A, R> {
    fn from(delegate: Delegate<A, R>) -> Self {
        Self::from_delegate(delegate)
    }
}

impl<A: 'static, R: 'static> FromIterator<Delegate<A, R>> for MulticastDelegate<A, R> {
    fn from_iter<I: IntoIterator<Item = Delegate<A, R>>>(iter: I) -> Self {
        let registry = Self::new();
        registry.lock().refill(iter);
        registry
    }
}

impl<A: 'static, R: 'static> fmt::Debug for MulticastDelegate<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A subscriber may format its own registry in the middle of a
        // locked sweep, so never wait for the lock here.
        let mut debug = f.debug_struct("MulticastDelegate");
        debug.field("id", &self.id);
        match self.inner.try_lock() {
            Ok(guard) => debug.field("len", &guard.entries.len()),
            Err(TryLockError::Poisoned(poisoned)) => {
                debug.field("len", &poisoned.into_inner().entries.len())
            }
            Err(TryLockError::WouldBlock) => debug.field("len", &format_args!("<locked>")),
        };
        debug.field("config", &self.config).finish()
    }
}
