//! # Closure identity
//!
//! A closure has no inspectable identity of its own, so each closure
//! delegate carries a [`ClosureIdentity`] chosen at construction. Two
//! closure delegates are equal when their identities match.
//!
//! Adapters provided here:
//!
//! - [`Token`]: a process-unique number issued per construction and
//!   shared by clones of a delegate. Two independently built closures never
//!   share a token; they can still compare equal when both wrap the same
//!   `fn` pointer or both are the same capture-free closure type.
//! - [`Keyed`]: a caller-supplied key, so that two closures built in
//!   different places can be declared to be the same subscription.
//!
//! The byte-layout adapter lives in [`crate::layout`].

use crate::error::DelegateError;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

/// Decides whether two closure delegates represent the same subscription.
///
/// Implementations must return `Ok(false)` for an identity of another
/// concrete type rather than an error.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot identify a closure delegate",
    label = "missing `ClosureIdentity` implementation",
    note = "Use `Token`, `Keyed`, or implement `matches` and `as_any` for `{Self}`."
)]
pub trait ClosureIdentity: Send + Sync + 'static {
    /// Compare against another identity.
    fn matches(&self, other: &dyn ClosureIdentity) -> Result<bool, DelegateError>;

    /// Upcast used for downcasting the other side of a comparison.
    fn as_any(&self) -> &dyn Any;
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// A monotonically issued identity number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    /// Issue a token no other call in this process has received.
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw token value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl ClosureIdentity for Token {
    fn matches(&self, other: &dyn ClosureIdentity) -> Result<bool, DelegateError> {
        Ok(other.as_any().downcast_ref::<Token>() == Some(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An identity supplied by the caller.
///
/// Keys of different types never match, even if their values would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyed<K>(pub K);

impl<K: PartialEq + Send + Sync + 'static> ClosureIdentity for Keyed<K> {
    fn matches(&self, other: &dyn ClosureIdentity) -> Result<bool, DelegateError> {
        Ok(other
            .as_any()
            .downcast_ref::<Keyed<K>>()
            .is_some_and(|other| other.0 == self.0))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
