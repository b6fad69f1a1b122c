//! # delegates-core
//!
//! The callable wrapper at the bottom of the delegates workspace.
//!
//! [`Delegate`] holds exactly one of three callable shapes behind a single
//! `Fn(A) -> R` signature:
//!
//! - a free function pointer ([`Delegate::from_fn`]),
//! - a method bound to a shared object ([`Delegate::from_method`],
//!   [`Delegate::from_weak_method`]),
//! - a type-erased closure ([`Delegate::from_closure`] and friends).
//!
//! Delegates compare equal when they would call the same thing, which is
//! what lets a multicast registry find and remove a subscriber it was
//! handed earlier. Closures have no identity of their own, so each closure
//! delegate carries a [`ClosureIdentity`] adapter:
//!
//! - [`Token`] - unique per construction, shared by clones (default)
//! - [`Keyed`] - a key chosen by the caller
//! - [`LayoutSnapshot`] - the bytes of the closure's captured state, see [`layout`]
//!
//! # Error Types
//!
//! - [`DelegateError`] - every failure the workspace reports
//! - [`BoxError`] - boxed errors returned by fallible subscribers

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod delegate;
mod error;
mod identity;
pub mod layout;

// Re-exports
pub use delegate::{Delegate, DelegateKind};
pub use error::{BoxError, DelegateError};
pub use identity::{ClosureIdentity, Keyed, Token};
pub use layout::{LayoutProfile, LayoutSnapshot, LayoutTable};
