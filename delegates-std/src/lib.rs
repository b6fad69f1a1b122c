//! # delegates-std
//!
//! The multicast registry of the delegates workspace.
//!
//! This crate provides:
//! - **Registry**: [`MulticastDelegate`], an ordered, mutex-guarded list of
//!   [`Delegate`]s invoked together
//! - **Subscriptions**: [`Subscription`] handles for exact removal
//! - **Configuration**: [`MulticastConfig`], [`DispatchMode`]
//! - **Testing**: [`testing::CallLog`], [`testing::CountingHandler`]
//!
//! Enable the `tracing` feature to get `trace`/`debug` events for
//! registry mutations and dispatches.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core
pub use delegates_core;
pub use delegates_core::{Delegate, DelegateError};

pub mod config;
pub mod multicast;
pub mod testing;

pub use config::{DispatchMode, MulticastConfig};
pub use multicast::{MulticastDelegate, RegistryId, Subscription};
