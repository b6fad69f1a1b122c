//! # delegates - Callables You Can Compare
//!
//! `delegates` wraps free functions, bound methods and closures behind one
//! `Fn(A) -> R` signature and lets you register many of them on a
//! thread-safe multicast registry, invoke them all at once, and later
//! remove exactly the one you added.
//!
//! ## Quick Start
//!
//! ```rust
//! use delegates::{Delegate, MulticastDelegate};
//! use std::sync::Arc;
//!
//! struct Greeter {
//!     name: &'static str,
//! }
//!
//! impl Greeter {
//!     fn greet(&self, greeting: &'static str) -> String {
//!         format!("{greeting}, {}", self.name)
//!     }
//! }
//!
//! let greeter = Arc::new(Greeter { name: "Ada" });
//! let on_login = MulticastDelegate::new();
//! on_login.add(Delegate::from_closure(|g: &'static str| g.to_uppercase()));
//! on_login.add(Delegate::from_method(Arc::clone(&greeter), Greeter::greet));
//!
//! assert_eq!(on_login.invoke("hello").unwrap(), "hello, Ada");
//!
//! // An independently built binding of the same object and method is equal.
//! on_login.remove(Delegate::from_method(greeter, Greeter::greet)).unwrap();
//! assert_eq!(on_login.invoke("hello").unwrap(), "HELLO");
//! ```
//!
//! ## Identifying closures
//!
//! Closures carry an identity chosen at construction: a fresh [`Token`]
//! ([`Delegate::from_closure`]), a caller key ([`Delegate::from_closure_keyed`])
//! or the bytes of their captures ([`Delegate::from_closure_layout`]).
//! Alternatively, [`MulticastDelegate::subscribe`] returns a
//! [`Subscription`] handle that [`MulticastDelegate::unsubscribe`] accepts.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use delegates_core::{
    BoxError,
    // Identity adapters
    ClosureIdentity,
    // Callable wrapper
    Delegate,
    DelegateError,
    DelegateKind,
    Keyed,
    LayoutProfile,
    LayoutSnapshot,
    LayoutTable,
    Token,
};

// Registry
pub use delegates_std::{
    DispatchMode, MulticastConfig, MulticastDelegate, RegistryId, Subscription, testing,
};

mod macros;
