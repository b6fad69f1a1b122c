//! # Callable Wrapper
//!
//! [`Delegate`] puts a free function, a method bound to a shared object, or
//! a closure behind one invocation signature `Fn(A) -> R`, and gives all
//! three an equality relation so that a previously registered callable can
//! be found again and unregistered.
//!
//! # Equality
//!
//! | Variant | Equal when |
//! |---|---|
//! | Function | the function pointers are identical |
//! | Method | same target object and same method pointer |
//! | Closure | clones of one delegate; otherwise a caller-supplied [`ClosureIdentity`] decides; otherwise the same wrapped `fn` pointer, the same stateless closure type, or the same [`Token`] |
//!
//! Delegates of different variants are never equal.

use crate::error::DelegateError;
use crate::identity::{ClosureIdentity, Keyed, Token};
use crate::layout::{LayoutSnapshot, LayoutTable};
use std::any::{Any, TypeId};
use std::fmt;
use std::mem::size_of;
use std::sync::{Arc, Weak};

/// Which of the three callable shapes a [`Delegate`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelegateKind {
    /// A plain function pointer.
    Function,
    /// A method bound to a shared target object.
    Method,
    /// A type-erased closure.
    Closure,
}

/// Object-safe view of a bound method, erasing the target type.
trait BoundCall<A, R>: Send + Sync + 'static {
    fn call(&self, args: A) -> Result<R, DelegateError>;

    fn same_binding(&self, other: &dyn BoundCall<A, R>) -> bool;

    fn as_any(&self) -> &dyn Any;
}

enum Target<T> {
    Strong(Arc<T>),
    Weak(Weak<T>),
}

impl<T> Target<T> {
    fn as_ptr(&self) -> *const T {
        match self {
            Target::Strong(target) => Arc::as_ptr(target),
            Target::Weak(target) => target.as_ptr(),
        }
    }
}

struct Bound<T, A, R> {
    target: Target<T>,
    method: fn(&T, A) -> R,
}

impl<T, A, R> BoundCall<A, R> for Bound<T, A, R>
where
    T: Send + Sync + 'static,
    A: 'static,
    R: 'static,
{
    fn call(&self, args: A) -> Result<R, DelegateError> {
        match &self.target {
            Target::Strong(target) => Ok((self.method)(target, args)),
            Target::Weak(target) => {
                let target = target.upgrade().ok_or(DelegateError::EmptyCallable)?;
                Ok((self.method)(&target, args))
            }
        }
    }

    fn same_binding(&self, other: &dyn BoundCall<A, R>) -> bool {
        // A binding on another target type fails the downcast.
        other
            .as_any()
            .downcast_ref::<Bound<T, A, R>>()
            .is_some_and(|other| {
                std::ptr::eq(self.target.as_ptr(), other.target.as_ptr())
                    && self.method as *const () == other.method as *const ()
            })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ClosureSlot<A, R> {
    call: Arc<dyn Fn(A) -> R + Send + Sync>,
    type_id: TypeId,
    stateless: bool,
    /// Address of the wrapped `fn` pointer, when the closure is nothing else.
    target: Option<usize>,
    /// The identity was supplied by the caller and alone decides equality.
    explicit: bool,
    identity: Arc<dyn ClosureIdentity>,
}

impl<A, R> ClosureSlot<A, R> {
    fn try_eq(&self, other: &Self) -> Result<bool, DelegateError> {
        if Arc::ptr_eq(&self.call, &other.call) {
            return Ok(true);
        }
        if self.explicit || other.explicit {
            return self.identity.matches(&*other.identity);
        }
        if self.target.is_some() || other.target.is_some() {
            return Ok(self.target == other.target);
        }
        // Nothing captured: the closure type alone determines behavior.
        if self.stateless && other.stateless && self.type_id == other.type_id {
            return Ok(true);
        }
        self.identity.matches(&*other.identity)
    }
}

impl<A, R> Clone for ClosureSlot<A, R> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
            type_id: self.type_id,
            stateless: self.stateless,
            target: self.target,
            explicit: self.explicit,
            identity: Arc::clone(&self.identity),
        }
    }
}

enum Payload<A, R> {
    Function(fn(A) -> R),
    Method(Arc<dyn BoundCall<A, R>>),
    Closure(ClosureSlot<A, R>),
}

impl<A, R> Clone for Payload<A, R> {
    fn clone(&self) -> Self {
        match self {
            Payload::Function(f) => Payload::Function(*f),
            Payload::Method(bound) => Payload::Method(Arc::clone(bound)),
            Payload::Closure(slot) => Payload::Closure(slot.clone()),
        }
    }
}

/// A callable with signature `Fn(A) -> R` and a uniform equality relation.
///
/// Several arguments are passed as a tuple; `A = ()` takes none.
/// Cloning is cheap: clones share the bound target and the closure.
///
/// # Example
///
/// ```
/// use delegates_core::Delegate;
/// use std::sync::Arc;
///
/// fn double(x: i32) -> i32 {
///     x * 2
/// }
///
/// struct Offset(i32);
///
/// impl Offset {
///     fn apply(&self, x: i32) -> i32 {
///         x + self.0
///     }
/// }
///
/// let f = Delegate::from_fn(double);
/// assert_eq!(f.invoke(21).unwrap(), 42);
///
/// let target = Arc::new(Offset(10));
/// let a = Delegate::from_method(Arc::clone(&target), Offset::apply);
/// let b = Delegate::from_method(target, Offset::apply);
/// assert_eq!(a.invoke(1).unwrap(), 11);
/// assert_eq!(a, b);
/// ```
pub struct Delegate<A, R = ()> {
    payload: Payload<A, R>,
}

impl<A: 'static, R: 'static> Delegate<A, R> {
    /// Wrap a plain function pointer.
    pub fn from_fn(f: fn(A) -> R) -> Self {
        Self {
            payload: Payload::Function(f),
        }
    }

    /// Bind `method` to a target whose ownership is shared with the delegate.
    pub fn from_method<T>(target: Arc<T>, method: fn(&T, A) -> R) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self::bound(Target::Strong(target), method)
    }

    /// Bind `method` to a target without keeping it alive.
    ///
    /// Once the last strong reference is gone, invoking fails with
    /// [`DelegateError::EmptyCallable`]. Compares equal to a strong binding
    /// of the same target and method.
    pub fn from_weak_method<T>(target: &Arc<T>, method: fn(&T, A) -> R) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self::bound(Target::Weak(Arc::downgrade(target)), method)
    }

    fn bound<T>(target: Target<T>, method: fn(&T, A) -> R) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            payload: Payload::Method(Arc::new(Bound { target, method })),
        }
    }

    /// Wrap a closure under a fresh [`Token`].
    ///
    /// Clones of the returned delegate compare equal to it. So does any
    /// other closure delegate wrapping the same `fn(A) -> R` pointer, or,
    /// for a closure that captures nothing, another one of the same type.
    pub fn from_closure<F>(f: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::closure(f, Token::next(), false)
    }

    /// Wrap a closure identified by `key`.
    ///
    /// Independently built closures with equal keys of the same type
    /// compare equal. The key alone decides: closures with different keys
    /// are never equal, even if they wrap the same function.
    pub fn from_closure_keyed<K, F>(key: K, f: F) -> Self
    where
        K: PartialEq + Send + Sync + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::with_identity(f, Keyed(key))
    }

    /// Wrap a closure identified by the bytes of its captured state.
    ///
    /// See [`crate::layout`] for how the comparison works.
    ///
    /// # Safety
    ///
    /// Every byte of `F` must be initialized, i.e. the captured values
    /// must not leave padding between them. Captures made only of
    /// pointer-sized values (references, `Arc`, `usize`, `u64`) satisfy
    /// this.
    pub unsafe fn from_closure_layout<F>(f: F, table: LayoutTable) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        // SAFETY: forwarded to the caller.
        let snapshot = unsafe { LayoutSnapshot::capture(&f, table) };
        Self::with_identity(f, snapshot)
    }

    /// Wrap a closure under a caller-chosen identity adapter.
    ///
    /// Equality against another closure delegate is decided by `identity`
    /// alone, apart from clones of the same delegate.
    pub fn with_identity<F, I>(f: F, identity: I) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        I: ClosureIdentity,
    {
        Self::closure(f, identity, true)
    }

    fn closure<F, I>(f: F, identity: I, explicit: bool) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        I: ClosureIdentity,
    {
        let target = (&f as &dyn Any)
            .downcast_ref::<fn(A) -> R>()
            .map(|target| *target as usize);
        Self {
            payload: Payload::Closure(ClosureSlot {
                call: Arc::new(f),
                type_id: TypeId::of::<F>(),
                stateless: size_of::<F>() == 0,
                target,
                explicit,
                identity: Arc::new(identity),
            }),
        }
    }
}

impl<A: 'static, R: 'static> Delegate<A, R> {
    /// Call the wrapped callable.
    ///
    /// # Errors
    ///
    /// [`DelegateError::EmptyCallable`] if a weakly bound target is gone.
    pub fn invoke(&self, args: A) -> Result<R, DelegateError> {
        match &self.payload {
            Payload::Function(f) => Ok(f(args)),
            Payload::Method(bound) => bound.call(args),
            Payload::Closure(slot) => Ok((slot.call)(args)),
        }
    }

    /// Compare two delegates.
    ///
    /// # Errors
    ///
    /// [`DelegateError::UnsupportedComparison`] when two layout-identified
    /// closures have a size the layout table does not know.
    pub fn try_eq(&self, other: &Self) -> Result<bool, DelegateError> {
        match (&self.payload, &other.payload) {
            (Payload::Function(a), Payload::Function(b)) => Ok(*a as *const () == *b as *const ()),
            (Payload::Method(a), Payload::Method(b)) => Ok(a.same_binding(&**b)),
            (Payload::Closure(a), Payload::Closure(b)) => a.try_eq(b),
            _ => Ok(false),
        }
    }

    /// The callable shape held by this delegate.
    pub fn kind(&self) -> DelegateKind {
        match self.payload {
            Payload::Function(_) => DelegateKind::Function,
            Payload::Method(_) => DelegateKind::Method,
            Payload::Closure(_) => DelegateKind::Closure,
        }
    }
}

impl<A, R> Clone for Delegate<A, R> {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.clone(),
        }
    }
}

/// Unsupported comparisons count as not equal; use [`Delegate::try_eq`]
/// to tell the two apart.
impl<A: 'static, R: 'static> PartialEq for Delegate<A, R> {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.try_eq(other), Ok(true))
    }
}

impl<A: 'static, R: 'static> fmt::Debug for Delegate<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

impl<A: 'static, R: 'static> From<fn(A) -> R> for Delegate<A, R> {
    fn from(f: fn(A) -> R) -> Self {
        Self::from_fn(f)
    }
}
