/// Builds a [`MulticastDelegate`](crate::MulticastDelegate) from a list of
/// subscribers.
///
/// Each expression may be anything that converts into a
/// [`Delegate`](crate::Delegate): a delegate, or a function pointer.
///
/// # Example
/// ```rust
/// use delegates::{Delegate, MulticastDelegate, multicast};
///
/// fn double(x: i32) -> i32 {
///     x * 2
/// }
///
/// let registry: MulticastDelegate<i32, i32> = multicast![
///     Delegate::from_closure(|x: i32| x + 1),
///     double as fn(i32) -> i32,
/// ];
/// assert_eq!(registry.len(), 2);
/// assert_eq!(registry.invoke(5).unwrap(), 10);
/// ```
#[macro_export]
macro_rules! multicast {
    () => {
        $crate::MulticastDelegate::new()
    };
    ($($subscriber:expr),+ $(,)?) => {{
        let registry = $crate::MulticastDelegate::new();
        $(
            registry.add($subscriber);
        )+
        registry
    }};
}
