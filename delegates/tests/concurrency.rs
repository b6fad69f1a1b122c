use delegates::{Delegate, DispatchMode, MulticastConfig, MulticastDelegate, testing::CallLog};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 50;

#[test]
fn test_concurrent_add_loses_nothing() {
    let log = CallLog::new();
    let registry: Arc<MulticastDelegate<(), ()>> = Arc::new(MulticastDelegate::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let log = log.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    registry.add(log.recorder((t, i), ()));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), THREADS * PER_THREAD);
    registry.invoke(()).unwrap();

    let calls = log.entries();
    assert_eq!(calls.len(), THREADS * PER_THREAD);
    for t in 0..THREADS {
        let own: Vec<usize> = calls
            .iter()
            .filter(|(thread, _)| *thread == t)
            .map(|(_, i)| *i)
            .collect();
        assert_eq!(own, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn test_cross_copy_does_not_deadlock() {
    let left: Arc<MulticastDelegate<(), usize>> = Arc::new(MulticastDelegate::new());
    let right: Arc<MulticastDelegate<(), usize>> = Arc::new(MulticastDelegate::new());
    for n in 0..3 {
        left.add(Delegate::from_closure(move |()| n));
    }
    for n in 10..15 {
        right.add(Delegate::from_closure(move |()| n));
    }

    let barrier = Arc::new(Barrier::new(2));
    let spawn_copier = |dst: Arc<MulticastDelegate<(), usize>>, src: Arc<MulticastDelegate<(), usize>>| {
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..1_000 {
                dst.copy_from(&src);
            }
        })
    };
    let a = spawn_copier(Arc::clone(&left), Arc::clone(&right));
    let b = spawn_copier(Arc::clone(&right), Arc::clone(&left));
    a.join().unwrap();
    b.join().unwrap();

    // Each side ends up holding one of the two original lists, whole.
    for registry in [&left, &right] {
        let len = registry.len();
        assert!(len == 3 || len == 5, "torn list of {len} entries");
        let last = registry.invoke(()).unwrap();
        assert_eq!(last, if len == 3 { 2 } else { 14 });
    }
}

#[test]
fn test_invoke_races_with_mutation() {
    for dispatch in [DispatchMode::Locked, DispatchMode::Snapshot] {
        let registry = Arc::new(MulticastDelegate::with_config(
            MulticastConfig::new().with_dispatch(dispatch),
        ));
        registry.add(Delegate::from_closure(|x: usize| x));

        let churn = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..500 {
                    let subscription = registry.subscribe(Delegate::from_closure(|x: usize| x + 1));
                    assert!(registry.unsubscribe(&subscription));
                }
            })
        };

        for _ in 0..500 {
            let result = registry.invoke(1).unwrap();
            assert!(result == 1 || result == 2);
        }
        churn.join().unwrap();
        assert_eq!(registry.len(), 1);
    }
}
