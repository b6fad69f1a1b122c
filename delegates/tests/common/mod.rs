#![allow(dead_code)]

use lazy_static::lazy_static;
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Global state for free-function subscribers
// ============================================================================

lazy_static! {
    /// Names pushed by the free functions below, in call order.
    pub static ref FREE_CALLS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
    /// Serializes tests that read or clear `FREE_CALLS`.
    static ref FREE_LOCK: Mutex<()> = Mutex::new(());
}

/// Hold this while a test uses the free-function subscribers.
pub fn free_calls_guard() -> MutexGuard<'static, ()> {
    let guard = FREE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    FREE_CALLS.lock().unwrap().clear();
    guard
}

pub fn free_calls() -> Vec<&'static str> {
    FREE_CALLS.lock().unwrap().clone()
}

pub fn alpha(x: i32) -> i32 {
    FREE_CALLS.lock().unwrap().push("alpha");
    x + 1
}

pub fn beta(x: i32) -> i32 {
    FREE_CALLS.lock().unwrap().push("beta");
    x * 10
}

pub fn gamma(x: i32) -> i32 {
    FREE_CALLS.lock().unwrap().push("gamma");
    x - 100
}

// ============================================================================
// Bound-method targets
// ============================================================================

pub struct Account {
    pub balance: AtomicUsize,
}

impl Account {
    pub fn new(balance: usize) -> Arc<Self> {
        Arc::new(Self {
            balance: AtomicUsize::new(balance),
        })
    }

    pub fn deposit(&self, amount: usize) -> usize {
        self.balance.fetch_add(amount, Ordering::SeqCst) + amount
    }

    pub fn withdraw(&self, amount: usize) -> usize {
        self.balance.fetch_sub(amount, Ordering::SeqCst) - amount
    }

    pub fn balance(&self) -> usize {
        self.balance.load(Ordering::SeqCst)
    }
}
