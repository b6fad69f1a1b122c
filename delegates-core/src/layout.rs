//! # Byte-layout closure identity
//!
//! Identifies a closure by the bytes of its captured state. Two closures
//! of the same concrete type whose captures hold the same values (the same
//! `Arc` pointer, the same integers) compare equal even when they were
//! built independently.
//!
//! This adapter depends on how the compiler lays out a closure's captures,
//! which is why it is kept apart from the rest of the crate and only
//! reachable through an `unsafe` constructor. Prefer [`Token`] or
//! [`Keyed`] where the caller can keep hold of a handle or a key.
//!
//! Comparison works on a fixed [`LAYOUT_CAPACITY`]-byte buffer. Before the
//! buffers are compared, the offsets listed by the matching
//! [`LayoutProfile`] are zeroed in both. The profile is resolved from the
//! [`LayoutTable`] when the snapshot is taken; a closure whose size has no
//! profile, or two snapshots resolved to different profiles, cannot be
//! compared and yield [`DelegateError::UnsupportedComparison`].
//!
//! [`Token`]: crate::Token
//! [`Keyed`]: crate::Keyed

use crate::error::DelegateError;
use crate::identity::ClosureIdentity;
use std::any::{Any, TypeId};
use std::mem::size_of;

/// Size of the buffer a closure is copied into.
pub const LAYOUT_CAPACITY: usize = 64;

const WORD: usize = size_of::<usize>();

/// Known layout for closures of one size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutProfile {
    /// Closure size in bytes this profile applies to.
    pub size: usize,
    /// Byte offsets that hold no meaningful state and are ignored.
    pub ignored: &'static [usize],
}

static WORD_PROFILES: [LayoutProfile; LAYOUT_CAPACITY / WORD] = {
    let mut profiles = [LayoutProfile {
        size: 0,
        ignored: &[],
    }; LAYOUT_CAPACITY / WORD];
    let mut i = 0;
    while i < profiles.len() {
        profiles[i].size = (i + 1) * WORD;
        i += 1;
    }
    profiles
};

/// The set of closure sizes that may be compared byte-wise.
#[derive(Debug, Clone, Copy)]
pub struct LayoutTable {
    profiles: &'static [LayoutProfile],
}

impl LayoutTable {
    /// A table made of the given profiles.
    pub const fn new(profiles: &'static [LayoutProfile]) -> Self {
        Self { profiles }
    }

    /// Every multiple of the pointer width up to [`LAYOUT_CAPACITY`], with
    /// no ignored offsets.
    pub fn word_aligned() -> Self {
        Self::new(&WORD_PROFILES)
    }

    /// Look up the profile for a closure size.
    pub fn profile(&self, size: usize) -> Option<&LayoutProfile> {
        if size > LAYOUT_CAPACITY {
            return None;
        }
        self.profiles.iter().find(|p| p.size == size)
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::word_aligned()
    }
}

/// A byte copy of a closure taken when the delegate was built.
pub struct LayoutSnapshot {
    type_id: TypeId,
    size: usize,
    bytes: [u8; LAYOUT_CAPACITY],
    profile: Option<LayoutProfile>,
}

impl LayoutSnapshot {
    /// Copy the bytes of `value`.
    ///
    /// The profile for the value's size is looked up in `table` now. Values
    /// with no profile, or larger than [`LAYOUT_CAPACITY`], are not
    /// copied; comparing such a snapshot reports
    /// [`DelegateError::UnsupportedComparison`].
    ///
    /// # Safety
    ///
    /// Every byte of `F` must be initialized: `F` must contain no padding
    /// and no `MaybeUninit` or union fields.
    pub unsafe fn capture<F: 'static>(value: &F, table: LayoutTable) -> Self {
        let size = size_of::<F>();
        let profile = table.profile(size).copied();
        let mut bytes = [0u8; LAYOUT_CAPACITY];
        if profile.is_some() {
            // SAFETY: `value` is a valid reference to `size` bytes, all of
            // which the caller guarantees are initialized.
            let raw = unsafe { std::slice::from_raw_parts((value as *const F).cast::<u8>(), size) };
            bytes[..size].copy_from_slice(raw);
        }
        Self {
            type_id: TypeId::of::<F>(),
            size,
            bytes,
            profile,
        }
    }

    /// Size in bytes of the captured closure.
    pub fn size(&self) -> usize {
        self.size
    }

    fn masked(&self, profile: &LayoutProfile) -> [u8; LAYOUT_CAPACITY] {
        let mut bytes = self.bytes;
        for &offset in profile.ignored {
            if offset < self.size {
                bytes[offset] = 0;
            }
        }
        bytes
    }
}

impl ClosureIdentity for LayoutSnapshot {
    fn matches(&self, other: &dyn ClosureIdentity) -> Result<bool, DelegateError> {
        let Some(other) = other.as_any().downcast_ref::<LayoutSnapshot>() else {
            return Ok(false);
        };
        if self.type_id != other.type_id {
            return Ok(false);
        }
        // Both sides must have been captured under the same profile.
        match (&self.profile, &other.profile) {
            (Some(mine), Some(theirs)) if mine == theirs => {
                Ok(self.masked(mine) == other.masked(theirs))
            }
            _ => Err(DelegateError::UnsupportedComparison { size: self.size }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    struct Pair {
        left: u64,
        right: u64,
    }

    fn snapshot<F: 'static>(value: &F, table: LayoutTable) -> LayoutSnapshot {
        // SAFETY: the test types are made of `u64` fields only.
        unsafe { LayoutSnapshot::capture(value, table) }
    }

    #[test]
    fn test_equal_values_match() {
        let a = snapshot(&Pair { left: 1, right: 2 }, LayoutTable::word_aligned());
        let b = snapshot(&Pair { left: 1, right: 2 }, LayoutTable::word_aligned());
        let c = snapshot(&Pair { left: 1, right: 3 }, LayoutTable::word_aligned());
        assert!(a.matches(&b).unwrap());
        assert!(!a.matches(&c).unwrap());
    }

    #[test]
    fn test_different_types_never_match() {
        let a = snapshot(&Pair { left: 0, right: 0 }, LayoutTable::word_aligned());
        let b = snapshot(&[0u64; 2], LayoutTable::word_aligned());
        assert_eq!(a.size(), b.size());
        assert!(!a.matches(&b).unwrap());
    }

    #[test]
    fn test_ignored_offsets_are_masked() {
        static PROFILES: [LayoutProfile; 1] = [LayoutProfile {
            size: 16,
            ignored: &[8, 9, 10, 11, 12, 13, 14, 15],
        }];
        let table = LayoutTable::new(&PROFILES);
        let a = snapshot(&Pair { left: 7, right: 1 }, table);
        let b = snapshot(&Pair { left: 7, right: 99 }, table);
        assert!(a.matches(&b).unwrap());
    }

    #[test]
    fn test_unknown_size_is_reported() {
        let table = LayoutTable::new(&[]);
        let a = snapshot(&Pair { left: 1, right: 2 }, table);
        let b = snapshot(&Pair { left: 1, right: 2 }, table);
        assert!(matches!(
            a.matches(&b),
            Err(DelegateError::UnsupportedComparison { size: 16 })
        ));
    }

    #[test]
    fn test_mismatched_tables_are_reported_both_ways() {
        let a = snapshot(&Pair { left: 1, right: 2 }, LayoutTable::word_aligned());
        let b = snapshot(&Pair { left: 1, right: 2 }, LayoutTable::new(&[]));
        assert!(matches!(
            a.matches(&b),
            Err(DelegateError::UnsupportedComparison { size: 16 })
        ));
        assert!(matches!(
            b.matches(&a),
            Err(DelegateError::UnsupportedComparison { size: 16 })
        ));
    }

    #[test]
    fn test_oversized_value_is_reported() {
        let big = [1u64; 9];
        let a = snapshot(&big, LayoutTable::word_aligned());
        let b = snapshot(&big, LayoutTable::word_aligned());
        assert!(matches!(
            a.matches(&b),
            Err(DelegateError::UnsupportedComparison { size: 72 })
        ));
    }
}
