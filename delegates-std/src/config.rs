//! Registry configuration.

/// How a [`MulticastDelegate`](crate::MulticastDelegate) holds its lock
/// while invoking subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Hold the lock for the whole sweep. Adds and removes wait until the
    /// sweep finishes; a subscriber must not touch its own registry.
    #[default]
    Locked,
    /// Copy the subscriber list under the lock, then invoke the copy with
    /// the lock released. Subscribers may add or remove entries; the
    /// change is seen by the next invocation.
    Snapshot,
}

/// Settings fixed when a registry is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MulticastConfig {
    /// Locking strategy used by `invoke`.
    pub dispatch: DispatchMode,
    /// Initial capacity of the subscriber list.
    pub capacity: usize,
}

impl MulticastConfig {
    /// Default settings: locked dispatch, no preallocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatch mode.
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Set the initial capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = MulticastConfig::new()
            .with_dispatch(DispatchMode::Snapshot)
            .with_capacity(8);
        assert_eq!(config.dispatch, DispatchMode::Snapshot);
        assert_eq!(config.capacity, 8);
        assert_eq!(MulticastConfig::default().dispatch, DispatchMode::Locked);
    }
}
