//! PIDs spawned by this launcher instance.

use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Shared set of managed PIDs.
///
/// Only the launch controller writes; everyone else reads. Dead PIDs are
/// removed lazily by [`ManagedPidSet::prune_dead`].
#[derive(Debug, Clone, Default)]
pub struct ManagedPidSet {
    pids: Arc<RwLock<HashSet<u32>>>,
}

impl ManagedPidSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashSet<u32>> {
        self.pids.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<u32>> {
        self.pids.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, pid: u32) -> bool {
        self.write().insert(pid)
    }

    pub fn remove(&self, pid: u32) -> bool {
        self.write().remove(&pid)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.read().contains(&pid)
    }

    /// Managed PIDs in ascending order.
    pub fn pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.read().iter().copied().collect();
        pids.sort_unstable();
        pids
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every PID for which `is_alive` is false. Returns the removed PIDs.
    pub fn prune_dead(&self, is_alive: impl Fn(u32) -> bool) -> Vec<u32> {
        let mut pids = self.write();
        let mut dead: Vec<u32> = pids.iter().copied().filter(|&pid| !is_alive(pid)).collect();
        dead.sort_unstable();
        for pid in &dead {
            pids.remove(pid);
        }
        if !dead.is_empty() {
            debug!("Pruned exited managed PIDs: {:?}", dead);
        }
        dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_contains() {
        let set = ManagedPidSet::new();
        assert!(set.insert(5));
        assert!(!set.insert(5));
        assert!(set.contains(5));
        assert!(set.remove(5));
        assert!(set.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let set = ManagedPidSet::new();
        set.clone().insert(3);
        set.insert(1);
        assert_eq!(set.pids(), vec![1, 3]);
    }

    #[test]
    fn test_prune_dead() {
        let set = ManagedPidSet::new();
        for pid in [1, 2, 3] {
            set.insert(pid);
        }

        let removed = set.prune_dead(|pid| pid == 2);

        assert_eq!(removed, vec![1, 3]);
        assert_eq!(set.pids(), vec![2]);
    }
}
