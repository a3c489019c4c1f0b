//! Shared network set with runtime updates
//!
//! Readers take an immutable snapshot and query it without holding the
//! lock. Writers build a new set and swap it in, so a reader never sees a
//! half-applied update.

use crate::{NetworkSet, Result};
use cidrlist_cidr::NetworkRange;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Cloneable handle to a replaceable [`NetworkSet`]
///
/// Clones share the same underlying set.
///
/// # Examples
///
/// ```
/// use cidrlist_set::{NetworkSet, SharedNetworkSet};
///
/// let shared = SharedNetworkSet::new(NetworkSet::new(["10.0.0.0/8"])?);
/// let before = shared.snapshot();
///
/// shared.add("192.168.0.0/16")?;
///
/// assert!(shared.contains("192.168.1.1")?);
/// assert!(!before.contains("192.168.1.1")?);
/// # Ok::<(), cidrlist_set::ParseError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedNetworkSet {
    current: Arc<RwLock<Arc<NetworkSet>>>,
}

impl SharedNetworkSet {
    pub fn new(set: NetworkSet) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(set))),
        }
    }

    /// Current set; unaffected by later updates
    pub fn snapshot(&self) -> Arc<NetworkSet> {
        Arc::clone(&self.current.read())
    }

    /// Membership test against the current snapshot
    pub fn contains(&self, query: &str) -> Result<bool> {
        self.snapshot().contains(query)
    }

    /// Parse and append one entry
    ///
    /// On a parse error the current set is left untouched.
    pub fn add(&self, entry: &str) -> Result<()> {
        let range = NetworkRange::parse(entry)?;

        let mut current = self.current.write();
        let mut next = NetworkSet::clone(&current);
        next.push(range);
        *current = Arc::new(next);

        debug!(entry, %range, entries = current.len(), "network entry added");
        Ok(())
    }

    /// Swap in a whole new set, returning the previous one
    pub fn replace(&self, set: NetworkSet) -> Arc<NetworkSet> {
        let entries = set.len();
        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(set));
        debug!(entries, "network set replaced");
        previous
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}

impl From<NetworkSet> for SharedNetworkSet {
    fn from(set: NetworkSet) -> Self {
        Self::new(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_snapshot_isolation() {
        let shared = SharedNetworkSet::new(NetworkSet::new(["10.0.0.0/8"]).unwrap());
        let before = shared.snapshot();

        shared.add("172.16.0.0/12").unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(shared.len(), 2);
        assert!(shared.contains("172.20.0.1").unwrap());
        assert!(!before.contains("172.20.0.1").unwrap());
    }

    #[test]
    fn test_failed_add_keeps_set() {
        let shared = SharedNetworkSet::new(NetworkSet::new(["10.0.0.0/8"]).unwrap());
        let before = shared.snapshot();

        assert!(shared.add("172.16.0.0/255.0.255.0").is_err());
        assert!(Arc::ptr_eq(&before, &shared.snapshot()));
    }

    #[test]
    fn test_replace() {
        let shared = SharedNetworkSet::default();
        assert!(shared.is_empty());

        let previous = shared.replace(NetworkSet::new(["8.8.8.8"]).unwrap());
        assert!(previous.is_empty());
        assert!(shared.contains("8.8.8.8").unwrap());
    }

    #[test]
    fn test_clones_share_state() {
        let shared = SharedNetworkSet::default();
        let handle = shared.clone();
        handle.add("::1").unwrap();
        assert!(shared.contains("::1").unwrap());
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let shared = SharedNetworkSet::new(NetworkSet::new(["10.0.0.0/8"]).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let snapshot = shared.snapshot();
                        assert!(snapshot.contains("10.1.2.3").unwrap());
                        // every snapshot is a complete set
                        assert!(snapshot.iter().all(|range| range.prefix_len() <= 32));
                    }
                })
            })
            .collect();

        for i in 0..100u8 {
            shared.add(&format!("192.168.{}.0/24", i)).unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(shared.len(), 101);
    }
}
