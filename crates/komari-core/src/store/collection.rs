// ── Generic reactive keyed collection ──
//
// Concurrent storage with O(1) lookups by node uuid and push-based
// change notification via `watch` channels.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A concurrent, reactive collection for one domain type.
///
/// Uses `DashMap` for lookups and a `watch` channel for the ordered
/// snapshot subscribers receive. Every replacement bumps a version counter.
pub(crate) struct Collection<T: Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,

    /// Version counter, bumped on every replacement.
    version: watch::Sender<u64>,

    /// Ordered snapshot, rebuilt on replacement.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> Collection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace the whole collection. The snapshot keeps `items` order.
    ///
    /// Incoming entries are upserted first and stale keys pruned after,
    /// so concurrent lookups never observe an empty collection.
    pub(crate) fn replace_all(&self, items: Vec<(String, T)>) {
        let incoming: HashSet<String> = items.iter().map(|(k, _)| k.clone()).collect();
        let mut ordered = Vec::with_capacity(items.len());
        for (key, value) in items {
            let value = Arc::new(value);
            self.by_key.insert(key, Arc::clone(&value));
            ordered.push(value);
        }
        self.by_key.retain(|key, _| incoming.contains(key));

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(ordered));
        self.version.send_modify(|v| *v += 1);
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// The current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn items(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn replace_all_keeps_incoming_order() {
        let col: Collection<String> = Collection::new();
        col.replace_all(items(&[("b", "2"), ("a", "1")]));

        let snap: Vec<String> = col.snapshot().iter().map(|v| (**v).clone()).collect();
        assert_eq!(snap, vec!["2", "1"]);
        assert_eq!(*col.get("a").unwrap(), "1");
    }

    #[test]
    fn replace_all_prunes_stale_keys() {
        let col: Collection<String> = Collection::new();
        col.replace_all(items(&[("a", "1"), ("b", "2")]));
        col.replace_all(items(&[("b", "3")]));

        assert!(col.get("a").is_none());
        assert_eq!(*col.get("b").unwrap(), "3");
        assert_eq!(col.len(), 1);
        assert_eq!(col.version(), 2);
    }

    #[test]
    fn subscribers_see_replacement() {
        let col: Collection<String> = Collection::new();
        let mut rx = col.subscribe();
        col.replace_all(items(&[("a", "1")]));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
