// ── Central reactive data store ──
//
// Thread-safe storage for the dashboard's node inventory and live
// status. Both are replaced wholesale per refresh; the online set is
// derived from every accepted live-status map.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::Collection;
use super::query::NodeQuery;
use crate::convert::sort_by_weight;
use crate::model::{LiveStatus, Node};

/// Central reactive store for one dashboard.
///
/// Reads never block writers: lookups go through `DashMap`, snapshots
/// through `watch` channels.
pub struct DataStore {
    pub(crate) nodes: Collection<Node>,
    pub(crate) statuses: Collection<LiveStatus>,
    pub(crate) online: watch::Sender<Arc<HashSet<String>>>,
    pub(crate) last_status_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        let (online, _) = watch::channel(Arc::new(HashSet::new()));
        let (last_status_refresh, _) = watch::channel(None);

        Self {
            nodes: Collection::new(),
            statuses: Collection::new(),
            online,
            last_status_refresh,
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace the inventory. Nodes are kept sorted by weight descending.
    pub(crate) fn apply_nodes(&self, mut nodes: Vec<Node>) {
        sort_by_weight(&mut nodes);
        self.nodes
            .replace_all(nodes.into_iter().map(|n| (n.id.clone(), n)).collect());
    }

    /// Replace every live status and recompute the online set.
    pub(crate) fn apply_live_status(&self, statuses: HashMap<String, LiveStatus>) {
        let online = online_set(&statuses);
        let mut entries: Vec<(String, LiveStatus)> = statuses.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.statuses.replace_all(entries);
        self.online.send_modify(|set| *set = Arc::new(online));
        self.last_status_refresh
            .send_modify(|ts| *ts = Some(Utc::now()));
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn nodes_snapshot(&self) -> Arc<Vec<Arc<Node>>> {
        self.nodes.snapshot()
    }

    pub fn statuses_snapshot(&self) -> Arc<Vec<Arc<LiveStatus>>> {
        self.statuses.snapshot()
    }

    pub fn online_ids(&self) -> Arc<HashSet<String>> {
        self.online.borrow().clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn last_status_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_status_refresh.borrow()
    }

    /// Bumped once per inventory replacement.
    pub fn inventory_version(&self) -> u64 {
        self.nodes.version()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn node(&self, id: &str) -> Option<Arc<Node>> {
        self.nodes.get(id)
    }

    /// Find a node by uuid, or else by case-insensitive exact name.
    pub fn find_node(&self, identifier: &str) -> Option<Arc<Node>> {
        self.node(identifier).or_else(|| {
            self.nodes_snapshot()
                .iter()
                .find(|n| n.name.eq_ignore_ascii_case(identifier))
                .cloned()
        })
    }

    pub fn live_status(&self, id: &str) -> Option<Arc<LiveStatus>> {
        self.statuses.get(id)
    }

    pub fn is_online(&self, id: &str) -> bool {
        self.online.borrow().contains(id)
    }

    /// Sorted unique non-empty group names across the inventory.
    pub fn group_names(&self) -> Vec<String> {
        group_names(self.nodes_snapshot().iter().map(AsRef::as_ref))
    }

    /// Filter and sort the inventory.
    pub fn query(&self, query: &NodeQuery) -> Vec<Arc<Node>> {
        query.apply(&self.nodes_snapshot(), |id| self.live_status(id))
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_nodes(&self) -> watch::Receiver<Arc<Vec<Arc<Node>>>> {
        self.nodes.subscribe()
    }

    pub fn subscribe_statuses(&self) -> watch::Receiver<Arc<Vec<Arc<LiveStatus>>>> {
        self.statuses.subscribe()
    }

    pub fn subscribe_online(&self) -> watch::Receiver<Arc<HashSet<String>>> {
        self.online.subscribe()
    }
}

/// Ids of every status reporting `online == true`.
pub fn online_set(statuses: &HashMap<String, LiveStatus>) -> HashSet<String> {
    statuses
        .values()
        .filter(|s| s.online)
        .map(|s| s.node_id.clone())
        .collect()
}

/// Sorted unique non-empty group names.
pub fn group_names<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<String> {
    nodes
        .into_iter()
        .filter_map(|n| n.group.as_deref())
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{node, status};

    #[test]
    fn online_set_contains_only_online_nodes() {
        let mut statuses = HashMap::new();
        statuses.insert("A".to_owned(), status("A", true));
        statuses.insert("B".to_owned(), status("B", false));

        let online = online_set(&statuses);
        assert_eq!(online, HashSet::from(["A".to_owned()]));
    }

    #[test]
    fn live_status_replaces_online_set_wholesale() {
        let store = DataStore::new();
        store.apply_live_status(HashMap::from([("A".to_owned(), status("A", true))]));
        assert!(store.is_online("A"));

        store.apply_live_status(HashMap::from([("B".to_owned(), status("B", true))]));
        assert!(!store.is_online("A"));
        assert!(store.is_online("B"));
        assert!(store.live_status("A").is_none());
        assert!(store.last_status_refresh().is_some());
    }

    #[test]
    fn inventory_sorted_and_grouped() {
        let store = DataStore::new();
        store.apply_nodes(vec![
            node("a", 1, Some("eu")),
            node("b", 7, Some("asia")),
            node("c", 3, Some("")),
            node("d", 5, Some("eu")),
        ]);

        let ids: Vec<String> = store.nodes_snapshot().iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec!["b", "d", "c", "a"]);
        assert_eq!(store.group_names(), vec!["asia", "eu"]);
        assert_eq!(store.find_node("D").unwrap().id, "d");
        assert_eq!(store.inventory_version(), 1);
    }
}
