// ── Node list filtering and sorting ──

use std::sync::Arc;

use crate::model::{LiveStatus, Node, NodeSort};

/// Filter and ordering applied to a node list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeQuery {
    /// Only nodes in this group. `None` keeps all groups.
    pub group: Option<String>,
    /// Case-insensitive substring of the node name.
    pub search: Option<String>,
    pub sort: NodeSort,
    /// Reverse the natural descending order.
    pub ascending: bool,
    /// Include nodes flagged hidden.
    pub include_hidden: bool,
}

impl NodeQuery {
    fn matches(&self, node: &Node) -> bool {
        if node.hidden && !self.include_hidden {
            return false;
        }
        if let Some(group) = self.group.as_deref() {
            if !node.in_group(group) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => node
                .display_name()
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        }
    }

    /// Filter `nodes` and order them by the sort key.
    ///
    /// `Index` orders by weight; metric sorts look up each node's live
    /// status through `status`. Equal keys fall back to the node id.
    pub fn apply<F>(&self, nodes: &[Arc<Node>], status: F) -> Vec<Arc<Node>>
    where
        F: Fn(&str) -> Option<Arc<LiveStatus>>,
    {
        let mut keyed: Vec<(f64, Arc<Node>)> = nodes
            .iter()
            .filter(|n| self.matches(n))
            .map(|n| {
                let key = match self.sort {
                    NodeSort::Index => weight_key(n.weight),
                    sort => sort.metric(status(&n.id).as_deref()),
                };
                (key, Arc::clone(n))
            })
            .collect();

        keyed.sort_by(|(ka, a), (kb, b)| {
            let ord = kb.total_cmp(ka);
            let ord = if self.ascending { ord.reverse() } else { ord };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        keyed.into_iter().map(|(_, n)| n).collect()
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn weight_key(weight: i64) -> f64 {
    weight as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{node, status};

    fn ids(nodes: &[Arc<Node>]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn fixture() -> Vec<Arc<Node>> {
        vec![
            Arc::new(node("tokyo", 3, Some("asia"))),
            Arc::new(node("paris", 2, Some("eu"))),
            Arc::new(node("berlin", 2, Some("eu"))),
            Arc::new(Node {
                hidden: true,
                ..node("secret", 9, None)
            }),
        ]
    }

    #[test]
    fn index_order_is_weight_descending_then_id() {
        let out = NodeQuery::default().apply(&fixture(), |_| None);
        assert_eq!(ids(&out), vec!["tokyo", "berlin", "paris"]);
    }

    #[test]
    fn group_and_search_filters() {
        let query = NodeQuery {
            group: Some("eu".into()),
            search: Some("PAR".into()),
            ..NodeQuery::default()
        };
        assert_eq!(ids(&query.apply(&fixture(), |_| None)), vec!["paris"]);
    }

    #[test]
    fn hidden_nodes_need_opt_in() {
        let query = NodeQuery {
            include_hidden: true,
            ..NodeQuery::default()
        };
        assert_eq!(ids(&query.apply(&fixture(), |_| None))[0], "secret");
    }

    #[test]
    fn metric_sort_reads_live_status() {
        let statuses: HashMap<String, Arc<LiveStatus>> = [("tokyo", 5.0), ("paris", 80.0)]
            .into_iter()
            .map(|(id, cpu)| {
                let s = LiveStatus {
                    cpu,
                    ..status(id, true)
                };
                (id.to_owned(), Arc::new(s))
            })
            .collect();
        let lookup = |id: &str| statuses.get(id).cloned();

        let desc = NodeQuery {
            sort: NodeSort::Cpu,
            ..NodeQuery::default()
        };
        assert_eq!(ids(&desc.apply(&fixture(), lookup)), vec!["paris", "tokyo", "berlin"]);

        let asc = NodeQuery {
            ascending: true,
            ..desc
        };
        assert_eq!(ids(&asc.apply(&fixture(), lookup)), vec!["berlin", "tokyo", "paris"]);
    }
}
