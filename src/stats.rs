use std::collections::HashMap;

use crate::keys::KeyTrait;
use crate::tree::AdaptiveRadixTree;

/// Occupancy tally for one inner-node width.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStats {
    pub count: usize,
    pub total_children: usize,
}

impl NodeStats {
    /// Mean slot utilization for nodes of the given width, in `0.0..=1.0`.
    pub fn density(&self, width: usize) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.total_children as f64 / (self.count * width) as f64
    }
}

/// A walk of the whole tree, tallying shape: how many nodes of each width,
/// how full they are, and how deep the tree goes.
#[derive(Debug, Clone, Default)]
pub struct TreeStats {
    /// Keyed by node width (4, 16, 48, 256).
    pub node_stats: HashMap<usize, NodeStats>,
    pub num_leaves: usize,
    pub num_inner_nodes: usize,
    pub num_entries: usize,
    pub max_height: usize,
}

pub fn tree_stats<K: KeyTrait, V>(tree: &AdaptiveRadixTree<K, V>) -> TreeStats {
    let mut stats = TreeStats {
        num_entries: tree.len(),
        ..Default::default()
    };
    let Some(root) = tree.root else {
        return stats;
    };

    let mut stack = vec![(root, 1usize)];
    while let Some((id, height)) = stack.pop() {
        stats.max_height = stats.max_height.max(height);
        let node = tree.arena.get(id);
        if node.is_leaf() {
            stats.num_leaves += 1;
            continue;
        }
        stats.num_inner_nodes += 1;
        let per_width = stats.node_stats.entry(node.capacity()).or_default();
        per_width.count += 1;
        per_width.total_children += node.num_children();
        for (_, child) in node.iter() {
            stack.push((child, height + 1));
        }
    }
    // Every live arena slot is reachable from the root.
    debug_assert_eq!(stats.num_leaves + stats.num_inner_nodes, tree.arena.len());
    stats
}
