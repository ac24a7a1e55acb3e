use crate::arena::NodeId;
use crate::keys::KeyTrait;
use crate::mapping::direct_mapping::DirectMapping;
use crate::mapping::indexed_mapping::IndexedMapping;
use crate::mapping::sorted_keyed_mapping::SortedKeyedMapping;
use crate::mapping::NodeMapping;

/// Non-owning back-reference from a node to the inner node holding it: the
/// parent's id plus the partial-key byte that routes to this node there.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct Uplink {
    pub(crate) parent: NodeId,
    pub(crate) key: u8,
}

/// Terminal node payload: the full encoded key and the value.
pub(crate) struct LeafNode<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

/// The four adaptive tiers plus the leaf, as a closed tagged variant so
/// grow/shrink transitions are exhaustive matches.
pub(crate) enum NodeType<K, V> {
    Leaf(LeafNode<K, V>),
    Node4(SortedKeyedMapping<4>),
    Node16(SortedKeyedMapping<16>),
    Node48(IndexedMapping<48>),
    Node256(DirectMapping),
}

pub(crate) struct Node<K: KeyTrait, V> {
    /// Compressed path: the key bytes this node consumes, the first of which
    /// is also its uplink byte (root excepted).
    pub(crate) prefix: K::PartialType,
    pub(crate) parent: Option<Uplink>,
    pub(crate) ntype: NodeType<K, V>,
}

impl<K: KeyTrait, V> Node<K, V> {
    #[inline]
    pub(crate) fn new_leaf(prefix: K::PartialType, key: K, value: V) -> Self {
        Self {
            prefix,
            parent: None,
            ntype: NodeType::Leaf(LeafNode { key, value }),
        }
    }

    #[inline]
    pub(crate) fn new_inner(prefix: K::PartialType) -> Self {
        Self {
            prefix,
            parent: None,
            ntype: NodeType::Node4(SortedKeyedMapping::new()),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(&self.ntype, NodeType::Leaf(_))
    }

    pub(crate) fn leaf(&self) -> Option<&LeafNode<K, V>> {
        let NodeType::Leaf(leaf) = &self.ntype else {
            return None;
        };
        Some(leaf)
    }

    pub(crate) fn leaf_mut(&mut self) -> Option<&mut LeafNode<K, V>> {
        let NodeType::Leaf(leaf) = &mut self.ntype else {
            return None;
        };
        Some(leaf)
    }

    pub(crate) fn num_children(&self) -> usize {
        match &self.ntype {
            NodeType::Leaf(_) => 0,
            NodeType::Node4(m) => m.num_children(),
            NodeType::Node16(m) => m.num_children(),
            NodeType::Node48(m) => m.num_children(),
            NodeType::Node256(m) => m.num_children(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        match &self.ntype {
            NodeType::Leaf(_) => 0,
            NodeType::Node4(_) => 4,
            NodeType::Node16(_) => 16,
            NodeType::Node48(_) => 48,
            NodeType::Node256(_) => 256,
        }
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.num_children() == self.capacity()
    }

    pub(crate) fn seek_child(&self, key: u8) -> Option<NodeId> {
        match &self.ntype {
            NodeType::Leaf(_) => None,
            NodeType::Node4(m) => m.seek_child(key),
            NodeType::Node16(m) => m.seek_child(key),
            NodeType::Node48(m) => m.seek_child(key),
            NodeType::Node256(m) => m.seek_child(key),
        }
    }

    /// Adds a child slot. The node must not be full; the engine grows it
    /// first. The child's own parent/uplink is set by the engine.
    pub(crate) fn add_child(&mut self, key: u8, child: NodeId) {
        match &mut self.ntype {
            NodeType::Leaf(_) => unreachable!("invariant violation: add_child on a leaf"),
            NodeType::Node4(m) => m.add_child(key, child),
            NodeType::Node16(m) => m.add_child(key, child),
            NodeType::Node48(m) => m.add_child(key, child),
            NodeType::Node256(m) => m.add_child(key, child),
        }
    }

    /// Substitutes the child at an existing slot in place, returning the old
    /// child id.
    pub(crate) fn update_child(&mut self, key: u8, child: NodeId) -> NodeId {
        match &mut self.ntype {
            NodeType::Leaf(_) => unreachable!("invariant violation: update_child on a leaf"),
            NodeType::Node4(m) => m.update_child(key, child),
            NodeType::Node16(m) => m.update_child(key, child),
            NodeType::Node48(m) => m.update_child(key, child),
            NodeType::Node256(m) => m.update_child(key, child),
        }
    }

    /// Removes the child at `key` (which must be present), then shrinks the
    /// tier in place when occupancy drops below the smaller tier's capacity
    /// threshold. A Node4 left with a single child is not handled here: that
    /// collapse merges compressed paths and is done by the engine.
    pub(crate) fn delete_child(&mut self, key: u8) -> NodeId {
        let child = match &mut self.ntype {
            NodeType::Leaf(_) => unreachable!("invariant violation: delete_child on a leaf"),
            NodeType::Node4(m) => m.delete_child(key),
            NodeType::Node16(m) => m.delete_child(key),
            NodeType::Node48(m) => m.delete_child(key),
            NodeType::Node256(m) => m.delete_child(key),
        };
        let shrunk = match &mut self.ntype {
            NodeType::Node16(m) if m.num_children() < 5 => {
                Some(NodeType::Node4(SortedKeyedMapping::from_resized_shrink(m)))
            }
            NodeType::Node48(m) if m.num_children() < 17 => {
                Some(NodeType::Node16(SortedKeyedMapping::from_indexed(m)))
            }
            NodeType::Node256(m) if m.num_children() < 49 => {
                Some(NodeType::Node48(IndexedMapping::from_direct(m)))
            }
            _ => None,
        };
        if let Some(ntype) = shrunk {
            self.ntype = ntype;
        }
        child
    }

    /// In-place transition to the next tier. Legal only when full. Child ids
    /// and this node's own id are unchanged, so no back-references move.
    pub(crate) fn grow(&mut self) {
        debug_assert!(self.is_full(), "invariant violation: grow below capacity");
        let grown = match &mut self.ntype {
            NodeType::Leaf(_) => unreachable!("invariant violation: grow on a leaf"),
            NodeType::Node4(m) => NodeType::Node16(SortedKeyedMapping::from_resized_grow(m)),
            NodeType::Node16(m) => NodeType::Node48(IndexedMapping::from_sorted(m)),
            NodeType::Node48(m) => NodeType::Node256(DirectMapping::from_indexed(m)),
            NodeType::Node256(_) => unreachable!("invariant violation: grow on a Node256"),
        };
        self.ntype = grown;
    }

    pub(crate) fn first_child(&self) -> Option<(u8, NodeId)> {
        match &self.ntype {
            NodeType::Leaf(_) => None,
            NodeType::Node4(m) => m.first_child(),
            NodeType::Node16(m) => m.first_child(),
            NodeType::Node48(m) => m.first_child(),
            NodeType::Node256(m) => m.first_child(),
        }
    }

    pub(crate) fn last_child(&self) -> Option<(u8, NodeId)> {
        match &self.ntype {
            NodeType::Leaf(_) => None,
            NodeType::Node4(m) => m.last_child(),
            NodeType::Node16(m) => m.last_child(),
            NodeType::Node48(m) => m.last_child(),
            NodeType::Node256(m) => m.last_child(),
        }
    }

    /// Sibling slot with the smallest partial key greater than `key`.
    pub(crate) fn seek_next_child(&self, key: u8) -> Option<(u8, NodeId)> {
        match &self.ntype {
            NodeType::Leaf(_) => None,
            NodeType::Node4(m) => m.seek_next_child(key),
            NodeType::Node16(m) => m.seek_next_child(key),
            NodeType::Node48(m) => m.seek_next_child(key),
            NodeType::Node256(m) => m.seek_next_child(key),
        }
    }

    /// Sibling slot with the largest partial key less than `key`.
    pub(crate) fn seek_prev_child(&self, key: u8) -> Option<(u8, NodeId)> {
        match &self.ntype {
            NodeType::Leaf(_) => None,
            NodeType::Node4(m) => m.seek_prev_child(key),
            NodeType::Node16(m) => m.seek_prev_child(key),
            NodeType::Node48(m) => m.seek_prev_child(key),
            NodeType::Node256(m) => m.seek_prev_child(key),
        }
    }

    /// Children in ascending partial-key order.
    pub(crate) fn iter(&self) -> Box<dyn Iterator<Item = (u8, NodeId)> + '_> {
        match &self.ntype {
            NodeType::Leaf(_) => Box::new(std::iter::empty()),
            NodeType::Node4(m) => Box::new(m.iter()),
            NodeType::Node16(m) => Box::new(m.iter()),
            NodeType::Node48(m) => Box::new(m.iter()),
            NodeType::Node256(m) => Box::new(m.iter()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::Arena;
    use crate::keys::array_key::ArrayKey;
    use crate::node::{Node, NodeType};
    use crate::partials::array_partial::ArrPartial;

    type TestNode = Node<ArrayKey<16>, u32>;

    fn prefix(bytes: &[u8]) -> ArrPartial<16> {
        ArrPartial::from_slice(bytes)
    }

    fn leaf_ids(arena: &mut Arena<TestNode>, n: usize) -> Vec<crate::arena::NodeId> {
        (0..n)
            .map(|i| {
                arena.insert(Node::new_leaf(
                    prefix(b"x"),
                    ArrayKey::from(i as u64),
                    i as u32,
                ))
            })
            .collect()
    }

    #[test]
    fn grow_chain_preserves_children() {
        let mut arena: Arena<TestNode> = Arena::new();
        let ids = leaf_ids(&mut arena, 256);

        let mut node = TestNode::new_inner(prefix(b"p"));
        for (i, id) in ids.iter().enumerate() {
            if node.is_full() {
                node.grow();
            }
            node.add_child(i as u8, *id);

            // After every transition boundary, everything inserted so far is
            // still reachable in order.
            if [4, 16, 48].contains(&(i + 1)) {
                let keys: Vec<u8> = node.iter().map(|(k, _)| k).collect();
                assert_eq!(keys, (0..=i as u8).collect::<Vec<u8>>());
            }
        }
        assert!(matches!(node.ntype, NodeType::Node256(_)));
        assert_eq!(node.num_children(), 256);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(node.seek_child(i as u8), Some(*id));
        }
    }

    #[test]
    fn delete_shrinks_tiers() {
        let mut arena: Arena<TestNode> = Arena::new();
        let ids = leaf_ids(&mut arena, 64);

        let mut node = TestNode::new_inner(prefix(b"p"));
        for (i, id) in ids.iter().enumerate() {
            if node.is_full() {
                node.grow();
            }
            node.add_child(i as u8, *id);
        }
        assert!(matches!(node.ntype, NodeType::Node256(_)));

        // 256 -> 48 once occupancy falls below 49: at exactly 49 children
        // the node keeps its width, one more delete shrinks it.
        for i in 49..64 {
            node.delete_child(i as u8);
        }
        assert_eq!(node.num_children(), 49);
        assert!(matches!(node.ntype, NodeType::Node256(_)));
        node.delete_child(48);
        assert!(matches!(node.ntype, NodeType::Node48(_)));

        // 48 -> 16 below 17, relative order preserved.
        for i in (17..48).rev() {
            node.delete_child(i as u8);
        }
        assert_eq!(node.num_children(), 17);
        assert!(matches!(node.ntype, NodeType::Node48(_)));
        node.delete_child(16);
        assert!(matches!(node.ntype, NodeType::Node16(_)));
        let keys: Vec<u8> = node.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, (0..16).collect::<Vec<u8>>());

        // 16 -> 4 below 5.
        for i in 5..16 {
            node.delete_child(i as u8);
        }
        assert!(matches!(node.ntype, NodeType::Node16(_)));
        node.delete_child(4);
        assert!(matches!(node.ntype, NodeType::Node4(_)));
        for i in 0..4u8 {
            assert_eq!(node.seek_child(i), Some(ids[i as usize]));
        }
    }
}
