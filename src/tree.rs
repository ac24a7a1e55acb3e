use std::mem;

use crate::arena::{Arena, NodeId};
use crate::keys::KeyTrait;
use crate::node::{Node, NodeType, Uplink};
use crate::partials::Partial;

/// An ordered map over binary-comparable keys, backed by an adaptive radix
/// tree.
///
/// Inner nodes come in four widths (4, 16, 48, 256) and change width in
/// place as children come and go, always under the same arena handle. Paths
/// with no branching are compressed into a per-node prefix; a node's prefix
/// includes the byte that routes to it from its parent, so collapsing a
/// one-child node is a plain prefix concatenation.
///
/// Every node carries a back-reference to its parent slot, which makes
/// successor/predecessor walks O(depth) from any leaf and gives iterators a
/// stable handle to resume from. A modification counter (`version`) advances
/// on every structural change, letting detached cursors detect that the tree
/// changed underneath them; replacing the value of an existing key is not a
/// structural change.
///
/// Keys must be prefix-free in their encoded form: no key's byte encoding
/// may be a strict prefix of another's. The provided key types guarantee
/// this (strings are null-terminated, integers are fixed-width). Violations
/// are treated as contract violations and panic.
pub struct AdaptiveRadixTree<K: KeyTrait, V> {
    pub(crate) arena: Arena<Node<K, V>>,
    pub(crate) root: Option<NodeId>,
    size: usize,
    version: u64,
}

/// A stable, copyable handle to one entry of the tree.
///
/// Handles remain valid across structural changes that do not remove their
/// entry. A handle to a removed entry is detected best-effort: accessors
/// return `None` when the slot is vacant or no longer a leaf, but a slot
/// reused by a later insert cannot be told apart from the original.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EntryRef(pub(crate) NodeId);

impl<K: KeyTrait, V> Default for AdaptiveRadixTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeyTrait, V> AdaptiveRadixTree<K, V> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            size: 0,
            version: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The structural modification counter. Advances on every insert of a
    /// new key, every removal, and `clear`; never on value replacement.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.size = 0;
        self.version += 1;
    }

    pub fn get<Q>(&self, key: Q) -> Option<&V>
    where
        Q: Into<K>,
    {
        self.get_k(&key.into())
    }

    pub fn get_k(&self, key: &K) -> Option<&V> {
        let id = self.find_leaf(key)?;
        self.arena.get(id).leaf().map(|leaf| &leaf.value)
    }

    pub fn get_mut<Q>(&mut self, key: Q) -> Option<&mut V>
    where
        Q: Into<K>,
    {
        self.get_mut_k(&key.into())
    }

    pub fn get_mut_k(&mut self, key: &K) -> Option<&mut V> {
        let id = self.find_leaf(key)?;
        self.arena.get_mut(id).leaf_mut().map(|leaf| &mut leaf.value)
    }

    pub fn contains_key<Q>(&self, key: Q) -> bool
    where
        Q: Into<K>,
    {
        self.find_leaf(&key.into()).is_some()
    }

    /// Linear scan over all entries. O(n).
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, v)| v == value)
    }

    /// Inserts `key` -> `value`, returning the previous value if the key was
    /// already present. Replacing a value does not count as a structural
    /// modification.
    pub fn insert<Q>(&mut self, key: Q, value: V) -> Option<V>
    where
        Q: Into<K>,
    {
        self.insert_k(key.into(), value)
    }

    pub fn insert_k(&mut self, key: K, value: V) -> Option<V> {
        let Some(root_id) = self.root else {
            let prefix = key.to_partial(0);
            let id = self.arena.insert(Node::new_leaf(prefix, key, value));
            self.root = Some(id);
            self.size = 1;
            self.version += 1;
            return None;
        };

        let mut cur = root_id;
        let mut depth = 0usize;
        loop {
            let (lcp, prefix_len, is_leaf) = {
                let node = self.arena.get(cur);
                (
                    node.prefix.prefix_length_key(&key, depth),
                    node.prefix.len(),
                    node.is_leaf(),
                )
            };

            if lcp < prefix_len {
                self.split_and_insert(cur, depth, lcp, key, value);
                return None;
            }

            if is_leaf {
                let node = self.arena.get_mut(cur);
                let leaf = node.leaf_mut().expect("invariant violation: leaf lost its payload");
                assert!(
                    leaf.key.matches_slice(key.as_ref()),
                    "invariant violation: key encoding is a prefix of an existing key"
                );
                return Some(mem::replace(&mut leaf.value, value));
            }

            depth += prefix_len;
            assert!(
                key.length_at(depth) > 0,
                "invariant violation: key encoding is a prefix of an existing key"
            );
            let byte = key.at(depth);
            match self.arena.get(cur).seek_child(byte) {
                Some(child) => cur = child,
                None => {
                    let leaf = Node::new_leaf(key.to_partial(depth), key, value);
                    let leaf_id = self.arena.insert(leaf);
                    self.add_child(cur, byte, leaf_id);
                    self.size += 1;
                    self.version += 1;
                    return None;
                }
            }
        }
    }

    pub fn remove<Q>(&mut self, key: Q) -> Option<V>
    where
        Q: Into<K>,
    {
        self.remove_k(&key.into())
    }

    pub fn remove_k(&mut self, key: &K) -> Option<V> {
        let leaf_id = self.find_leaf(key)?;
        Some(self.remove_leaf(leaf_id))
    }

    pub fn first_entry(&self) -> Option<EntryRef> {
        Some(EntryRef(self.minimum_leaf(self.root?)))
    }

    pub fn last_entry(&self) -> Option<EntryRef> {
        Some(EntryRef(self.maximum_leaf(self.root?)))
    }

    pub fn get_entry<Q>(&self, key: Q) -> Option<EntryRef>
    where
        Q: Into<K>,
    {
        self.find_leaf(&key.into()).map(EntryRef)
    }

    /// The key and value behind a handle, or `None` if the entry has been
    /// removed since the handle was obtained (best-effort).
    pub fn entry(&self, entry: EntryRef) -> Option<(&K, &V)> {
        if !self.valid_leaf(entry.0) {
            return None;
        }
        Some(self.leaf_parts(entry.0))
    }

    /// Removes the entry behind a handle in O(1) plus restructuring, without
    /// re-descending from the root. Returns `None` for a stale handle.
    pub fn delete_entry(&mut self, entry: EntryRef) -> Option<V> {
        if !self.valid_leaf(entry.0) {
            return None;
        }
        Some(self.remove_leaf(entry.0))
    }

    /// The entry with the smallest key greater than this one's.
    pub fn successor(&self, entry: EntryRef) -> Option<EntryRef> {
        if !self.valid_leaf(entry.0) {
            return None;
        }
        self.successor_id(entry.0).map(EntryRef)
    }

    /// The entry with the largest key smaller than this one's.
    pub fn predecessor(&self, entry: EntryRef) -> Option<EntryRef> {
        if !self.valid_leaf(entry.0) {
            return None;
        }
        self.predecessor_id(entry.0).map(EntryRef)
    }

    // ---- internals ----

    /// Descends by prefix comparison, then verifies the full key at the
    /// leaf. The per-level checks are pessimistic (every prefix byte is
    /// compared), so the terminal check only rejects keys that diverge
    /// inside a leaf's compressed tail.
    fn find_leaf(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root?;
        let mut depth = 0usize;
        loop {
            let node = self.arena.get(cur);
            if let Some(leaf) = node.leaf() {
                return leaf.key.matches_slice(key.as_ref()).then_some(cur);
            }
            let prefix_len = node.prefix.len();
            if node.prefix.prefix_length_key(key, depth) < prefix_len {
                return None;
            }
            depth += prefix_len;
            if key.length_at(depth) == 0 {
                return None;
            }
            cur = node.seek_child(key.at(depth))?;
        }
    }

    /// Splits `cur`'s prefix at `lcp` under a fresh Node4 branch, with the
    /// old node and a new leaf as its two children. `cur` keeps its id, so
    /// the children it already routes to are untouched.
    fn split_and_insert(&mut self, cur: NodeId, depth: usize, lcp: usize, key: K, value: V) {
        assert!(
            key.length_at(depth) > lcp,
            "invariant violation: key encoding is a prefix of an existing key"
        );

        let (branch_prefix, demoted_prefix, old_uplink) = {
            let node = self.arena.get(cur);
            (
                node.prefix.partial_before(lcp),
                node.prefix.partial_after(lcp),
                node.parent,
            )
        };
        let old_route = demoted_prefix.at(0);
        let new_route = key.at(depth + lcp);
        debug_assert_ne!(old_route, new_route);

        let branch_id = self.arena.insert(Node::new_inner(branch_prefix));
        self.arena.get_mut(branch_id).parent = old_uplink;
        match old_uplink {
            None => self.root = Some(branch_id),
            Some(Uplink { parent, key: route }) => {
                self.arena.get_mut(parent).update_child(route, branch_id);
            }
        }

        self.arena.get_mut(cur).prefix = demoted_prefix;

        let leaf = Node::new_leaf(key.to_partial(depth + lcp), key, value);
        let leaf_id = self.arena.insert(leaf);
        self.add_child(branch_id, old_route, cur);
        self.add_child(branch_id, new_route, leaf_id);

        self.size += 1;
        self.version += 1;
    }

    /// Routes `child` under `parent` at `key`, growing the parent's width
    /// first if it is full, and stamps the child's uplink.
    fn add_child(&mut self, parent: NodeId, key: u8, child: NodeId) {
        let node = self.arena.get_mut(parent);
        if node.is_full() {
            node.grow();
        }
        node.add_child(key, child);
        self.arena.get_mut(child).parent = Some(Uplink { parent, key });
    }

    pub(crate) fn remove_leaf(&mut self, leaf_id: NodeId) -> V {
        let node = self.arena.remove(leaf_id);
        let NodeType::Leaf(leaf) = node.ntype else {
            unreachable!("invariant violation: removing a non-leaf entry");
        };
        match node.parent {
            None => self.root = None,
            Some(Uplink { parent, key }) => {
                self.arena.get_mut(parent).delete_child(key);
                self.collapse_if_single(parent);
            }
        }
        self.size -= 1;
        self.version += 1;
        leaf.value
    }

    /// Path compression on the way out: an inner node left with a single
    /// child is removed, its prefix folded onto the child's.
    fn collapse_if_single(&mut self, id: NodeId) {
        let node = self.arena.get_mut(id);
        if node.num_children() != 1 {
            return;
        }
        let NodeType::Node4(mapping) = &mut node.ntype else {
            unreachable!("invariant violation: one-child node above the narrowest width");
        };
        let (route, child_id) = mapping.take_only_child();
        let prefix = node.prefix.clone();
        let uplink = node.parent;

        let child = self.arena.get_mut(child_id);
        debug_assert_eq!(child.prefix.at(0), route);
        child.prefix = prefix.partial_extended_with(&child.prefix);
        child.parent = uplink;
        match uplink {
            None => self.root = Some(child_id),
            Some(Uplink { parent, key }) => {
                self.arena.get_mut(parent).update_child(key, child_id);
            }
        }
        self.arena.remove(id);
    }

    pub(crate) fn minimum_leaf(&self, mut cur: NodeId) -> NodeId {
        loop {
            let node = self.arena.get(cur);
            if node.is_leaf() {
                return cur;
            }
            let (_, child) = node
                .first_child()
                .expect("invariant violation: inner node with no children");
            cur = child;
        }
    }

    pub(crate) fn maximum_leaf(&self, mut cur: NodeId) -> NodeId {
        loop {
            let node = self.arena.get(cur);
            if node.is_leaf() {
                return cur;
            }
            let (_, child) = node
                .last_child()
                .expect("invariant violation: inner node with no children");
            cur = child;
        }
    }

    /// Walks up until some ancestor has a sibling to the right, then down
    /// that sibling's leftmost spine. O(depth).
    pub(crate) fn successor_id(&self, leaf: NodeId) -> Option<NodeId> {
        let mut cur = leaf;
        loop {
            let Uplink { parent, key } = self.arena.get(cur).parent?;
            if let Some((_, sibling)) = self.arena.get(parent).seek_next_child(key) {
                return Some(self.minimum_leaf(sibling));
            }
            cur = parent;
        }
    }

    /// Mirror of [`successor_id`](Self::successor_id).
    pub(crate) fn predecessor_id(&self, leaf: NodeId) -> Option<NodeId> {
        let mut cur = leaf;
        loop {
            let Uplink { parent, key } = self.arena.get(cur).parent?;
            if let Some((_, sibling)) = self.arena.get(parent).seek_prev_child(key) {
                return Some(self.maximum_leaf(sibling));
            }
            cur = parent;
        }
    }

    pub(crate) fn leaf_parts(&self, id: NodeId) -> (&K, &V) {
        let leaf = self
            .arena
            .get(id)
            .leaf()
            .expect("invariant violation: entry handle does not refer to a leaf");
        (&leaf.key, &leaf.value)
    }

    pub(crate) fn valid_leaf(&self, id: NodeId) -> bool {
        self.arena.contains(id) && self.arena.get(id).is_leaf()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::seq::SliceRandom;
    use rand::{thread_rng, Rng};

    use crate::keys::array_key::ArrayKey;
    use crate::keys::vector_key::VectorKey;
    use crate::tree::AdaptiveRadixTree;

    #[test]
    fn insert_and_get_strings() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, i32>::new();
        assert!(tree.is_empty());
        assert_eq!(tree.insert("hello", 1), None);
        assert_eq!(tree.insert("world", 2), None);
        assert_eq!(tree.insert("help", 3), None);
        assert_eq!(tree.len(), 3);

        assert_eq!(tree.get("hello"), Some(&1));
        assert_eq!(tree.get("world"), Some(&2));
        assert_eq!(tree.get("help"), Some(&3));
        assert_eq!(tree.get("hel"), None);
        assert_eq!(tree.get("helios"), None);
    }

    #[test]
    fn null_termination_keeps_prefixes_distinct() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u32>::new();
        tree.insert("a", 1);
        tree.insert("ab", 2);
        tree.insert("abc", 3);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get("a"), Some(&1));
        assert_eq!(tree.get("ab"), Some(&2));
        assert_eq!(tree.get("abc"), Some(&3));

        assert_eq!(tree.remove("ab"), Some(2));
        assert_eq!(tree.get("a"), Some(&1));
        assert_eq!(tree.get("ab"), None);
        assert_eq!(tree.get("abc"), Some(&3));
    }

    #[test]
    fn replace_returns_old_value_without_version_bump() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u64>::new();
        tree.insert(42u64, 1);
        let v = tree.version();
        assert_eq!(tree.insert(42u64, 2), Some(1));
        assert_eq!(tree.version(), v);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(42u64), Some(&2));
    }

    #[test]
    fn structural_changes_bump_version() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u64>::new();
        let v0 = tree.version();
        tree.insert(1u64, 1);
        let v1 = tree.version();
        assert_ne!(v0, v1);
        tree.remove(1u64);
        assert_ne!(tree.version(), v1);
        let v2 = tree.version();
        tree.clear();
        assert_ne!(tree.version(), v2);
    }

    #[test]
    fn get_mut_changes_value_in_place() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, Vec<u32>>::new();
        tree.insert("xs", vec![1]);
        tree.get_mut("xs").unwrap().push(2);
        assert_eq!(tree.get("xs"), Some(&vec![1, 2]));
    }

    #[test]
    fn dense_u64_bulk_matches_btreemap() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u64>::new();
        let mut model = BTreeMap::new();

        let mut keys: Vec<u64> = (0..10_000).collect();
        keys.shuffle(&mut thread_rng());
        for k in &keys {
            tree.insert(*k, *k * 2);
            model.insert(*k, *k * 2);
        }
        assert_eq!(tree.len(), model.len());

        for k in &keys {
            assert_eq!(tree.get(*k), model.get(k));
        }
        let got: Vec<(u64, u64)> = tree.iter().map(|(k, v)| (k.to_be_u64(), *v)).collect();
        let want: Vec<(u64, u64)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn random_inserts_and_removes_match_btreemap() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u32>::new();
        let mut model = BTreeMap::new();
        let mut rng = thread_rng();

        for _ in 0..50_000 {
            let k: u16 = rng.gen();
            if rng.gen_bool(0.6) {
                let v: u32 = rng.gen();
                assert_eq!(tree.insert(k as u64, v), model.insert(k as u64, v));
            } else {
                assert_eq!(tree.remove(k as u64), model.remove(&(k as u64)));
            }
        }
        assert_eq!(tree.len(), model.len());
        let got: Vec<u64> = tree.iter().map(|(k, _)| k.to_be_u64()).collect();
        let want: Vec<u64> = model.keys().copied().collect();
        assert_eq!(got, want);
    }

    #[test]
    fn removal_collapses_back_to_single_leaf() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u32>::new();
        tree.insert("flask", 1);
        tree.insert("flower", 2);
        tree.insert("flame", 3);

        assert_eq!(tree.remove("flower"), Some(2));
        assert_eq!(tree.remove("flame"), Some(3));
        // Only one entry left; the root should be a lone leaf again and the
        // remaining key fully reachable through its re-merged prefix.
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("flask"), Some(&1));
        assert_eq!(tree.remove("flask"), Some(1));
        assert!(tree.is_empty());
        assert_eq!(tree.get("flask"), None);
    }

    #[test]
    fn remove_returns_none_for_absent_keys() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u32>::new();
        tree.insert("present", 1);
        assert_eq!(tree.remove("absent"), None);
        assert_eq!(tree.remove("presen"), None);
        assert_eq!(tree.remove("presents"), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn wide_fanout_grows_and_shrinks() {
        // All 256 second-byte values under one shared first byte force the
        // parent node through every width on the way up, then back down.
        let mut tree = AdaptiveRadixTree::<VectorKey, u32>::new();
        for i in 0..=255u8 {
            tree.insert_k(VectorKey::new_from_vec(vec![7, i, 0]), i as u32);
        }
        assert_eq!(tree.len(), 256);
        for i in 0..=255u8 {
            assert_eq!(tree.get_k(&VectorKey::new_from_vec(vec![7, i, 0])), Some(&(i as u32)));
        }

        for i in 0..250u8 {
            assert_eq!(tree.remove_k(&VectorKey::new_from_vec(vec![7, i, 0])), Some(i as u32));
        }
        assert_eq!(tree.len(), 6);
        for i in 250..=255u8 {
            assert_eq!(tree.get_k(&VectorKey::new_from_vec(vec![7, i, 0])), Some(&(i as u32)));
        }
    }

    #[test]
    fn first_and_last_entries_follow_byte_order() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, i64>::new();
        assert!(tree.first_entry().is_none());
        assert!(tree.last_entry().is_none());

        for v in [-5i64, 3, -77, 12, 0] {
            tree.insert(v, v);
        }
        let first = tree.first_entry().unwrap();
        let last = tree.last_entry().unwrap();
        assert_eq!(tree.entry(first).unwrap().1, &-77);
        assert_eq!(tree.entry(last).unwrap().1, &12);
    }

    #[test]
    fn successor_walk_visits_sorted_order() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u64>::new();
        let mut keys: Vec<u64> = (0..1000).map(|i| i * 37).collect();
        keys.shuffle(&mut thread_rng());
        for k in &keys {
            tree.insert(*k, *k);
        }

        let mut walked = Vec::new();
        let mut cur = tree.first_entry();
        while let Some(e) = cur {
            walked.push(tree.entry(e).unwrap().0.to_be_u64());
            cur = tree.successor(e);
        }
        keys.sort_unstable();
        assert_eq!(walked, keys);

        let mut reversed = Vec::new();
        let mut cur = tree.last_entry();
        while let Some(e) = cur {
            reversed.push(tree.entry(e).unwrap().0.to_be_u64());
            cur = tree.predecessor(e);
        }
        reversed.reverse();
        assert_eq!(reversed, keys);
    }

    #[test]
    fn delete_entry_skips_the_root_descent() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, u32>::new();
        for i in 0..100u64 {
            tree.insert(i, i as u32);
        }
        let entry = tree.get_entry(40u64).unwrap();
        assert_eq!(tree.delete_entry(entry), Some(40));
        assert_eq!(tree.get(40u64), None);
        assert_eq!(tree.len(), 99);
        // Stale handle: best-effort None.
        assert_eq!(tree.delete_entry(entry), None);
        assert!(tree.entry(entry).is_none());
    }

    #[test]
    fn contains_value_scans_entries() {
        let mut tree = AdaptiveRadixTree::<ArrayKey<16>, String>::new();
        tree.insert("k1", "red".to_string());
        tree.insert("k2", "blue".to_string());
        assert!(tree.contains_value(&"red".to_string()));
        assert!(!tree.contains_value(&"green".to_string()));
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn raw_prefix_key_insert_panics() {
        // Raw byte keys with no terminator: "ab" extends "a", which the
        // prefix-freedom contract forbids.
        let mut tree = AdaptiveRadixTree::<VectorKey, u32>::new();
        tree.insert_k(VectorKey::new_from_vec(b"a".to_vec()), 1);
        tree.insert_k(VectorKey::new_from_vec(b"ab".to_vec()), 2);
    }
}
