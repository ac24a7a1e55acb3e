use crate::arena::NodeId;
use crate::mapping::indexed_mapping::IndexedMapping;
use crate::mapping::NodeMapping;
use crate::utils::u8_keys::{
    u8_keys_find_insert_position_sorted, u8_keys_find_key_position_sorted,
};

/// Child table for the 4- and 16-wide tiers: parallel arrays of partial-key
/// bytes and child handles, kept in ascending unsigned key order at all
/// times. Inserts shift the tail right to make room; deletes shift it left
/// to close the gap. Lookup is a linear scan at width 4 and a SIMD/binary
/// search at width 16. Unused key slots hold 255 as a sentinel so the SIMD
/// equality scan never has to special-case them (a real 255 key still works,
/// since only the first `num_children` lanes are considered).
pub(crate) struct SortedKeyedMapping<const WIDTH: usize> {
    pub(crate) keys: [u8; WIDTH],
    pub(crate) children: [Option<NodeId>; WIDTH],
    pub(crate) num_children: u8,
}

impl<const WIDTH: usize> Default for SortedKeyedMapping<WIDTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WIDTH: usize> SortedKeyedMapping<WIDTH> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            keys: [255; WIDTH],
            children: [None; WIDTH],
            num_children: 0,
        }
    }

    /// Grow transition (4 -> 16): same layout, wider arrays, order kept.
    pub(crate) fn from_resized_grow<const OLD_WIDTH: usize>(
        km: &mut SortedKeyedMapping<OLD_WIDTH>,
    ) -> Self {
        debug_assert!(WIDTH > OLD_WIDTH);
        let mut new = Self::new();
        for i in 0..km.num_children as usize {
            new.keys[i] = km.keys[i];
            new.children[i] = km.children[i].take();
        }
        new.num_children = km.num_children;
        km.num_children = 0;
        new
    }

    /// Shrink transition (16 -> 4): surviving children fit the smaller width.
    pub(crate) fn from_resized_shrink<const OLD_WIDTH: usize>(
        km: &mut SortedKeyedMapping<OLD_WIDTH>,
    ) -> Self {
        debug_assert!(WIDTH < OLD_WIDTH);
        debug_assert!(km.num_children as usize <= WIDTH);
        let mut new = Self::new();
        for i in 0..km.num_children as usize {
            new.keys[i] = km.keys[i];
            new.children[i] = km.children[i].take();
        }
        new.num_children = km.num_children;
        km.num_children = 0;
        new
    }

    /// Shrink transition (48 -> 16): drains the indexed mapping in ascending
    /// key order, so the result is sorted by construction.
    pub(crate) fn from_indexed<const IDX_WIDTH: usize>(
        im: &mut IndexedMapping<IDX_WIDTH>,
    ) -> Self {
        debug_assert!(im.num_children() <= WIDTH);
        let mut new = Self::new();
        let mut cnt = 0;
        for (key, child) in im.drain_in_order() {
            new.keys[cnt] = key;
            new.children[cnt] = Some(child);
            cnt += 1;
        }
        new.num_children = cnt as u8;
        new
    }

    /// The sole remaining (key, child) pair, removed from the table. Used by
    /// the engine when a one-child node is collapsed into its child.
    pub(crate) fn take_only_child(&mut self) -> (u8, NodeId) {
        assert_eq!(
            self.num_children, 1,
            "invariant violation: collapse of a node with {} children",
            self.num_children
        );
        self.num_children = 0;
        let child = self.children[0].take();
        (
            self.keys[0],
            child.expect("invariant violation: empty child slot"),
        )
    }

    /// Children in ascending partial-key order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        (0..self.num_children as usize).map(|i| {
            (
                self.keys[i],
                self.children[i].expect("invariant violation: empty child slot"),
            )
        })
    }
}

impl<const WIDTH: usize> NodeMapping<WIDTH> for SortedKeyedMapping<WIDTH> {
    fn add_child(&mut self, key: u8, child: NodeId) {
        let n = self.num_children as usize;
        assert!(n < WIDTH, "invariant violation: add_child on a full node");
        debug_assert!(
            u8_keys_find_key_position_sorted::<WIDTH>(key, &self.keys, n).is_none(),
            "invariant violation: add_child on a present partial key"
        );

        let idx = u8_keys_find_insert_position_sorted::<WIDTH>(key, &self.keys, n);
        for i in (idx..n).rev() {
            self.keys[i + 1] = self.keys[i];
            self.children[i + 1] = self.children[i].take();
        }
        self.keys[idx] = key;
        self.children[idx] = Some(child);
        self.num_children += 1;
    }

    fn update_child(&mut self, key: u8, child: NodeId) -> NodeId {
        let idx =
            u8_keys_find_key_position_sorted::<WIDTH>(key, &self.keys, self.num_children as usize)
                .expect("invariant violation: update_child on an absent partial key");
        self.children[idx]
            .replace(child)
            .expect("invariant violation: empty child slot")
    }

    fn seek_child(&self, key: u8) -> Option<NodeId> {
        let idx =
            u8_keys_find_key_position_sorted::<WIDTH>(key, &self.keys, self.num_children as usize)?;
        self.children[idx]
    }

    fn delete_child(&mut self, key: u8) -> NodeId {
        let n = self.num_children as usize;
        let idx = u8_keys_find_key_position_sorted::<WIDTH>(key, &self.keys, n)
            .expect("invariant violation: delete_child on an absent partial key");
        let child = self.children[idx]
            .take()
            .expect("invariant violation: empty child slot");

        // Shift the tail left to close the gap.
        for i in idx..n - 1 {
            self.keys[i] = self.keys[i + 1];
            self.children[i] = self.children[i + 1].take();
        }
        self.keys[n - 1] = 255;
        self.num_children -= 1;
        child
    }

    #[inline(always)]
    fn num_children(&self) -> usize {
        self.num_children as usize
    }

    fn first_child(&self) -> Option<(u8, NodeId)> {
        if self.num_children == 0 {
            return None;
        }
        Some((self.keys[0], self.children[0]?))
    }

    fn last_child(&self) -> Option<(u8, NodeId)> {
        if self.num_children == 0 {
            return None;
        }
        let i = self.num_children as usize - 1;
        Some((self.keys[i], self.children[i]?))
    }

    fn seek_next_child(&self, key: u8) -> Option<(u8, NodeId)> {
        (0..self.num_children as usize)
            .find(|&i| self.keys[i] > key)
            .map(|i| (self.keys[i], self.children[i]))
            .and_then(|(k, c)| Some((k, c?)))
    }

    fn seek_prev_child(&self, key: u8) -> Option<(u8, NodeId)> {
        (0..self.num_children as usize)
            .rev()
            .find(|&i| self.keys[i] < key)
            .map(|i| (self.keys[i], self.children[i]))
            .and_then(|(k, c)| Some((k, c?)))
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::Arena;
    use crate::mapping::sorted_keyed_mapping::SortedKeyedMapping;
    use crate::mapping::NodeMapping;

    fn ids(n: usize) -> (Arena<u32>, Vec<crate::arena::NodeId>) {
        let mut arena = Arena::new();
        let ids = (0..n).map(|i| arena.insert(i as u32)).collect();
        (arena, ids)
    }

    #[test]
    fn add_keeps_sorted_order() {
        let (_arena, ids) = ids(4);
        let mut node = SortedKeyedMapping::<4>::new();
        node.add_child(5, ids[0]);
        node.add_child(2, ids[1]);
        node.add_child(200, ids[2]);
        node.add_child(3, ids[3]);

        let keys: Vec<u8> = node.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![2, 3, 5, 200]);
        assert_eq!(node.seek_child(5), Some(ids[0]));
        assert_eq!(node.seek_child(200), Some(ids[2]));
        assert_eq!(node.seek_child(4), None);
    }

    #[test]
    fn delete_closes_the_gap() {
        let (_arena, ids) = ids(4);
        let mut node = SortedKeyedMapping::<4>::new();
        for (i, k) in [10u8, 20, 30, 40].iter().enumerate() {
            node.add_child(*k, ids[i]);
        }
        assert_eq!(node.delete_child(20), ids[1]);
        let keys: Vec<u8> = node.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![10, 30, 40]);
        assert_eq!(node.num_children(), 3);
        assert_eq!(node.seek_child(20), None);
        assert_eq!(node.seek_child(30), Some(ids[2]));
    }

    #[test]
    fn sibling_navigation() {
        let (_arena, ids) = ids(3);
        let mut node = SortedKeyedMapping::<16>::new();
        node.add_child(10, ids[0]);
        node.add_child(130, ids[1]);
        node.add_child(255, ids[2]);

        assert_eq!(node.first_child(), Some((10, ids[0])));
        assert_eq!(node.last_child(), Some((255, ids[2])));
        assert_eq!(node.seek_next_child(10), Some((130, ids[1])));
        assert_eq!(node.seek_next_child(130), Some((255, ids[2])));
        assert_eq!(node.seek_next_child(255), None);
        assert_eq!(node.seek_prev_child(255), Some((130, ids[1])));
        assert_eq!(node.seek_prev_child(10), None);
    }

    #[test]
    fn grow_preserves_pairs() {
        let (_arena, ids) = ids(4);
        let mut n4 = SortedKeyedMapping::<4>::new();
        for (i, k) in [9u8, 1, 200, 100].iter().enumerate() {
            n4.add_child(*k, ids[i]);
        }
        let n16 = SortedKeyedMapping::<16>::from_resized_grow(&mut n4);
        assert_eq!(n4.num_children(), 0);
        assert_eq!(n16.num_children(), 4);
        let pairs: Vec<_> = n16.iter().collect();
        assert_eq!(
            pairs,
            vec![(1, ids[1]), (9, ids[0]), (100, ids[3]), (200, ids[2])]
        );
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn delete_absent_key_panics() {
        let (_arena, ids) = ids(1);
        let mut node = SortedKeyedMapping::<4>::new();
        node.add_child(1, ids[0]);
        node.delete_child(2);
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn add_to_full_node_panics() {
        let (_arena, ids) = ids(5);
        let mut node = SortedKeyedMapping::<4>::new();
        for (i, id) in ids.iter().enumerate().take(4) {
            node.add_child(i as u8, *id);
        }
        node.add_child(4, ids[4]);
    }
}
