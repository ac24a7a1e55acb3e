use crate::arena::NodeId;
use crate::mapping::indexed_mapping::IndexedMapping;
use crate::mapping::NodeMapping;

/// Child table for the widest tier: one slot per possible partial-key byte.
/// Every operation is O(1) except ordered navigation, which scans.
pub(crate) struct DirectMapping {
    children: [Option<NodeId>; 256],
    num_children: u16,
}

impl Default for DirectMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectMapping {
    pub(crate) fn new() -> Self {
        Self {
            children: [None; 256],
            num_children: 0,
        }
    }

    /// Grow transition (48 -> 256).
    pub(crate) fn from_indexed<const WIDTH: usize>(im: &mut IndexedMapping<WIDTH>) -> Self {
        let mut dm = Self::new();
        for (key, child) in im.drain_in_order() {
            dm.children[key as usize] = Some(child);
            dm.num_children += 1;
        }
        dm
    }

    /// Removes and yields all children in ascending partial-key order.
    pub(crate) fn drain_in_order(&mut self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        self.num_children = 0;
        self.children
            .iter_mut()
            .enumerate()
            .filter_map(|(key, slot)| slot.take().map(|child| (key as u8, child)))
    }

    /// Children in ascending partial-key order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(key, slot)| slot.map(|child| (key as u8, child)))
    }
}

impl NodeMapping<256> for DirectMapping {
    #[inline]
    fn add_child(&mut self, key: u8, child: NodeId) {
        assert!(
            self.children[key as usize].is_none(),
            "invariant violation: add_child on a present partial key"
        );
        self.children[key as usize] = Some(child);
        self.num_children += 1;
    }

    #[inline]
    fn update_child(&mut self, key: u8, child: NodeId) -> NodeId {
        self.children[key as usize]
            .replace(child)
            .expect("invariant violation: update_child on an absent partial key")
    }

    #[inline]
    fn seek_child(&self, key: u8) -> Option<NodeId> {
        self.children[key as usize]
    }

    #[inline]
    fn delete_child(&mut self, key: u8) -> NodeId {
        let child = self.children[key as usize]
            .take()
            .expect("invariant violation: delete_child on an absent partial key");
        self.num_children -= 1;
        child
    }

    #[inline(always)]
    fn num_children(&self) -> usize {
        self.num_children as usize
    }

    fn first_child(&self) -> Option<(u8, NodeId)> {
        self.iter().next()
    }

    fn last_child(&self) -> Option<(u8, NodeId)> {
        (0..256)
            .rev()
            .find_map(|k| self.children[k].map(|c| (k as u8, c)))
    }

    fn seek_next_child(&self, key: u8) -> Option<(u8, NodeId)> {
        (key as usize + 1..256).find_map(|k| self.children[k].map(|c| (k as u8, c)))
    }

    fn seek_prev_child(&self, key: u8) -> Option<(u8, NodeId)> {
        (0..key as usize)
            .rev()
            .find_map(|k| self.children[k].map(|c| (k as u8, c)))
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::Arena;
    use crate::mapping::direct_mapping::DirectMapping;
    use crate::mapping::NodeMapping;

    #[test]
    fn full_range_add_seek_delete() {
        let mut arena = Arena::new();
        let mut dm = DirectMapping::new();
        let ids: Vec<_> = (0..=255u32).map(|i| arena.insert(i)).collect();
        for (i, id) in ids.iter().enumerate() {
            dm.add_child(i as u8, *id);
        }
        assert_eq!(dm.num_children(), 256);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(dm.seek_child(i as u8), Some(*id));
        }
        assert_eq!(dm.delete_child(47), ids[47]);
        assert_eq!(dm.seek_child(47), None);
        assert_eq!(dm.num_children(), 255);
        assert_eq!(dm.seek_next_child(46), Some((48, ids[48])));
        assert_eq!(dm.seek_prev_child(48), Some((46, ids[46])));
    }
}
