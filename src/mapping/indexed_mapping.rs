use crate::arena::NodeId;
use crate::mapping::direct_mapping::DirectMapping;
use crate::mapping::sorted_keyed_mapping::SortedKeyedMapping;
use crate::mapping::NodeMapping;
use crate::utils::bitset::Bitset64;

/// Sentinel in the byte -> slot table marking an unmapped partial key. Slot
/// indices never exceed `WIDTH - 1`, so 255 is always free to mean "absent".
const SLOT_EMPTY: u8 = 255;

/// Child table for the 48-wide tier: a 256-entry byte -> slot index table
/// over a compact array of child slots. Lookup is O(1) through the table;
/// ordered navigation scans the table, which stays in byte order by
/// construction. Freed slots are tracked in a bitset and reused.
pub(crate) struct IndexedMapping<const WIDTH: usize> {
    child_index: [u8; 256],
    children: [Option<NodeId>; WIDTH],
    occupied: Bitset64<1>,
    num_children: u8,
}

impl<const WIDTH: usize> Default for IndexedMapping<WIDTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WIDTH: usize> IndexedMapping<WIDTH> {
    pub(crate) fn new() -> Self {
        Self {
            child_index: [SLOT_EMPTY; 256],
            children: [None; WIDTH],
            occupied: Bitset64::new(),
            num_children: 0,
        }
    }

    /// Grow transition (16 -> 48).
    pub(crate) fn from_sorted<const KM_WIDTH: usize>(
        km: &mut SortedKeyedMapping<KM_WIDTH>,
    ) -> Self {
        let mut im = Self::new();
        for i in 0..km.num_children as usize {
            let child = km.children[i]
                .take()
                .expect("invariant violation: empty child slot");
            im.add_child(km.keys[i], child);
        }
        km.num_children = 0;
        im
    }

    /// Shrink transition (256 -> 48).
    pub(crate) fn from_direct(dm: &mut DirectMapping) -> Self {
        let mut im = Self::new();
        for (key, child) in dm.drain_in_order() {
            im.add_child(key, child);
        }
        im
    }

    /// Removes and yields all children in ascending partial-key order.
    pub(crate) fn drain_in_order(&mut self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        self.num_children = 0;
        let children = &mut self.children;
        let occupied = &mut self.occupied;
        self.child_index.iter_mut().enumerate().filter_map(
            move |(key, slot)| {
                if *slot == SLOT_EMPTY {
                    return None;
                }
                let pos = std::mem::replace(slot, SLOT_EMPTY) as usize;
                occupied.unset(pos);
                let child = children[pos]
                    .take()
                    .expect("invariant violation: empty child slot");
                Some((key as u8, child))
            },
        )
    }

    /// Children in ascending partial-key order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u8, NodeId)> + '_ {
        self.child_index
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot != SLOT_EMPTY)
            .map(|(key, slot)| {
                (
                    key as u8,
                    self.children[*slot as usize]
                        .expect("invariant violation: empty child slot"),
                )
            })
    }

    #[inline]
    fn slot_of(&self, key: u8) -> Option<usize> {
        let slot = self.child_index[key as usize];
        if slot == SLOT_EMPTY {
            None
        } else {
            Some(slot as usize)
        }
    }

    fn entry_at(&self, key: usize) -> Option<(u8, NodeId)> {
        let slot = self.child_index[key];
        if slot == SLOT_EMPTY {
            return None;
        }
        Some((
            key as u8,
            self.children[slot as usize].expect("invariant violation: empty child slot"),
        ))
    }
}

impl<const WIDTH: usize> NodeMapping<WIDTH> for IndexedMapping<WIDTH> {
    fn add_child(&mut self, key: u8, child: NodeId) {
        assert!(
            self.child_index[key as usize] == SLOT_EMPTY,
            "invariant violation: add_child on a present partial key"
        );
        let pos = self
            .occupied
            .first_empty()
            .filter(|p| *p < WIDTH)
            .expect("invariant violation: add_child on a full node");
        self.child_index[key as usize] = pos as u8;
        self.children[pos] = Some(child);
        self.occupied.set(pos);
        self.num_children += 1;
    }

    fn update_child(&mut self, key: u8, child: NodeId) -> NodeId {
        let pos = self
            .slot_of(key)
            .expect("invariant violation: update_child on an absent partial key");
        self.children[pos]
            .replace(child)
            .expect("invariant violation: empty child slot")
    }

    fn seek_child(&self, key: u8) -> Option<NodeId> {
        self.children[self.slot_of(key)?]
    }

    fn delete_child(&mut self, key: u8) -> NodeId {
        let pos = self
            .slot_of(key)
            .expect("invariant violation: delete_child on an absent partial key");
        self.child_index[key as usize] = SLOT_EMPTY;
        self.occupied.unset(pos);
        self.num_children -= 1;
        self.children[pos]
            .take()
            .expect("invariant violation: empty child slot")
    }

    #[inline(always)]
    fn num_children(&self) -> usize {
        self.num_children as usize
    }

    fn first_child(&self) -> Option<(u8, NodeId)> {
        (0..256).find_map(|key| self.entry_at(key))
    }

    fn last_child(&self) -> Option<(u8, NodeId)> {
        (0..256).rev().find_map(|key| self.entry_at(key))
    }

    fn seek_next_child(&self, key: u8) -> Option<(u8, NodeId)> {
        (key as usize + 1..256).find_map(|k| self.entry_at(k))
    }

    fn seek_prev_child(&self, key: u8) -> Option<(u8, NodeId)> {
        (0..key as usize).rev().find_map(|k| self.entry_at(k))
    }
}
