use std::num::NonZeroU32;

/// Stable handle to a node slot in an [`Arena`].
///
/// Parent back-references and the child slots of the inner-node mappings are
/// all `NodeId`s, so the parent/child cycle is plain copyable data with
/// ownership flowing strictly arena -> slot. A node keeps its id across
/// grow/shrink transitions and reparenting, which is what keeps outstanding
/// entry handles and an iterator's precomputed "next" reference valid while
/// other parts of the tree change shape.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(NonZeroU32);

impl NodeId {
    #[inline]
    fn from_index(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize);
        NodeId(NonZeroU32::new(index as u32 + 1).expect("index overflow"))
    }

    #[inline]
    fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.index())
    }
}

/// Slab allocator for tree nodes. Freed slots are recycled in LIFO order.
///
/// `get`/`get_mut`/`remove` on a vacant slot panic: the engine only ever
/// holds ids of live nodes, so a vacant access means the tree is corrupt.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let index = index as usize;
                debug_assert!(self.slots[index].is_none());
                self.slots[index] = Some(value);
                NodeId::from_index(index)
            }
            None => {
                self.slots.push(Some(value));
                NodeId::from_index(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> T {
        let value = self.slots[id.index()]
            .take()
            .expect("invariant violation: removing vacant arena slot");
        self.free.push(id.index() as u32);
        value
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &T {
        self.slots[id.index()]
            .as_ref()
            .expect("invariant violation: reading vacant arena slot")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        self.slots[id.index()]
            .as_mut()
            .expect("invariant violation: reading vacant arena slot")
    }

    /// Whether `id` currently refers to a live node. Used to validate entry
    /// handles handed out to callers, best-effort.
    #[inline]
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index())
            .map(|s| s.is_some())
            .unwrap_or(false)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn insert_get_remove() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(*arena.get(a), "a");
        assert_eq!(*arena.get(b), "b");
        assert_eq!(arena.len(), 2);

        assert_eq!(arena.remove(a), "a");
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 1);

        // Freed slot is recycled, old handle now points at the new value.
        let c = arena.insert("c");
        assert_eq!(c, a);
        assert_eq!(*arena.get(c), "c");
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn vacant_access_panics() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        arena.get(a);
    }
}
