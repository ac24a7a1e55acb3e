use thiserror::Error;

use crate::arena::NodeId;
use crate::keys::KeyTrait;
use crate::tree::{AdaptiveRadixTree, EntryRef};

/// Why a [`Cursor`] operation could not proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The tree was structurally modified (insert of a new key, removal, or
    /// clear) since the cursor last observed it. Detection is best-effort,
    /// via the tree's modification counter.
    #[error("tree was structurally modified while the cursor was active")]
    ConcurrentModification,
    /// The cursor has no current entry to operate on.
    #[error("cursor has no current entry")]
    Exhausted,
}

/// Ascending iterator over `(&K, &V)` pairs.
///
/// Each step resumes from the previous leaf's parent back-reference, so a
/// full scan costs O(n · depth) with no heap allocation per step. The borrow
/// on the tree makes modification during iteration impossible; for
/// interleaved iteration and removal, use a [`Cursor`].
pub struct Iter<'a, K: KeyTrait, V> {
    tree: &'a AdaptiveRadixTree<K, V>,
    next: Option<NodeId>,
}

impl<'a, K: KeyTrait, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.successor_id(id);
        Some(self.tree.leaf_parts(id))
    }
}

/// Descending iterator over `(&K, &V)` pairs.
pub struct IterRev<'a, K: KeyTrait, V> {
    tree: &'a AdaptiveRadixTree<K, V>,
    next: Option<NodeId>,
}

impl<'a, K: KeyTrait, V> Iterator for IterRev<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.predecessor_id(id);
        Some(self.tree.leaf_parts(id))
    }
}

/// Ascending iterator over keys.
pub struct Keys<'a, K: KeyTrait, V>(Iter<'a, K, V>);

impl<'a, K: KeyTrait, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }
}

/// Descending iterator over keys.
pub struct KeysRev<'a, K: KeyTrait, V>(IterRev<'a, K, V>);

impl<'a, K: KeyTrait, V> Iterator for KeysRev<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }
}

/// Ascending iterator over values.
pub struct Values<'a, K: KeyTrait, V>(Iter<'a, K, V>);

impl<'a, K: KeyTrait, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }
}

impl<K: KeyTrait, V> AdaptiveRadixTree<K, V> {
    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            next: self.first_entry().map(|e| e.0),
        }
    }

    /// Entries in descending key order.
    pub fn iter_rev(&self) -> IterRev<'_, K, V> {
        IterRev {
            tree: self,
            next: self.last_entry().map(|e| e.0),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    pub fn keys_rev(&self) -> KeysRev<'_, K, V> {
        KeysRev(self.iter_rev())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }
}

/// A detached traversal position that does not borrow the tree.
///
/// Unlike [`Iter`], a cursor takes the tree as an argument on every call, so
/// the tree can be mutated between steps. The price is that the cursor can
/// be invalidated: it snapshots the tree's modification counter when
/// created, and every operation first checks that the counter is unchanged,
/// failing with [`CursorError::ConcurrentModification`] otherwise. Removing
/// the current entry through [`remove_current`](Cursor::remove_current) is
/// the sanctioned mutation: it re-synchronizes the cursor with the tree.
///
/// The same cursor serves both directions, like holding a position in the
/// ordered sequence: `next` yields the current entry and moves right, `prev`
/// yields it and moves left.
pub struct Cursor {
    next: Option<NodeId>,
    last: Option<NodeId>,
    expected_version: u64,
}

impl Cursor {
    /// A cursor positioned at the smallest entry.
    pub fn first<K: KeyTrait, V>(tree: &AdaptiveRadixTree<K, V>) -> Self {
        Self {
            next: tree.first_entry().map(|e| e.0),
            last: None,
            expected_version: tree.version(),
        }
    }

    /// A cursor positioned at the largest entry.
    pub fn last<K: KeyTrait, V>(tree: &AdaptiveRadixTree<K, V>) -> Self {
        Self {
            next: tree.last_entry().map(|e| e.0),
            last: None,
            expected_version: tree.version(),
        }
    }

    /// A cursor positioned at an existing entry.
    pub fn at<K: KeyTrait, V>(tree: &AdaptiveRadixTree<K, V>, entry: EntryRef) -> Self {
        Self {
            next: Some(entry.0),
            last: None,
            expected_version: tree.version(),
        }
    }

    fn check<K: KeyTrait, V>(&self, tree: &AdaptiveRadixTree<K, V>) -> Result<(), CursorError> {
        if self.expected_version != tree.version() {
            return Err(CursorError::ConcurrentModification);
        }
        Ok(())
    }

    /// Yields the current entry and advances towards larger keys.
    pub fn next<'t, K: KeyTrait, V>(
        &mut self,
        tree: &'t AdaptiveRadixTree<K, V>,
    ) -> Result<Option<(&'t K, &'t V)>, CursorError> {
        self.check(tree)?;
        let Some(id) = self.next else {
            return Ok(None);
        };
        self.next = tree.successor_id(id);
        self.last = Some(id);
        Ok(Some(tree.leaf_parts(id)))
    }

    /// Yields the current entry and advances towards smaller keys.
    pub fn prev<'t, K: KeyTrait, V>(
        &mut self,
        tree: &'t AdaptiveRadixTree<K, V>,
    ) -> Result<Option<(&'t K, &'t V)>, CursorError> {
        self.check(tree)?;
        let Some(id) = self.next else {
            return Ok(None);
        };
        self.next = tree.predecessor_id(id);
        self.last = Some(id);
        Ok(Some(tree.leaf_parts(id)))
    }

    /// Removes the entry last yielded by `next`/`prev` and re-synchronizes
    /// with the tree, so iteration can continue. The already-computed resume
    /// position is a node handle, which removal of a *different* entry never
    /// moves.
    pub fn remove_current<K: KeyTrait, V>(
        &mut self,
        tree: &mut AdaptiveRadixTree<K, V>,
    ) -> Result<V, CursorError> {
        self.check(tree)?;
        let Some(id) = self.last.take() else {
            return Err(CursorError::Exhausted);
        };
        let value = tree
            .delete_entry(EntryRef(id))
            .ok_or(CursorError::ConcurrentModification)?;
        self.expected_version = tree.version();
        Ok(value)
    }
}
