use crate::arena::NodeId;

pub mod direct_mapping;
pub mod indexed_mapping;
pub mod sorted_keyed_mapping;

/// The uniform contract of the inner-node child tables: a mapping from one
/// partial-key byte to exactly one child handle.
///
/// Misuse is a bug in the tree engine, not a runtime condition: `add_child`
/// panics on a full table or a duplicate byte (the engine grows first and
/// never re-adds an existing byte), and `update_child`/`delete_child` panic
/// when the byte is absent. The mappings store routing only; the child's
/// parent back-reference and uplink byte are maintained by the engine
/// helpers wrapping these calls.
pub(crate) trait NodeMapping<const WIDTH: usize> {
    fn add_child(&mut self, key: u8, child: NodeId);
    /// Substitutes the child at an existing slot, returning the old child.
    fn update_child(&mut self, key: u8, child: NodeId) -> NodeId;
    fn seek_child(&self, key: u8) -> Option<NodeId>;
    fn delete_child(&mut self, key: u8) -> NodeId;
    fn num_children(&self) -> usize;

    /// Child with the smallest partial-key byte.
    fn first_child(&self) -> Option<(u8, NodeId)>;
    /// Child with the largest partial-key byte.
    fn last_child(&self) -> Option<(u8, NodeId)>;
    /// Child with the smallest partial-key byte strictly greater than `key`.
    fn seek_next_child(&self, key: u8) -> Option<(u8, NodeId)>;
    /// Child with the largest partial-key byte strictly less than `key`.
    fn seek_prev_child(&self, key: u8) -> Option<(u8, NodeId)>;
}
