use crate::keys::KeyTrait;

pub mod array_partial;
pub mod vector_partial;

/// A compressed path fragment: the span of key bytes a node consumes in one
/// step because no branching occurred there. By convention the first byte of
/// a node's partial is also the byte that routes to it from its parent, so
/// collapsing a single-child node is plain concatenation.
pub trait Partial: Clone {
    /// Returns a partial of the first `length` bytes.
    fn partial_before(&self, length: usize) -> Self;
    /// Returns a partial from `start` onwards.
    fn partial_after(&self, start: usize) -> Self;
    /// Extends the partial with another partial.
    fn partial_extended_with(&self, other: &Self) -> Self;
    /// Returns the byte at `pos`.
    fn at(&self, pos: usize) -> u8;
    /// Returns the length of the partial.
    fn len(&self) -> usize;
    /// Returns true if the partial is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Length of the common prefix between this partial and `key` read from
    /// `at_depth` onwards.
    fn prefix_length_key<K>(&self, key: &K, at_depth: usize) -> usize
    where
        K: KeyTrait<PartialType = Self>;
    /// Length of the common prefix between this partial and `slice`.
    fn prefix_length_slice(&self, slice: &[u8]) -> usize;
    /// Slice view of the partial's bytes.
    fn to_slice(&self) -> &[u8];
}
