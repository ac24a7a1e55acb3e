use crate::partials::Partial;

pub mod array_key;
pub mod vector_key;

/// The key transform: a binary-comparable encoding of an application key.
///
/// Implementations must be deterministic and order-preserving: comparing two
/// encodings byte-by-byte as *unsigned* values must agree with the key type's
/// natural order. They must also be prefix-free, meaning no valid key's
/// encoding may be a strict prefix of another's. The provided key types get
/// prefix freedom by null-terminating strings and using fixed-width
/// big-endian integers (signed
/// integers additionally flip their sign bit so two's-complement order
/// becomes unsigned order).
pub trait KeyTrait: Clone + PartialEq + Eq + PartialOrd + Ord + AsRef<[u8]> {
    type PartialType: Partial;

    /// Upper bound on encoded length, if the key type has one.
    const MAXIMUM_SIZE: Option<usize>;

    /// Rebuild a key from its encoded byte sequence.
    fn new_from_slice(data: &[u8]) -> Self;
    /// The encoded byte at `pos`.
    fn at(&self, pos: usize) -> u8;
    /// Number of encoded bytes remaining from `at_depth` onwards.
    fn length_at(&self, at_depth: usize) -> usize;
    /// The encoded bytes from `at_depth` onwards, as a partial.
    fn to_partial(&self, at_depth: usize) -> Self::PartialType;
    /// True if the full encoded byte sequence equals `slice`.
    fn matches_slice(&self, slice: &[u8]) -> bool;
}
