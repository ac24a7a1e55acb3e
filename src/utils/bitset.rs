use num_traits::PrimInt;

/// A fixed-width bitset over an array of primitive integer words.
///
/// Used by the indexed (48-wide) node mapping to track which child slots are
/// occupied, so freed slots can be found and reused in O(words) time.
// TODO: The SHIFT parameter can be derived from BIT_WIDTH once
// generic_const_exprs lands in stable.
pub struct Bitset<
    StorageType,
    const BIT_WIDTH: usize,
    const SHIFT: usize,
    const STORAGE_WIDTH: usize,
> where
    StorageType: PrimInt,
{
    bits: [StorageType; STORAGE_WIDTH],
}

impl<StorageType, const BIT_WIDTH: usize, const SHIFT: usize, const STORAGE_WIDTH: usize>
    Bitset<StorageType, BIT_WIDTH, SHIFT, STORAGE_WIDTH>
where
    StorageType: PrimInt,
{
    pub fn new() -> Self {
        Self {
            bits: [StorageType::zero(); STORAGE_WIDTH],
        }
    }

    /// Position of the lowest clear bit, if any bit is clear.
    pub fn first_empty(&self) -> Option<usize> {
        for (i, b) in self.bits.iter().enumerate() {
            if *b != StorageType::max_value() {
                return Some((i << SHIFT) + b.trailing_ones() as usize);
            }
        }
        None
    }

    #[inline]
    pub fn set(&mut self, pos: usize) {
        debug_assert!(pos < STORAGE_WIDTH * BIT_WIDTH);
        let bit = StorageType::one() << (pos % BIT_WIDTH);
        self.bits[pos >> SHIFT] = self.bits[pos >> SHIFT] | bit;
    }

    #[inline]
    pub fn unset(&mut self, pos: usize) {
        debug_assert!(pos < STORAGE_WIDTH * BIT_WIDTH);
        let bit = StorageType::one() << (pos % BIT_WIDTH);
        self.bits[pos >> SHIFT] = self.bits[pos >> SHIFT] & !bit;
    }

    #[inline]
    pub fn check(&self, pos: usize) -> bool {
        debug_assert!(pos < STORAGE_WIDTH * BIT_WIDTH);
        let bit = StorageType::one() << (pos % BIT_WIDTH);
        !(self.bits[pos >> SHIFT] & bit).is_zero()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.bits = [StorageType::zero(); STORAGE_WIDTH];
    }

    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Positions of all set bits, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().flat_map(|(i, b)| {
            (0..BIT_WIDTH).filter_map(move |j| {
                if !(*b >> j & StorageType::one()).is_zero() {
                    Some((i << SHIFT) + j)
                } else {
                    None
                }
            })
        })
    }
}

impl<StorageType, const BIT_WIDTH: usize, const SHIFT: usize, const STORAGE_WIDTH: usize> Default
    for Bitset<StorageType, BIT_WIDTH, SHIFT, STORAGE_WIDTH>
where
    StorageType: PrimInt,
{
    fn default() -> Self {
        Self::new()
    }
}

pub type Bitset64<const STORAGE_WIDTH_U64: usize> = Bitset<u64, 64, 6, STORAGE_WIDTH_U64>;
pub type Bitset8<const STORAGE_WIDTH_U8: usize> = Bitset<u8, 8, 3, STORAGE_WIDTH_U8>;
