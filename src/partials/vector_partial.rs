use std::cmp::min;

use crate::keys::KeyTrait;
use crate::partials::Partial;

/// A heap-allocated partial, for keys without a fixed maximum size.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VectorPartial {
    data: Box<[u8]>,
}

impl VectorPartial {
    pub fn from_slice(src: &[u8]) -> Self {
        Self {
            data: Box::from(src),
        }
    }

    pub fn to_slice(&self) -> &[u8] {
        &self.data
    }
}

impl From<&[u8]> for VectorPartial {
    fn from(src: &[u8]) -> Self {
        Self::from_slice(src)
    }
}

impl Partial for VectorPartial {
    fn partial_before(&self, length: usize) -> Self {
        assert!(length <= self.data.len());
        VectorPartial::from_slice(&self.data[..length])
    }

    fn partial_after(&self, start: usize) -> Self {
        assert!(start <= self.data.len());
        VectorPartial::from_slice(&self.data[start..])
    }

    fn partial_extended_with(&self, other: &Self) -> Self {
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Self {
            data: data.into_boxed_slice(),
        }
    }

    #[inline(always)]
    fn at(&self, pos: usize) -> u8 {
        debug_assert!(pos < self.data.len());
        self.data[pos]
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.data.len()
    }

    fn prefix_length_key<K>(&self, key: &K, at_depth: usize) -> usize
    where
        K: KeyTrait<PartialType = Self>,
    {
        let len = min(self.data.len(), key.length_at(at_depth));
        let mut idx = 0;
        while idx < len {
            if self.data[idx] != key.at(at_depth + idx) {
                break;
            }
            idx += 1;
        }
        idx
    }

    fn prefix_length_slice(&self, slice: &[u8]) -> usize {
        let len = min(self.data.len(), slice.len());
        let mut idx = 0;
        while idx < len {
            if self.data[idx] != slice[idx] {
                break;
            }
            idx += 1;
        }
        idx
    }

    fn to_slice(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use crate::partials::vector_partial::VectorPartial;
    use crate::partials::Partial;

    #[test]
    fn split_and_merge() {
        let p = VectorPartial::from_slice(b"radixtree");
        let head = p.partial_before(5);
        let tail = p.partial_after(5);
        assert_eq!(head.to_slice(), b"radix");
        assert_eq!(tail.to_slice(), b"tree");
        assert_eq!(head.partial_extended_with(&tail).to_slice(), b"radixtree");
    }
}
