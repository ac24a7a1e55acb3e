use std::cmp::min;

use crate::keys::KeyTrait;
use crate::partials::Partial;

/// A stack-allocated partial, for keys with a compile-time maximum size.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ArrPartial<const SIZE: usize> {
    data: [u8; SIZE],
    len: usize,
}

impl<const SIZE: usize> ArrPartial<SIZE> {
    pub fn from_slice(src: &[u8]) -> Self {
        assert!(src.len() <= SIZE, "data length exceeds partial capacity");
        let mut data = [0; SIZE];
        data[..src.len()].copy_from_slice(src);
        Self {
            data,
            len: src.len(),
        }
    }

    pub fn to_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl<const SIZE: usize> Partial for ArrPartial<SIZE> {
    fn partial_before(&self, length: usize) -> Self {
        assert!(length <= self.len);
        ArrPartial::from_slice(&self.data[..length])
    }

    fn partial_after(&self, start: usize) -> Self {
        assert!(start <= self.len);
        ArrPartial::from_slice(&self.data[start..self.len])
    }

    fn partial_extended_with(&self, other: &Self) -> Self {
        assert!(self.len + other.len <= SIZE, "extension exceeds capacity");
        let mut data = [0; SIZE];
        data[..self.len].copy_from_slice(self.to_slice());
        data[self.len..self.len + other.len].copy_from_slice(other.to_slice());
        Self {
            data,
            len: self.len + other.len,
        }
    }

    #[inline(always)]
    fn at(&self, pos: usize) -> u8 {
        debug_assert!(pos < self.len);
        self.data[pos]
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }

    fn prefix_length_key<K>(&self, key: &K, at_depth: usize) -> usize
    where
        K: KeyTrait<PartialType = Self>,
    {
        let len = min(self.len, key.length_at(at_depth));
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
        let len = min(self.len, slice.len());
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
        &self.data[..self.len]
    }
}
