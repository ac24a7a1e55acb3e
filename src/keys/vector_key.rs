use crate::keys::KeyTrait;
use crate::partials::vector_partial::VectorPartial;

/// A heap-allocated key for encodings without a fixed maximum size. Strings
/// are null-terminated, like [`ArrayKey`](crate::keys::array_key::ArrayKey).
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Debug)]
pub struct VectorKey {
    data: Box<[u8]>,
}

impl VectorKey {
    pub fn new_from_str(s: &str) -> Self {
        let mut data = Vec::with_capacity(s.len() + 1);
        data.extend_from_slice(s.as_bytes());
        data.push(0);
        Self {
            data: data.into_boxed_slice(),
        }
    }

    pub fn new_from_vec(data: Vec<u8>) -> Self {
        Self {
            data: data.into_boxed_slice(),
        }
    }
}

impl AsRef<[u8]> for VectorKey {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl KeyTrait for VectorKey {
    type PartialType = VectorPartial;
    const MAXIMUM_SIZE: Option<usize> = None;

    fn new_from_slice(data: &[u8]) -> Self {
        Self {
            data: Box::from(data),
        }
    }

    #[inline(always)]
    fn at(&self, pos: usize) -> u8 {
        self.data[pos]
    }

    #[inline(always)]
    fn length_at(&self, at_depth: usize) -> usize {
        self.data.len() - at_depth
    }

    fn to_partial(&self, at_depth: usize) -> VectorPartial {
        VectorPartial::from_slice(&self.data[at_depth..])
    }

    #[inline(always)]
    fn matches_slice(&self, slice: &[u8]) -> bool {
        &*self.data == slice
    }
}

impl From<&str> for VectorKey {
    fn from(data: &str) -> Self {
        Self::new_from_str(data)
    }
}

impl From<String> for VectorKey {
    fn from(data: String) -> Self {
        Self::new_from_str(&data)
    }
}

impl From<&String> for VectorKey {
    fn from(data: &String) -> Self {
        Self::new_from_str(data)
    }
}

macro_rules! impl_from_unsigned {
    ( $($t:ty),* ) => {
    $(
    impl From< $t > for VectorKey
    {
        fn from(data: $t) -> Self {
            Self::new_from_slice(data.to_be_bytes().as_ref())
        }
    }
    ) *
    }
}
impl_from_unsigned!(u8, u16, u32, u64, usize, u128);

macro_rules! impl_from_signed {
    ( $t:ty, $tu:ty ) => {
        impl From<$t> for VectorKey {
            fn from(val: $t) -> Self {
                let v = val as $tu;
                let sign_bit = 1 << (<$tu>::BITS - 1);
                VectorKey::new_from_slice((v ^ sign_bit).to_be_bytes().as_ref())
            }
        }
    };
}

impl_from_signed!(i8, u8);
impl_from_signed!(i16, u16);
impl_from_signed!(i32, u32);
impl_from_signed!(i64, u64);
impl_from_signed!(i128, u128);
impl_from_signed!(isize, usize);

#[cfg(test)]
mod tests {
    use crate::keys::vector_key::VectorKey;

    #[test]
    fn string_prefixes_stay_distinct() {
        let a: VectorKey = "a".into();
        let ab: VectorKey = "ab".into();
        // "a\0" sorts below "ab\0" and neither is a prefix of the other.
        assert!(a < ab);
        assert!(!ab.as_ref().starts_with(a.as_ref()));
    }

    #[test]
    fn signed_ordering_is_preserved() {
        let neg: VectorKey = (-5i32).into();
        let zero: VectorKey = 0i32.into();
        let pos: VectorKey = 5i32.into();
        assert!(neg < zero);
        assert!(zero < pos);
    }
}
