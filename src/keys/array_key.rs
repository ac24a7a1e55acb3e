use crate::keys::KeyTrait;
use crate::partials::array_partial::ArrPartial;

/// A fixed-capacity key holding up to `N` encoded bytes on the stack.
///
/// Strings are null-terminated on conversion so that no string's encoding is
/// a prefix of another's; choose `N` with one byte of headroom for that
/// terminator. Unsigned integers encode as big-endian bytes; signed integers
/// flip their sign bit first so negative values sort below positive ones
/// under unsigned byte comparison.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct ArrayKey<const N: usize> {
    data: [u8; N],
    len: usize,
}

impl<const N: usize> ArrayKey<N> {
    pub fn new_from_str(s: &str) -> Self {
        assert!(s.len() + 1 <= N, "string does not fit in key capacity");
        let mut data = [0; N];
        data[..s.len()].copy_from_slice(s.as_bytes());
        Self {
            data,
            len: s.len() + 1,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// (Convenience function. Not all keys can be assumed to be numeric.)
    pub fn to_be_u64(&self) -> u64 {
        assert!(self.len <= 8, "key is longer than 8 bytes");
        let mut arr = [0; 8];
        arr[8 - self.len..].copy_from_slice(&self.data[..self.len]);
        u64::from_be_bytes(arr)
    }
}

impl<const N: usize> AsRef<[u8]> for ArrayKey<N> {
    fn as_ref(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl<const N: usize> PartialOrd for ArrayKey<N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: usize> Ord for ArrayKey<N> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<const N: usize> KeyTrait for ArrayKey<N> {
    type PartialType = ArrPartial<N>;
    const MAXIMUM_SIZE: Option<usize> = Some(N);

    fn new_from_slice(data: &[u8]) -> Self {
        assert!(data.len() <= N, "data length exceeds key capacity");
        let mut arr = [0; N];
        arr[..data.len()].copy_from_slice(data);
        Self {
            data: arr,
            len: data.len(),
        }
    }

    #[inline(always)]
    fn at(&self, pos: usize) -> u8 {
        self.data[pos]
    }

    #[inline(always)]
    fn length_at(&self, at_depth: usize) -> usize {
        self.len - at_depth
    }

    fn to_partial(&self, at_depth: usize) -> ArrPartial<N> {
        ArrPartial::from_slice(&self.data[at_depth..self.len])
    }

    #[inline(always)]
    fn matches_slice(&self, slice: &[u8]) -> bool {
        &self.data[..self.len] == slice
    }
}

impl<const N: usize> From<&str> for ArrayKey<N> {
    fn from(data: &str) -> Self {
        Self::new_from_str(data)
    }
}

impl<const N: usize> From<String> for ArrayKey<N> {
    fn from(data: String) -> Self {
        Self::new_from_str(&data)
    }
}

impl<const N: usize> From<&String> for ArrayKey<N> {
    fn from(data: &String) -> Self {
        Self::new_from_str(data)
    }
}

macro_rules! impl_from_unsigned {
    ( $($t:ty),* ) => {
    $(
    impl<const N: usize> From< $t > for ArrayKey<N>
    {
        fn from(data: $t) -> Self {
            Self::new_from_slice(data.to_be_bytes().as_ref())
        }
    }
    impl<const N: usize> From< &$t > for ArrayKey<N>
    {
        fn from(data: &$t) -> Self {
            (*data).into()
        }
    }
    ) *
    }
}
impl_from_unsigned!(u8, u16, u32, u64, usize, u128);

macro_rules! impl_from_signed {
    ( $t:ty, $tu:ty ) => {
        impl<const N: usize> From<$t> for ArrayKey<N> {
            fn from(val: $t) -> Self {
                // Flip the sign bit so two's-complement order becomes
                // unsigned byte order.
                let v = val as $tu;
                let sign_bit = 1 << (<$tu>::BITS - 1);
                ArrayKey::new_from_slice((v ^ sign_bit).to_be_bytes().as_ref())
            }
        }

        impl<const N: usize> From<&$t> for ArrayKey<N> {
            fn from(val: &$t) -> Self {
                (*val).into()
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
