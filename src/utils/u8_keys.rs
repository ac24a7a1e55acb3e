//! Searches over the sorted partial-key arrays of the 4- and 16-wide node
//! tiers. Equality search uses SIMD on platforms that have it (byte equality
//! compares the same signed or unsigned, so the intrinsics are safe against
//! the unsigned ordering of the arrays); everything else falls back to a
//! linear or binary scan.

#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
#[inline]
fn x86_64_sse_find_key_16(key: u8, keys: &[u8], num_children: usize) -> Option<usize> {
    use std::arch::x86_64::{
        __m128i, _mm_cmpeq_epi8, _mm_loadu_si128, _mm_movemask_epi8, _mm_set1_epi8,
    };

    let bitfield = unsafe {
        let key_vec = _mm_set1_epi8(key as i8);
        let results = _mm_cmpeq_epi8(key_vec, _mm_loadu_si128(keys.as_ptr() as *const __m128i));
        let mask = (1i32 << num_children) - 1;
        _mm_movemask_epi8(results) & mask
    };
    if bitfield != 0 {
        return Some(bitfield.trailing_zeros() as usize);
    }
    None
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
#[inline]
fn aarch64_neon_find_key_16(key: u8, keys: &[u8], num_children: usize) -> Option<usize> {
    use std::arch::aarch64::{
        vceqq_u8, vdupq_n_u8, vget_lane_u64, vld1q_u8, vreinterpret_u64_u8, vreinterpretq_u16_u8,
        vshrn_n_u16,
    };
    unsafe {
        let key_vec = vdupq_n_u8(key);
        let node_keys_vec = vld1q_u8(keys.as_ptr());
        let cmp_vec = vceqq_u8(key_vec, node_keys_vec);

        // NEON has no movemask; narrow the 8-bit lanes to 4-bit ones and read
        // the result out of a 64-bit lane, giving 4 bits per input byte.
        let eq_mask = vreinterpretq_u16_u8(cmp_vec);
        let res = vshrn_n_u16::<4>(eq_mask);
        let matches = vget_lane_u64::<0>(vreinterpret_u64_u8(res));

        if matches != 0 {
            let idx = (matches.trailing_zeros() >> 2) as usize;
            if idx < num_children {
                return Some(idx);
            }
        }
        None
    }
}

fn binary_find_key(key: u8, keys: &[u8], num_children: usize) -> Option<usize> {
    let mut left = 0;
    let mut right = num_children;
    while left < right {
        let mid = (left + right) / 2;
        match keys[mid].cmp(&key) {
            std::cmp::Ordering::Less => left = mid + 1,
            std::cmp::Ordering::Equal => return Some(mid),
            std::cmp::Ordering::Greater => right = mid,
        }
    }
    None
}

/// Position of `key` within the first `num_children` entries of a sorted key
/// array, or `None` if absent.
#[allow(unreachable_code)]
pub fn u8_keys_find_key_position_sorted<const WIDTH: usize>(
    key: u8,
    keys: &[u8],
    num_children: usize,
) -> Option<usize> {
    // Width 4 and under, just use linear search.
    if WIDTH <= 4 {
        return (0..num_children).find(|&i| keys[i] == key);
    }

    if WIDTH == 16 {
        #[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
        {
            return x86_64_sse_find_key_16(key, keys, num_children);
        }

        #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
        {
            return aarch64_neon_find_key_16(key, keys, num_children);
        }
    }

    binary_find_key(key, keys, num_children)
}

/// Position at which `key` keeps the first `num_children` entries sorted:
/// the first index holding a strictly greater key, or `num_children` when
/// `key` sorts past everything present. `key` must not already be present.
pub fn u8_keys_find_insert_position_sorted<const WIDTH: usize>(
    key: u8,
    keys: &[u8],
    num_children: usize,
) -> usize {
    debug_assert!(num_children <= WIDTH);
    (0..num_children)
        .find(|&i| keys[i] > key)
        .unwrap_or(num_children)
}

#[cfg(test)]
mod tests {
    use super::{u8_keys_find_insert_position_sorted, u8_keys_find_key_position_sorted};

    #[test]
    fn find_sorted_16() {
        let mut keys = [255u8; 16];
        for (i, k) in [3u8, 9, 77, 130, 200, 254].iter().enumerate() {
            keys[i] = *k;
        }
        assert_eq!(u8_keys_find_key_position_sorted::<16>(3, &keys, 6), Some(0));
        assert_eq!(
            u8_keys_find_key_position_sorted::<16>(130, &keys, 6),
            Some(3)
        );
        assert_eq!(
            u8_keys_find_key_position_sorted::<16>(254, &keys, 6),
            Some(5)
        );
        assert_eq!(u8_keys_find_key_position_sorted::<16>(128, &keys, 6), None);
        // Sentinel bytes past num_children must not match.
        assert_eq!(u8_keys_find_key_position_sorted::<16>(255, &keys, 6), None);
    }

    #[test]
    fn find_sorted_4() {
        let keys = [10u8, 20, 30, 255];
        assert_eq!(u8_keys_find_key_position_sorted::<4>(20, &keys, 3), Some(1));
        assert_eq!(u8_keys_find_key_position_sorted::<4>(25, &keys, 3), None);
        assert_eq!(u8_keys_find_key_position_sorted::<4>(255, &keys, 3), None);
    }

    #[test]
    fn insert_position_sorted() {
        let keys = [10u8, 20, 130, 255];
        assert_eq!(u8_keys_find_insert_position_sorted::<4>(5, &keys, 3), 0);
        assert_eq!(u8_keys_find_insert_position_sorted::<4>(15, &keys, 3), 1);
        assert_eq!(u8_keys_find_insert_position_sorted::<4>(140, &keys, 3), 3);
        assert_eq!(u8_keys_find_insert_position_sorted::<4>(0, &keys, 0), 0);
    }
}
