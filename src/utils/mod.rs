//! Small support pieces shared by the node mappings: occupancy bitsets and
//! searches over the sorted `u8` key arrays of the narrow node tiers.

pub mod bitset;
pub mod u8_keys;
