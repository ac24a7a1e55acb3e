//! An ordered, in-memory key-value map built on an adaptive radix tree
//! (ART): inner nodes adapt their width (4, 16, 48, 256) to their fanout,
//! and unary paths are compressed into per-node prefixes.
//!
//! Keys are stored in a binary-comparable encoding, so iteration order is
//! the byte order of the encoded keys, which the provided key types make
//! agree with the natural order of strings and integers. See
//! [`keys::KeyTrait`] for the encoding contract.
//!
//! ```
//! use artmap::{AdaptiveRadixTree, ArrayKey};
//!
//! let mut tree = AdaptiveRadixTree::<ArrayKey<16>, String>::new();
//! tree.insert(7u64, "seven".to_string());
//! tree.insert("seven", "7".to_string());
//! assert_eq!(tree.get(7u64), Some(&"seven".to_string()));
//! ```

mod arena;
pub mod iter;
pub mod keys;
mod mapping;
mod node;
pub mod partials;
pub mod stats;
pub mod tree;
pub mod utils;

pub use iter::{Cursor, CursorError, Iter, IterRev, Keys, KeysRev, Values};
pub use keys::array_key::ArrayKey;
pub use keys::vector_key::VectorKey;
pub use tree::{AdaptiveRadixTree, EntryRef};
