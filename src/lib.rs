//! An ordered map based on an AVL tree.
//!
//! The map keeps every node's two subtrees within one level of each other's height, which bounds
//! the height of the tree by roughly `1.44 * log2(n)` and makes search, insertion, removal, and
//! stepping to a neighboring entry `O(log n)`.
//!
//! # Examples
//!
//! ```
//! let mut map = avl_tree::Map::new();
//!
//! for key in [10, 20, 30] { map.insert(key, key * 2); }
//! assert_eq!(map.height(), 2);
//!
//! let last = map.last().unwrap();
//! let prev = map.predecessor(last).unwrap().unwrap();
//! assert_eq!(map.get_key_value(prev), Ok((&20, &40)));
//! ```

#![deny(missing_docs)]

mod balance;
mod error;
pub mod map;
mod node;
#[cfg(feature = "quickcheck")]
mod quickcheck;

pub use error::Error;
pub use map::Map;
pub use node::Handle;
