//! The skip list container and its supporting node/iterator types
//!
//! [`SkipList`] is the ordered index: a concurrent skip list whose links
//! are tagged persistent offsets rather than raw pointers, so the same
//! structure is valid across a process restart once its backing
//! [`crate::pmem::Pool`] remaps.
//!
//! # Example
//!
//! ```
//! use pskiplist::{Config, SkipList};
//!
//! let list: SkipList<u32, &str> = SkipList::new(Config::default()).unwrap();
//! list.try_emplace(1, "one").unwrap();
//! list.try_emplace(2, "two").unwrap();
//!
//! let collected: Vec<_> = list.iter().collect();
//! assert_eq!(collected, vec![(1, "one"), (2, "two")]);
//! ```

mod iter;
mod node;
mod skiplist;

pub use iter::Iter;
pub use skiplist::SkipList;
