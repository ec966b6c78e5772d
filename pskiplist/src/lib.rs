//! A persistent, concurrent skip list index
//!
//! This crate implements the ordered key→value index for a persistent
//! key-value store: a skip list whose every linking mutation is durable
//! and position-independent, so the structure survives a process restart
//! even if the backing pool remaps to a different virtual address.
//!
//! - **[`index::SkipList`]**: the container — `find`, `try_emplace`, `erase`,
//!   `lower_bound`/`upper_bound`, and forward iteration.
//! - **`pskiplist_pmem`**: the tagged-offset and pool abstractions this
//!   crate is built against (re-exported at [`pmem`]).
//!
//! # Architecture
//!
//! ```text
//! Caller → SkipList::try_emplace/find/erase → find_le (top-down descent)
//!                                            → Node (atomic TPO nexts)
//!                                            → Pool (alloc/resolve/flush)
//! ```
//!
//! # Example
//!
//! ```
//! use pskiplist::{Config, SkipList};
//!
//! let list: SkipList<String, String> = SkipList::new(Config::default())?;
//!
//! let (_, inserted) = list.try_emplace("b".to_string(), "2".to_string())?;
//! assert!(inserted);
//! list.try_emplace("a".to_string(), "1".to_string())?;
//!
//! assert_eq!(list.find(&"a".to_string()), Some(("a".to_string(), "1".to_string())));
//! assert_eq!(list.size(), 2);
//! # Ok::<(), pskiplist_core::Error>(())
//! ```

pub mod config;
pub mod index;

pub use config::Config;
pub use index::{Iter, SkipList};

/// Re-export of the pool/tagged-offset layer this crate is built against.
pub use pskiplist_pmem as pmem;
