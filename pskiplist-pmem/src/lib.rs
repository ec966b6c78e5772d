//! The persistent-memory collaborator interface for the pskiplist
//! crate family.
//!
//! This crate is the boundary the skip list is built against: tagged
//! offsets that resolve only through a pool handle, a pool that allocates
//! and resolves them, and transaction brackets that scope durable linking
//! updates. [`Pool`] ships a reference adapter good enough to exercise
//! every durability scenario an in-process test can drive; a production
//! deployment is expected to implement the same surface against a real
//! PMDK- or mmap-backed pool.
//!
//! # Example
//!
//! ```
//! use pskiplist_pmem::{Pool, transaction};
//!
//! let pool: Pool<&'static str> = Pool::new(1024);
//! let tpo = transaction::run(&pool, |tx| tx.alloc("hello")).unwrap();
//! assert_eq!(*pool.resolve(tpo).unwrap(), "hello");
//! ```

pub mod offset;
pub mod pool;
pub mod transaction;

pub use offset::{AtomicTaggedOffset, TaggedOffset, DELETED, DIRTY};
pub use pool::{Pool, PoolHandle};
pub use transaction::Transaction;
