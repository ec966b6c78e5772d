//! Error types for the persistent skip list
//!
//! This module defines the error types surfaced by the pool layer and the
//! skip list's mutating operations.

use thiserror::Error;

/// The main error type for pskiplist operations
#[derive(Error, Debug)]
pub enum Error {
    /// The pool's backing slab has no room for another allocation
    #[error("persistent pool exhausted (capacity {capacity})")]
    PoolExhausted {
        /// The pool's configured capacity
        capacity: usize,
    },

    /// A transaction was aborted before it could commit
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    /// An offset did not resolve to a live node in the current pool
    #[error("dangling tagged offset: {0:#x}")]
    DanglingOffset(u64),

    /// A node was asked to link at a level beyond its allocated height
    #[error("level {level} out of range for node of height {height}")]
    LevelOutOfRange {
        /// The level that was requested
        level: u8,
        /// The node's actual height
        height: u8,
    },
}

/// A specialized Result type for pskiplist operations
pub type Result<T> = std::result::Result<T, Error>;
