//! Core types and traits shared across the pskiplist crate family
//!
//! This crate contains the fundamental error handling and comparator
//! abstractions used by the persistent skip list. It provides:
//!
//! - Common error types with [`Error`] and [`Result`]
//! - The [`KeyComparator`] trait used to order keys without requiring `Ord`
//!
//! # Example
//!
//! ```
//! use pskiplist_core::{KeyComparator, OrdComparator};
//!
//! let cmp = OrdComparator::default();
//! assert!(cmp.less(&1, &2));
//! assert!(cmp.equal(&1, &1));
//! ```

pub mod comparator;
pub mod error;

pub use comparator::{KeyComparator, OrdComparator};
pub use error::{Error, Result};
