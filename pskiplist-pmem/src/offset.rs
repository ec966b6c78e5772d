//! Tagged persistent offsets (TPOs)
//!
//! A [`TaggedOffset`] never stores a virtual address. It stores a byte
//! offset within a pool plus two status bits, and only resolves to a live
//! address (or, in this crate's reference pool, a live node) given the
//! pool's *current* base — so the same word stays valid across a restart
//! that remaps the pool to a different address.

use std::sync::atomic::{AtomicU64, Ordering};

/// Bit 0: the referenced node has been logically removed, awaiting unlink.
pub const DELETED: u64 = 1 << 0;
/// Bit 1: the word was written but has not yet been durably flushed.
pub const DIRTY: u64 = 1 << 1;
const FLAG_MASK: u64 = DELETED | DIRTY;

/// A 64-bit word encoding an in-pool byte offset and two status bits.
///
/// Bits 2..63 hold the offset; nodes are at least 4-byte aligned so the two
/// low bits are always free for flags. The all-zero word is the null TPO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaggedOffset(u64);

impl TaggedOffset {
    /// The null TPO: encodes no offset, no flags.
    pub const NULL: TaggedOffset = TaggedOffset(0);

    /// Builds a TPO from a virtual pointer and the pool base it was resolved
    /// against, per the `from(pool_base, vptr, deleted, dirty)` contract.
    pub fn from_vptr(pool_base: u64, vptr: u64, deleted: bool, dirty: bool) -> Self {
        Self::from_offset(vptr.wrapping_sub(pool_base), deleted, dirty)
    }

    /// Builds a TPO directly from a byte offset.
    pub fn from_offset(offset: u64, deleted: bool, dirty: bool) -> Self {
        let mut word = offset & !FLAG_MASK;
        if deleted {
            word |= DELETED;
        }
        if dirty {
            word |= DIRTY;
        }
        TaggedOffset(word)
    }

    /// Reconstructs a TPO from its raw 64-bit word (e.g. after an atomic load).
    pub fn from_raw(word: u64) -> Self {
        TaggedOffset(word)
    }

    /// The raw 64-bit word, suitable for storing in an atomic slot.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// The byte offset within the pool, with flag bits masked off.
    pub fn offset(&self) -> u64 {
        self.0 & !FLAG_MASK
    }

    /// Resolves this TPO to a virtual address given the pool's current base.
    /// Returns `None` for the null TPO.
    pub fn vptr(&self, pool_base: u64) -> Option<u64> {
        if self.is_null() {
            None
        } else {
            Some(pool_base.wrapping_add(self.offset()))
        }
    }

    /// True for the null TPO (word == 0).
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// True if the node this TPO refers to has been logically removed.
    pub fn is_deleted(&self) -> bool {
        self.0 & DELETED != 0
    }

    /// True if this word has been written but not yet durably flushed.
    pub fn is_dirty(&self) -> bool {
        self.0 & DIRTY != 0
    }

    /// Returns a copy of this TPO with the DIRTY bit set or cleared.
    pub fn with_dirty(&self, dirty: bool) -> Self {
        Self::from_offset(self.offset(), self.is_deleted(), dirty)
    }

    /// Returns a copy of this TPO with the DELETED bit set or cleared.
    pub fn with_deleted(&self, deleted: bool) -> Self {
        Self::from_offset(self.offset(), deleted, self.is_dirty())
    }

    /// Returns a copy of this TPO with the DIRTY bit cleared.
    pub fn clear_dirty(&self) -> Self {
        self.with_dirty(false)
    }
}

impl Default for TaggedOffset {
    fn default() -> Self {
        Self::NULL
    }
}

/// An atomic slot holding a [`TaggedOffset`], used for `nexts[level]`.
///
/// All loads and stores use `Relaxed` ordering by default, per the
/// concurrency model: visibility is driven by the dirty-bit / observation
/// cleaning protocol rather than acquire/release fences.
#[derive(Debug)]
pub struct AtomicTaggedOffset(AtomicU64);

impl AtomicTaggedOffset {
    /// Creates a new atomic slot initialized to the given TPO.
    pub fn new(value: TaggedOffset) -> Self {
        AtomicTaggedOffset(AtomicU64::new(value.raw()))
    }

    /// Loads the current TPO with the given ordering.
    pub fn load(&self, order: Ordering) -> TaggedOffset {
        TaggedOffset::from_raw(self.0.load(order))
    }

    /// Stores a TPO with the given ordering.
    pub fn store(&self, value: TaggedOffset, order: Ordering) {
        self.0.store(value.raw(), order);
    }

    /// Compare-and-swap on the raw word, returning the previous TPO on
    /// success or the TPO actually observed on failure.
    pub fn compare_exchange(
        &self,
        current: TaggedOffset,
        new: TaggedOffset,
        success: Ordering,
        failure: Ordering,
    ) -> Result<TaggedOffset, TaggedOffset> {
        self.0
            .compare_exchange(current.raw(), new.raw(), success, failure)
            .map(TaggedOffset::from_raw)
            .map_err(TaggedOffset::from_raw)
    }
}

impl Clone for AtomicTaggedOffset {
    fn clone(&self) -> Self {
        AtomicTaggedOffset::new(self.load(Ordering::Relaxed))
    }
}
