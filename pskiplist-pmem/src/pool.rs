//! The persistent-memory pool (external collaborator)
//!
//! Production deployments plug a real PMDK- or mmap-backed allocator in
//! behind this surface. [`Pool`] is the reference adapter this crate ships:
//! a `dashmap`-backed slab that hands out stable, reusable indices as
//! tagged offsets. Node payloads never move once allocated (each slot holds
//! an `Arc`), so a resolved reference stays valid for as long as any holder
//! keeps the `Arc` alive — exactly the property the skip list needs from a
//! real pool, without requiring `unsafe` placement of arbitrary `K`/`V`
//! types into a raw byte region.
//!
//! [`Pool::simulate_restart`] models a process restart that remaps the pool
//! to a new base address: the pool's `uuid` and its slots are unchanged,
//! only the `base` marker advances, demonstrating that tagged offsets
//! resolve correctly independent of where the pool happens to be mapped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use pskiplist_core::{Error, Result};

use crate::offset::TaggedOffset;

/// Alignment assumed for pool allocations; the low 2 bits of an offset are
/// therefore always free for the TPO's DELETED/DIRTY flags.
const OFFSET_ALIGN: u64 = 4;

fn index_to_offset(index: u64) -> u64 {
    index * OFFSET_ALIGN
}

fn offset_to_index(offset: u64) -> u64 {
    offset / OFFSET_ALIGN
}

/// A lightweight handle identifying a pool and its current mapping.
///
/// Two handles with the same `uuid` but different `base` represent the same
/// logical pool observed before and after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHandle {
    base: u64,
    uuid: u128,
}

impl PoolHandle {
    /// The pool's current base address (changes across a simulated restart).
    pub fn base(&self) -> u64 {
        self.base
    }

    /// The pool's stable identifier (constant across restarts).
    pub fn uuid(&self) -> u128 {
        self.uuid
    }
}

/// A reference pool adapter backing allocation, resolution, and flush for
/// persistent objects of type `T`.
pub struct Pool<T> {
    uuid: u128,
    base: AtomicU64,
    capacity: usize,
    slots: DashMap<u64, Arc<T>>,
    next_index: AtomicU64,
    free_list: SegQueue<u64>,
    flush_count: AtomicU64,
}

impl<T> Pool<T> {
    /// Creates a new pool with room for `capacity` live allocations.
    pub fn new(capacity: usize) -> Self {
        Pool {
            uuid: uuid_from_entropy(),
            base: AtomicU64::new(0x1000_0000),
            capacity,
            slots: DashMap::new(),
            next_index: AtomicU64::new(0),
            free_list: SegQueue::new(),
            flush_count: AtomicU64::new(0),
        }
    }

    /// The pool's current handle (base address + uuid).
    pub fn handle(&self) -> PoolHandle {
        PoolHandle {
            base: self.base.load(Ordering::Relaxed),
            uuid: self.uuid,
        }
    }

    /// Number of live (allocated, unfreed) nodes in the pool.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the pool holds no live allocations.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Allocates `value` in the pool, returning a clean TPO referencing it.
    ///
    /// Mirrors `alloc_persistent<T>(args)`: the returned offset is
    /// stable until [`Pool::free_persistent`] is called on it.
    pub fn alloc_persistent(&self, value: T) -> Result<TaggedOffset> {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                let index = self.next_index.fetch_add(1, Ordering::Relaxed);
                if index as usize >= self.capacity {
                    return Err(Error::PoolExhausted {
                        capacity: self.capacity,
                    });
                }
                index
            }
        };
        self.slots.insert(index, Arc::new(value));
        Ok(TaggedOffset::from_offset(index_to_offset(index), false, false))
    }

    /// Frees the node referenced by `tpo`. Mirrors `free_persistent<T>(p)`.
    ///
    /// Any `Arc` clones obtained via [`Pool::resolve`] before this call
    /// remain valid; the slot is simply no longer reachable by offset,
    /// which is exactly the "unreachable, awaiting zero refcount" state
    /// the skip list's deferred reclamation relies on.
    pub fn free_persistent(&self, tpo: TaggedOffset) {
        if tpo.is_null() {
            return;
        }
        let index = offset_to_index(tpo.offset());
        if self.slots.remove(&index).is_some() {
            self.free_list.push(index);
        }
    }

    /// Resolves a TPO to the live node it refers to, or `None` if the TPO
    /// is null or dangling (already freed).
    pub fn resolve(&self, tpo: TaggedOffset) -> Option<Arc<T>> {
        if tpo.is_null() {
            return None;
        }
        let index = offset_to_index(tpo.offset());
        self.slots.get(&index).map(|entry| Arc::clone(&entry))
    }

    /// Durably flushes the slot backing `tpo`. In this in-process reference
    /// adapter there is no real medium to flush to, so this only bumps an
    /// observability counter; a production pool would issue the real flush
    /// primitive here (e.g. `pmemobj_persist` / `msync`).
    pub fn flush(&self, tpo: TaggedOffset) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        log::trace!("flush requested for offset {:#x}", tpo.offset());
    }

    /// Drains any buffered writes. No-op in this adapter; see [`Pool::flush`].
    pub fn drain(&self) {
        log::trace!("drain requested");
    }

    /// Number of times [`Pool::flush`] has been called. Exposed for tests
    /// that assert the dirty-bit cleaning path actually triggers a flush.
    pub fn flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    /// Simulates a process restart: the pool remaps to a new base address.
    /// The uuid and every allocated offset are unchanged, demonstrating
    /// that tagged offsets remain resolvable across the remap.
    pub fn simulate_restart(&self) -> PoolHandle {
        self.base.fetch_add(0x1000_0000, Ordering::Relaxed);
        self.handle()
    }
}

/// Generates a pool-scoped uuid without depending on a system RNG crate;
/// good enough for a single-process identifier, not for cross-host use.
fn uuid_from_entropy() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let addr = &nanos as *const u128 as u128;
    nanos ^ addr.rotate_left(17)
}
