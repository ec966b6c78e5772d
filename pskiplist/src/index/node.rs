//! Skip list nodes

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use pskiplist_pmem::{AtomicTaggedOffset, Pool, TaggedOffset};

/// A single node in the skip list.
///
/// `entry` is `None` for the two sentinels (head and tail); every other
/// node carries exactly one key/value pair, set once at construction and
/// never mutated afterward. Only `nexts` changes after construction.
pub(crate) struct Node<K, V> {
    entry: Option<(K, V)>,
    nexts: Vec<AtomicTaggedOffset>,
    height: u8,
    /// Volatile: counts live pins (readers/iterators currently positioned
    /// on this node). Gates physical reclamation after an erase.
    refcount: AtomicU16,
    /// Volatile: set by `erase` once the node has been unlinked from every
    /// level. A retired node with a zero refcount is freed immediately;
    /// otherwise the last matching `unpin` frees it.
    retired: AtomicBool,
}

impl<K, V> Node<K, V> {
    /// Builds a node carrying `(key, value)` at the given height (`1..=H`).
    pub(crate) fn with_entry(key: K, value: V, height: u8) -> Self {
        debug_assert!(height >= 1, "non-sentinel nodes must have height >= 1");
        Node {
            entry: Some((key, value)),
            nexts: Self::fresh_nexts(height),
            height,
            refcount: AtomicU16::new(0),
            retired: AtomicBool::new(false),
        }
    }

    /// Builds a sentinel node: head has `height == max_height`, tail has
    /// `height == 0`.
    pub(crate) fn sentinel(height: u8) -> Self {
        Node {
            entry: None,
            nexts: Self::fresh_nexts(height),
            height,
            refcount: AtomicU16::new(0),
            retired: AtomicBool::new(false),
        }
    }

    fn fresh_nexts(height: u8) -> Vec<AtomicTaggedOffset> {
        (0..height)
            .map(|_| AtomicTaggedOffset::new(TaggedOffset::NULL))
            .collect()
    }

    pub(crate) fn height(&self) -> u8 {
        self.height
    }

    /// Tail's defining property: height 0, no entry.
    pub(crate) fn is_tail(&self) -> bool {
        self.height == 0
    }

    pub(crate) fn entry(&self) -> Option<&(K, V)> {
        self.entry.as_ref()
    }

    pub(crate) fn key(&self) -> &K {
        &self
            .entry
            .as_ref()
            .expect("key() called on a sentinel node")
            .0
    }

    /// Reads the cleaned TPO at `level`, performing observation-time
    /// cleaning: if the stored word is dirty, CAS it to a clean copy
    /// and request a durable flush before returning.
    pub(crate) fn next_tpo(&self, level: usize, pool: &Pool<Node<K, V>>) -> TaggedOffset {
        loop {
            let observed = self.nexts[level].load(Ordering::Relaxed);
            if !observed.is_dirty() {
                return observed;
            }
            let clean = observed.clear_dirty();
            match self.nexts[level].compare_exchange(
                observed,
                clean,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    pool.flush(clean);
                    return clean;
                }
                Err(_) => continue,
            }
        }
    }

    /// Resolves the node at `level`, or `None` if there is none (should not
    /// happen for a well-formed list, since every link ultimately points at
    /// the tail sentinel rather than being null).
    pub(crate) fn next(&self, level: usize, pool: &Pool<Node<K, V>>) -> Option<std::sync::Arc<Node<K, V>>> {
        let tpo = self.next_tpo(level, pool);
        pool.resolve(tpo)
    }

    /// Stores `tpo` into `nexts[level]`, marking it dirty. Relaxed
    /// ordering: visibility is governed by the dirty-bit protocol, not by
    /// acquire/release fences.
    pub(crate) fn set_next(&self, level: usize, tpo: TaggedOffset) {
        debug_assert!(
            (level as u8) < self.height,
            "level {level} out of range for node of height {}",
            self.height
        );
        self.nexts[level].store(tpo.with_dirty(true), Ordering::Relaxed);
    }

    pub(crate) fn pin(&self) {
        self.refcount.fetch_add(1, Ordering::AcqRel);
    }

    /// Unpins this node. If it was retired and this was the last pin,
    /// physically frees it from the pool.
    pub(crate) fn unpin(&self, pool: &Pool<Node<K, V>>, self_offset: TaggedOffset) {
        let previous = self.refcount.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "unpin called without a matching pin");
        if previous == 1 && self.retired.load(Ordering::Acquire) {
            pool.free_persistent(self_offset);
        }
    }

    /// Marks this node as logically removed. If no reader currently holds a
    /// pin on it, frees it immediately; otherwise the free is deferred to
    /// the last `unpin`.
    pub(crate) fn retire(&self, pool: &Pool<Node<K, V>>, self_offset: TaggedOffset) {
        self.retired.store(true, Ordering::Release);
        if self.refcount.load(Ordering::Acquire) == 0 {
            pool.free_persistent(self_offset);
        }
    }

    #[cfg(test)]
    pub(crate) fn refcount(&self) -> u16 {
        self.refcount.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering as O;

    #[test]
    fn sentinel_nodes_have_no_entry() {
        let head = Node::<String, String>::sentinel(8);
        assert!(head.entry().is_none());
        assert_eq!(head.height(), 8);
        assert!(!head.is_tail());

        let tail = Node::<String, String>::sentinel(0);
        assert!(tail.is_tail());
    }

    #[test]
    fn set_next_marks_the_slot_dirty() {
        let node = Node::<String, String>::with_entry("a".into(), "1".into(), 1);
        let pool: Pool<Node<String, String>> = Pool::new(4);
        let target = pool.alloc_persistent(Node::sentinel(0)).unwrap();

        node.set_next(0, target);
        let raw = node.nexts[0].load(O::Relaxed);
        assert!(raw.is_dirty());

        let cleaned = node.next_tpo(0, &pool);
        assert!(!cleaned.is_dirty());
        assert_eq!(cleaned.offset(), target.offset());
        assert_eq!(pool.flush_count(), 1);
    }

    #[test]
    fn retire_with_no_pins_frees_immediately() {
        let pool: Pool<Node<String, String>> = Pool::new(4);
        let node = Node::with_entry("a".into(), "1".into(), 1);
        let offset = pool.alloc_persistent(node).unwrap();
        let node = pool.resolve(offset).unwrap();

        node.retire(&pool, offset);
        assert!(pool.resolve(offset).is_none());
    }

    #[test]
    fn retire_with_a_pin_defers_until_unpin() {
        let pool: Pool<Node<String, String>> = Pool::new(4);
        let node = Node::with_entry("a".into(), "1".into(), 1);
        let offset = pool.alloc_persistent(node).unwrap();
        let node = pool.resolve(offset).unwrap();

        node.pin();
        node.retire(&pool, offset);
        assert!(pool.resolve(offset).is_some(), "still pinned, must not be freed yet");

        node.unpin(&pool, offset);
        assert!(pool.resolve(offset).is_none(), "last unpin must free the retired node");
    }
}
