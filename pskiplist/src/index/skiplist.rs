//! The skip list container

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pskiplist_core::{KeyComparator, OrdComparator, Result};
use pskiplist_pmem::{transaction, AtomicTaggedOffset, Pool, PoolHandle, TaggedOffset};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::config::Config;
use crate::index::iter::Iter;
use crate::index::node::Node;

type NodeRef<K, V> = (TaggedOffset, Arc<Node<K, V>>);

/// Per-level predecessors and the `find_le` result.
pub(crate) struct FindResult<K, V> {
    pub(crate) offset: TaggedOffset,
    pub(crate) node: Arc<Node<K, V>>,
    pub(crate) found: bool,
    pub(crate) pre: Vec<NodeRef<K, V>>,
}

/// A persistent, concurrent skip list ordering keys of type `K`.
///
/// Every public operation starts with [`SkipList::find_le`], a top-down
/// probabilistic descent that records per-level predecessors, then
/// mutates or returns. See the crate documentation for the architecture.
pub struct SkipList<K, V, C = OrdComparator<K>> {
    pool: Pool<Node<K, V>>,
    head_offset: AtomicTaggedOffset,
    tail_offset: TaggedOffset,
    size: AtomicUsize,
    comparator: C,
    rng: Mutex<StdRng>,
    config: Config,
}

impl<K, V> SkipList<K, V, OrdComparator<K>>
where
    K: Ord + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates an empty skip list ordered by `K`'s `Ord` implementation.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_comparator(config, OrdComparator::default())
    }
}

impl<K, V, C> SkipList<K, V, C>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    C: KeyComparator<K>,
{
    /// Creates an empty skip list ordered by the given comparator.
    pub fn with_comparator(config: Config, comparator: C) -> Result<Self> {
        config.validate();
        let pool: Pool<Node<K, V>> = Pool::new(config.pool_capacity);

        let (head_offset, tail_offset) = transaction::run(&pool, |tx| {
            let tail_offset = tx.alloc(Node::sentinel(0))?;

            let head = Node::sentinel(config.max_height);
            for level in 0..config.max_height as usize {
                head.set_next(level, tail_offset);
            }
            let head_offset = tx.alloc(head)?;

            Ok((head_offset, tail_offset))
        })?;

        Ok(SkipList {
            pool,
            head_offset: AtomicTaggedOffset::new(head_offset),
            tail_offset,
            size: AtomicUsize::new(0),
            comparator,
            rng: Mutex::new(StdRng::from_entropy()),
            config,
        })
    }

    /// Number of non-sentinel nodes reachable at level 0.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// True if the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn head(&self) -> NodeRef<K, V> {
        let offset = self.head_offset.load(Ordering::Relaxed);
        let node = self
            .pool
            .resolve(offset)
            .expect("head node missing from pool");
        (offset, node)
    }

    fn random_height(&self) -> u8 {
        let mut height = 1;
        let mut rng = self.rng.lock();
        while height < self.config.max_height && rng.gen_ratio(1, self.config.branching_factor) {
            height += 1;
        }
        height
    }

    /// Top-down descent: returns the greatest node `<= key` (or
    /// head if none) together with the per-level predecessor chain.
    pub(crate) fn find_le(&self, key: &K) -> FindResult<K, V> {
        let (head_offset, head) = self.head();
        let height = self.config.max_height as usize;
        let mut pre: Vec<Option<NodeRef<K, V>>> = (0..height).map(|_| None).collect();

        let mut node_offset = head_offset;
        let mut node = head;
        let mut level = height - 1;

        loop {
            let next_tpo = node.next_tpo(level, &self.pool);
            let next_node = self
                .pool
                .resolve(next_tpo)
                .expect("dangling next pointer in skip list");

            let next_is_before_key = !next_node.is_tail() && self.comparator.less(next_node.key(), key);

            if next_is_before_key {
                node_offset = next_tpo;
                node = next_node;
                continue;
            }

            pre[level] = Some((node_offset, Arc::clone(&node)));

            if level == 0 {
                // `node` only ever holds head or a key strictly less than
                // `key` (we only step into `next_node` above when it sorts
                // strictly before `key`), so equality can only show up on
                // `next_node` here.
                if !next_node.is_tail() && self.comparator.equal(next_node.key(), key) {
                    return FindResult {
                        offset: next_tpo,
                        node: next_node,
                        found: true,
                        pre: Self::unwrap_pre(pre),
                    };
                }
                return FindResult {
                    offset: node_offset,
                    node,
                    found: false,
                    pre: Self::unwrap_pre(pre),
                };
            }

            level -= 1;
        }
    }

    fn unwrap_pre(pre: Vec<Option<NodeRef<K, V>>>) -> Vec<NodeRef<K, V>> {
        pre.into_iter()
            .map(|slot| slot.expect("find_le must visit every level during descent"))
            .collect()
    }

    /// Inserts `(key, value)` if no equivalent key is present.
    ///
    /// Returns an iterator positioned at the existing or newly inserted
    /// entry, and whether an insertion actually happened. Fails only if the
    /// backing pool cannot allocate the new node.
    pub fn try_emplace(&self, key: K, value: V) -> Result<(Iter<'_, K, V, C>, bool)> {
        let result = self.find_le(&key);
        if result.found {
            return Ok((self.iter_at(result.offset, result.node), false));
        }

        let height = self.random_height();
        let new_node = Node::with_entry(key, value, height);

        let new_offset = transaction::run(&self.pool, |tx| tx.alloc(new_node))?;
        let new_node = self
            .pool
            .resolve(new_offset)
            .expect("just-allocated node missing from pool");

        for level in 0..height as usize {
            let (_, pred) = &result.pre[level];
            // Link forward first, then publish — level 0 is the
            // linearization point.
            new_node.set_next(level, pred.next_tpo(level, &self.pool));
            pred.set_next(level, new_offset);
        }

        self.size.fetch_add(1, Ordering::Relaxed);
        Ok((self.iter_at(new_offset, new_node), true))
    }

    /// Finds the entry for `key`, if present.
    pub fn find(&self, key: &K) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let result = self.find_le(key);
        if result.found {
            result.node.entry().cloned()
        } else {
            None
        }
    }

    /// Returns the entry with the smallest key `>= key`.
    pub fn lower_bound(&self, key: &K) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let result = self.find_le(key);
        if result.found {
            return result.node.entry().cloned();
        }
        let (_, pred) = &result.pre[0];
        let next = pred.next(0, &self.pool)?;
        if next.is_tail() {
            None
        } else {
            next.entry().cloned()
        }
    }

    /// Returns the entry with the smallest key strictly greater than `key`.
    pub fn upper_bound(&self, key: &K) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let result = self.find_le(key);
        let (_, pred) = &result.pre[0];
        let mut current = pred.next(0, &self.pool)?;
        loop {
            if current.is_tail() {
                return None;
            }
            if self.comparator.less(key, current.key()) {
                return current.entry().cloned();
            }
            current = current.next(0, &self.pool)?;
        }
    }

    /// Removes `key` if present. Returns `1` if a node was removed, `0`
    /// otherwise (never an error: a missing key is not a failure).
    pub fn erase(&self, key: &K) -> usize {
        let result = self.find_le(key);
        if !result.found {
            return 0;
        }

        let height = result.node.height() as usize;
        for level in (0..height).rev() {
            let (_, pred) = &result.pre[level];
            pred.set_next(level, result.node.next_tpo(level, &self.pool));
        }

        result.node.retire(&self.pool, result.offset);
        self.size.fetch_sub(1, Ordering::Relaxed);
        1
    }

    /// Returns the `(key, value)` pair at position `pos` in ascending
    /// order, or `None` if `pos >= size()`.
    pub fn get_index(&self, mut pos: usize) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let (_, head) = self.head();
        let mut current = head.next(0, &self.pool)?;
        loop {
            if current.is_tail() {
                return None;
            }
            if pos == 0 {
                return current.entry().cloned();
            }
            pos -= 1;
            current = current.next(0, &self.pool)?;
        }
    }

    /// Collects every entry with `start <= key < end` into a `Vec`, in
    /// ascending order. An ambient convenience built from `lower_bound` +
    /// forward iteration.
    pub fn range(&self, start: &K, end: &K) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let result = self.find_le(start);
        let mut out = Vec::new();
        let mut current = if result.found {
            Some(Arc::clone(&result.node))
        } else {
            let (_, pred) = &result.pre[0];
            pred.next(0, &self.pool)
        };

        while let Some(node) = current {
            if node.is_tail() {
                break;
            }
            if !self.comparator.less(node.key(), end) {
                break;
            }
            out.push(node.entry().cloned().expect("non-sentinel node"));
            current = node.next(0, &self.pool);
        }
        out
    }

    /// A forward iterator starting at the smallest key.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        let (_, head) = self.head();
        match head.next(0, &self.pool) {
            Some(first) => {
                let first_offset = head.next_tpo(0, &self.pool);
                self.iter_at(first_offset, first)
            }
            None => Iter::empty(self),
        }
    }

    fn iter_at(&self, offset: TaggedOffset, node: Arc<Node<K, V>>) -> Iter<'_, K, V, C> {
        Iter::starting_at(self, offset, node)
    }

    pub(crate) fn pool(&self) -> &Pool<Node<K, V>> {
        &self.pool
    }

    /// The backing pool's current handle (base address + stable uuid).
    pub fn pool_handle(&self) -> PoolHandle {
        self.pool.handle()
    }

    /// Simulates a process restart: the backing pool remaps to a new base
    /// address. Every previously allocated tagged offset, and therefore
    /// every key already in the list, stays resolvable afterward.
    pub fn simulate_restart(&self) -> PoolHandle {
        self.pool.simulate_restart()
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }
}
