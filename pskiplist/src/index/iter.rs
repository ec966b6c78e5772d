//! Forward iteration over a [`crate::SkipList`]

use std::sync::Arc;

use pskiplist_pmem::TaggedOffset;

use crate::index::node::Node;
use crate::index::skiplist::SkipList;

/// A forward iterator over `(key, value)` pairs in ascending order.
///
/// Holding an `Iter` pins the node it is currently positioned at, so a
/// concurrent `erase` of that key defers physical reclamation until the
/// iterator advances past it or is dropped.
pub struct Iter<'a, K, V, C> {
    list: &'a SkipList<K, V, C>,
    current: Option<(TaggedOffset, Arc<Node<K, V>>)>,
}

impl<'a, K, V, C> Iter<'a, K, V, C>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub(crate) fn starting_at(list: &'a SkipList<K, V, C>, offset: TaggedOffset, node: Arc<Node<K, V>>) -> Self {
        node.pin();
        Iter {
            list,
            current: Some((offset, node)),
        }
    }

    pub(crate) fn empty(list: &'a SkipList<K, V, C>) -> Self {
        Iter { list, current: None }
    }
}

impl<'a, K, V, C> Iterator for Iter<'a, K, V, C>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, node) = self.current.take()?;
        let entry = node
            .entry()
            .cloned()
            .expect("iterator positioned on a non-sentinel node");

        let pool = self.list.pool();
        let next_offset = node.next_tpo(0, pool);
        let next_node = pool.resolve(next_offset);
        node.unpin(pool, offset);

        self.current = match next_node {
            Some(next) if !next.is_tail() => {
                next.pin();
                Some((next_offset, next))
            }
            _ => None,
        };

        Some(entry)
    }
}

impl<'a, K, V, C> Drop for Iter<'a, K, V, C> {
    fn drop(&mut self) {
        if let Some((offset, node)) = self.current.take() {
            node.unpin(self.list.pool(), offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn empty_iterator_yields_nothing() {
        let list: SkipList<String, String> = SkipList::new(Config::default()).unwrap();
        assert_eq!(list.iter().count(), 0);
    }

    #[test]
    fn iterator_pins_and_unpins_as_it_advances() {
        let list: SkipList<String, String> = SkipList::new(Config::default()).unwrap();
        list.try_emplace("a".into(), "1".into()).unwrap();
        list.try_emplace("b".into(), "2".into()).unwrap();

        let mut iter = list.iter();
        let (offset_a, node_a) = iter.current.clone().expect("iterator starts positioned");
        assert_eq!(node_a.refcount(), 1);

        iter.next();
        assert_eq!(node_a.refcount(), 0);

        let (_, node_b) = iter.current.clone().expect("iterator now on b");
        assert_eq!(node_b.refcount(), 1);

        drop(iter);
        assert_eq!(node_b.refcount(), 0);
        let _ = offset_a;
    }

    #[test]
    fn dropping_iterator_midway_unpins_current_node() {
        let list: SkipList<String, String> = SkipList::new(Config::default()).unwrap();
        list.try_emplace("a".into(), "1".into()).unwrap();

        let iter = list.iter();
        let (_, node) = iter.current.clone().unwrap();
        assert_eq!(node.refcount(), 1);
        drop(iter);
        assert_eq!(node.refcount(), 0);
    }
}
