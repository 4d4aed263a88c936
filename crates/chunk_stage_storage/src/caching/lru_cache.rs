use crate::SmallKeyBuildHasher;

use core::hash::{BuildHasher, Hash};
use slab::Slab;
use std::collections::{hash_map, HashMap};

/// A map that tracks the Least Recently Used entry for next eviction.
///
/// For the purpose of fast, repeated random access, LRU order is only updated on insertion or by calling `touch`.
///
/// Eviction does not happen inline; the owner walks `iter_lru` and calls `remove` on the entries that are safe
/// to evict. Thus the cache may grow unbounded unless removals occur.
#[derive(Clone, Debug)]
pub struct LruCache<K, V, H = SmallKeyBuildHasher> {
    store: HashMap<K, (V, usize), H>,
    order: LruList<K>,
}

impl<K, V, H> Default for LruCache<K, V, H>
where
    H: Default,
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, H> LruCache<K, V, H>
where
    K: Hash + Eq,
{
    pub fn with_hasher(hasher_builder: H) -> Self {
        LruCache {
            store: HashMap::with_hasher(hasher_builder),
            order: LruList::default(),
        }
    }
}

impl<K, V, H> LruCache<K, V, H>
where
    K: Hash + Eq + Clone,
    H: BuildHasher,
{
    /// Borrow the value for `key`. This will not update the LRU order.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.store.get(key).map(|(val, _)| val)
    }

    /// Inserts `new_val` for `key`, returning the old value if it exists. `key` becomes the most recently used.
    #[inline]
    pub fn insert(&mut self, key: K, new_val: V) -> Option<V> {
        let Self { store, order } = self;
        match store.entry(key) {
            hash_map::Entry::Occupied(occupied) => {
                let (old_val, i) = occupied.into_mut();
                order.move_to_front(*i);

                Some(std::mem::replace(old_val, new_val))
            }
            hash_map::Entry::Vacant(vacant) => {
                let i = order.push_front(vacant.key().clone());
                vacant.insert((new_val, i));

                None
            }
        }
    }

    /// Marks `key` as most recently used. Returns `false` iff there is no entry.
    #[inline]
    pub fn touch(&mut self, key: &K) -> bool {
        let Self { store, order } = self;
        match store.get(key) {
            Some((_, i)) => {
                order.move_to_front(*i);

                true
            }
            None => false,
        }
    }

    /// Removes any trace of `key`.
    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.store.remove(key).map(|(val, i)| {
            self.order.remove(i);

            val
        })
    }

    /// Iterate over entries from least to most recently used.
    #[inline]
    pub fn iter_lru(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order
            .iter_from_back()
            .filter_map(move |key| self.store.get_key_value(key).map(|(k, (v, _))| (k, v)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Doubly-linked list of keys with nodes in a `Slab`. The front is the most recently used.
#[derive(Clone, Debug)]
struct LruList<T> {
    nodes: Slab<ListNode<T>>,
    front: Option<usize>,
    back: Option<usize>,
}

#[derive(Clone, Debug)]
struct ListNode<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<T> Default for LruList<T> {
    fn default() -> Self {
        Self {
            nodes: Slab::new(),
            front: None,
            back: None,
        }
    }
}

impl<T> LruList<T> {
    fn unlink(&mut self, index: usize) {
        let ListNode { prev, next, .. } = self.nodes[index];
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.front = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.back = prev,
        }
    }

    fn link_front(&mut self, index: usize) {
        let old_front = self.front;
        {
            let node = &mut self.nodes[index];
            node.prev = None;
            node.next = old_front;
        }
        match old_front {
            Some(f) => self.nodes[f].prev = Some(index),
            None => self.back = Some(index),
        }
        self.front = Some(index);
    }

    fn move_to_front(&mut self, index: usize) {
        if self.front == Some(index) {
            return;
        }
        self.unlink(index);
        self.link_front(index);
    }

    fn push_front(&mut self, value: T) -> usize {
        let index = self.nodes.insert(ListNode {
            value,
            prev: None,
            next: None,
        });
        self.link_front(index);

        index
    }

    fn remove(&mut self, index: usize) -> T {
        self.unlink(index);

        self.nodes.remove(index).value
    }

    fn iter_from_back(&self) -> impl Iterator<Item = &T> + '_ {
        let mut cursor = self.back;
        std::iter::from_fn(move || {
            let node = &self.nodes[cursor?];
            cursor = node.prev;

            Some(&node.value)
        })
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
