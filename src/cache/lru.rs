//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::HashMap;
use std::hash::Hash;

/// Sentinel index for "no neighbour"
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: usize,
    next: usize,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// A doubly-linked list threaded through a slab of nodes, indexed by key:
/// - head = Most recently used
/// - tail = Least recently used
///
/// `touch`, `remove` and `evict_oldest` are all O(1).
#[derive(Debug)]
pub struct LruTracker<K> {
    nodes: Vec<Node<K>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: usize,
    tail: usize,
}

impl<K: Hash + Eq + Clone> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to head).
    ///
    /// If key is new, allocates a node for it at the head.
    pub fn touch(&mut self, key: &K) {
        if let Some(&idx) = self.index.get(key) {
            if self.head != idx {
                self.unlink(idx);
                self.push_front(idx);
            }
            return;
        }

        let node = Node {
            key: key.clone(),
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.index.insert(key.clone(), idx);
        self.push_front(idx);
    }

    // == Remove ==
    /// Removes a key from the tracker. Unknown keys are ignored.
    pub fn remove(&mut self, key: &K) {
        if let Some(idx) = self.index.remove(key) {
            self.unlink(idx);
            self.free.push(idx);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        let key = self.nodes[idx].key.clone();
        self.index.remove(&key);
        self.unlink(idx);
        self.free.push(idx);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        (self.tail != NIL).then(|| &self.nodes[self.tail].key)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Keys from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let node = &self.nodes[cursor];
            cursor = node.next;
            Some(&node.key)
        })
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }
}

impl<K: Hash + Eq + Clone> Default for LruTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order(lru: &LruTracker<&'static str>) -> Vec<&'static str> {
        lru.iter().copied().collect()
    }

    #[test]
    fn test_lru_new() {
        let lru: LruTracker<&str> = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_new_key() {
        let mut lru = LruTracker::new();

        lru.touch(&"key1");
        lru.touch(&"key2");
        lru.touch(&"key3");

        assert_eq!(lru.len(), 3);
        // key1 is oldest (added first)
        assert_eq!(lru.peek_oldest(), Some(&"key1"));
        assert_eq!(order(&lru), vec!["key3", "key2", "key1"]);
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch(&"key1");
        lru.touch(&"key2");
        lru.touch(&"key3");

        // Touch key1 again - should move to head
        lru.touch(&"key1");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&"key2"));
        assert_eq!(order(&lru), vec!["key1", "key3", "key2"]);
    }

    #[test]
    fn test_lru_evict_oldest() {
        let mut lru = LruTracker::new();

        lru.touch(&"key1");
        lru.touch(&"key2");
        lru.touch(&"key3");

        assert_eq!(lru.evict_oldest(), Some("key1"));
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.evict_oldest(), Some("key2"));
        assert_eq!(lru.evict_oldest(), Some("key3"));
        assert_eq!(lru.evict_oldest(), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_remove_middle_head_tail() {
        let mut lru = LruTracker::new();

        lru.touch(&"a");
        lru.touch(&"b");
        lru.touch(&"c");
        lru.touch(&"d");

        lru.remove(&"b");
        assert_eq!(order(&lru), vec!["d", "c", "a"]);
        lru.remove(&"d");
        assert_eq!(order(&lru), vec!["c", "a"]);
        lru.remove(&"a");
        assert_eq!(order(&lru), vec!["c"]);
        assert_eq!(lru.peek_oldest(), Some(&"c"));
        assert!(!lru.contains(&"b"));
    }

    #[test]
    fn test_lru_remove_nonexistent_key() {
        let mut lru = LruTracker::new();

        lru.touch(&"key1");
        lru.touch(&"key2");
        lru.remove(&"nonexistent");

        assert_eq!(lru.len(), 2);
        assert!(lru.contains(&"key1"));
        assert!(lru.contains(&"key2"));
    }

    #[test]
    fn test_lru_slots_are_reused() {
        let mut lru = LruTracker::new();

        lru.touch(&"a");
        lru.touch(&"b");
        lru.remove(&"a");
        lru.touch(&"c");

        assert_eq!(lru.nodes.len(), 2);
        assert_eq!(order(&lru), vec!["c", "b"]);
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::new();

        lru.touch(&"key1");
        lru.touch(&"key1");
        lru.touch(&"key1");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("key1"));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruTracker::new();

        lru.touch(&"a");
        lru.touch(&"b");
        lru.touch(&"c");
        lru.touch(&"a");
        lru.touch(&"c");
        lru.touch(&"b");

        assert_eq!(lru.evict_oldest(), Some("a"));
        assert_eq!(lru.evict_oldest(), Some("c"));
        assert_eq!(lru.evict_oldest(), Some("b"));
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();
        lru.touch(&1);
        lru.touch(&2);
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.evict_oldest(), None);
        lru.touch(&3);
        assert_eq!(lru.peek_oldest(), Some(&3));
    }
}
