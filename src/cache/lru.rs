//! LRU Tracker Module
//!
//! Implements Least Recently Used ordering for capacity eviction.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency List ==
/// Tracks access order for LRU eviction.
///
/// A doubly-linked list threaded through a slab of nodes, plus a key to slot
/// index, so touching, removing and popping the oldest key are all O(1).
///
/// - Head = least recently used (next eviction candidate)
/// - Tail = most recently used
///
/// New keys are appended at the tail, so keys that were never touched again
/// leave in insertion order.
#[derive(Debug)]
pub struct RecencyList<K> {
    nodes: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K> Default for RecencyList<K> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
        }
    }
}

impl<K: Eq + Hash + Clone> RecencyList<K> {
    // == Constructor ==
    /// Creates a new empty recency list.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// Existing keys move to the tail; new keys are appended there.
    pub fn touch(&mut self, key: &K) {
        if let Some(&slot) = self.index.get(key) {
            self.unlink(slot);
            self.link_back(slot);
            return;
        }

        let node = Node {
            key: key.clone(),
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key.clone(), slot);
        self.link_back(slot);
    }

    // == Remove ==
    /// Removes a key from the list. Returns false if it was not tracked.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(slot) = self.index.remove(key) else {
            return false;
        };
        self.unlink(slot);
        self.nodes[slot] = None;
        self.free.push(slot);
        true
    }

    // == Pop LRU ==
    /// Removes and returns the least recently used key.
    pub fn pop_lru(&mut self) -> Option<K> {
        let slot = self.head?;
        self.unlink(slot);
        let node = self.nodes[slot].take()?;
        self.free.push(slot);
        self.index.remove(&node.key);
        Some(node.key)
    }

    // == Peek LRU ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_lru(&self) -> Option<&K> {
        self.head
            .and_then(|slot| self.nodes[slot].as_ref())
            .map(|node| &node.key)
    }

    /// Returns true if the key is tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.nodes[cursor?].as_ref()?;
            cursor = node.next;
            Some(&node.key)
        })
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }
}

impl<K> RecencyList<K> {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<K>> {
        self.nodes.get_mut(slot).and_then(Option::as_mut)
    }

    /// Detaches a node, patching its neighbours and the head/tail.
    fn unlink(&mut self, slot: usize) {
        let Some((prev, next)) = self.nodes[slot].as_ref().map(|node| (node.prev, node.next))
        else {
            return;
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = None;
        }
    }

    /// Appends a detached node at the tail.
    fn link_back(&mut self, slot: usize) {
        let old_tail = self.tail;
        let Some(node) = self.node_mut(slot) else {
            return;
        };
        node.prev = old_tail;
        node.next = None;
        match old_tail {
            Some(t) => {
                if let Some(tail) = self.node_mut(t) {
                    tail.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }
}
