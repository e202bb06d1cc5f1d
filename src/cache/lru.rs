//! Recency List Module
//!
//! Implements Least Recently Used ordering for cache eviction.
//!
//! Entries live in a `Vec` arena and are chained by index into a doubly linked
//! list, which keeps every operation O(1) without unsafe pointers.

use crate::cache::Entry;

/// Null link.
const NIL: usize = usize::MAX;

// == Handle ==
/// Opaque position of an entry inside a [`RecencyList`].
///
/// A handle stays valid until its entry is removed; the slot may then be
/// reused for a later entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

#[derive(Debug)]
struct Node<K, V> {
    /// None while the slot sits on the free list
    entry: Option<Entry<K, V>>,
    prev: usize,
    next: usize,
}

// == Recency List ==
/// Entries ordered by access time.
///
/// - Head = Most recently used
/// - Tail = Least recently used
#[derive(Debug)]
pub struct RecencyList<K, V> {
    nodes: Vec<Node<K, V>>,
    head: usize,
    tail: usize,
    /// Recyclable slots
    free: Vec<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    // == Constructor ==
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            free: Vec::new(),
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts an entry as the most recently used one.
    pub fn push_front(&mut self, entry: Entry<K, V>) -> Handle {
        let node = Node {
            entry: Some(entry),
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.link_front(idx);
        self.len += 1;
        Handle(idx)
    }

    // == Remove ==
    /// Unlinks the entry at `handle` and hands it back.
    ///
    /// Returns None if the handle does not point at a live entry.
    pub fn remove(&mut self, handle: Handle) -> Option<Entry<K, V>> {
        let idx = handle.0;
        let entry = self.nodes.get_mut(idx)?.entry.take()?;
        self.unlink(idx);
        self.free.push(idx);
        self.len -= 1;
        Some(entry)
    }

    // == Move To Front ==
    /// Marks the entry at `handle` as most recently used.
    pub fn move_to_front(&mut self, handle: Handle) {
        let idx = handle.0;
        if self.head == idx || self.get(handle).is_none() {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    // == Replace ==
    /// Swaps the entry stored at `handle`, keeping its position.
    ///
    /// Returns the previous entry, or None (and drops `entry`) if the handle
    /// is not live.
    pub fn replace(&mut self, handle: Handle, entry: Entry<K, V>) -> Option<Entry<K, V>> {
        let slot = &mut self.nodes.get_mut(handle.0)?.entry;
        if slot.is_none() {
            return None;
        }
        slot.replace(entry)
    }

    pub fn get(&self, handle: Handle) -> Option<&Entry<K, V>> {
        self.nodes.get(handle.0)?.entry.as_ref()
    }

    /// Returns the most recently used entry.
    pub fn front(&self) -> Option<&Entry<K, V>> {
        self.get(Handle(self.head))
    }

    // == Peek Back ==
    /// Returns the least recently used entry without removing it.
    pub fn back(&self) -> Option<&Entry<K, V>> {
        self.get(Handle(self.tail))
    }

    // == Pop Back ==
    /// Returns and removes the least recently used entry.
    ///
    /// Returns None if the list is empty.
    pub fn pop_back(&mut self) -> Option<Entry<K, V>> {
        self.remove(Handle(self.tail))
    }

    /// Drops every entry and releases the arena.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[idx];
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            self.nodes[old_head].prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = &self.nodes[idx];
            (node.prev, node.next)
        };
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
        let node = &mut self.nodes[idx];
        node.prev = NIL;
        node.next = NIL;
    }
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Iterator ==
/// Iterator over `(Handle, &Entry)` pairs, head to tail.
pub struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Handle, &'a Entry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.nodes.get(self.cursor)?;
        let handle = Handle(self.cursor);
        self.cursor = node.next;
        node.entry.as_ref().map(|entry| (handle, entry))
    }
}
