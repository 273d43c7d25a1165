//! Bounded LRU Cache
//!
//! A least-recently-used map bounded by total byte size rather than entry
//! count. Entries form a doubly linked recency list stored slab-style in a
//! `Vec`, with a `HashMap` from key to slot index for O(1) lookup. The list
//! head is the most recently used entry; eviction removes from the tail.

use std::collections::HashMap;

/// Cached values report their size so the cache can enforce its byte bound.
pub trait ByteSized {
    fn byte_len(&self) -> usize;
}

/// Callback invoked with each evicted entry, oldest first.
pub type EvictHook<V> = Box<dyn FnMut(String, V) + Send>;

/// Slot index marking "no neighbor" in the recency list.
const NIL: usize = usize::MAX;

struct Slot<V> {
    key: String,
    value: V,
    prev: usize,
    next: usize,
}

pub struct LruCache<V: ByteSized> {
    /// Maximum total bytes; 0 means unbounded.
    max_bytes: i64,
    used_bytes: i64,
    head: usize,
    tail: usize,
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    on_evict: Option<EvictHook<V>>,
}

impl<V: ByteSized> LruCache<V> {
    pub fn new(max_bytes: i64, on_evict: Option<EvictHook<V>>) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            head: NIL,
            tail: NIL,
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            on_evict,
        }
    }

    /// Looks up a key and promotes it to most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.attach_front(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Inserts or replaces a value, then evicts from the tail until the
    /// byte bound holds again. An entry whose size alone exceeds the bound
    /// evicts everything else and remains; callers that need strict
    /// enforcement must not insert values larger than `max_bytes`.
    pub fn insert(&mut self, key: &str, value: V) {
        if let Some(&idx) = self.index.get(key) {
            self.detach(idx);
            self.attach_front(idx);
            if let Some(slot) = self.slots[idx].as_mut() {
                self.used_bytes += value.byte_len() as i64 - slot.value.byte_len() as i64;
                slot.value = value;
            }
        } else {
            self.used_bytes += key.len() as i64 + value.byte_len() as i64;
            let slot = Slot {
                key: key.to_owned(),
                value,
                prev: NIL,
                next: NIL,
            };
            let idx = match self.free.pop() {
                Some(idx) => {
                    self.slots[idx] = Some(slot);
                    idx
                }
                None => {
                    self.slots.push(Some(slot));
                    self.slots.len() - 1
                }
            };
            self.index.insert(key.to_owned(), idx);
            self.attach_front(idx);
        }

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes && self.index.len() > 1 {
            self.remove_oldest();
        }
    }

    /// Evicts the least recently used entry, firing the eviction hook.
    pub fn remove_oldest(&mut self) {
        let idx = self.tail;
        if idx == NIL {
            return;
        }
        self.detach(idx);
        if let Some(slot) = self.slots[idx].take() {
            self.free.push(idx);
            self.index.remove(&slot.key);
            self.used_bytes -= slot.key.len() as i64 + slot.value.byte_len() as i64;
            if let Some(hook) = self.on_evict.as_mut() {
                hook(slot.key, slot.value);
            }
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total bytes currently accounted for (keys plus values).
    pub fn used_bytes(&self) -> i64 {
        self.used_bytes
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(slot) => (slot.prev, slot.next),
            None => return,
        };
        match prev {
            NIL => self.head = next,
            p => {
                if let Some(slot) = self.slots[p].as_mut() {
                    slot.next = next;
                }
            }
        }
        match next {
            NIL => self.tail = prev,
            n => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.prev = prev;
                }
            }
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = NIL;
            slot.next = old_head;
        }
        if old_head != NIL {
            if let Some(slot) = self.slots[old_head].as_mut() {
                slot.prev = idx;
            }
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }
}
