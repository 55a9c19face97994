//! Insertion-ordered list over arena slots.

use crate::arena::{Arena, Key, Link};
use crate::NIL;
use std::cmp::Ordering;
use std::ops::ControlFlow;

/// An insertion-ordered list whose links live inside an [`Arena`].
///
/// The list itself only stores head and tail indices; every operation takes
/// the arena explicitly. Several lists can share one arena and nodes move
/// between them without touching the values.
///
/// Pushing and popping at the ends is O(1). Removing an arbitrary node and
/// computing the length are O(n) because the links are singly-linked; both
/// walks carry a corruption ceiling: a walk that visits more nodes than
/// the arena has slots can only mean a link cycle, and the list panics
/// rather than spin forever on corrupt state.
#[derive(Debug, Clone, Copy)]
pub struct LinkList {
    head: u32,
    tail: u32,
}

impl Default for LinkList {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head: NIL,
            tail: NIL,
        }
    }

    /// Returns `true` if the list has no nodes. O(1).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head == NIL
    }

    /// Counts the nodes by walking the links. O(n).
    #[must_use]
    pub fn len<T>(&self, arena: &Arena<T>) -> usize {
        let mut count = 0;
        let mut cursor = self.head;
        while cursor != NIL {
            count += 1;
            self.check_walk(arena, count);
            cursor = match arena.link(cursor) {
                Link::To(next) => next,
                Link::End => NIL,
                Link::Detached => panic!("linked node carries a detached link; list is corrupt"),
            };
        }
        count
    }

    /// Appends the node behind `key` to the back of the list. O(1).
    ///
    /// Panics if the key is stale or the node is already linked into a
    /// list; membership is exclusive and linking twice would corrupt both
    /// lists.
    pub fn push_back<T>(&mut self, arena: &mut Arena<T>, key: Key) {
        assert!(arena.contains(key), "push_back with a stale key");
        assert_eq!(
            arena.link(key.index),
            Link::Detached,
            "push_back with a node that is already linked"
        );

        arena.set_link(key.index, Link::End);
        if self.tail == NIL {
            self.head = key.index;
        } else {
            arena.set_link(self.tail, Link::To(key.index));
        }
        self.tail = key.index;
    }

    /// Removes and returns the front node's key, or `None` if empty. O(1).
    ///
    /// The node stays live in the arena; it is merely detached.
    pub fn pop_front<T>(&mut self, arena: &mut Arena<T>) -> Option<Key> {
        if self.head == NIL {
            return None;
        }
        let index = self.head;
        match arena.link(index) {
            Link::To(next) => self.head = next,
            Link::End => {
                self.head = NIL;
                self.tail = NIL;
            }
            Link::Detached => panic!("linked node carries a detached link; list is corrupt"),
        }
        arena.set_link(index, Link::Detached);
        Some(arena.key_of(index))
    }

    /// Detaches the node behind `key` from wherever it sits in this list.
    ///
    /// Returns `true` if the node was found and removed. O(n): the walk
    /// starts from the head to find the predecessor.
    pub fn unlist<T>(&mut self, arena: &mut Arena<T>, key: Key) -> bool {
        if !arena.contains(key) {
            return false;
        }

        let mut prev = NIL;
        let mut cursor = self.head;
        let mut steps = 0;
        while cursor != NIL {
            steps += 1;
            self.check_walk(arena, steps);

            let next = match arena.link(cursor) {
                Link::To(next) => next,
                Link::End => NIL,
                Link::Detached => panic!("linked node carries a detached link; list is corrupt"),
            };

            if cursor == key.index {
                if prev == NIL {
                    self.head = next;
                } else if next == NIL {
                    arena.set_link(prev, Link::End);
                } else {
                    arena.set_link(prev, Link::To(next));
                }
                if self.tail == cursor {
                    self.tail = prev;
                }
                if self.head == NIL {
                    self.tail = NIL;
                }
                arena.set_link(cursor, Link::Detached);
                return true;
            }

            prev = cursor;
            cursor = next;
        }
        false
    }

    /// Inserts the node behind `key` keeping the order established by
    /// `compare`.
    ///
    /// Walks from the head and inserts before the first node that compares
    /// strictly greater than the new one; appends otherwise, so equal nodes
    /// preserve insertion order. The list must already be sorted under the
    /// same comparator; sorted insertion only maintains order, it does not
    /// establish it.
    pub fn sorted_insert<T>(
        &mut self,
        arena: &mut Arena<T>,
        key: Key,
        compare: impl Fn(&T, &T) -> Ordering,
    ) {
        assert!(arena.contains(key), "sorted_insert with a stale key");
        assert_eq!(
            arena.link(key.index),
            Link::Detached,
            "sorted_insert with a node that is already linked"
        );

        let mut prev = NIL;
        let mut cursor = self.head;
        let mut steps = 0;
        while cursor != NIL {
            steps += 1;
            self.check_walk(arena, steps);

            if compare(arena.value(cursor), arena.value(key.index)) == Ordering::Greater {
                arena.set_link(key.index, Link::To(cursor));
                if prev == NIL {
                    self.head = key.index;
                } else {
                    arena.set_link(prev, Link::To(key.index));
                }
                return;
            }

            prev = cursor;
            cursor = match arena.link(cursor) {
                Link::To(next) => next,
                Link::End => NIL,
                Link::Detached => panic!("linked node carries a detached link; list is corrupt"),
            };
        }

        self.push_back(arena, key);
    }

    /// Visits each node in order.
    ///
    /// The callback may return [`ControlFlow::Break`] to stop early. Calling
    /// on an empty list is a no-op.
    pub fn for_each<T>(
        &self,
        arena: &Arena<T>,
        mut visit: impl FnMut(Key, &T) -> ControlFlow<()>,
    ) {
        let mut cursor = self.head;
        let mut steps = 0;
        while cursor != NIL {
            steps += 1;
            self.check_walk(arena, steps);

            if visit(arena.key_of(cursor), arena.value(cursor)).is_break() {
                return;
            }
            cursor = match arena.link(cursor) {
                Link::To(next) => next,
                Link::End => NIL,
                Link::Detached => panic!("linked node carries a detached link; list is corrupt"),
            };
        }
    }

    /// Repeatedly pops the front node, removes it from the arena, and hands
    /// the owned value to `consume` until the list is empty.
    ///
    /// Each node is fully detached and removed before `consume` runs, so no
    /// list or arena state is mid-mutation while the callback executes. The
    /// usual pattern is to move nodes out of a lock-protected list first and
    /// drain the detached copy after the lock is released.
    pub fn drain<T>(&mut self, arena: &mut Arena<T>, mut consume: impl FnMut(T)) {
        while let Some(key) = self.pop_front(arena) {
            if let Some(value) = arena.remove(key) {
                consume(value);
            }
        }
    }

    fn check_walk<T>(&self, arena: &Arena<T>, steps: usize) {
        assert!(
            steps <= arena.slot_count(),
            "list walk exceeded {} arena slots; the links form a cycle",
            arena.slot_count()
        );
    }
}
