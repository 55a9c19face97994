//! Slot arena with stable generational keys.

use crate::NIL;

/// A stable handle to an arena slot.
///
/// Keys carry the slot's generation at allocation time. Once the slot is
/// removed and recycled, old keys stop matching and every arena operation
/// treats them as "not found". This is what makes handing keys across
/// threads safe without reference counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Key {
    /// Returns the raw slot index. Only meaningful for diagnostics.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Link state of an occupied slot.
///
/// `Detached` replaces the classic self-link sentinel: a node that is in no
/// list says so explicitly, and [`LinkList::push_back`](crate::LinkList::push_back)
/// refuses nodes that are already linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    /// Not a member of any list.
    Detached,
    /// Tail of a list.
    End,
    /// Linked to the slot at this index.
    To(u32),
}

#[derive(Debug)]
enum SlotState<T> {
    Vacant { next_free: u32 },
    Occupied { value: T, link: Link },
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    state: SlotState<T>,
}

/// A slab of reusable slots with an internal free list.
///
/// Vacant slots form a singly-linked free list, so `insert` and `remove`
/// are O(1) and allocation-free while spare capacity remains. The arena
/// grows on demand when the free list is exhausted.
#[derive(Debug, Default)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: u32,
    occupied: usize,
}

impl<T> Arena<T> {
    /// Creates an empty arena with no reserved slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: NIL,
            occupied: 0,
        }
    }

    /// Creates an arena with `capacity` pre-allocated vacant slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = Self::new();
        arena.reserve(capacity);
        arena
    }

    /// Adds `additional` vacant slots to the free list.
    ///
    /// This is the bulk provisioning call: after reserving, that many
    /// inserts are guaranteed not to allocate.
    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
        for _ in 0..additional {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                state: SlotState::Vacant {
                    next_free: self.free_head,
                },
            });
            self.free_head = index;
        }
    }

    /// Returns the total number of slots, vacant or occupied.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns `true` if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Returns the number of vacant slots available without growing.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.len() - self.occupied
    }

    /// Inserts a value, reusing a free slot when one exists.
    ///
    /// Grows the arena when the free list is empty.
    pub fn insert(&mut self, value: T) -> Key {
        let index = if self.free_head != NIL {
            let index = self.free_head;
            match self.slots[index as usize].state {
                SlotState::Vacant { next_free } => self.free_head = next_free,
                SlotState::Occupied { .. } => {
                    panic!("arena free list points at an occupied slot; arena is corrupt")
                }
            }
            self.slots[index as usize].state = SlotState::Occupied {
                value,
                link: Link::Detached,
            };
            index
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                state: SlotState::Occupied {
                    value,
                    link: Link::Detached,
                },
            });
            index
        };

        self.occupied += 1;
        Key {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Removes the value behind `key`, recycling its slot.
    ///
    /// Returns `None` if the key is stale or the slot is vacant. Panics if
    /// the node is still linked into a list; callers must detach first,
    /// otherwise that list would be left pointing at a recycled slot.
    pub fn remove(&mut self, key: Key) -> Option<T> {
        if !self.contains(key) {
            return None;
        }
        let slot = &mut self.slots[key.index as usize];
        let state = std::mem::replace(
            &mut slot.state,
            SlotState::Vacant {
                next_free: self.free_head,
            },
        );
        match state {
            SlotState::Occupied { value, link } => {
                assert_eq!(
                    link,
                    Link::Detached,
                    "removing a node that is still linked into a list"
                );
                slot.generation = slot.generation.wrapping_add(1);
                self.free_head = key.index;
                self.occupied -= 1;
                Some(value)
            }
            SlotState::Vacant { .. } => None,
        }
    }

    /// Returns `true` if `key` still refers to a live value.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        match self.slots.get(key.index as usize) {
            Some(slot) => {
                slot.generation == key.generation
                    && matches!(slot.state, SlotState::Occupied { .. })
            }
            None => false,
        }
    }

    /// Returns a reference to the value behind `key`, if live.
    #[must_use]
    pub fn get(&self, key: Key) -> Option<&T> {
        if !self.contains(key) {
            return None;
        }
        match &self.slots[key.index as usize].state {
            SlotState::Occupied { value, .. } => Some(value),
            SlotState::Vacant { .. } => None,
        }
    }

    /// Returns a mutable reference to the value behind `key`, if live.
    pub fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        if !self.contains(key) {
            return None;
        }
        match &mut self.slots[key.index as usize].state {
            SlotState::Occupied { value, .. } => Some(value),
            SlotState::Vacant { .. } => None,
        }
    }

    /// Reads the link of the occupied slot at `index`.
    pub(crate) fn link(&self, index: u32) -> Link {
        match &self.slots[index as usize].state {
            SlotState::Occupied { link, .. } => *link,
            SlotState::Vacant { .. } => {
                panic!("list walk reached a vacant slot; list is corrupt")
            }
        }
    }

    /// Writes the link of the occupied slot at `index`.
    pub(crate) fn set_link(&mut self, index: u32, link: Link) {
        match &mut self.slots[index as usize].state {
            SlotState::Occupied { link: slot, .. } => *slot = link,
            SlotState::Vacant { .. } => {
                panic!("list walk reached a vacant slot; list is corrupt")
            }
        }
    }

    /// Reads the value of the occupied slot at `index`.
    pub(crate) fn value(&self, index: u32) -> &T {
        match &self.slots[index as usize].state {
            SlotState::Occupied { value, .. } => value,
            SlotState::Vacant { .. } => {
                panic!("list walk reached a vacant slot; list is corrupt")
            }
        }
    }

    /// Rebuilds the key for the occupied slot at `index`.
    pub(crate) fn key_of(&self, index: u32) -> Key {
        Key {
            index,
            generation: self.slots[index as usize].generation,
        }
    }
}
