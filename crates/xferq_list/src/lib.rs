//! # xferq List
//!
//! Arena-backed linked-list primitive for xferq queues.
//!
//! This crate provides:
//! - [`Arena`], a slab of slots with an internal free list and per-slot
//!   generation counters, handing out stable [`Key`] handles
//! - [`LinkList`], an insertion-ordered list whose links live inside the
//!   arena slots, so nodes can move between lists without reallocation
//!
//! The combination replaces a classic intrusive circular list: instead of
//! raw pointer linkage with a self-link "unlinked" sentinel, nodes are
//! addressed by index + generation and carry an explicit detached state.
//! A stale key (slot recycled since the key was issued) is simply rejected.
//!
//! Several lists may share one arena. Allocation only happens when the
//! arena grows past its reserved capacity; push/pop themselves never
//! allocate, which keeps the steady-state path allocation-free.
//!
//! ## Example
//!
//! ```rust
//! use xferq_list::{Arena, LinkList};
//!
//! let mut arena: Arena<u32> = Arena::with_capacity(8);
//! let mut pending = LinkList::new();
//! let mut done = LinkList::new();
//!
//! let key = arena.insert(7);
//! pending.push_back(&mut arena, key);
//!
//! // Move the node to another list; the key stays valid.
//! let key = pending.pop_front(&mut arena).unwrap();
//! done.push_back(&mut arena, key);
//!
//! assert!(pending.is_empty());
//! assert_eq!(done.len(&arena), 1);
//! assert_eq!(arena.get(key), Some(&7));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod arena;
mod list;

pub use arena::{Arena, Key};
pub use list::LinkList;

/// Reserved index meaning "no slot".
pub(crate) const NIL: u32 = u32::MAX;
