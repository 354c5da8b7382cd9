//! Typed index arenas for the compiler.
//!
//! Syntax nodes, semantic entities and type references live in vectors and
//! refer to each other through small `u32` handles. Back-references (child to
//! parent) are plain handles too, so the structures can be mutated while they
//! are being built without any lifetime entanglement.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A handle type usable as an arena index.
pub trait ArenaIndex: Copy + Eq {
    fn from_usize(index: usize) -> Self;
    fn index(self) -> usize;
}

/// Declare a `u32` newtype handle implementing [`ArenaIndex`].
#[macro_export]
macro_rules! define_index {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(pub u32);

        impl $crate::arena::ArenaIndex for $name {
            #[inline]
            fn from_usize(index: usize) -> Self {
                debug_assert!(index <= u32::MAX as usize);
                Self(index as u32)
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

/// An append-only arena of `T` addressed by `I`.
///
/// Values are never removed; handles stay valid for the arena's lifetime.
pub struct Arena<I, T> {
    items: Vec<T>,
    _marker: PhantomData<fn() -> I>,
}

impl<I: ArenaIndex, T> Arena<I, T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Create an arena with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Allocate a value and return its handle.
    #[inline]
    pub fn alloc(&mut self, value: T) -> I {
        let id = I::from_usize(self.items.len());
        self.items.push(value);
        id
    }

    /// The handle the next allocation will receive.
    #[inline]
    pub fn next_index(&self) -> I {
        I::from_usize(self.items.len())
    }

    #[inline]
    pub fn get(&self, id: I) -> Option<&T> {
        self.items.get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.items.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over `(handle, value)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (I::from_usize(i), v))
    }

    /// Iterate over all handles in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        (0..self.items.len()).map(I::from_usize)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }
}

impl<I: ArenaIndex, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaIndex, T: Clone> Clone for Arena<I, T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            _marker: PhantomData,
        }
    }
}

impl<I: ArenaIndex, T: fmt::Debug> fmt::Debug for Arena<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<I: ArenaIndex, T> Index<I> for Arena<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, id: I) -> &T {
        &self.items[id.index()]
    }
}

impl<I: ArenaIndex, T> IndexMut<I> for Arena<I, T> {
    #[inline]
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_index! {
        struct TestId;
    }

    #[test]
    fn test_alloc_and_index() {
        let mut arena: Arena<TestId, &str> = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!(a, TestId(0));
        assert_eq!(b, TestId(1));
        assert_eq!(arena[b], "b");
        assert_eq!(arena.next_index(), TestId(2));
    }

    #[test]
    fn test_iter_preserves_order() {
        let mut arena: Arena<TestId, u32> = Arena::new();
        for i in 0..4 {
            arena.alloc(i * 10);
        }
        let collected: Vec<_> = arena.iter().map(|(id, v)| (id.0, *v)).collect();
        assert_eq!(collected, vec![(0, 0), (1, 10), (2, 20), (3, 30)]);
    }

    #[test]
    fn test_get_out_of_range() {
        let arena: Arena<TestId, u8> = Arena::new();
        assert!(arena.get(TestId(3)).is_none());
    }
}
