//! Bump arena for per-line text
//!
//! An [`Arena`] owns a fixed-size byte buffer and hands out consecutive
//! ranges of it. Nothing is freed individually: [`Arena::reset`] empties
//! the whole arena in O(1) so the next line can reuse the memory.
//!
//! Allocations are returned as [`ArenaSlice`] handles tagged with the
//! arena's generation. Every reset bumps the generation, so resolving a
//! handle that outlived a reset fails with [`ArenaError::StaleHandle`]
//! instead of silently reading the next line's text.

use crate::config::LexerConfig;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error(
        "arena ran out of memory: requested {requested} bytes, \
         {used} of {capacity} bytes already used"
    )]
    Exhausted {
        requested: usize,
        capacity: usize,
        used: usize,
    },
    #[error("arena slice from generation {slice} used after reset (arena is at generation {arena})")]
    StaleHandle { slice: u64, arena: u64 },
    #[error("arena slice {offset}..{end} was not allocated by this arena ({used} bytes in use)")]
    ForeignHandle { offset: usize, end: usize, used: usize },
}

/// Handle to a range of bytes allocated from an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaSlice {
    offset: usize,
    len: usize,
    generation: u64,
}

impl ArenaSlice {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// A fixed-capacity bump allocator
#[derive(Debug)]
pub struct Arena {
    memory: Box<[u8]>,
    used: usize,
    generation: u64,
}

impl Arena {
    /// Creates an arena controlling `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            memory: vec![0; capacity].into_boxed_slice(),
            used: 0,
            generation: 0,
        }
    }

    /// Creates an arena large enough for any line accepted by `config`
    pub fn for_lines(config: &LexerConfig) -> Self {
        Self::with_capacity(config.arena_capacity())
    }

    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.used
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reserves the next `size` bytes
    pub fn allocate(&mut self, size: usize) -> Result<ArenaSlice, ArenaError> {
        if size > self.remaining() {
            return Err(ArenaError::Exhausted {
                requested: size,
                capacity: self.capacity(),
                used: self.used,
            });
        }

        let slice = ArenaSlice {
            offset: self.used,
            len: size,
            generation: self.generation,
        };
        self.used += size;
        Ok(slice)
    }

    /// Allocates room for `bytes` and copies them in
    pub fn copy_from(&mut self, bytes: &[u8]) -> Result<ArenaSlice, ArenaError> {
        let slice = self.allocate(bytes.len())?;
        self.memory[slice.offset..slice.end()].copy_from_slice(bytes);
        Ok(slice)
    }

    /// Resolves a handle to its bytes
    pub fn get(&self, slice: ArenaSlice) -> Result<&[u8], ArenaError> {
        self.check(slice)?;
        Ok(&self.memory[slice.offset..slice.end()])
    }

    pub fn get_mut(&mut self, slice: ArenaSlice) -> Result<&mut [u8], ArenaError> {
        self.check(slice)?;
        Ok(&mut self.memory[slice.offset..slice.end()])
    }

    /// Empties the arena and invalidates every handle issued so far
    pub fn reset(&mut self) {
        tracing::trace!(used = self.used, generation = self.generation, "arena reset");
        self.used = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    fn check(&self, slice: ArenaSlice) -> Result<(), ArenaError> {
        if slice.generation != self.generation {
            return Err(ArenaError::StaleHandle {
                slice: slice.generation,
                arena: self.generation,
            });
        }
        if slice.end() > self.used {
            return Err(ArenaError::ForeignHandle {
                offset: slice.offset,
                end: slice.end(),
                used: self.used,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_allocations_are_consecutive() {
        let mut arena = Arena::with_capacity(16);
        let first = arena.allocate(4).unwrap();
        let second = arena.allocate(6).unwrap();

        assert_eq!(first.offset(), 0);
        assert_eq!(first.len(), 4);
        assert_eq!(second.offset(), 4);
        assert_eq!(arena.used(), 10);
        assert_eq!(arena.remaining(), 6);
    }

    #[test]
    fn test_exhaustion() {
        let mut arena = Arena::with_capacity(8);
        arena.allocate(5).unwrap();

        assert_eq!(
            arena.allocate(4),
            Err(ArenaError::Exhausted {
                requested: 4,
                capacity: 8,
                used: 5
            })
        );
        // A failed allocation does not consume anything
        assert_eq!(arena.used(), 5);
        assert!(arena.allocate(3).is_ok());
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn test_zero_capacity() {
        let mut arena = Arena::with_capacity(0);
        assert!(arena.allocate(0).is_ok());
        assert!(arena.allocate(1).is_err());
    }

    #[test]
    fn test_copy_from() {
        let mut arena = Arena::with_capacity(32);
        let slice = arena.copy_from("vector的".as_bytes()).unwrap();
        assert_eq!(arena.get(slice).unwrap(), "vector的".as_bytes());
    }

    #[test]
    fn test_reset_invalidates_handles() {
        let mut arena = Arena::with_capacity(8);
        let old = arena.copy_from(b"give").unwrap();
        arena.reset();

        assert_eq!(arena.used(), 0);
        assert_eq!(arena.generation(), 1);
        assert_eq!(
            arena.get(old),
            Err(ArenaError::StaleHandle { slice: 0, arena: 1 })
        );

        let fresh = arena.copy_from(b"take").unwrap();
        assert_eq!(fresh.offset(), old.offset());
        assert_eq!(arena.get(fresh).unwrap(), b"take");
    }

    #[test]
    fn test_foreign_handle() {
        let mut big = Arena::with_capacity(16);
        let small = Arena::with_capacity(16);
        let slice = big.allocate(8).unwrap();

        assert!(matches!(
            small.get(slice),
            Err(ArenaError::ForeignHandle { end: 8, used: 0, .. })
        ));
    }

    #[test]
    fn test_get_mut_writes_through() {
        let mut arena = Arena::with_capacity(4);
        let slice = arena.allocate(2).unwrap();
        arena.get_mut(slice).unwrap().copy_from_slice(b"ok");
        assert_eq!(arena.get(slice).unwrap(), b"ok");
    }
}
