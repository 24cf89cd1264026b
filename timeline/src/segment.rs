//! Fixed-capacity storage segments chained into an append-only list.
//!
//! A [`Segment`] is a pre-allocated block of write-once slots plus an owning
//! link to the segment that follows it. Segments never shrink, move, or lose
//! data once linked. When the last segment fills up, [`Segment::next`] links a
//! new segment twice the size, so reaching index `N` from the head visits
//! `O(log N)` segments.
//!
//! # Concurrency
//!
//! - Each slot is a [`OnceLock`] holding the `(state, timestamp)` pair. The
//!   pair is published with release semantics by its single writer and read
//!   with acquire semantics, so a reader sees either nothing or the complete
//!   pair, never half of it.
//! - The successor link is an [`AtomicPtr`] set by exactly one
//!   compare-and-set. A thread that loses the race frees its own candidate
//!   (it was never visible to anyone) and adopts the winner. No thread ever
//!   waits on another.
//!
//! # Safety
//!
//! The successor pointer is the only unsafe state in the crate. Every non-null
//! pointer stored in `next` comes from [`Box::into_raw`], is published once,
//! is never replaced, and is freed only in [`Drop`], which requires exclusive
//! access to the segment.

use std::fmt;
use std::mem;
use std::ptr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::clock::Nanos;

/// A written slot: one stamped state and its timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<T> {
    /// The stamped state.
    pub state: T,
    /// When the state was stamped, in monotonic nanoseconds.
    pub timestamp: Nanos,
}

/// A fixed-capacity block of write-once slots with a lazily created successor.
pub struct Segment<T> {
    /// Slot cells; `None` until the reserving writer publishes its pair.
    slots: Box<[OnceLock<Slot<T>>]>,
    /// Owning pointer to the next segment, or null while this is the tail.
    next: AtomicPtr<Segment<T>>,
}

impl<T> Segment<T> {
    /// Allocates a segment with `capacity` empty slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Returns the number of slots this segment holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stores a state and timestamp at `offset`.
    ///
    /// The caller must hold the exclusive right to `offset`, which the
    /// timeline's index reservation guarantees. A second write to the same
    /// slot is dropped (and trips a debug assertion); slots are never
    /// overwritten.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= self.capacity()`.
    #[inline]
    pub fn write(&self, offset: usize, state: T, timestamp: Nanos) {
        let written = self.slots[offset].set(Slot { state, timestamp });
        debug_assert!(written.is_ok(), "slot {offset} was written twice");
    }

    /// Returns the slot at `offset`, or `None` if its writer has not finished.
    ///
    /// `None` is the "not yet written" sentinel: a concurrent reader can see a
    /// reserved-but-unpublished slot below an already published one.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= self.capacity()`.
    #[inline]
    pub fn read(&self, offset: usize) -> Option<&Slot<T>> {
        self.slots[offset].get()
    }

    /// Returns the state stored at `offset`, if written.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= self.capacity()`.
    pub fn read_state(&self, offset: usize) -> Option<&T> {
        self.read(offset).map(|slot| &slot.state)
    }

    /// Returns the timestamp stored at `offset`, if written.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= self.capacity()`.
    pub fn read_timestamp(&self, offset: usize) -> Option<Nanos> {
        self.read(offset).map(|slot| slot.timestamp)
    }

    /// Returns the following segment if it has already been linked.
    ///
    /// Unlike [`next`](Self::next) this never grows the chain.
    #[inline]
    pub fn peek_next(&self) -> Option<&Segment<T>> {
        let next = self.next.load(Ordering::Acquire);
        // SAFETY: a non-null `next` was produced by `Box::into_raw` in
        // `next()`, is never replaced once set, and is only freed by `Drop`,
        // which cannot run while `&self` is alive.
        unsafe { next.as_ref() }
    }

    /// Returns the following segment, linking a new one if this is the tail.
    ///
    /// The new segment holds twice as many slots as this one. When several
    /// threads extend the same tail at once, exactly one compare-and-set wins;
    /// the others drop their unpublished candidate and return the winner.
    pub fn next(&self) -> &Segment<T> {
        if let Some(next) = self.peek_next() {
            return next;
        }

        let capacity = self.capacity().saturating_mul(2);
        let candidate = Box::into_raw(Box::new(Segment::new(capacity)));

        match self.next.compare_exchange(
            ptr::null_mut(),
            candidate,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tracing::trace!(capacity, "linked new timeline segment");
                // SAFETY: `candidate` came from `Box::into_raw` above and is
                // now owned by `self.next`, which outlives `&self`.
                unsafe { &*candidate }
            }
            Err(winner) => {
                tracing::trace!(capacity, "lost segment link race");
                // SAFETY: the exchange failed, so `candidate` was never
                // published and this thread still owns it exclusively.
                drop(unsafe { Box::from_raw(candidate) });
                // SAFETY: `winner` is the non-null pointer another thread
                // linked; same reasoning as in `peek_next`.
                unsafe { &*winner }
            }
        }
    }
}

impl<T> Drop for Segment<T> {
    fn drop(&mut self) {
        // Unlink iteratively so a long chain does not recurse through `Drop`.
        let mut next = mem::replace(self.next.get_mut(), ptr::null_mut());
        while !next.is_null() {
            // SAFETY: `next` was produced by `Box::into_raw` and has just been
            // detached from its only owner, so nobody else can reach it.
            let mut segment = unsafe { Box::from_raw(next) };
            next = mem::replace(segment.next.get_mut(), ptr::null_mut());
        }
    }
}

impl<T> fmt::Debug for Segment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("capacity", &self.capacity())
            .field("linked", &self.peek_next().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_new_segment_is_empty() {
        let segment: Segment<&str> = Segment::new(8);

        assert_eq!(segment.capacity(), 8);
        for offset in 0..8 {
            assert!(segment.read(offset).is_none());
            assert!(segment.read_state(offset).is_none());
            assert!(segment.read_timestamp(offset).is_none());
        }
        assert!(segment.peek_next().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let segment = Segment::new(4);
        segment.write(2, "parsed", 1_500);

        assert_eq!(
            segment.read(2),
            Some(&Slot {
                state: "parsed",
                timestamp: 1_500
            })
        );
        assert_eq!(segment.read_state(2), Some(&"parsed"));
        assert_eq!(segment.read_timestamp(2), Some(1_500));
        assert!(segment.read(1).is_none());
        assert!(segment.read(3).is_none());
    }

    #[test]
    fn test_slot_is_never_overwritten() {
        let segment = Segment::new(2);
        segment.write(0, 1u32, 10);

        // Release builds ignore a second write; debug builds flag it.
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            segment.write(0, 2u32, 20);
        }));
        assert!(cfg!(debug_assertions) == result.is_err());

        assert_eq!(segment.read_state(0), Some(&1));
        assert_eq!(segment.read_timestamp(0), Some(10));
    }

    #[test]
    #[should_panic]
    fn test_write_out_of_bounds_panics() {
        let segment = Segment::new(2);
        segment.write(2, (), 0);
    }

    #[test]
    fn test_next_doubles_capacity() {
        let head: Segment<u8> = Segment::new(8);
        let second = head.next();
        let third = second.next();

        assert_eq!(second.capacity(), 16);
        assert_eq!(third.capacity(), 32);
        assert!(head.peek_next().is_some());
    }

    #[test]
    fn test_next_is_idempotent() {
        let head: Segment<u8> = Segment::new(1);
        let first = head.next();
        let again = head.next();

        assert!(ptr::eq(first, again));
        assert!(ptr::eq(head.peek_next().unwrap(), first));
    }

    #[test]
    fn test_concurrent_next_has_single_winner() {
        for _ in 0..50 {
            let head: Segment<u64> = Segment::new(4);
            let addresses: Vec<usize> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..8)
                    .map(|_| scope.spawn(|| ptr::from_ref(head.next()) as usize))
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
            assert_eq!(head.next().capacity(), 8);
        }
    }

    #[test]
    fn test_drop_releases_whole_chain() {
        struct Tracked(Arc<AtomicUsize>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicUsize::new(0));
        {
            let head = Segment::new(1);
            let mut segment = &head;
            for depth in 0..16 {
                segment.write(0, Tracked(Arc::clone(&dropped)), depth);
                segment = segment.next();
            }
        }

        assert_eq!(dropped.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_debug_does_not_require_debug_state() {
        struct Opaque;

        let head: Segment<Opaque> = Segment::new(2);
        let rendered = format!("{head:?}");
        assert!(rendered.contains("capacity: 2"));
        assert!(rendered.contains("linked: false"));
    }
}
