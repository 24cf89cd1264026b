//! The wait-free stamped-state timeline.
//!
//! A [`Timeline`] records the states one unit of work passes through (a
//! request, a job, a connection) together with a monotonic timestamp for each,
//! so elapsed time between any two states can be computed afterwards without
//! threading timing code through the business logic.
//!
//! # Design
//!
//! - A single [`AtomicUsize`] hands out global slot indices with
//!   `fetch_add`. Every index goes to exactly one caller.
//! - An index is resolved to `(segment, offset)` by walking the segment chain
//!   from the head and subtracting capacities. Capacities double along the
//!   chain, so the walk is `O(log N)`.
//! - Reaching past the tail links a new segment with one compare-and-set (see
//!   [`Segment::next`]). Nothing ever blocks, spins, or retries.
//!
//! # Visibility
//!
//! Reserving an index and publishing its slot are two separate steps. A
//! reader whose count snapshot covers index `i + 1` can find that slot
//! published while slot `i` is still empty, because its writer has reserved
//! but not yet written it. Queries and iteration skip such holes. Once all
//! writers have returned, every reserved index is visible.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::{self, Nanos};
use crate::config::{DEFAULT_SEGMENT_CAPACITY, TimelineConfig};
use crate::error::Result;
use crate::event::Event;
use crate::segment::Segment;

/// Sentinel returned by [`Timeline::time_between_nanos`] when no duration exists.
pub const NOT_FOUND: i64 = -1;

/// A thread-safe, append-only record of stamped states.
///
/// Share it between threads by reference or behind an `Arc`; every method
/// takes `&self`. A timeline is deliberately not `Clone`: all callers observe
/// the same underlying record.
///
/// # Examples
///
/// ```rust
/// use timeline::Timeline;
///
/// let timeline = Timeline::new(Some("accepted"));
/// timeline.append("parsed").append("responded");
///
/// assert_eq!(timeline.len(), 3);
/// assert!(timeline.time_between(&"accepted", &"responded").is_some());
/// assert!(timeline.time_between(&"responded", &"accepted").is_none());
/// ```
#[derive(Debug)]
pub struct Timeline<T> {
    /// Wall-clock time the timeline was created.
    issued_at: DateTime<Utc>,
    /// Head of the segment chain; owns every following segment.
    head: Segment<T>,
    /// Number of reserved indices. Reserved does not mean written.
    count: AtomicUsize,
    /// Whether index 0 holds an initial state supplied at construction.
    has_initial_state: bool,
}

impl<T> Timeline<T> {
    /// Creates a timeline, stamping `initial` as its first state if present.
    ///
    /// With `None` no event is recorded and the timeline renders as
    /// `<created>` until something is appended.
    pub fn new(initial: Option<T>) -> Self {
        let issued_at = Utc::now();
        Self::from_parts(
            DEFAULT_SEGMENT_CAPACITY,
            issued_at,
            initial.map(|state| (state, clock::now())),
        )
    }

    /// Creates a timeline using a custom storage configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::error::ConfigError) if `config` fails
    /// validation.
    pub fn with_config(config: &TimelineConfig, initial: Option<T>) -> Result<Self> {
        config.validate()?;
        let issued_at = Utc::now();
        Ok(Self::from_parts(
            config.first_segment_capacity,
            issued_at,
            initial.map(|state| (state, clock::now())),
        ))
    }

    /// Creates a timeline with a known issue time and initial stamp.
    ///
    /// Useful for replaying recorded timelines and for deterministic output
    /// from [`Display`](std::fmt::Display).
    pub fn with_issued_at(issued_at: DateTime<Utc>, initial: Option<(T, Nanos)>) -> Self {
        Self::from_parts(DEFAULT_SEGMENT_CAPACITY, issued_at, initial)
    }

    fn from_parts(
        capacity: usize,
        issued_at: DateTime<Utc>,
        initial: Option<(T, Nanos)>,
    ) -> Self {
        clock::anchor();

        let head = Segment::new(capacity);
        let has_initial_state = initial.is_some();
        if let Some((state, timestamp)) = initial {
            head.write(0, state, timestamp);
        }

        Self {
            issued_at,
            head,
            count: AtomicUsize::new(usize::from(has_initial_state)),
            has_initial_state,
        }
    }

    /// Stamps `state` with the current monotonic time.
    ///
    /// Wait-free: reserves an index, walks at most `O(log N)` segments, and
    /// writes the slot. Returns `self` so stamps can be chained.
    #[inline]
    pub fn append(&self, state: T) -> &Self {
        self.append_at(state, clock::now())
    }

    /// Stamps `state` with a caller-supplied timestamp.
    ///
    /// Timestamps should come from [`clock::now`](crate::clock::now) (or the
    /// same clock) for durations to be meaningful.
    pub fn append_at(&self, state: T, timestamp: Nanos) -> &Self {
        let index = self.count.fetch_add(1, Ordering::AcqRel);
        let (segment, offset) = self.locate(index);
        segment.write(offset, state, timestamp);
        self
    }

    /// Resolves a global index to its segment and offset, growing the chain
    /// if the index lies past the current tail.
    fn locate(&self, mut index: usize) -> (&Segment<T>, usize) {
        let mut segment = &self.head;
        while index >= segment.capacity() {
            index -= segment.capacity();
            segment = segment.next();
        }
        (segment, index)
    }

    /// Returns the number of reserved stamps.
    ///
    /// While appends are in flight some of these may not be visible yet.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Returns `true` if nothing has been stamped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the wall-clock time the timeline was created.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns whether the timeline was created with an initial state.
    pub fn has_initial_state(&self) -> bool {
        self.has_initial_state
    }

    /// Iterates over the written events, in index order.
    ///
    /// The iterator covers the stamps reserved when it was created and skips
    /// slots whose writers have not finished.
    pub fn iter(&self) -> Events<'_, T> {
        self.events_between(0, self.len())
    }

    /// Materializes every written event, in index order.
    ///
    /// Intended for diagnostics and tests; cost is linear in the number of
    /// stamps.
    pub fn events(&self) -> Vec<Event<'_, T>> {
        self.iter().collect()
    }

    fn events_between(&self, from: usize, end: usize) -> Events<'_, T> {
        if from >= end {
            return Events {
                segment: &self.head,
                offset: 0,
                index: end,
                end,
            };
        }

        let (segment, offset) = self.locate(from);
        Events {
            segment,
            offset,
            index: from,
            end,
        }
    }

    /// Returns the capacity of every segment linked so far, head first.
    ///
    /// Diagnostic only; never grows the chain.
    pub fn segment_capacities(&self) -> Vec<usize> {
        let mut capacities = Vec::new();
        let mut segment = Some(&self.head);
        while let Some(current) = segment {
            capacities.push(current.capacity());
            segment = current.peek_next();
        }
        capacities
    }
}

impl<T: PartialEq> Timeline<T> {
    /// Finds the first event whose state equals `state`.
    pub fn find_first(&self, state: &T) -> Option<Event<'_, T>> {
        self.find_by_state(state, 0)
    }

    /// Finds the first event at or after `from_index` whose state equals
    /// `state`.
    ///
    /// Pass [`Event::next_index`] of a previous match to find a repeated
    /// state's next occurrence.
    pub fn find_by_state(&self, state: &T, from_index: usize) -> Option<Event<'_, T>> {
        self.events_between(from_index, self.len())
            .find(|event| event.state == state)
    }

    /// Returns the time from the first `from` stamp to the first `to` stamp
    /// that follows it.
    ///
    /// Both scans run over one snapshot of the stamp count. The second scan
    /// starts right after the `from` match, so a `to` that only occurs
    /// earlier, or a state compared with itself when stamped once, yields
    /// `None`. Stamps whose timestamps run backwards (possible across threads
    /// or with caller-supplied timestamps) give a zero duration, never a
    /// negative one.
    pub fn time_between(&self, from: &T, to: &T) -> Option<Duration> {
        let mut events = self.iter();
        let start = events.find(|event| event.state == from)?;
        let end = events.find(|event| event.state == to)?;
        Some(Duration::from_nanos(
            end.timestamp.saturating_sub(start.timestamp),
        ))
    }

    /// Like [`time_between`](Self::time_between), in nanoseconds, returning
    /// [`NOT_FOUND`] when no duration exists.
    pub fn time_between_nanos(&self, from: &T, to: &T) -> i64 {
        self.time_between(from, to).map_or(NOT_FOUND, |duration| {
            i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
        })
    }
}

impl<'a, T> IntoIterator for &'a Timeline<T> {
    type Item = Event<'a, T>;
    type IntoIter = Events<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the written events of a [`Timeline`].
///
/// Created by [`Timeline::iter`]. Walks the segment chain once, yielding
/// events in index order and skipping slots that are reserved but unwritten.
#[derive(Debug)]
pub struct Events<'a, T> {
    segment: &'a Segment<T>,
    offset: usize,
    index: usize,
    end: usize,
}

impl<'a, T> Iterator for Events<'a, T> {
    type Item = Event<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.end {
            if self.offset == self.segment.capacity() {
                self.segment = self.segment.next();
                self.offset = 0;
            }

            let index = self.index;
            let slot = self.segment.read(self.offset);
            self.offset += 1;
            self.index += 1;

            if let Some(slot) = slot {
                return Some(Event {
                    state: &slot.state,
                    timestamp: slot.timestamp,
                    index,
                });
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.index))
    }
}
