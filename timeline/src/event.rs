//! Read-only views of stamped events.

use serde::Serialize;

use crate::clock::Nanos;

/// A single stamped state materialized from a timeline.
///
/// Timelines store states and timestamps in segment slots; an `Event` is only
/// built on demand by lookups such as
/// [`Timeline::find_by_state`](crate::Timeline::find_by_state). It borrows the
/// state from the timeline, which is sound because written slots are never
/// overwritten.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Event<'a, T> {
    /// The stamped state.
    pub state: &'a T,
    /// Monotonic timestamp of the stamp, in nanoseconds.
    pub timestamp: Nanos,
    /// Global index of the stamp within its timeline.
    pub index: usize,
}

impl<T> Clone for Event<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Event<'_, T> {}

impl<T> Event<'_, T> {
    /// Index to pass as `from_index` to find the next occurrence of a state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timeline::Timeline;
    ///
    /// let timeline = Timeline::new(Some("retry"));
    /// timeline.append("backoff").append("retry");
    ///
    /// let first = timeline.find_first(&"retry").unwrap();
    /// let second = timeline.find_by_state(&"retry", first.next_index()).unwrap();
    /// assert_eq!((first.index, second.index), (0, 2));
    /// ```
    pub fn next_index(&self) -> usize {
        self.index + 1
    }
}
