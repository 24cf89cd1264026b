//! Monotonic nanosecond clock for default stamp timestamps.
//!
//! [`Instant`] is opaque, so timestamps are expressed as nanoseconds elapsed
//! since a process-wide anchor instant. All timelines in a process share the
//! anchor, which keeps timestamps from different timelines comparable and lets
//! callers pass their own readings to
//! [`Timeline::append_at`](crate::Timeline::append_at).

use std::sync::OnceLock;
use std::time::Instant;

/// Nanoseconds on the monotonic clock.
pub type Nanos = u64;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Returns the process-wide anchor instant, initialising it on first use.
///
/// Timeline constructors call this so that the one-time initialisation never
/// lands on a concurrent append.
pub(crate) fn anchor() -> Instant {
    *ANCHOR.get_or_init(Instant::now)
}

/// Reads the monotonic clock.
///
/// Successive readings on one thread never decrease. Saturates at
/// `u64::MAX` after roughly 584 years of process uptime.
#[inline]
pub fn now() -> Nanos {
    Nanos::try_from(anchor().elapsed().as_nanos()).unwrap_or(Nanos::MAX)
}
