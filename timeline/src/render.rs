//! Human-readable rendering of timelines.
//!
//! A rendered timeline starts with the issue time and the initial state, then
//! lists each following stamp as an offset from the first stamp, right-aligned
//! under the issue time:
//!
//! ```text
//! 2019-07-29T15:38:06.123Z - accepted
//!                    +68us - parsed
//!                  +3005ms - responded
//! ```
//!
//! A timeline created without an initial state shows `<created>` on the first
//! line and lists every stamp below it.

use std::fmt;

use chrono::SecondsFormat;

use crate::clock::Nanos;
use crate::timeline::Timeline;

/// First-line placeholder for a timeline created without an initial state.
pub const CREATED_PLACEHOLDER: &str = "<created>";

const NANOS_PER_MICRO: Nanos = 1_000;
const NANOS_PER_MILLI: Nanos = 1_000_000;

/// Formats a nanosecond delta in the most readable of `ns`, `us`, or `ms`.
///
/// Values are truncated, not rounded.
///
/// # Examples
///
/// ```rust
/// use timeline::render::format_delta;
///
/// assert_eq!(format_delta(999), "999ns");
/// assert_eq!(format_delta(68_000), "68us");
/// assert_eq!(format_delta(3_005_000_000), "3005ms");
/// ```
pub fn format_delta(delta: Nanos) -> String {
    if delta < NANOS_PER_MICRO {
        format!("{delta}ns")
    } else if delta < NANOS_PER_MILLI {
        format!("{}us", delta / NANOS_PER_MICRO)
    } else {
        format!("{}ms", delta / NANOS_PER_MILLI)
    }
}

impl<T: fmt::Display> fmt::Display for Timeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issued = self
            .issued_at()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let width = issued.len();
        let mut events = self.iter();

        write!(f, "{issued} - ")?;
        let mut base = None;
        match events.next() {
            Some(first) if self.has_initial_state() => {
                write!(f, "{}", first.state)?;
                base = Some(first.timestamp);
            }
            first => {
                f.write_str(CREATED_PLACEHOLDER)?;
                if let Some(first) = first {
                    base = Some(first.timestamp);
                    write_offset(f, width, 0, first.state)?;
                }
            }
        }

        for event in events {
            let base = *base.get_or_insert(event.timestamp);
            write_offset(f, width, event.timestamp.saturating_sub(base), event.state)?;
        }

        Ok(())
    }
}

fn write_offset<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    width: usize,
    delta: Nanos,
    state: &T,
) -> fmt::Result {
    let offset = format!("+{}", format_delta(delta));
    write!(f, "\n{offset:>width$} - {state}")
}
