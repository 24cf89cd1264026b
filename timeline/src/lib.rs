//! # timeline
//!
//! Wait-free, append-only timeline of stamped states.
//!
//! A [`Timeline`] follows one unit of work (a request, a job, a connection)
//! through its lifetime. Code anywhere along the way stamps the state it has
//! reached; afterwards the elapsed time between any two states can be read
//! back, without timing code spread through the business logic.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Wait-free appends from any number of threads: one atomic fetch-add, no
//!   locks, no retry loops
//! - Unbounded capacity via a chain of doubling segments, so append and
//!   lookup walk `O(log N)` segments
//! - Stamps are never overwritten or moved; lookups hand out borrowed views
//! - Duration queries return `None` instead of failing or going negative
//!
//! ## Quick Start
//!
//! ```rust
//! use timeline::Timeline;
//!
//! #[derive(Debug, PartialEq)]
//! enum Request {
//!     Accepted,
//!     Authorized,
//!     Responded,
//! }
//!
//! let timeline = Timeline::new(Some(Request::Accepted));
//!
//! // Stamp states as the request progresses (from any thread).
//! timeline.append(Request::Authorized);
//! timeline.append(Request::Responded);
//!
//! // Ask how long a phase took.
//! let auth = timeline.time_between(&Request::Accepted, &Request::Authorized);
//! assert!(auth.is_some());
//!
//! // Missing or out-of-order states are simply not found.
//! assert!(timeline.time_between(&Request::Responded, &Request::Accepted).is_none());
//! ```
//!
//! ## Architecture
//!
//! - [`Timeline`] — Owns the segment chain and the reservation counter
//! - [`Event`] — Borrowed `(state, timestamp, index)` view returned by lookups
//! - [`TimelineConfig`] — Head segment sizing
//!
//! ## Modules
//!
//! - [`timeline`] — Append protocol, lookups, duration queries
//! - [`segment`] — Fixed-capacity slot blocks and lazy chain extension
//! - [`event`] — Event views
//! - [`render`] — Human-readable rendering
//! - [`clock`] — Monotonic nanosecond clock
//! - [`config`] — Storage configuration
//! - [`error`] — Error types

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod render;
pub mod segment;
pub mod timeline;

// Re-export primary API types at crate root for convenience.
pub use clock::Nanos;
pub use config::TimelineConfig;
pub use error::{ConfigError, Result, TimelineError};
pub use event::Event;
pub use timeline::{Events, NOT_FOUND, Timeline};
