//! Configuration for timeline storage.
//!
//! A timeline only has one tunable: how many slots its head segment holds.
//! Every following segment doubles the previous one, so the head capacity
//! decides how many stamps fit before the chain grows for the first time.
//! Units of work that routinely pass through dozens of states can start with
//! a larger head and skip the first few growth steps.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Head segment capacity used when no configuration is supplied.
pub const DEFAULT_SEGMENT_CAPACITY: usize = 8;

/// Smallest accepted head segment capacity.
pub const MIN_SEGMENT_CAPACITY: usize = 1;

/// Largest accepted head segment capacity.
///
/// The head segment is allocated eagerly for every timeline, so a runaway
/// value would turn a cheap per-request object into a large allocation.
pub const MAX_SEGMENT_CAPACITY: usize = 1 << 20;

/// Storage configuration for a [`Timeline`](crate::Timeline).
///
/// # Examples
///
/// ```rust
/// use timeline::{Timeline, TimelineConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TimelineConfig::new(64)?;
/// let timeline = Timeline::with_config(&config, Some("accepted"))?;
/// assert_eq!(timeline.segment_capacities(), vec![64]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Number of slots in the head segment.
    pub first_segment_capacity: usize,
}

impl TimelineConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSegmentCapacity`] if the capacity is zero
    /// or larger than [`MAX_SEGMENT_CAPACITY`].
    pub fn new(first_segment_capacity: usize) -> Result<Self> {
        let config = Self {
            first_segment_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSegmentCapacity`] if validation fails.
    pub fn validate(&self) -> Result<()> {
        let capacity = self.first_segment_capacity;
        if !(MIN_SEGMENT_CAPACITY..=MAX_SEGMENT_CAPACITY).contains(&capacity) {
            tracing::debug!(capacity, "rejected timeline config");
            return Err(ConfigError::InvalidSegmentCapacity {
                capacity,
                min: MIN_SEGMENT_CAPACITY,
                max: MAX_SEGMENT_CAPACITY,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            first_segment_capacity: DEFAULT_SEGMENT_CAPACITY,
        }
    }
}
