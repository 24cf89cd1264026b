//! Error types for the timeline library.
//!
//! Lookups and duration queries never fail: a state that was not stamped is a
//! normal outcome reported through `Option` (or the [`NOT_FOUND`] sentinel).
//! Appends cannot fail either, since capacity grows without bound. The only
//! fallible surface is building a timeline from a caller-supplied
//! [`TimelineConfig`].
//!
//! [`NOT_FOUND`]: crate::timeline::NOT_FOUND
//! [`TimelineConfig`]: crate::config::TimelineConfig

use thiserror::Error;

/// The main error type for all timeline operations.
#[derive(Error, Debug)]
pub enum TimelineError {
    /// Error validating a timeline configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur when validating a [`TimelineConfig`](crate::config::TimelineConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The head segment capacity is outside the accepted range.
    #[error("invalid head segment capacity {capacity}: must be between {min} and {max}")]
    InvalidSegmentCapacity {
        /// The rejected capacity.
        capacity: usize,
        /// Smallest accepted capacity.
        min: usize,
        /// Largest accepted capacity.
        max: usize,
    },
}

/// Type alias for `Result<T, TimelineError>`.
pub type Result<T> = std::result::Result<T, TimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err: TimelineError = ConfigError::InvalidSegmentCapacity {
            capacity: 0,
            min: 1,
            max: 1 << 20,
        }
        .into();

        assert_eq!(
            err.to_string(),
            "config error: invalid head segment capacity 0: must be between 1 and 1048576"
        );
    }
}
