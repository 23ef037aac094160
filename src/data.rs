use crate::time::TimeRange;
use std::env;
use thiserror::Error;

/// Shortest range accepted by default, in minutes
pub const DEFAULT_MIN_DURATION: u16 = 30;

/// Environment override for `ValidationPolicy::min_duration`
pub const MIN_DURATION_VAR: &str = "RENDEZVOUS_MIN_RANGE_MINUTES";

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("Invalid time format {0:?}. Use HH:MM (24h)")]
    InvalidFormat(String),
    #[error("Invalid time range {range}. End must be at least {min_duration} minutes after start")]
    InvalidRange { range: TimeRange, min_duration: u16 },
    #[error("Time range {range} overlaps with an existing range {existing}")]
    OverlappingRange {
        range: TimeRange,
        existing: TimeRange,
    },
}

/// Rules applied to every range before it is inserted
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ValidationPolicy {
    pub min_duration: u16,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            min_duration: DEFAULT_MIN_DURATION,
        }
    }
}

impl ValidationPolicy {
    pub fn new(min_duration: u16) -> Self {
        ValidationPolicy { min_duration }
    }

    /// Defaults, with `min_duration` taken from `RENDEZVOUS_MIN_RANGE_MINUTES`
    /// when it is set to a number
    pub fn from_env() -> Self {
        env::var(MIN_DURATION_VAR)
            .map(|e| e.parse::<u16>().ok())
            .ok()
            .flatten()
            .map(ValidationPolicy::new)
            .unwrap_or_default()
    }

    pub fn validate(&self, candidate: &TimeRange, existing: &[TimeRange]) -> Result<(), ValidationError> {
        validate_range(candidate, existing, self.min_duration)
    }
}

/// Checks `candidate` before it is added next to `existing`
///
/// # Errors
/// `InvalidRange` when the range is empty, inverted or shorter than
/// `min_duration` (the all-day range is always accepted), then
/// `OverlappingRange` when it overlaps any of `existing`.
///
/// # Examples
/// ```
/// use rendezvous_libs::{
///     data::{validate_range, ValidationError},
///     time::TimeRange,
/// };
///
/// let existing = vec![TimeRange::parse("09:00", "10:00").unwrap()];
///
/// assert!(matches!(
///     validate_range(&TimeRange::parse("11:00", "11:20").unwrap(), &existing, 30),
///     Err(ValidationError::InvalidRange { .. })
/// ));
/// assert!(matches!(
///     validate_range(&TimeRange::parse("09:30", "10:30").unwrap(), &existing, 30),
///     Err(ValidationError::OverlappingRange { .. })
/// ));
/// assert!(validate_range(&TimeRange::parse("10:00", "10:30").unwrap(), &existing, 30).is_ok());
/// ```
pub fn validate_range(
    candidate: &TimeRange,
    existing: &[TimeRange],
    min_duration: u16,
) -> Result<(), ValidationError> {
    if !candidate.is_all_day()
        && (candidate.end() <= candidate.start() || candidate.duration() < min_duration)
    {
        return Err(ValidationError::InvalidRange {
            range: *candidate,
            min_duration,
        });
    }

    match existing.iter().find(|range| range.overlaps(candidate)) {
        Some(conflict) => Err(ValidationError::OverlappingRange {
            range: *candidate,
            existing: *conflict,
        }),
        None => Ok(()),
    }
}
