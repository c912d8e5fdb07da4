//! Error types for the referral engine
//!
//! Only table construction can fail; commission and rank evaluation over a
//! validated table are total functions.

use std::fmt;

/// Error types for engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Rate table has no entries
    EmptyRateTable,

    /// A single rate exceeds 100%
    RateOutOfRange {
        degree: u32,
        bps: u32,
        max: u32,
    },

    /// Rank table has no tiers
    EmptyTierTable,

    /// Tier levels must be 1, 2, 3, ...
    NonConsecutiveLevel {
        expected: u32,
        found: u32,
    },

    /// First tier must be reachable with zero sales
    NonZeroBaseThreshold {
        threshold: i64,
    },

    /// Thresholds must strictly increase with level
    NonIncreasingThreshold {
        level: u32,
        threshold: i64,
        previous: i64,
    },

    /// Negative threshold or bonus
    NegativeAmount {
        field: String,
        value: i64,
    },

    /// Depth bound outside the accepted range
    DepthOutOfRange {
        depth: u32,
        max: u32,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyRateTable => {
                write!(f, "Commission rate table must not be empty")
            }
            EngineError::RateOutOfRange { degree, bps, max } => {
                write!(
                    f,
                    "Rate for degree {} is {} bps, above maximum {} bps",
                    degree, bps, max
                )
            }
            EngineError::EmptyTierTable => {
                write!(f, "Rank tier table must not be empty")
            }
            EngineError::NonConsecutiveLevel { expected, found } => {
                write!(f, "Expected tier level {}, found {}", expected, found)
            }
            EngineError::NonZeroBaseThreshold { threshold } => {
                write!(f, "Base tier threshold must be 0, found {}", threshold)
            }
            EngineError::NonIncreasingThreshold {
                level,
                threshold,
                previous,
            } => {
                write!(
                    f,
                    "Threshold {} for level {} does not exceed previous threshold {}",
                    threshold, level, previous
                )
            }
            EngineError::NegativeAmount { field, value } => {
                write!(f, "{} must not be negative, found {}", field, value)
            }
            EngineError::DepthOutOfRange { depth, max } => {
                write!(f, "Referral depth {} must be between 1 and {}", depth, max)
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Input validation utilities
pub mod validation {
    use super::*;

    /// Upper bound accepted for the referral depth setting
    pub const MAX_SUPPORTED_DEPTH: u32 = 32;

    /// Validate a configured upline/downline depth
    pub fn validate_depth(depth: u32) -> EngineResult<u32> {
        if depth == 0 || depth > MAX_SUPPORTED_DEPTH {
            return Err(EngineError::DepthOutOfRange {
                depth,
                max: MAX_SUPPORTED_DEPTH,
            });
        }
        Ok(depth)
    }

    /// Validate that an amount is not negative
    pub fn validate_non_negative(value: i64, field: &str) -> EngineResult<()> {
        if value < 0 {
            return Err(EngineError::NegativeAmount {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }
}
