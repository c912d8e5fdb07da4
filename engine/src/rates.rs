//! Commission Rate Table
//!
//! Maps a referral degree (1 = direct referrer) to a commission rate.
//! Degrees past the end of the table reuse the last configured rate.
//!
//! Rates are stored in basis points (10000 = 100%) so that
//! `floor(amount * rate)` can be computed exactly in integers:
//!
//! ```text
//! commission = amount * bps / 10000      (truncating)
//!
//! 333 * 700 / 10000 = 233100 / 10000 = 23
//! ```

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::Amount;

/// 100% in basis points
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default schedule: 7%, 5%, 3%, 1%, 1%, 1%
const DEFAULT_RATES_BPS: [u32; 6] = [700, 500, 300, 100, 100, 100];

/// Ordered degree -> rate schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommissionRates {
    bps: Vec<u32>,
}

impl Default for CommissionRates {
    fn default() -> Self {
        Self {
            bps: DEFAULT_RATES_BPS.to_vec(),
        }
    }
}

impl CommissionRates {
    /// Build a custom schedule, one entry per degree starting at degree 1
    pub fn new(bps: Vec<u32>) -> EngineResult<Self> {
        if bps.is_empty() {
            return Err(EngineError::EmptyRateTable);
        }

        for (index, &rate) in bps.iter().enumerate() {
            if rate > BPS_DENOMINATOR {
                return Err(EngineError::RateOutOfRange {
                    degree: index as u32 + 1,
                    bps: rate,
                    max: BPS_DENOMINATOR,
                });
            }
        }

        Ok(Self { bps })
    }

    /// Number of explicitly configured degrees
    pub fn len(&self) -> usize {
        self.bps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bps.is_empty()
    }

    /// Rate in basis points for a 1-based degree.
    ///
    /// Degree 0 is the purchaser themselves and earns nothing.
    pub fn rate_bps(&self, degree: u32) -> u32 {
        if degree == 0 {
            return 0;
        }

        let index = (degree as usize - 1).min(self.bps.len() - 1);
        self.bps[index]
    }

    /// Rate as a fraction (0.07 for 7%), for display
    pub fn rate(&self, degree: u32) -> f64 {
        self.rate_bps(degree) as f64 / BPS_DENOMINATOR as f64
    }

    /// `floor(amount * rate(degree))`, zero for non-positive amounts
    pub fn commission(&self, amount: Amount, degree: u32) -> Amount {
        if amount <= 0 {
            return 0;
        }

        let scaled = amount as i128 * self.rate_bps(degree) as i128;
        (scaled / BPS_DENOMINATOR as i128) as Amount
    }
}
