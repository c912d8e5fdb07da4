//! Promotional Rank Tiers
//!
//! A user's rank is the highest tier whose sales threshold is at or below
//! their total network sales. Each tier unlocks a monthly bonus.
//!
//! ```text
//! level | threshold | monthly bonus
//! ------+-----------+--------------
//!   1   |         0 |            0
//!   2   |   500_000 |      250_000
//!   3   | 1_500_000 |      750_000
//!   4   | 3_000_000 |    1_500_000
//!   5   | 5_000_000 |    2_500_000
//! ```

use serde::Serialize;

use crate::error::{validation::validate_non_negative, EngineError, EngineResult};
use crate::Amount;

/// A single promotional rank tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankTier {
    pub level: u32,
    pub threshold: Amount,
    pub monthly_bonus: Amount,
}

impl RankTier {
    pub const fn new(level: u32, threshold: Amount, monthly_bonus: Amount) -> Self {
        Self {
            level,
            threshold,
            monthly_bonus,
        }
    }
}

const DEFAULT_TIERS: [RankTier; 5] = [
    RankTier::new(1, 0, 0),
    RankTier::new(2, 500_000, 250_000),
    RankTier::new(3, 1_500_000, 750_000),
    RankTier::new(4, 3_000_000, 1_500_000),
    RankTier::new(5, 5_000_000, 2_500_000),
];

/// Rank position and progress towards the next tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankProgress {
    pub current_rank: u32,
    pub total_network_sales: Amount,
    pub monthly_bonus: Amount,
    /// `None` at the top tier
    pub next_rank_threshold: Option<Amount>,
    pub remaining_amount: Amount,
    /// 0.0 ..= 100.0
    pub progress_percentage: f64,
}

/// Ordered, validated tier table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankTable {
    tiers: Vec<RankTier>,
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS.to_vec(),
        }
    }
}

impl RankTable {
    /// Build a custom table.
    ///
    /// Levels must run 1, 2, 3, ... with the first threshold at 0 and
    /// strictly increasing thresholds after it.
    pub fn new(tiers: Vec<RankTier>) -> EngineResult<Self> {
        let first = tiers.first().ok_or(EngineError::EmptyTierTable)?;
        if first.threshold != 0 {
            return Err(EngineError::NonZeroBaseThreshold {
                threshold: first.threshold,
            });
        }

        let mut previous: Option<&RankTier> = None;
        for (index, tier) in tiers.iter().enumerate() {
            let expected = index as u32 + 1;
            if tier.level != expected {
                return Err(EngineError::NonConsecutiveLevel {
                    expected,
                    found: tier.level,
                });
            }

            validate_non_negative(tier.monthly_bonus, "monthly_bonus")?;

            if let Some(prev) = previous {
                if tier.threshold <= prev.threshold {
                    return Err(EngineError::NonIncreasingThreshold {
                        level: tier.level,
                        threshold: tier.threshold,
                        previous: prev.threshold,
                    });
                }
            }
            previous = Some(tier);
        }

        Ok(Self { tiers })
    }

    /// Highest tier whose threshold is at or below `sales`
    pub fn tier_for_sales(&self, sales: Amount) -> &RankTier {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.threshold <= sales)
            .unwrap_or(&self.tiers[0])
    }

    /// Tier directly above `level`
    pub fn next_tier(&self, level: u32) -> Option<&RankTier> {
        self.tiers.iter().find(|tier| tier.level == level + 1)
    }

    /// Rank, bonus and progress for a sales total
    pub fn progress(&self, sales: Amount) -> RankProgress {
        let current = self.tier_for_sales(sales);

        let (next_rank_threshold, remaining_amount, progress_percentage) =
            match self.next_tier(current.level) {
                Some(next) => {
                    let span = (next.threshold - current.threshold) as f64;
                    let done = (sales - current.threshold) as f64;
                    let percentage = (done / span * 100.0).clamp(0.0, 100.0);

                    (
                        Some(next.threshold),
                        (next.threshold - sales).max(0),
                        percentage,
                    )
                }
                None => (None, 0, 100.0),
            };

        RankProgress {
            current_rank: current.level,
            total_network_sales: sales,
            monthly_bonus: current.monthly_bonus,
            next_rank_threshold,
            remaining_amount,
            progress_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_for_sales() {
        let table = RankTable::default();

        assert_eq!(table.tier_for_sales(0).level, 1);
        assert_eq!(table.tier_for_sales(499_999).level, 1);
        assert_eq!(table.tier_for_sales(500_000).level, 2);
        assert_eq!(table.tier_for_sales(1_499_999).level, 2);
        assert_eq!(table.tier_for_sales(1_500_000).level, 3);
        assert_eq!(table.tier_for_sales(3_000_000).level, 4);
        assert_eq!(table.tier_for_sales(5_000_000).level, 5);
        assert_eq!(table.tier_for_sales(50_000_000).level, 5);
    }

    #[test]
    fn test_negative_sales_stay_at_base() {
        let progress = RankTable::default().progress(-10);
        assert_eq!(progress.current_rank, 1);
        assert_eq!(progress.progress_percentage, 0.0);
        assert_eq!(progress.remaining_amount, 500_010);
    }

    #[test]
    fn test_progress_at_threshold_is_zero() {
        let progress = RankTable::default().progress(500_000);

        assert_eq!(progress.current_rank, 2);
        assert_eq!(progress.monthly_bonus, 250_000);
        assert_eq!(progress.next_rank_threshold, Some(1_500_000));
        assert_eq!(progress.remaining_amount, 1_000_000);
        assert_eq!(progress.progress_percentage, 0.0);
    }

    #[test]
    fn test_progress_midway() {
        let progress = RankTable::default().progress(1_000_000);

        assert_eq!(progress.current_rank, 2);
        assert_eq!(progress.remaining_amount, 500_000);
        assert!((progress.progress_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_rank_caps_progress() {
        let table = RankTable::default();

        for sales in [5_000_000, 7_250_000] {
            let progress = table.progress(sales);
            assert_eq!(progress.current_rank, 5);
            assert_eq!(progress.monthly_bonus, 2_500_000);
            assert_eq!(progress.next_rank_threshold, None);
            assert_eq!(progress.remaining_amount, 0);
            assert_eq!(progress.progress_percentage, 100.0);
        }
    }

    #[test]
    fn test_custom_table_validation() {
        assert_eq!(RankTable::new(vec![]), Err(EngineError::EmptyTierTable));

        assert!(matches!(
            RankTable::new(vec![RankTier::new(1, 10, 0)]),
            Err(EngineError::NonZeroBaseThreshold { threshold: 10 })
        ));

        assert!(matches!(
            RankTable::new(vec![RankTier::new(1, 0, 0), RankTier::new(3, 100, 0)]),
            Err(EngineError::NonConsecutiveLevel { expected: 2, found: 3 })
        ));

        assert!(matches!(
            RankTable::new(vec![RankTier::new(1, 0, 0), RankTier::new(2, 0, 5)]),
            Err(EngineError::NonIncreasingThreshold { level: 2, .. })
        ));

        assert!(matches!(
            RankTable::new(vec![RankTier::new(1, 0, -1)]),
            Err(EngineError::NegativeAmount { .. })
        ));

        let table = RankTable::new(vec![RankTier::new(1, 0, 0), RankTier::new(2, 100, 10)]).unwrap();
        assert_eq!(table.progress(25).progress_percentage, 25.0);
        assert_eq!(table.progress(100).current_rank, 2);
    }
}
