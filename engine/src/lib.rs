//! Referral Commission Engine
//!
//! Storage-free domain logic for a multi-level referral program.
//!
//! # Components
//! - `CommissionRates`: degree -> rate schedule (clamped to the last entry)
//! - `RankTable`: promotional rank tiers, monthly bonus and progress
//! - `UplineWalk` / `DownlineWalk`: bounded, cycle-safe referral graph traversal
//! - `plan_commissions`: per-degree commission amounts for a completed order
//!
//! Every amount is an `i64` in the smallest currency unit. Rates are held in
//! basis points so the truncating commission formula is exact.
//!
//! # Example
//! ```
//! use referral_engine::{resolve_upline, plan_commissions, CommissionRates};
//!
//! // C was referred by B, B by A
//! let parent_of = |user: &char| match user {
//!     'C' => Some('B'),
//!     'B' => Some('A'),
//!     _ => None,
//! };
//! let upline = resolve_upline('C', 6, parent_of);
//! let plan = plan_commissions(10_000, &upline.ancestors, &CommissionRates::default());
//!
//! assert_eq!(plan[0].recipient, 'B');
//! assert_eq!(plan[0].amount, 700);
//! assert_eq!(plan[1].recipient, 'A');
//! assert_eq!(plan[1].amount, 500);
//! ```

pub mod commission;
pub mod error;
pub mod graph;
pub mod ranks;
pub mod rates;

#[cfg(test)]
mod tests;

pub use commission::{network_sales_share, plan_commissions, PlannedCommission};
pub use error::{EngineError, EngineResult};
pub use error::validation;
pub use graph::{resolve_upline, Ancestor, DownlineWalk, Level, Upline, UplineWalk, WalkEnd};
pub use ranks::{RankProgress, RankTable, RankTier};
pub use rates::{CommissionRates, BPS_DENOMINATOR};

/// Default bound on referral degrees, shared by commission crediting and
/// network sales aggregation.
pub const DEFAULT_MAX_DEPTH: u32 = 6;

/// Amount in the smallest currency unit.
pub type Amount = i64;
