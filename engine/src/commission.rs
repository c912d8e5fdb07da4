//! Commission Planning
//!
//! Turns a completed order amount and the purchaser's upline into the list of
//! per-degree credits. Storage concerns (edge lookup, idempotence, atomic
//! increments) belong to the caller.

use serde::Serialize;

use crate::graph::Ancestor;
use crate::rates::CommissionRates;
use crate::Amount;

/// A commission to be credited to one upline member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannedCommission<T> {
    pub recipient: T,
    /// User directly below `recipient` on the purchaser's chain
    pub via: T,
    pub degree: u32,
    pub rate_bps: u32,
    pub amount: Amount,
}

/// Commission per ancestor, skipping degrees whose truncated amount is zero
pub fn plan_commissions<T: Copy>(
    order_amount: Amount,
    upline: &[Ancestor<T>],
    rates: &CommissionRates,
) -> Vec<PlannedCommission<T>> {
    upline
        .iter()
        .filter_map(|ancestor| {
            let amount = rates.commission(order_amount, ancestor.degree);
            if amount == 0 {
                return None;
            }

            Some(PlannedCommission {
                recipient: ancestor.user,
                via: ancestor.via,
                degree: ancestor.degree,
                rate_bps: rates.rate_bps(ancestor.degree),
                amount,
            })
        })
        .collect()
}

/// Network sales credited to a root user for one downline level:
/// the sum of what the root earns on each order, floored per order.
pub fn network_sales_share<I>(order_amounts: I, degree: u32, rates: &CommissionRates) -> Amount
where
    I: IntoIterator<Item = Amount>,
{
    order_amounts
        .into_iter()
        .map(|amount| rates.commission(amount, degree))
        .fold(0, Amount::saturating_add)
}
