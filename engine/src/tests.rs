//! Scenario Tests
//!
//! Whole-flow checks across rates, graph walks and rank tiers.

#[cfg(test)]
mod scenario_tests {
    use std::collections::HashMap;

    use crate::{
        network_sales_share, plan_commissions, resolve_upline, CommissionRates, DownlineWalk,
        RankTable, WalkEnd, DEFAULT_MAX_DEPTH,
    };

    /// user -> referrer
    struct Tree {
        parents: HashMap<u32, u32>,
    }

    impl Tree {
        fn chain(len: u32) -> Self {
            Self {
                parents: (1..len).map(|n| (n, n - 1)).collect(),
            }
        }

        fn referrer(&self, user: &u32) -> Option<u32> {
            self.parents.get(user).copied()
        }

        fn referred(&self, frontier: &[u32]) -> Vec<u32> {
            let mut children: Vec<u32> = self
                .parents
                .iter()
                .filter(|(_, parent)| frontier.contains(parent))
                .map(|(child, _)| *child)
                .collect();
            children.sort_unstable();
            children
        }
    }

    mod commission_tests {
        use super::*;

        #[test]
        fn test_ten_deep_chain_credits_six_degrees() {
            let tree = Tree::chain(10);
            let upline = resolve_upline(9, DEFAULT_MAX_DEPTH, |u| tree.referrer(u));
            let plan = plan_commissions(100_000, &upline.ancestors, &CommissionRates::default());

            let degrees: Vec<_> = plan.iter().map(|p| p.degree).collect();
            assert_eq!(degrees, vec![1, 2, 3, 4, 5, 6]);

            let amounts: Vec<_> = plan.iter().map(|p| p.amount).collect();
            assert_eq!(amounts, vec![7_000, 5_000, 3_000, 1_000, 1_000, 1_000]);

            assert_eq!(upline.end, WalkEnd::DepthLimit);
        }

        #[test]
        fn test_depth_bound_is_configurable() {
            let tree = Tree::chain(10);
            let upline = resolve_upline(9, 3, |u| tree.referrer(u));
            assert_eq!(upline.ancestors.len(), 3);
        }

        #[test]
        fn test_floor_not_round() {
            let rates = CommissionRates::default();
            assert_eq!(rates.commission(333, 1), 23);
        }
    }

    mod network_tests {
        use super::*;

        #[test]
        fn test_network_sales_match_commissions() {
            // root 0, chain 0 <- 1 <- 2, each descendant bought 10_000
            let tree = Tree::chain(3);
            let rates = CommissionRates::default();

            let mut walk = DownlineWalk::new(0u32, DEFAULT_MAX_DEPTH);
            let mut total = 0;
            while let Some(frontier) = walk.frontier() {
                let children = tree.referred(frontier);
                let level = walk.descend(children);
                total += network_sales_share(
                    level.members.iter().map(|_| 10_000),
                    level.degree,
                    &rates,
                );
            }

            // 700 from user 1 (degree 1), 500 from user 2 (degree 2)
            assert_eq!(total, 1_200);

            // the same numbers the distributor credits when 1 and 2 buy
            let from_two = resolve_upline(2, DEFAULT_MAX_DEPTH, |u| tree.referrer(u));
            let credited: i64 = plan_commissions(10_000, &from_two.ancestors, &rates)
                .iter()
                .filter(|p| p.recipient == 0)
                .map(|p| p.amount)
                .sum();
            assert_eq!(credited, 500);
        }
    }

    mod rank_tests {
        use super::*;

        #[test]
        fn test_rank_promotion_sequence() {
            let table = RankTable::default();

            let observed: Vec<_> = [0, 600_000, 1_600_000]
                .into_iter()
                .map(|sales| {
                    let p = table.progress(sales);
                    (p.current_rank, p.monthly_bonus)
                })
                .collect();

            assert_eq!(observed, vec![(1, 0), (2, 250_000), (3, 750_000)]);
        }

        #[test]
        fn test_progress_fraction_between_tiers() {
            let table = RankTable::default();

            let quarter = table.progress(750_000);
            assert!((quarter.progress_percentage - 25.0).abs() < 1e-9);
            assert_eq!(quarter.remaining_amount, 750_000);

            let base = table.progress(0);
            assert_eq!(base.progress_percentage, 0.0);
            assert_eq!(base.next_rank_threshold, Some(500_000));
        }

        #[test]
        fn test_top_tier_progress_json() {
            let top = RankTable::default().progress(7_000_000);
            let json = serde_json::to_value(&top).unwrap();

            assert_eq!(json["current_rank"], 5);
            assert_eq!(json["monthly_bonus"], 2_500_000);
            assert!(json["next_rank_threshold"].is_null());
            assert_eq!(json["remaining_amount"], 0);
            assert_eq!(json["progress_percentage"], 100.0);
        }
    }
}
