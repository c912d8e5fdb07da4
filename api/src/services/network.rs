//! Network Sales Aggregator
//!
//! 네트워크 매출 = 다운라인의 completed 주문에 대해 루트 사용자가 받는
//! (받았을) 커미션의 합. 원 매출 합계가 아님
//!
//! ```text
//! total = Σ_level Σ_order floor(order_amount * rate(level.degree))
//! cached = max(cached, total)      -- 감소하지 않음 (환불 시에도)
//! ```

use std::sync::Arc;

use anyhow::Result;
use referral_engine::{network_sales_share, CommissionRates};
use serde::Serialize;
use uuid::Uuid;

use crate::db::ReferralStore;
use super::referral_graph::ReferralGraph;

/// 집계 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSales {
    pub user_id: Uuid,
    /// 이번에 다시 계산한 값
    pub computed: i64,
    /// 저장된 값 (ratchet 적용 후)
    pub total: i64,
    /// 집계에 포함된 다운라인 인원
    pub downline_members: usize,
}

/// 네트워크 매출 집계 서비스
pub struct NetworkSalesAggregator {
    store: Arc<dyn ReferralStore>,
    graph: Arc<ReferralGraph>,
    rates: CommissionRates,
}

impl NetworkSalesAggregator {
    pub fn new(
        store: Arc<dyn ReferralStore>,
        graph: Arc<ReferralGraph>,
        rates: CommissionRates,
    ) -> Self {
        Self { store, graph, rates }
    }

    /// 네트워크 매출 재계산 + 캐시 갱신
    ///
    /// 사용자가 없으면 `Ok(None)`
    pub async fn aggregate(&self, user_id: Uuid) -> Result<Option<NetworkSales>> {
        let Some(user) = self.store.find_user(user_id).await? else {
            return Ok(None);
        };

        let levels = self.graph.downline(user_id).await?;

        let mut computed: i64 = 0;
        let mut downline_members = 0;
        for level in &levels {
            let amounts = self.store.completed_order_amounts(&level.members).await?;
            computed = computed.saturating_add(network_sales_share(amounts, level.degree, &self.rates));
            downline_members += level.members.len();
        }

        let total = if computed > user.total_network_sales {
            self.store.raise_network_sales(user_id, computed).await?
        } else {
            user.total_network_sales
        };

        tracing::debug!(
            user = %user_id,
            computed,
            cached = user.total_network_sales,
            total,
            downline_members,
            "network sales aggregated"
        );

        Ok(Some(NetworkSales {
            user_id,
            computed,
            total,
            downline_members,
        }))
    }
}
