//! Promotional Rank Engine
//!
//! 1. 네트워크 매출 재집계 (캐시 갱신)
//! 2. 매출 기준 최고 티어 = 새 랭크
//! 3. 저장된 랭크와 다르면 저장 (승급/강등 로그). 산정에 쓴 매출이 아직
//!    저장된 값일 때만 저장되므로 늦게 끝난 평가가 최신 랭크를 덮어쓰지 않음
//! 4. 월 보너스 + 다음 티어까지 진행률 반환

use std::sync::Arc;

use anyhow::Result;
use referral_engine::{RankProgress, RankTable};
use serde::Serialize;
use uuid::Uuid;

use crate::db::ReferralStore;
use super::network::NetworkSalesAggregator;

/// 랭크 저장이 경합으로 거절될 때 재평가 횟수
const RANK_WRITE_ATTEMPTS: usize = 3;

/// 랭크 평가 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEvaluation {
    pub user_id: Uuid,
    pub previous_rank: u32,
    #[serde(flatten)]
    pub progress: RankProgress,
}

impl RankEvaluation {
    pub fn changed(&self) -> bool {
        self.previous_rank != self.progress.current_rank
    }
}

/// 프로모션 랭크 서비스
pub struct RankEngine {
    store: Arc<dyn ReferralStore>,
    aggregator: Arc<NetworkSalesAggregator>,
    tiers: RankTable,
}

impl RankEngine {
    pub fn new(
        store: Arc<dyn ReferralStore>,
        aggregator: Arc<NetworkSalesAggregator>,
        tiers: RankTable,
    ) -> Self {
        Self {
            store,
            aggregator,
            tiers,
        }
    }

    /// 사용자 랭크 평가
    ///
    /// 사용자가 없으면 `Ok(None)`. 평가 도중 다른 요청이 네트워크 매출을
    /// 갱신해 랭크 저장이 거절되면 최신 값으로 다시 평가
    pub async fn evaluate(&self, user_id: Uuid) -> Result<Option<RankEvaluation>> {
        for attempt in 1..=RANK_WRITE_ATTEMPTS {
            let Some(user) = self.store.find_user(user_id).await? else {
                return Ok(None);
            };

            let Some(sales) = self.aggregator.aggregate(user_id).await? else {
                return Ok(None);
            };

            let progress = self.tiers.progress(sales.total);
            let previous_rank = user.promotional_rank.max(0) as u32;

            if progress.current_rank != previous_rank {
                let stored = self
                    .store
                    .set_rank(user_id, progress.current_rank as i32, sales.total)
                    .await?;

                if !stored {
                    tracing::debug!(
                        user = %user_id,
                        attempt,
                        sales = sales.total,
                        "network sales changed during rank evaluation, retrying"
                    );
                    continue;
                }

                if progress.current_rank > previous_rank {
                    tracing::info!(
                        user = %user_id,
                        from = previous_rank,
                        to = progress.current_rank,
                        sales = sales.total,
                        "promotional rank raised"
                    );
                } else {
                    tracing::warn!(
                        user = %user_id,
                        from = previous_rank,
                        to = progress.current_rank,
                        sales = sales.total,
                        "promotional rank lowered"
                    );
                }
            }

            return Ok(Some(RankEvaluation {
                user_id,
                previous_rank,
                progress,
            }));
        }

        anyhow::bail!(
            "rank evaluation for {} kept racing with network sales updates",
            user_id
        )
    }
}
