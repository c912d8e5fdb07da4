//! Commission Distributor
//!
//! 완료된 주문 1건에 대해 구매자의 업라인에 단계별 커미션 적립
//!
//! # Flow
//!
//! ```text
//! order (completed)
//!   │
//!   ├─ upline = ReferralGraph::upline(purchaser)        degree 1..=max_depth
//!   ├─ plan   = floor(amount * rate(degree)), 0원 단계 제외
//!   ├─ 각 단계의 active 추천 관계 (ancestor -> via) 확인, 없으면 해당 단계 skip
//!   └─ record_distribution: claim + 이벤트 저장 + earnings 원자적 증가 (1 트랜잭션)
//! ```
//!
//! 같은 주문을 다시 처리하면 claim이 실패하므로 추가 적립 없이
//! 기존 기록만 반환 (주문 완료 API와 웹훅이 모두 호출해도 안전)

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use referral_engine::{plan_commissions, CommissionRates};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{CommissionRecord, OrderStatus, ReferralStore};
use super::referral_graph::ReferralGraph;

/// 지급된 커미션 1건 (응답용)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditedCommission {
    pub recipient_id: Uuid,
    pub referral_id: Uuid,
    pub degree: u32,
    /// 0.07 = 7%
    pub rate: f64,
    pub amount: i64,
}

impl From<&CommissionRecord> for CreditedCommission {
    fn from(record: &CommissionRecord) -> Self {
        Self {
            recipient_id: record.recipient_id,
            referral_id: record.referral_id,
            degree: record.degree as u32,
            rate: record.rate_bps as f64 / referral_engine::BPS_DENOMINATOR as f64,
            amount: record.amount,
        }
    }
}

/// 커미션 처리 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DistributionOutcome {
    /// 이번 호출에서 적립됨 (업라인이 없으면 빈 목록)
    Credited { commissions: Vec<CreditedCommission> },
    /// 이미 처리된 주문. 기존 적립 내역 반환, 추가 적립 없음
    AlreadyProcessed { commissions: Vec<CreditedCommission> },
    /// completed 상태가 아님. 아무것도 쓰지 않음
    NotEligible { status: OrderStatus },
}

impl DistributionOutcome {
    /// 이 호출로 새로 적립된 내역
    pub fn credited(&self) -> &[CreditedCommission] {
        match self {
            DistributionOutcome::Credited { commissions } => commissions,
            _ => &[],
        }
    }

    pub fn total_credited(&self) -> i64 {
        self.credited().iter().map(|c| c.amount).sum()
    }
}

/// 커미션 지급 서비스
pub struct CommissionDistributor {
    store: Arc<dyn ReferralStore>,
    graph: Arc<ReferralGraph>,
    rates: CommissionRates,
}

impl CommissionDistributor {
    pub fn new(
        store: Arc<dyn ReferralStore>,
        graph: Arc<ReferralGraph>,
        rates: CommissionRates,
    ) -> Self {
        Self { store, graph, rates }
    }

    /// 주문 1건 커미션 처리
    ///
    /// 주문이 없으면 `Ok(None)` (호출 측에서 404)
    pub async fn distribute(&self, order_id: Uuid) -> Result<Option<DistributionOutcome>> {
        let Some(order) = self.store.find_order(order_id).await? else {
            return Ok(None);
        };

        if order.status != OrderStatus::Completed {
            tracing::debug!(order = %order_id, status = %order.status, "order not completed, skipping commissions");
            return Ok(Some(DistributionOutcome::NotEligible { status: order.status }));
        }

        if self.store.is_order_distributed(order_id).await? {
            return self.already_processed(order_id).await.map(Some);
        }

        let upline = self.graph.upline(order.user_id).await?;
        let plan = plan_commissions(order.total_amount, &upline.ancestors, &self.rates);

        let now = Utc::now();
        let mut records = Vec::with_capacity(plan.len());
        for planned in &plan {
            let edge = self
                .store
                .find_active_referral(planned.recipient, planned.via)
                .await?;

            let Some(edge) = edge else {
                tracing::warn!(
                    order = %order_id,
                    recipient = %planned.recipient,
                    degree = planned.degree,
                    amount = planned.amount,
                    "no active referral edge, commission forfeited"
                );
                continue;
            };

            records.push(CommissionRecord {
                id: Uuid::new_v4(),
                order_id,
                referral_id: edge.id,
                recipient_id: planned.recipient,
                degree: planned.degree as i32,
                rate_bps: planned.rate_bps as i32,
                amount: planned.amount,
                created_at: now,
            });
        }

        if records.len() < plan.len() {
            tracing::warn!(
                order = %order_id,
                planned = plan.len(),
                credited = records.len(),
                "partial commission distribution"
            );
        }

        if !self.store.record_distribution(order_id, &records).await? {
            // 동시에 실행된 다른 처리가 먼저 claim
            return self.already_processed(order_id).await.map(Some);
        }

        let commissions: Vec<CreditedCommission> = records.iter().map(Into::into).collect();
        tracing::info!(
            order = %order_id,
            purchaser = %order.user_id,
            amount = order.total_amount,
            credited = commissions.len(),
            total = commissions.iter().map(|c| c.amount).sum::<i64>(),
            "commissions distributed"
        );

        Ok(Some(DistributionOutcome::Credited { commissions }))
    }

    async fn already_processed(&self, order_id: Uuid) -> Result<DistributionOutcome> {
        tracing::info!(order = %order_id, "order already distributed, nothing credited");
        let existing = self.store.commissions_for_order(order_id).await?;
        Ok(DistributionOutcome::AlreadyProcessed {
            commissions: existing.iter().map(Into::into).collect(),
        })
    }
}
