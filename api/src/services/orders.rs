//! Order Service
//!
//! 주문 생성 / 상태 전이 / 결제 웹훅
//!
//! completed로 전이되는 순간 커미션 처리를 동기 실행. 커미션 처리는
//! 멱등이므로 상태 변경 API와 웹훅이 같은 주문을 각각 처리해도 한 번만 적립

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{Order, OrderStatus, ReferralStore};
use crate::error::ApiError;
use super::commission::{CommissionDistributor, DistributionOutcome};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(Uuid),

    #[error("purchaser not found: {0}")]
    UnknownPurchaser(Uuid),

    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("webhook is disabled")]
    WebhookDisabled,

    #[error("webhook secret mismatch")]
    InvalidSecret,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => ApiError::NotFound("Order".to_string()),
            OrderError::UnknownPurchaser(_) => ApiError::NotFound("User".to_string()),
            OrderError::InvalidAmount(amount) => {
                ApiError::ValidationError(format!("Order amount must not be negative: {}", amount))
            }
            err @ OrderError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            OrderError::WebhookDisabled | OrderError::InvalidSecret => ApiError::Unauthorized,
            OrderError::Store(err) => err.into(),
        }
    }
}

/// 상태 전이 결과
#[derive(Debug, Clone, Serialize)]
pub struct TransitionResult {
    pub order: Order,
    /// completed로 전이된 경우 커미션 처리 결과
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commissions: Option<DistributionOutcome>,
}

/// 주문 서비스
pub struct OrderService {
    store: Arc<dyn ReferralStore>,
    distributor: Arc<CommissionDistributor>,
    webhook_secret: Option<String>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn ReferralStore>,
        distributor: Arc<CommissionDistributor>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            store,
            distributor,
            webhook_secret,
        }
    }

    /// pending 주문 생성
    pub async fn create(&self, user_id: Uuid, total_amount: i64) -> Result<Order, OrderError> {
        if total_amount < 0 {
            return Err(OrderError::InvalidAmount(total_amount));
        }

        if self.store.find_user(user_id).await?.is_none() {
            return Err(OrderError::UnknownPurchaser(user_id));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            total_amount,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_order(&order).await?;

        tracing::info!(order = %order.id, user = %user_id, amount = total_amount, "order created");
        Ok(order)
    }

    pub async fn find(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))
    }

    /// 상태 전이 (compare-and-set)
    pub async fn transition(&self, order_id: Uuid, to: OrderStatus) -> Result<TransitionResult, OrderError> {
        let order = self.find(order_id).await?;
        let from = order.status;

        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }

        if !self.store.transition_order(order_id, from, to).await? {
            // 그 사이 다른 요청이 상태를 바꿈
            let current = self.find(order_id).await?;
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        tracing::info!(order = %order_id, %from, %to, "order status changed");

        let commissions = if to == OrderStatus::Completed {
            self.distributor.distribute(order_id).await?
        } else {
            None
        };

        let order = self.find(order_id).await?;
        Ok(TransitionResult { order, commissions })
    }

    /// 결제 완료 웹훅
    ///
    /// 아직 완료되지 않은 주문이면 completed로 전이한 뒤 커미션 처리.
    /// 이미 completed면 커미션 처리만 (재시도 안전)
    pub async fn complete_from_webhook(
        &self,
        order_id: Uuid,
        secret: &str,
    ) -> Result<DistributionOutcome, OrderError> {
        let expected = self
            .webhook_secret
            .as_deref()
            .ok_or(OrderError::WebhookDisabled)?;

        if !constant_time_eq(expected.as_bytes(), secret.as_bytes()) {
            tracing::warn!(order = %order_id, "webhook rejected: secret mismatch");
            return Err(OrderError::InvalidSecret);
        }

        let order = self.find(order_id).await?;
        match order.status {
            OrderStatus::Pending | OrderStatus::Processing => {
                let result = self.transition(order_id, OrderStatus::Completed).await?;
                result.commissions.ok_or(OrderError::NotFound(order_id))
            }
            _ => self
                .distributor
                .distribute(order_id)
                .await?
                .ok_or(OrderError::NotFound(order_id)),
        }
    }
}

/// 길이가 같으면 내용과 무관하게 같은 시간에 비교
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
