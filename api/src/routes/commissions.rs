//! Commission Processing Endpoints
//!
//! - 수동 처리: `POST /commissions/process`
//! - 결제 웹훅: `POST /webhooks/order-completed`
//!
//! 둘 다 같은 주문에 여러 번 호출돼도 한 번만 적립

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    services::DistributionOutcome,
    types::parse_id,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub order_id: String,
    pub secret: String,
}

/// 처리 결과 응답
///
/// ```json
/// {
///   "order_id": "…",
///   "outcome": "credited",
///   "commissions": [
///     { "recipient_id": "…", "referral_id": "…", "degree": 1, "rate": 0.07, "amount": 700 }
///   ],
///   "total_credited": 700
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub order_id: Uuid,
    #[serde(flatten)]
    pub outcome: DistributionOutcome,
    pub total_credited: i64,
}

impl ProcessResponse {
    fn new(order_id: Uuid, outcome: DistributionOutcome) -> Self {
        Self {
            order_id,
            total_credited: outcome.total_credited(),
            outcome,
        }
    }
}

/// POST /commissions/process
///
/// completed가 아닌 주문은 `not_eligible` (적립 없음)
pub async fn process_commissions(
    State(state): State<AppState>,
    Json(req): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let order_id = parse_id(&req.order_id, "order")?;

    let outcome = state
        .distributor
        .distribute(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order".to_string()))?;

    Ok(Json(ProcessResponse::new(order_id, outcome)))
}

/// POST /webhooks/order-completed
///
/// 시크릿 불일치 / 미설정 시 401
pub async fn order_completed_webhook(
    State(state): State<AppState>,
    Json(req): Json<WebhookRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let order_id = parse_id(&req.order_id, "order")?;
    let outcome = state
        .orders
        .complete_from_webhook(order_id, &req.secret)
        .await?;

    Ok(Json(ProcessResponse::new(order_id, outcome)))
}
