//! Order Endpoints
//!
//! 주문 생성 / 조회 / 상태 전이

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    db::{Order, OrderStatus},
    error::ApiError,
    services::TransitionResult,
    types::parse_id,
    AppState,
};

/// 주문 생성 요청
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    /// 최소 화폐 단위
    pub total_amount: i64,
}

/// 상태 전이 요청
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// POST /orders
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let user_id = parse_id(&req.user_id, "user")?;
    let order = state.orders.create(user_id, req.total_amount).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_id(&id, "order")?;
    Ok(Json(state.orders.find(order_id).await?))
}

/// POST /orders/:id/status
///
/// completed로 전이하면 응답에 커미션 처리 결과 포함
///
/// ```json
/// { "status": "completed" }
/// ```
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<TransitionResult>, ApiError> {
    let order_id = parse_id(&id, "order")?;
    Ok(Json(state.orders.transition(order_id, req.status).await?))
}
