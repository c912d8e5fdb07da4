//! Promotional Ranking Endpoint

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::ApiError, services::RankEvaluation, types::parse_id, AppState};

/// GET /users/:id/ranking
///
/// 네트워크 매출 재집계 후 랭크 평가 (변경 시 저장)
///
/// # Response
///
/// ```json
/// {
///   "user_id": "…",
///   "previous_rank": 2,
///   "current_rank": 2,
///   "total_network_sales": 1000000,
///   "monthly_bonus": 250000,
///   "next_rank_threshold": 1500000,
///   "remaining_amount": 500000,
///   "progress_percentage": 50.0
/// }
/// ```
pub async fn get_ranking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RankEvaluation>, ApiError> {
    let user_id = parse_id(&id, "user")?;

    state
        .ranks
        .evaluate(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User".to_string()))
}
