//! Referral Edge Administration

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    db::{Referral, ReferralStatus},
    error::ApiError,
    types::parse_id,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ReferralStatusRequest {
    pub status: ReferralStatus,
}

/// POST /referrals/:id/status
///
/// inactive 관계에 해당하는 커미션은 지급되지 않음 (이후 주문부터)
pub async fn update_referral_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReferralStatusRequest>,
) -> Result<Json<Referral>, ApiError> {
    let referral_id = parse_id(&id, "referral")?;

    if !state.store.set_referral_status(referral_id, req.status).await? {
        return Err(ApiError::NotFound("Referral".to_string()));
    }

    tracing::info!(referral = %referral_id, status = %req.status, "referral status updated");

    state
        .store
        .find_referral(referral_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Referral".to_string()))
}
