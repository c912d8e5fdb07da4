//! User Endpoints
//!
//! 가입, 프로필, 추천 네트워크, 커미션 수령 내역

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{CommissionRecord, Referral, ReferralStatus, User},
    error::ApiError,
    services::NewUser,
    types::{parse_id, PageQuery, Pagination},
    AppState,
};

// ============ Request/Response Types ============

/// 가입 요청
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub display_name: String,
    /// 추천인의 추천 코드 (선택)
    pub referral_code: Option<String>,
}

/// 프로필 응답
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub display_name: String,
    /// 다른 사용자에게 공유하는 코드
    pub reference_code: String,
    pub referred_by: Option<Uuid>,
    pub promotional_rank: i32,
    /// 마지막 랭크 평가 시점의 네트워크 매출
    pub total_network_sales: i64,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            reference_code: user.reference_code,
            referred_by: user.referred_by,
            promotional_rank: user.promotional_rank,
            total_network_sales: user.total_network_sales,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// 직접 추천 관계 1건
#[derive(Debug, Serialize)]
pub struct ReferralEntry {
    pub referral_id: Uuid,
    pub referred_id: Uuid,
    pub status: ReferralStatus,
    /// 이 관계로 적립된 커미션 합계
    pub earnings: i64,
    pub created_at: String,
}

impl From<Referral> for ReferralEntry {
    fn from(referral: Referral) -> Self {
        Self {
            referral_id: referral.id,
            referred_id: referral.referred_id,
            status: referral.status,
            earnings: referral.earnings,
            created_at: referral.created_at.to_rfc3339(),
        }
    }
}

/// 다운라인 단계별 인원
#[derive(Debug, Serialize)]
pub struct LevelSummary {
    pub degree: u32,
    pub members: usize,
}

/// 추천 네트워크 응답
#[derive(Debug, Serialize)]
pub struct NetworkResponse {
    pub user_id: Uuid,
    pub direct_referrals: Vec<ReferralEntry>,
    pub active_referrals: usize,
    pub total_earnings: i64,
    pub levels: Vec<LevelSummary>,
}

/// 커미션 수령 내역 1건
#[derive(Debug, Serialize)]
pub struct CommissionEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub referral_id: Uuid,
    pub degree: i32,
    /// 0.07 = 7%
    pub rate: f64,
    pub amount: i64,
    pub created_at: String,
}

impl From<CommissionRecord> for CommissionEntry {
    fn from(record: CommissionRecord) -> Self {
        Self {
            id: record.id,
            order_id: record.order_id,
            referral_id: record.referral_id,
            degree: record.degree,
            rate: record.rate_bps as f64 / referral_engine::BPS_DENOMINATOR as f64,
            amount: record.amount,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommissionHistoryResponse {
    pub user_id: Uuid,
    pub commissions: Vec<CommissionEntry>,
    /// 현재 페이지 합계
    pub page_total: i64,
    pub pagination: Pagination,
}

// ============ Handlers ============

/// POST /users
///
/// # Request
///
/// ```json
/// { "display_name": "Alice", "referral_code": "K7Q2M9XA" }
/// ```
pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .registration
        .register(NewUser {
            display_name: req.display_name,
            referral_code: req.referral_code,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = find_user(&state, &id).await?;
    Ok(Json(user.into()))
}

/// GET /users/:id/network
///
/// 직접 추천 관계 + 단계별 다운라인 인원
pub async fn get_network(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NetworkResponse>, ApiError> {
    let user = find_user(&state, &id).await?;

    let referrals = state.store.referrals_by_referrer(user.id).await?;
    let levels = state.graph.downline(user.id).await?;

    let total_earnings = referrals.iter().map(|r| r.earnings).sum();
    let active_referrals = referrals
        .iter()
        .filter(|r| r.status == ReferralStatus::Active)
        .count();

    Ok(Json(NetworkResponse {
        user_id: user.id,
        direct_referrals: referrals.into_iter().map(Into::into).collect(),
        active_referrals,
        total_earnings,
        levels: levels
            .into_iter()
            .map(|level| LevelSummary {
                degree: level.degree,
                members: level.members.len(),
            })
            .collect(),
    }))
}

/// GET /users/:id/commissions?page=0&limit=20
pub async fn get_commissions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CommissionHistoryResponse>, ApiError> {
    let user = find_user(&state, &id).await?;
    let (page, limit) = query.resolve();

    let (records, total) = state
        .store
        .commissions_for_recipient(user.id, page, limit)
        .await?;

    let commissions: Vec<CommissionEntry> = records.into_iter().map(Into::into).collect();
    let page_total = commissions.iter().map(|c| c.amount).sum();

    Ok(Json(CommissionHistoryResponse {
        user_id: user.id,
        commissions,
        page_total,
        pagination: Pagination::new(page, limit, total),
    }))
}

// ============ Helpers ============

async fn find_user(state: &AppState, raw_id: &str) -> Result<User, ApiError> {
    let id = parse_id(raw_id, "user")?;
    state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))
}
