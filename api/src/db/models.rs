//! Database Models
//!
//! Users, referral edges, orders and per-order commission events.
//! Amounts are BIGINT in the smallest currency unit.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// 알 수 없는 상태 문자열
#[derive(Debug, Clone, Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// 사용자
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,

    /// 공개 추천 코드 (8자리 대문자/숫자)
    pub reference_code: String,

    pub display_name: String,

    /// 추천인 user id (없으면 루트)
    pub referred_by: Option<Uuid>,

    /// 프로모션 랭크 (1부터 시작)
    pub promotional_rank: i32,

    /// 캐시된 네트워크 매출 (감소하지 않음)
    pub total_network_sales: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 추천 관계 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Active,
    Inactive,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Active => "active",
            ReferralStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReferralStatus::Active),
            "inactive" => Ok(ReferralStatus::Inactive),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for ReferralStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 추천 관계 (referrer -> referred)
///
/// `earnings`는 commission_events 합계의 materialized 값
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referred_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: ReferralStatus,
    pub earnings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 주문 상태
///
/// ```text
/// pending ──► processing ──► completed ──► refunded
///    │            │
///    └────────────┴──► cancelled
/// pending ──► completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// 허용된 상태 전이인지 확인
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Cancelled)
                | (Completed, Refunded)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 주문
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: Uuid,
    /// 구매자
    pub user_id: Uuid,
    pub total_amount: i64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 커미션 지급 이벤트 (주문 x 단계당 1건)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct CommissionRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    /// 적립된 추천 관계
    pub referral_id: Uuid,
    pub recipient_id: Uuid,
    /// 1 = 직접 추천인
    pub degree: i32,
    /// basis points (700 = 7%)
    pub rate_bps: i32,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}
