//! Repository Pattern Implementation
//!
//! 서비스 레이어는 `ReferralStore` trait에만 의존
//!
//! - PostgreSQL 구현: `db/mod.rs`의 `Database`
//! - 테스트용 in-memory 구현: `mock::MemoryStore`
//!
//! 동시성 규칙: 공유 값(earnings, total_network_sales, rank, order status)은
//! 읽고-쓰기가 아니라 저장소 내부의 원자적 연산으로만 변경한다.

use async_trait::async_trait;
use anyhow::Result;
use uuid::Uuid;

use super::models::{CommissionRecord, Order, OrderStatus, Referral, ReferralStatus, User};

/// 추천/주문/커미션 저장소 인터페이스
#[async_trait]
pub trait ReferralStore: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    // ============ Users ============

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_code(&self, code: &str) -> Result<Option<User>>;

    /// 사용자와 추천 관계를 하나의 트랜잭션으로 저장
    async fn insert_user(&self, user: &User, referral: Option<&Referral>) -> Result<()>;

    /// `referred_by`가 주어진 id 중 하나인 사용자들 (다음 다운라인 레벨)
    async fn referred_users(&self, referrer_ids: &[Uuid]) -> Result<Vec<Uuid>>;

    /// `total_network_sales = max(현재값, candidate)` 후 최종 값 반환
    async fn raise_network_sales(&self, user_id: Uuid, candidate: i64) -> Result<i64>;

    /// 랭크 저장 (compare-and-set)
    ///
    /// 저장된 `total_network_sales`가 랭크 산정에 쓰인 `sales`와 같을 때만 쓰고
    /// true. 그 사이 매출이 갱신됐으면 쓰지 않고 false
    async fn set_rank(&self, user_id: Uuid, rank: i32, sales: i64) -> Result<bool>;

    // ============ Referrals ============

    async fn find_referral(&self, id: Uuid) -> Result<Option<Referral>>;

    async fn find_active_referral(
        &self,
        referrer_id: Uuid,
        referred_id: Uuid,
    ) -> Result<Option<Referral>>;

    async fn referrals_by_referrer(&self, referrer_id: Uuid) -> Result<Vec<Referral>>;

    /// 변경된 행이 있으면 true
    async fn set_referral_status(&self, id: Uuid, status: ReferralStatus) -> Result<bool>;

    // ============ Orders ============

    async fn insert_order(&self, order: &Order) -> Result<()>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;

    /// compare-and-set: 현재 상태가 `from`일 때만 `to`로 변경
    async fn transition_order(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool>;

    /// 주어진 사용자들의 completed 주문 금액 목록
    async fn completed_order_amounts(&self, user_ids: &[Uuid]) -> Result<Vec<i64>>;

    // ============ Commissions ============

    async fn is_order_distributed(&self, order_id: Uuid) -> Result<bool>;

    /// 주문 claim + 이벤트 저장 + earnings 증가를 하나의 트랜잭션으로 실행
    ///
    /// 이미 처리된 주문이면 아무것도 쓰지 않고 false 반환
    async fn record_distribution(
        &self,
        order_id: Uuid,
        commissions: &[CommissionRecord],
    ) -> Result<bool>;

    async fn commissions_for_order(&self, order_id: Uuid) -> Result<Vec<CommissionRecord>>;

    /// 수령 내역 (최신순, 페이지네이션) + 전체 개수
    async fn commissions_for_recipient(
        &self,
        recipient_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CommissionRecord>, i64)>;
}

// PostgreSQL 구현은 db/mod.rs의 Database 구조체에 있음
// 테스트용 Mock 구현:
