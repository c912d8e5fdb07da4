//! Database Module
//!
//! PostgreSQL + SQLx 기반 `ReferralStore` 구현
//!
//! # 동시성
//!
//! 여러 요청이 같은 업라인을 동시에 적립할 수 있으므로 공유 값은 모두
//! 단일 SQL 문으로 원자적으로 변경:
//!
//! ```sql
//! UPDATE referrals SET earnings = earnings + $1 WHERE id = $2;
//! UPDATE users SET total_network_sales = GREATEST(total_network_sales, $2) ...;
//! UPDATE orders SET status = $3 WHERE id = $1 AND status = $2;
//! UPDATE users SET promotional_rank = $2 WHERE id = $1 AND total_network_sales = $3;
//! ```
//!
//! 커미션 지급은 `commission_runs`(PK = order_id) claim과 같은 트랜잭션에서
//! 실행되어 같은 주문이 두 번 적립되지 않음.
//!
//! # Connection Pool
//!
//! - max_connections: 10 (트래픽에 따라 조정)
//! - min_connections: 1 (idle 시 최소 유지)
//! - acquire_timeout: 3초 (커넥션 획득 대기)

mod models;
mod repository;

pub use models::*;
pub use repository::ReferralStore;

#[cfg(test)]
pub use repository::mock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, reference_code, display_name, referred_by,
    promotional_rank, total_network_sales, created_at, updated_at
"#;

const REFERRAL_COLUMNS: &str = r#"
    id, referrer_id, referred_id, status, earnings, created_at, updated_at
"#;

const ORDER_COLUMNS: &str = r#"
    id, user_id, total_amount, status, created_at, updated_at
"#;

const COMMISSION_COLUMNS: &str = r#"
    id, order_id, referral_id, recipient_id, degree, rate_bps, amount, created_at
"#;

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await
            .context("failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReferralStore for Database {
    /// Health check
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_code(&self, code: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE reference_code = $1",
            USER_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: &User, referral: Option<&Referral>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, reference_code, display_name, referred_by,
                promotional_rank, total_network_sales, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#
        )
        .bind(user.id)
        .bind(&user.reference_code)
        .bind(&user.display_name)
        .bind(user.referred_by)
        .bind(user.promotional_rank)
        .bind(user.total_network_sales)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        if let Some(referral) = referral {
            sqlx::query(
                r#"
                INSERT INTO referrals (
                    id, referrer_id, referred_id, status, earnings, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#
            )
            .bind(referral.id)
            .bind(referral.referrer_id)
            .bind(referral.referred_id)
            .bind(referral.status.as_str())
            .bind(referral.earnings)
            .bind(referral.created_at)
            .bind(referral.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn referred_users(&self, referrer_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM users
            WHERE referred_by = ANY($1)
            ORDER BY created_at
            "#
        )
        .bind(referrer_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn raise_network_sales(&self, user_id: Uuid, candidate: i64) -> Result<i64> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            UPDATE users
            SET total_network_sales = GREATEST(total_network_sales, $2),
                updated_at = CASE
                    WHEN $2 > total_network_sales THEN NOW()
                    ELSE updated_at
                END
            WHERE id = $1
            RETURNING total_network_sales
            "#
        )
        .bind(user_id)
        .bind(candidate)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn set_rank(&self, user_id: Uuid, rank: i32, sales: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET promotional_rank = $2, updated_at = NOW()
            WHERE id = $1 AND total_network_sales = $3
            "#
        )
        .bind(user_id)
        .bind(rank)
        .bind(sales)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_referral(&self, id: Uuid) -> Result<Option<Referral>> {
        let referral = sqlx::query_as::<_, Referral>(&format!(
            "SELECT {} FROM referrals WHERE id = $1",
            REFERRAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(referral)
    }

    async fn find_active_referral(
        &self,
        referrer_id: Uuid,
        referred_id: Uuid,
    ) -> Result<Option<Referral>> {
        let referral = sqlx::query_as::<_, Referral>(&format!(
            r#"
            SELECT {}
            FROM referrals
            WHERE referrer_id = $1 AND referred_id = $2 AND status = 'active'
            "#,
            REFERRAL_COLUMNS
        ))
        .bind(referrer_id)
        .bind(referred_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(referral)
    }

    async fn referrals_by_referrer(&self, referrer_id: Uuid) -> Result<Vec<Referral>> {
        let referrals = sqlx::query_as::<_, Referral>(&format!(
            "SELECT {} FROM referrals WHERE referrer_id = $1 ORDER BY created_at",
            REFERRAL_COLUMNS
        ))
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(referrals)
    }

    async fn set_referral_status(&self, id: Uuid, status: ReferralStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE referrals SET status = $2, updated_at = NOW() WHERE id = $1"
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn transition_order(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn completed_order_amounts(&self, user_ids: &[Uuid]) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT total_amount
            FROM orders
            WHERE user_id = ANY($1) AND status = 'completed'
            "#
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(amount,)| amount).collect())
    }

    async fn is_order_distributed(&self, order_id: Uuid) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM commission_runs WHERE order_id = $1)"
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn record_distribution(
        &self,
        order_id: Uuid,
        commissions: &[CommissionRecord],
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // 멱등성 키: 이미 claim된 주문이면 0 rows
        let claimed = sqlx::query(
            r#"
            INSERT INTO commission_runs (order_id, processed_at)
            VALUES ($1, NOW())
            ON CONFLICT (order_id) DO NOTHING
            "#
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for commission in commissions {
            sqlx::query(
                r#"
                INSERT INTO commission_events (
                    id, order_id, referral_id, recipient_id, degree, rate_bps, amount, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#
            )
            .bind(commission.id)
            .bind(commission.order_id)
            .bind(commission.referral_id)
            .bind(commission.recipient_id)
            .bind(commission.degree)
            .bind(commission.rate_bps)
            .bind(commission.amount)
            .bind(commission.created_at)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                UPDATE referrals
                SET earnings = earnings + $2, updated_at = NOW()
                WHERE id = $1
                "#
            )
            .bind(commission.referral_id)
            .bind(commission.amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn commissions_for_order(&self, order_id: Uuid) -> Result<Vec<CommissionRecord>> {
        let records = sqlx::query_as::<_, CommissionRecord>(&format!(
            "SELECT {} FROM commission_events WHERE order_id = $1 ORDER BY degree",
            COMMISSION_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn commissions_for_recipient(
        &self,
        recipient_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CommissionRecord>, i64)> {
        let offset = page as i64 * limit as i64;

        let records = sqlx::query_as::<_, CommissionRecord>(&format!(
            r#"
            SELECT {}
            FROM commission_events
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            COMMISSION_COLUMNS
        ))
        .bind(recipient_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        // 전체 개수
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM commission_events WHERE recipient_id = $1"
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((records, count.0))
    }
}
