//! Referral Commission API Library
//!
//! # Overview
//!
//! 다단계 추천 프로그램의 백엔드 API
//!
//! - 완료된 주문마다 구매자의 업라인(최대 `MAX_REFERRAL_DEPTH` 단계)에 커미션 적립
//! - 다운라인 네트워크 매출로 프로모션 랭크 / 월 보너스 산정
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐    │
//! │  │ Routes  │  │Services │  │   DB    │  │  Types  │    │
//! │  └────┬────┘  └────┬────┘  └────┬────┘  └────┬────┘    │
//! │       │            │            │            │          │
//! │       └────────────┴────────────┴────────────┘          │
//! │                         │                                │
//! └─────────────────────────┼────────────────────────────────┘
//!                           │
//!                           ▼
//!                  ┌────────────────┐
//!                  │ referral-engine│  (rates, ranks, graph walks)
//!                  └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 비즈니스 로직 (커미션, 네트워크 매출, 랭크)
//! - `db`: 데이터베이스 연동
//! - `types`: 공통 타입 정의
//!
//! ## Usage
//!
//! ```rust,ignore
//! use referral_api::{config::Config, db::Database, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config.database_url).await?;
//!     let state = AppState::new(Arc::new(db), config);
//!
//!     // ... 서버 시작
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use referral_engine::{CommissionRates, RankTable};

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod db;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::ApiError;
pub use db::{Database, ReferralStore};
pub use routes::create_router;

use services::{
    CommissionDistributor, NetworkSalesAggregator, OrderService, RankEngine, ReferralGraph,
    RegistrationService,
};

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReferralStore>,
    pub graph: Arc<ReferralGraph>,
    pub distributor: Arc<CommissionDistributor>,
    pub ranks: Arc<RankEngine>,
    pub registration: Arc<RegistrationService>,
    pub orders: Arc<OrderService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// 저장소 하나를 모든 서비스가 공유하도록 구성
    ///
    /// 커미션 지급과 네트워크 매출 집계는 같은 깊이 상한 / 요율표를 사용
    pub fn new(store: Arc<dyn ReferralStore>, config: Config) -> Self {
        let rates = CommissionRates::default();
        let graph = Arc::new(ReferralGraph::new(store.clone(), config.max_referral_depth));

        let distributor = Arc::new(CommissionDistributor::new(
            store.clone(),
            graph.clone(),
            rates.clone(),
        ));
        let aggregator = Arc::new(NetworkSalesAggregator::new(store.clone(), graph.clone(), rates));
        let ranks = Arc::new(RankEngine::new(store.clone(), aggregator, RankTable::default()));
        let registration = Arc::new(RegistrationService::new(store.clone()));
        let orders = Arc::new(OrderService::new(
            store.clone(),
            distributor.clone(),
            config.webhook_secret.clone(),
        ));

        Self {
            store,
            graph,
            distributor,
            ranks,
            registration,
            orders,
            config: Arc::new(config),
        }
    }
}
