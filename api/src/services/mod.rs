//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `ReferralGraph`: 업라인 / 다운라인 조회
//! - `CommissionDistributor`: 주문 커미션 지급 (멱등)
//! - `NetworkSalesAggregator`: 다운라인 네트워크 매출 집계
//! - `RankEngine`: 프로모션 랭크 평가
//! - `RegistrationService`: 추천 코드 기반 가입
//! - `OrderService`: 주문 상태 전이 + 결제 웹훅

mod referral_graph;
mod commission;
mod network;
mod ranking;
mod registration;
mod orders;

pub use referral_graph::ReferralGraph;
pub use commission::{CommissionDistributor, CreditedCommission, DistributionOutcome};
pub use network::{NetworkSales, NetworkSalesAggregator};
pub use ranking::{RankEngine, RankEvaluation};
pub use registration::{NewUser, RegistrationError, RegistrationService};
pub use orders::{OrderError, OrderService, TransitionResult};
