//! Health Check Endpoint
//!
//! 저장소 연결까지 확인하는 deep health check
//! - 200 + "healthy": 프로세스 + DB 정상
//! - 200 + "degraded": DB 연결 실패 (로드밸런서가 트래픽 차단 판단)

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub max_referral_depth: u32,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// GET /health
///
/// 서버 및 의존성 상태 확인
pub async fn health_check(
    State(state): State<AppState>,
) -> Json<HealthResponse> {
    let db_start = std::time::Instant::now();
    let db_status = match state.store.health_check().await {
        Ok(_) => DatabaseStatus {
            connected: true,
            latency_ms: Some(db_start.elapsed().as_millis() as u64),
        },
        Err(err) => {
            tracing::warn!("Health check failed: {:?}", err);
            DatabaseStatus {
                connected: false,
                latency_ms: None,
            }
        }
    };

    Json(HealthResponse {
        status: if db_status.connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        max_referral_depth: state.graph.max_depth(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
