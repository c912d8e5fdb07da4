//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - 서버 상태 확인
//!
//! POST /users                       - 가입 (추천 코드 선택)
//! GET  /users/:id                   - 프로필
//! GET  /users/:id/network           - 직접 추천 관계 + 다운라인 단계별 인원
//! GET  /users/:id/commissions       - 커미션 수령 내역
//! GET  /users/:id/ranking           - 프로모션 랭크 평가
//!
//! POST /orders                      - 주문 생성
//! GET  /orders/:id                  - 주문 조회
//! POST /orders/:id/status           - 상태 전이 (completed ⇒ 커미션 처리)
//!
//! POST /commissions/process         - 주문 커미션 처리
//! POST /webhooks/order-completed    - 결제 완료 웹훅
//!
//! POST /referrals/:id/status        - 추천 관계 활성/비활성
//! ```

pub mod health;
pub mod users;
pub mod ranking;
pub mod orders;
pub mod commissions;
pub mod referrals;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// 라우터 생성
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))

        // Users
        .route("/users", post(users::register_user))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/network", get(users::get_network))
        .route("/users/:id/commissions", get(users::get_commissions))
        .route("/users/:id/ranking", get(ranking::get_ranking))

        // Orders
        .route("/orders", post(orders::create_order))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", post(orders::update_order_status))

        // Commissions
        .route("/commissions/process", post(commissions::process_commissions))
        .route("/webhooks/order-completed", post(commissions::order_completed_webhook))

        // Referral edges
        .route("/referrals/:id/status", post(referrals::update_referral_status))

        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}

/// CORS 설정
///
/// 프로덕션: `ALLOWED_ORIGINS`에 지정된 도메인만 허용
/// 개발: localhost 허용
fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.is_production() {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("ALLOWED_ORIGINS is empty, cross-origin requests will be rejected");
        }

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:5173"), // Vite dev server
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Config, Environment};
    use crate::db::mock::MemoryStore;
    use crate::db::OrderStatus;

    const SECRET: &str = "whsec_router";

    fn app(store: &Arc<MemoryStore>) -> Router {
        let config = Config {
            port: 0,
            database_url: String::new(),
            max_referral_depth: 6,
            webhook_secret: Some(SECRET.to_string()),
            environment: Environment::Development,
            allowed_origins: Vec::new(),
        };
        create_router(AppState::new(store.clone(), config))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let store = Arc::new(MemoryStore::new());
        let (status, body) = send(app(&store), "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["max_referral_depth"], 6);
    }

    #[tokio::test]
    async fn test_process_commissions_twice() {
        let store = Arc::new(MemoryStore::new());
        let a = store.seed_user("A", None);
        let b = store.seed_user("B", Some(a.id));
        let c = store.seed_user("C", Some(b.id));
        let order = store.seed_order(c.id, 10_000, OrderStatus::Completed);
        let payload = json!({ "order_id": order.id.to_string() });

        let (status, body) =
            send(app(&store), "POST", "/commissions/process", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "credited");
        assert_eq!(body["total_credited"], 1_200);
        assert_eq!(body["commissions"][0]["amount"], 700);
        assert_eq!(body["commissions"][0]["degree"], 1);
        assert_eq!(body["commissions"][1]["amount"], 500);

        let (status, body) = send(app(&store), "POST", "/commissions/process", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "already_processed");
        assert_eq!(body["total_credited"], 0);
        assert_eq!(store.commission_count(), 2);
    }

    #[tokio::test]
    async fn test_process_pending_order() {
        let store = Arc::new(MemoryStore::new());
        let buyer = store.seed_user("buyer", None);
        let order = store.seed_order(buyer.id, 10_000, OrderStatus::Pending);

        let (status, body) = send(
            app(&store),
            "POST",
            "/commissions/process",
            Some(json!({ "order_id": order.id.to_string() })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "not_eligible");
        assert_eq!(body["status"], "pending");
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_process_unknown_and_malformed_order() {
        let store = Arc::new(MemoryStore::new());

        let (status, body) = send(
            app(&store),
            "POST",
            "/commissions/process",
            Some(json!({ "order_id": uuid::Uuid::new_v4().to_string() })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, body) = send(
            app(&store),
            "POST",
            "/commissions/process",
            Some(json!({ "order_id": "not-a-uuid" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_ranking() {
        let store = Arc::new(MemoryStore::new());
        let user = store.seed_user("ranked", None);
        store.set_cached_sales(user.id, 1_000_000);

        let uri = format!("/users/{}/ranking", user.id);
        let (status, body) = send(app(&store), "GET", &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_rank"], 2);
        assert_eq!(body["monthly_bonus"], 250_000);
        assert_eq!(body["next_rank_threshold"], 1_500_000);
        assert_eq!(body["remaining_amount"], 500_000);
        assert_eq!(body["progress_percentage"], 50.0);

        let uri = format!("/users/{}/ranking", uuid::Uuid::new_v4());
        let (status, _) = send(app(&store), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_and_order_flow() {
        let store = Arc::new(MemoryStore::new());
        let referrer = store.seed_user("referrer", None);

        let (status, user) = send(
            app(&store),
            "POST",
            "/users",
            Some(json!({ "display_name": "Bob", "referral_code": referrer.reference_code })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["referred_by"], referrer.id.to_string());

        let (status, order) = send(
            app(&store),
            "POST",
            "/orders",
            Some(json!({ "user_id": user["id"], "total_amount": 20_000 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["status"], "pending");

        let uri = format!("/orders/{}/status", order["id"].as_str().unwrap());
        let (status, result) =
            send(app(&store), "POST", &uri, Some(json!({ "status": "completed" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["order"]["status"], "completed");
        assert_eq!(result["commissions"]["outcome"], "credited");
        assert_eq!(result["commissions"]["commissions"][0]["amount"], 1_400);

        let (status, body) =
            send(app(&store), "POST", &uri, Some(json!({ "status": "pending" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let uri = format!("/users/{}/network", referrer.id);
        let (status, network) = send(app(&store), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(network["total_earnings"], 1_400);
        assert_eq!(network["active_referrals"], 1);
        assert_eq!(network["levels"][0]["members"], 1);

        let uri = format!("/users/{}/commissions?limit=5", referrer.id);
        let (status, history) = send(app(&store), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["page_total"], 1_400);
        assert_eq!(history["pagination"]["total"], 1);
        assert_eq!(history["pagination"]["limit"], 5);
    }

    #[tokio::test]
    async fn test_register_with_unknown_code() {
        let store = Arc::new(MemoryStore::new());

        let (status, body) = send(
            app(&store),
            "POST",
            "/users",
            Some(json!({ "display_name": "Eve", "referral_code": "ZZZZZZZZ" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Referral code not found");
    }

    #[tokio::test]
    async fn test_webhook() {
        let store = Arc::new(MemoryStore::new());
        let referrer = store.seed_user("referrer", None);
        let buyer = store.seed_user("buyer", Some(referrer.id));
        let order = store.seed_order(buyer.id, 10_000, OrderStatus::Processing);

        let (status, _) = send(
            app(&store),
            "POST",
            "/webhooks/order-completed",
            Some(json!({ "order_id": order.id.to_string(), "secret": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            app(&store),
            "POST",
            "/webhooks/order-completed",
            Some(json!({ "order_id": order.id.to_string(), "secret": SECRET })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "credited");
        assert_eq!(body["total_credited"], 700);
    }

    #[tokio::test]
    async fn test_deactivate_referral() {
        let store = Arc::new(MemoryStore::new());
        let referrer = store.seed_user("referrer", None);
        let buyer = store.seed_user("buyer", Some(referrer.id));
        let edge = store.referral_between(referrer.id, buyer.id).unwrap();

        let uri = format!("/referrals/{}/status", edge.id);
        let (status, body) =
            send(app(&store), "POST", &uri, Some(json!({ "status": "inactive" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "inactive");

        let order = store.seed_order(buyer.id, 10_000, OrderStatus::Completed);
        let (_, body) = send(
            app(&store),
            "POST",
            "/commissions/process",
            Some(json!({ "order_id": order.id.to_string() })),
        )
        .await;
        assert_eq!(body["total_credited"], 0);

        let uri = format!("/referrals/{}/status", uuid::Uuid::new_v4());
        let (status, _) =
            send(app(&store), "POST", &uri, Some(json!({ "status": "active" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_commission_history_far_page() {
        let store = Arc::new(MemoryStore::new());
        let user = store.seed_user("paged", None);

        let uri = format!("/users/{}/commissions?page={}&limit=100", user.id, u32::MAX);
        let (status, body) = send(app(&store), "GET", &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["commissions"], json!([]));
        assert_eq!(body["pagination"]["has_next"], false);
    }
}
