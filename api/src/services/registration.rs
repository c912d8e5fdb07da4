//! Registration Service
//!
//! 가입 시 추천 코드를 받으면 추천인을 찾아 `referred_by` 설정 +
//! active 추천 관계를 같은 트랜잭션으로 생성

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{Referral, ReferralStatus, ReferralStore, User};
use crate::error::ApiError;
use crate::types::ReferenceCode;

/// 코드 충돌 시 재시도 횟수
const CODE_ATTEMPTS: usize = 5;

const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("invalid display name: {0}")]
    InvalidName(String),

    #[error("invalid referral code: {0}")]
    InvalidReferralCode(String),

    #[error("unknown referral code: {0}")]
    UnknownReferralCode(String),

    #[error("could not allocate a unique reference code")]
    CodeSpaceExhausted,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::InvalidName(msg) => ApiError::ValidationError(msg),
            RegistrationError::InvalidReferralCode(msg) => ApiError::ValidationError(msg),
            RegistrationError::UnknownReferralCode(_) => {
                ApiError::NotFound("Referral code".to_string())
            }
            RegistrationError::CodeSpaceExhausted => ApiError::InternalError,
            RegistrationError::Store(err) => err.into(),
        }
    }
}

/// 가입 요청
#[derive(Debug, Clone)]
pub struct NewUser {
    pub display_name: String,
    pub referral_code: Option<String>,
}

/// 가입 서비스
pub struct RegistrationService {
    store: Arc<dyn ReferralStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn ReferralStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, request: NewUser) -> Result<User, RegistrationError> {
        let display_name = request.display_name.trim().to_string();
        if display_name.is_empty() || display_name.chars().count() > MAX_NAME_LEN {
            return Err(RegistrationError::InvalidName(format!(
                "Display name must be 1 to {} characters",
                MAX_NAME_LEN
            )));
        }

        let referrer = match request.referral_code.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let code = ReferenceCode::new(raw).map_err(RegistrationError::InvalidReferralCode)?;
                let referrer = self
                    .store
                    .find_user_by_code(code.as_str())
                    .await?
                    .ok_or_else(|| RegistrationError::UnknownReferralCode(code.as_str().to_string()))?;
                Some(referrer)
            }
        };

        let reference_code = self.allocate_code().await?;
        let now = Utc::now();

        let user = User {
            id: Uuid::new_v4(),
            reference_code: reference_code.as_str().to_string(),
            display_name,
            referred_by: referrer.as_ref().map(|r| r.id),
            promotional_rank: 1,
            total_network_sales: 0,
            created_at: now,
            updated_at: now,
        };

        let referral = referrer.as_ref().map(|r| Referral {
            id: Uuid::new_v4(),
            referrer_id: r.id,
            referred_id: user.id,
            status: ReferralStatus::Active,
            earnings: 0,
            created_at: now,
            updated_at: now,
        });

        self.store.insert_user(&user, referral.as_ref()).await?;

        tracing::info!(
            user = %user.id,
            code = %user.reference_code,
            referred_by = ?user.referred_by,
            "user registered"
        );

        Ok(user)
    }

    async fn allocate_code(&self) -> Result<ReferenceCode, RegistrationError> {
        for _ in 0..CODE_ATTEMPTS {
            // ThreadRng는 Send가 아니므로 await 전에 drop
            let candidate = ReferenceCode::generate(&mut rand::thread_rng());
            if self.store.find_user_by_code(candidate.as_str()).await?.is_none() {
                return Ok(candidate);
            }
            tracing::debug!(code = candidate.as_str(), "reference code collision, retrying");
        }

        Err(RegistrationError::CodeSpaceExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> RegistrationService {
        RegistrationService::new(store.clone())
    }

    #[tokio::test]
    async fn test_register_without_referrer() {
        let store = Arc::new(MemoryStore::new());

        let user = service(&store)
            .register(NewUser {
                display_name: "  Alice ".to_string(),
                referral_code: None,
            })
            .await
            .unwrap();

        assert_eq!(user.display_name, "Alice");
        assert_eq!(user.promotional_rank, 1);
        assert!(user.referred_by.is_none());
        assert!(ReferenceCode::new(&user.reference_code).is_ok());
        assert!(store.user(user.id).is_some());
    }

    #[tokio::test]
    async fn test_register_with_referral_code() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let alice = service
            .register(NewUser {
                display_name: "Alice".to_string(),
                referral_code: None,
            })
            .await
            .unwrap();

        let bob = service
            .register(NewUser {
                display_name: "Bob".to_string(),
                referral_code: Some(alice.reference_code.to_lowercase()),
            })
            .await
            .unwrap();

        assert_eq!(bob.referred_by, Some(alice.id));
        let edge = store.referral_between(alice.id, bob.id).unwrap();
        assert_eq!(edge.status, ReferralStatus::Active);
        assert_eq!(edge.earnings, 0);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_codes() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);

        let malformed = service
            .register(NewUser {
                display_name: "Carol".to_string(),
                referral_code: Some("bad!".to_string()),
            })
            .await;
        assert!(matches!(malformed, Err(RegistrationError::InvalidReferralCode(_))));

        let unknown = service
            .register(NewUser {
                display_name: "Carol".to_string(),
                referral_code: Some("ZZZZZZZZ".to_string()),
            })
            .await;
        assert!(matches!(unknown, Err(RegistrationError::UnknownReferralCode(_))));

        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_name() {
        let store = Arc::new(MemoryStore::new());

        let result = service(&store)
            .register(NewUser {
                display_name: "   ".to_string(),
                referral_code: None,
            })
            .await;

        assert!(matches!(result, Err(RegistrationError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_blank_referral_code_is_ignored() {
        let store = Arc::new(MemoryStore::new());

        let user = service(&store)
            .register(NewUser {
                display_name: "Dave".to_string(),
                referral_code: Some("  ".to_string()),
            })
            .await
            .unwrap();

        assert!(user.referred_by.is_none());
    }
}
