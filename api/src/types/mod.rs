//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의

use rand::{distributions::Uniform, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// 추천 코드에 쓰이는 문자 (대문자 + 숫자)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 공개 추천 코드 (예: `K7Q2M9XA`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCode(String);

impl ReferenceCode {
    pub const LEN: usize = 8;

    /// 입력 검증 (대소문자 구분 없음, 대문자로 정규화)
    pub fn new(raw: &str) -> Result<Self, String> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() == Self::LEN && code.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
            Ok(Self(code))
        } else {
            Err(format!(
                "Referral code must be {} letters or digits",
                Self::LEN
            ))
        }
    }

    /// 랜덤 코드 생성
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let index = Uniform::from(0..CODE_ALPHABET.len());
        let code = (0..Self::LEN)
            .map(|_| CODE_ALPHABET[rng.sample(index)] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 페이지네이션 쿼리 파라미터
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 페이지 (0부터 시작)
    pub page: Option<u32>,
    /// 페이지 크기 (기본 20, 최대 100)
    pub limit: Option<u32>,
}

impl PageQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    /// (page, limit) 기본값/상한 적용
    pub fn resolve(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(0);
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        (page, limit)
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let total = total.max(0) as u64;
        Self {
            page,
            limit,
            total,
            has_next: (page as u64 + 1) * (limit as u64) < total,
        }
    }
}

/// 경로 파라미터 UUID 파싱
pub fn parse_id(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::ValidationError(format!("Invalid {} id", field)))
}
