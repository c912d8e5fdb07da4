//! Referral Graph Accessor
//!
//! `referral_engine`의 단계별 walk를 async 저장소 조회로 구동
//!
//! - upline: `users.referred_by`를 따라 최대 `max_depth` 단계
//! - downline: `referred_by = ANY(frontier)`로 레벨 단위 BFS
//!
//! 두 방향 모두 같은 깊이 상한을 사용하므로 커미션 단계와
//! 랭크 산정용 네트워크 매출이 같은 범위에서 계산됨

use std::sync::Arc;

use anyhow::Result;
use referral_engine::{Ancestor, DownlineWalk, Level, Upline, UplineWalk, WalkEnd};
use uuid::Uuid;

use crate::db::ReferralStore;

/// 추천 트리 조회 (읽기 전용)
pub struct ReferralGraph {
    store: Arc<dyn ReferralStore>,
    max_depth: u32,
}

impl ReferralGraph {
    pub fn new(store: Arc<dyn ReferralStore>, max_depth: u32) -> Self {
        Self { store, max_depth }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// 업라인 체인 (degree 1 = 직접 추천인)
    ///
    /// 추천인 링크가 없거나 링크된 사용자가 존재하지 않으면 (그 사용자는
    /// 포함하지 않고) 종료. 깊이 상한 / 순환에서도 종료
    pub async fn upline(&self, user_id: Uuid) -> Result<Upline<Uuid>> {
        let mut walk = UplineWalk::new(user_id, self.max_depth);
        let mut ancestors: Vec<Ancestor<Uuid>> = Vec::new();

        let mut link = self.store.find_user(user_id).await?.and_then(|user| user.referred_by);

        while !walk.is_finished() {
            // 링크된 추천인이 실제로 존재할 때만 한 단계 전진
            let referrer = match link {
                Some(referrer_id) => {
                    let found = self.store.find_user(referrer_id).await?;
                    if found.is_none() {
                        tracing::warn!(
                            user = %referrer_id,
                            degree = walk.degree() + 1,
                            "dangling referrer link, upline truncated"
                        );
                    }
                    found
                }
                None => None,
            };

            link = referrer.as_ref().and_then(|user| user.referred_by);
            if let Some(ancestor) = walk.advance(referrer.map(|user| user.id)) {
                ancestors.push(ancestor);
            }
        }

        let end = walk.end().unwrap_or(WalkEnd::Root);
        if end == WalkEnd::Cycle {
            tracing::warn!(
                user = %user_id,
                depth = walk.degree(),
                "referral cycle detected, upline truncated"
            );
        }

        Ok(Upline { ancestors, end })
    }

    /// 다운라인 레벨 목록 (degree 1..=max_depth, 빈 레벨에서 종료)
    pub async fn downline(&self, user_id: Uuid) -> Result<Vec<Level<Uuid>>> {
        let mut walk = DownlineWalk::new(user_id, self.max_depth);
        let mut levels = Vec::new();

        while let Some(frontier) = walk.frontier() {
            let children = self.store.referred_users(frontier).await?;
            let level = walk.descend(children);
            if level.members.is_empty() {
                break;
            }
            levels.push(level);
        }

        if walk.revisits() > 0 {
            tracing::warn!(
                user = %user_id,
                revisits = walk.revisits(),
                "referral cycle detected in downline"
            );
        }

        Ok(levels)
    }
}
