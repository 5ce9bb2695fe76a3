//! 进程内存储 - 与 PostgREST 实现相同的过滤和排序语义

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ChatOrder, ReEngagementStore};
use crate::error::StoreError;
use crate::models::{Chat, UserProfile};
use crate::reengagement::eligibility::EligibilityWindow;
use crate::reengagement::relevance::compare_chats;

#[derive(Default)]
struct Inner {
    /// 按 id 有序，保证候选批次顺序稳定
    users: BTreeMap<String, UserProfile>,
    chats: Vec<Chat>,
    fail_eligibility: bool,
    fail_chats_for: HashSet<String>,
    fail_updates_for: HashSet<String>,
}

/// 进程内存储
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 新增或覆盖用户
    pub fn insert_user(&self, user: UserProfile) {
        self.lock().users.insert(user.id.clone(), user);
    }

    pub fn insert_chat(&self, chat: Chat) {
        self.lock().chats.push(chat);
    }

    pub fn user(&self, id: &str) -> Option<UserProfile> {
        self.lock().users.get(id).cloned()
    }

    /// 让候选查询失败
    pub fn fail_eligibility(&self, fail: bool) {
        self.lock().fail_eligibility = fail;
    }

    /// 让指定用户的聊天查询失败
    pub fn fail_chats_for(&self, user_id: impl Into<String>) {
        self.lock().fail_chats_for.insert(user_id.into());
    }

    /// 让指定用户的回写失败
    pub fn fail_updates_for(&self, user_id: impl Into<String>) {
        self.lock().fail_updates_for.insert(user_id.into());
    }
}

#[async_trait]
impl ReEngagementStore for MemoryStore {
    async fn select_eligible_users(
        &self,
        window: &EligibilityWindow,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let inner = self.lock();
        if inner.fail_eligibility {
            return Err(StoreError::Status {
                status: 503,
                body: "user_profiles unavailable".to_string(),
            });
        }

        Ok(inner
            .users
            .values()
            .filter(|u| window.admits(u))
            .cloned()
            .collect())
    }

    async fn select_chats_by_user(
        &self,
        user_id: &str,
        order: ChatOrder,
        limit: usize,
    ) -> Result<Vec<Chat>, StoreError> {
        let inner = self.lock();
        if inner.fail_chats_for.contains(user_id) {
            return Err(StoreError::Transport(format!(
                "chats query for {} timed out",
                user_id
            )));
        }

        let mut chats: Vec<Chat> = inner
            .chats
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| compare_chats(order, a, b));
        chats.truncate(limit);
        Ok(chats)
    }

    async fn update_last_re_engagement_sent(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_updates_for.contains(user_id) {
            return Err(StoreError::Status {
                status: 500,
                body: "update rejected".to_string(),
            });
        }

        // 与 PATCH ... ?id=eq.x 一致：没有匹配行时也算成功
        if let Some(user) = inner.users.get_mut(user_id) {
            user.last_re_engagement_sent = Some(at);
        }
        Ok(())
    }
}
