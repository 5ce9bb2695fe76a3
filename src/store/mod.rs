//! 存储接口 - 候选用户查询、聊天查询、发送时间回写
//!
//! 流水线只通过 `ReEngagementStore` 访问数据，具体实现：
//! - `PostgrestStore`：Supabase REST 接口
//! - `MemoryStore`：进程内实现，用于测试和本地演示

pub mod memory;
pub mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{Chat, UserProfile};
use crate::reengagement::eligibility::EligibilityWindow;

/// 聊天排序字段（均为降序，空值排最后，相同值按 id 升序）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOrder {
    LastMessageTime,
    CreatedAt,
}

impl ChatOrder {
    /// PostgREST 列名
    pub fn column(&self) -> &'static str {
        match self {
            ChatOrder::LastMessageTime => "last_message_time",
            ChatOrder::CreatedAt => "created_at",
        }
    }
}

/// 存储 trait
#[async_trait]
pub trait ReEngagementStore: Send + Sync {
    /// 查询满足不活跃和冷却条件的用户
    async fn select_eligible_users(
        &self,
        window: &EligibilityWindow,
    ) -> Result<Vec<UserProfile>, StoreError>;

    /// 按指定字段查询用户的聊天
    async fn select_chats_by_user(
        &self,
        user_id: &str,
        order: ChatOrder,
        limit: usize,
    ) -> Result<Vec<Chat>, StoreError>;

    /// 回写 `last_re_engagement_sent`
    async fn update_last_re_engagement_sent(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
