//! 聊天相关性 - 为用户挑选通知要提到的聊天
//!
//! 规则（先命中先用）：
//! 1. 有 `last_message_time` 的聊天中取最新的一个
//! 2. 都没有消息时间时，取 `created_at` 最新的一个
//!
//! 时间相同按聊天 id 升序，取第一个。

use std::cmp::Ordering;

use tracing::debug;

use crate::error::UserError;
use crate::models::{Chat, SelectedChat};
use crate::store::{ChatOrder, ReEngagementStore};

/// 按排序字段比较两个聊天：降序、空值靠后、相同按 id 升序
pub fn compare_chats(order: ChatOrder, a: &Chat, b: &Chat) -> Ordering {
    let primary = match order {
        // Option 中 None < Some，反向比较后 None 自然排在最后
        ChatOrder::LastMessageTime => b.last_message_time.cmp(&a.last_message_time),
        ChatOrder::CreatedAt => b.created_at.cmp(&a.created_at),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// 在已加载的聊天列表上应用相关性规则
pub fn select_chat(chats: &[Chat]) -> Option<&Chat> {
    let with_messages = chats
        .iter()
        .filter(|c| c.last_message_time.is_some())
        .min_by(|a, b| compare_chats(ChatOrder::LastMessageTime, a, b));

    with_messages.or_else(|| {
        chats
            .iter()
            .min_by(|a, b| compare_chats(ChatOrder::CreatedAt, a, b))
    })
}

/// 通过存储查询挑选聊天（每一层只取一条）
pub struct ChatRelevanceResolver<'a> {
    store: &'a dyn ReEngagementStore,
}

impl<'a> ChatRelevanceResolver<'a> {
    pub fn new(store: &'a dyn ReEngagementStore) -> Self {
        Self { store }
    }

    /// 返回 `UserError::NoChats` 表示用户没有任何聊天
    pub async fn resolve(&self, user_id: &str) -> Result<SelectedChat, UserError> {
        let by_message = self
            .store
            .select_chats_by_user(user_id, ChatOrder::LastMessageTime, 1)
            .await
            .map_err(UserError::ChatQuery)?;

        if let Some(chat) = by_message
            .into_iter()
            .next()
            .filter(|c| c.last_message_time.is_some())
        {
            debug!(user_id = %user_id, chat_id = %chat.id, "Selected chat by last message time");
            return Ok(chat.into());
        }

        let by_created = self
            .store
            .select_chats_by_user(user_id, ChatOrder::CreatedAt, 1)
            .await
            .map_err(UserError::ChatQuery)?;

        match by_created.into_iter().next() {
            Some(chat) => {
                debug!(user_id = %user_id, chat_id = %chat.id, "Selected chat by creation time");
                Ok(chat.into())
            }
            None => Err(UserError::NoChats),
        }
    }
}
