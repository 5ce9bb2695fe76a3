//! 数据模型 - 用户资料与聊天记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户资料（`user_profiles` 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// 用户 ID，同时作为推送平台的 external user id
    pub id: String,
    /// 最近一次 App 活跃时间
    #[serde(default)]
    pub last_app_activity: Option<DateTime<Utc>>,
    /// 最近一次召回通知发送时间
    #[serde(default)]
    pub last_re_engagement_sent: Option<DateTime<Utc>>,
    /// 是否允许召回通知
    #[serde(default)]
    pub re_engagement_enabled: bool,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            last_app_activity: None,
            last_re_engagement_sent: None,
            re_engagement_enabled: true,
        }
    }

    pub fn with_last_activity(mut self, at: DateTime<Utc>) -> Self {
        self.last_app_activity = Some(at);
        self
    }

    pub fn with_last_sent(mut self, at: DateTime<Utc>) -> Self {
        self.last_re_engagement_sent = Some(at);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.re_engagement_enabled = enabled;
        self
    }
}

/// 聊天（`chats` 表），本流程只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    /// 显示名称，会出现在通知文案里
    pub name: String,
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: name.into(),
            last_message_time: None,
            created_at,
        }
    }

    pub fn with_last_message(mut self, at: DateTime<Utc>) -> Self {
        self.last_message_time = Some(at);
        self
    }
}

/// 被选中用于通知的聊天
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedChat {
    pub id: String,
    pub name: String,
}

impl From<Chat> for SelectedChat {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id,
            name: chat.name,
        }
    }
}
