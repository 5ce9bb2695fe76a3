//! 推送抽象层 - 外部推送平台只通过 `PushSender` 访问

pub mod onesignal;

pub use onesignal::{OneSignalClient, OneSignalConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// 通知 data 中的类型标记
pub const RE_ENGAGEMENT_TYPE: &str = "re_engagement";

/// 附加在通知上的结构化数据，App 用来跳转到对应聊天
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushData {
    #[serde(rename = "type")]
    pub kind: String,
    pub chat_id: String,
    pub chat_name: String,
}

/// 一条待发送的推送
#[derive(Debug, Clone, PartialEq)]
pub struct PushNotification {
    /// 目标用户（推送平台的 external user id）
    pub target_user_id: String,
    pub heading: String,
    pub body: String,
    pub data: PushData,
}

impl PushNotification {
    /// 创建召回通知
    pub fn re_engagement(
        target_user_id: impl Into<String>,
        heading: impl Into<String>,
        body: impl Into<String>,
        chat_id: impl Into<String>,
        chat_name: impl Into<String>,
    ) -> Self {
        Self {
            target_user_id: target_user_id.into(),
            heading: heading.into(),
            body: body.into(),
            data: PushData {
                kind: RE_ENGAGEMENT_TYPE.to_string(),
                chat_id: chat_id.into(),
                chat_name: chat_name.into(),
            },
        }
    }
}

/// 推送平台的受理回执
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DispatchAck {
    /// 平台侧通知 ID
    #[serde(default)]
    pub id: Option<String>,
    /// 命中的设备数
    #[serde(default)]
    pub recipients: Option<u64>,
}

/// 推送发送 trait
#[async_trait]
pub trait PushSender: Send + Sync {
    /// 平台名称（用于日志）
    fn name(&self) -> &str;

    /// 发送一次，不重试
    async fn send(&self, notification: &PushNotification) -> Result<DispatchAck, DispatchError>;
}
