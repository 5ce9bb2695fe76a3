//! OneSignal 客户端
//!
//! 通过 REST API 按 external user id 推送通知

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::{DispatchAck, PushData, PushNotification, PushSender};
use crate::config::{RuntimeConfig, DEFAULT_HTTP_TIMEOUT_SECS, ONESIGNAL_API_URL};
use crate::error::{DispatchError, GlobalError};

/// OneSignal 客户端配置
#[derive(Debug, Clone)]
pub struct OneSignalConfig {
    pub app_id: String,
    /// REST API key
    pub api_key: String,
    pub api_url: String,
    /// 超时时间 (秒)
    pub timeout_secs: u64,
}

impl Default for OneSignalConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_key: String::new(),
            api_url: ONESIGNAL_API_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl From<&RuntimeConfig> for OneSignalConfig {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            app_id: config.onesignal_app_id.clone(),
            api_key: config.onesignal_api_key.clone(),
            api_url: config.onesignal_api_url.clone(),
            timeout_secs: config.http_timeout_secs,
        }
    }
}

/// 请求载荷
#[derive(Debug, Serialize)]
struct OneSignalPayload<'a> {
    app_id: &'a str,
    include_external_user_ids: Vec<&'a str>,
    contents: HashMap<&'static str, &'a str>,
    headings: HashMap<&'static str, &'a str>,
    data: &'a PushData,
}

impl<'a> OneSignalPayload<'a> {
    fn new(app_id: &'a str, notification: &'a PushNotification) -> Self {
        Self {
            app_id,
            include_external_user_ids: vec![notification.target_user_id.as_str()],
            contents: HashMap::from([("en", notification.body.as_str())]),
            headings: HashMap::from([("en", notification.heading.as_str())]),
            data: &notification.data,
        }
    }
}

/// OneSignal 客户端
#[derive(Debug)]
pub struct OneSignalClient {
    client: Client,
    config: OneSignalConfig,
}

impl OneSignalClient {
    /// 创建新的客户端
    pub fn new(config: OneSignalConfig) -> Result<Self, GlobalError> {
        if config.app_id.is_empty() || config.api_key.is_empty() {
            return Err(crate::error::ConfigError::OneSignalMissing.into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GlobalError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl PushSender for OneSignalClient {
    fn name(&self) -> &str {
        "onesignal"
    }

    async fn send(&self, notification: &PushNotification) -> Result<DispatchAck, DispatchError> {
        let payload = OneSignalPayload::new(&self.config.app_id, notification);

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Basic {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // 已被平台受理，回执解析失败不影响结果
        match serde_json::from_str::<DispatchAck>(&body) {
            Ok(ack) => Ok(ack),
            Err(e) => {
                warn!(user_id = %notification.target_user_id, error = %e, "Unreadable OneSignal response body");
                debug!(body = %body, "OneSignal raw response");
                Ok(DispatchAck::default())
            }
        }
    }
}
