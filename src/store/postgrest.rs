//! Supabase REST (PostgREST) 存储实现

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{ChatOrder, ReEngagementStore};
use crate::config::RuntimeConfig;
use crate::error::{GlobalError, StoreError};
use crate::models::{Chat, UserProfile};
use crate::reengagement::eligibility::EligibilityWindow;

const USER_COLUMNS: &str = "id,last_app_activity,last_re_engagement_sent,re_engagement_enabled";
const CHAT_COLUMNS: &str = "id,user_id,name,last_message_time,created_at";

/// PostgREST 存储
#[derive(Debug)]
pub struct PostgrestStore {
    client: Client,
    /// `{supabase_url}/rest/v1`
    rest_url: String,
    service_key: String,
}

impl PostgrestStore {
    pub fn new(
        supabase_url: &str,
        service_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, GlobalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GlobalError::Client(e.to_string()))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            service_key: service_key.into(),
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, GlobalError> {
        Self::new(
            &config.supabase_url,
            config.supabase_service_role_key.clone(),
            config.http_timeout_secs,
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 候选用户查询参数
pub(crate) fn eligible_users_query(window: &EligibilityWindow) -> Vec<(&'static str, String)> {
    vec![
        ("select", USER_COLUMNS.to_string()),
        ("re_engagement_enabled", "eq.true".to_string()),
        (
            "last_app_activity",
            format!("lt.{}", timestamp(window.inactive_before())),
        ),
        (
            "or",
            format!(
                "(last_re_engagement_sent.is.null,last_re_engagement_sent.lt.{})",
                timestamp(window.cooldown_before())
            ),
        ),
        ("order", "id.asc".to_string()),
    ]
}

/// 聊天查询参数
pub(crate) fn chats_query(
    user_id: &str,
    order: ChatOrder,
    limit: usize,
) -> Vec<(&'static str, String)> {
    vec![
        ("select", CHAT_COLUMNS.to_string()),
        ("user_id", format!("eq.{}", user_id)),
        ("order", format!("{}.desc.nullslast,id.asc", order.column())),
        ("limit", limit.to_string()),
    ]
}

#[async_trait]
impl ReEngagementStore for PostgrestStore {
    async fn select_eligible_users(
        &self,
        window: &EligibilityWindow,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let request = self
            .client
            .get(self.table_url("user_profiles"))
            .query(&eligible_users_query(window));
        self.fetch(request).await
    }

    async fn select_chats_by_user(
        &self,
        user_id: &str,
        order: ChatOrder,
        limit: usize,
    ) -> Result<Vec<Chat>, StoreError> {
        let request = self
            .client
            .get(self.table_url("chats"))
            .query(&chats_query(user_id, order, limit));
        self.fetch(request).await
    }

    async fn update_last_re_engagement_sent(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.table_url("user_profiles"))
            .query(&[("id", format!("eq.{}", user_id))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "last_re_engagement_sent": timestamp(at) }));

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }
}
