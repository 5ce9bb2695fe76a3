//! 召回流水线 - 逐个用户处理，单个用户失败不影响整批
//!
//! 候选筛选 → 选聊天 → 组装文案 → 推送 → 回写发送时间

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::composer::{MessageComposer, RandomPicker};
use super::dispatcher::{DispatchOutcome, NotificationDispatcher};
use super::eligibility::{EligibilitySelector, EligibilityWindow};
use super::relevance::ChatRelevanceResolver;
use super::state::StateUpdater;
use crate::config::RuntimeConfig;
use crate::error::{GlobalError, UserError};
use crate::models::UserProfile;
use crate::push::{OneSignalClient, OneSignalConfig, PushSender};
use crate::store::{PostgrestStore, ReEngagementStore};

/// 单个用户的处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationOutcome {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationOutcome {
    pub fn succeeded(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(user_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// 整批结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub total_candidates: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub outcomes: Vec<NotificationOutcome>,
    pub dry_run: bool,
}

/// 结果汇总器
#[derive(Debug, Default)]
pub struct ResultAggregator {
    result: BatchResult,
}

impl ResultAggregator {
    pub fn new(total_candidates: usize, dry_run: bool) -> Self {
        Self {
            result: BatchResult {
                total_candidates,
                outcomes: Vec::with_capacity(total_candidates),
                dry_run,
                ..Default::default()
            },
        }
    }

    /// 把单个用户的处理结果转成 outcome
    pub fn record(&mut self, user_id: &str, result: Result<(), UserError>) {
        let outcome = match result {
            Ok(()) => {
                self.result.success_count += 1;
                NotificationOutcome::succeeded(user_id)
            }
            Err(UserError::NoChats) => {
                info!(user_id = %user_id, "User has no chats, skipping");
                self.result.error_count += 1;
                NotificationOutcome::failed(user_id, UserError::NoChats.to_string())
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Error processing user");
                self.result.error_count += 1;
                NotificationOutcome::failed(user_id, e.to_string())
            }
        };
        self.result.outcomes.push(outcome);
    }

    pub fn finish(self) -> BatchResult {
        self.result
    }
}

/// 流水线参数
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub inactivity: Duration,
    pub cooldown: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            inactivity: Duration::days(crate::config::DEFAULT_INACTIVITY_DAYS),
            cooldown: Duration::days(crate::config::DEFAULT_MIN_INTERVAL_DAYS),
        }
    }
}

/// 召回流水线
pub struct ReEngagementPipeline {
    store: Arc<dyn ReEngagementStore>,
    dispatcher: NotificationDispatcher,
    composer: MessageComposer,
    settings: PipelineSettings,
}

impl ReEngagementPipeline {
    pub fn new(
        store: Arc<dyn ReEngagementStore>,
        dispatcher: NotificationDispatcher,
        composer: MessageComposer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            dispatcher,
            composer,
            settings,
        }
    }

    /// 按配置构建：Supabase 存储 + OneSignal 推送 + 随机模板
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, GlobalError> {
        config.validate()?;

        let store: Arc<dyn ReEngagementStore> = Arc::new(PostgrestStore::from_config(config)?);
        let sender: Arc<dyn PushSender> =
            Arc::new(OneSignalClient::new(OneSignalConfig::from(config))?);

        Ok(Self::new(
            store,
            NotificationDispatcher::new(sender).with_dry_run(config.dry_run),
            MessageComposer::new(config.heading.clone(), Arc::new(RandomPicker)),
            PipelineSettings {
                inactivity: config.inactivity_threshold(),
                cooldown: config.cooldown_threshold(),
            },
        ))
    }

    pub fn window(&self, now: DateTime<Utc>) -> EligibilityWindow {
        EligibilityWindow::new(now, self.settings.inactivity, self.settings.cooldown)
    }

    /// 执行一次完整调用
    ///
    /// 只有候选查询失败才返回 `Err`；单个用户的失败都记录在 `BatchResult` 里。
    pub async fn run(&self, now: DateTime<Utc>) -> Result<BatchResult, GlobalError> {
        let window = self.window(now);
        let users = EligibilitySelector::new(self.store.as_ref())
            .select(&window)
            .await?;

        let mut aggregator = ResultAggregator::new(users.len(), self.dispatcher.is_dry_run());
        for user in &users {
            let result = self.process_user(user, now).await;
            aggregator.record(&user.id, result);
        }

        let batch = aggregator.finish();
        info!(
            total = batch.total_candidates,
            successful = batch.success_count,
            errors = batch.error_count,
            dry_run = batch.dry_run,
            "Re-engagement batch finished"
        );
        Ok(batch)
    }

    /// 单个用户：选聊天 → 文案 → 推送 → 回写
    pub async fn process_user(
        &self,
        user: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        let store = self.store.as_ref();

        let chat = ChatRelevanceResolver::new(store).resolve(&user.id).await?;
        let notification = self.composer.compose(&user.id, &chat);

        match self.dispatcher.dispatch(&notification).await? {
            DispatchOutcome::Sent(_) => {
                StateUpdater::new(store).record_sent(&user.id, now).await;
            }
            DispatchOutcome::DryRun => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DispatchError, StoreError};

    #[test]
    fn test_aggregator_counts() {
        let mut aggregator = ResultAggregator::new(3, false);
        aggregator.record("a", Ok(()));
        aggregator.record("b", Err(UserError::NoChats));
        aggregator.record(
            "c",
            Err(UserError::Dispatch(DispatchError::Status {
                status: 500,
                body: "down".to_string(),
            })),
        );

        let batch = aggregator.finish();
        assert_eq!(batch.total_candidates, 3);
        assert_eq!(batch.success_count, 1);
        assert_eq!(batch.error_count, 2);
        assert_eq!(batch.success_count + batch.error_count, batch.total_candidates);
        assert_eq!(batch.outcomes[0], NotificationOutcome::succeeded("a"));
        assert_eq!(batch.outcomes[1].error.as_deref(), Some("No chats found"));
        assert!(batch.outcomes[2].error.as_deref().unwrap().contains("500"));
    }

    #[test]
    fn test_aggregator_chat_query_error() {
        let mut aggregator = ResultAggregator::new(1, false);
        aggregator.record(
            "a",
            Err(UserError::ChatQuery(StoreError::Transport("timeout".to_string()))),
        );
        let batch = aggregator.finish();
        assert_eq!(
            batch.outcomes[0].error.as_deref(),
            Some("Error fetching chats: request failed: timeout")
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(NotificationOutcome::succeeded("u-1")).unwrap();
        assert_eq!(json, serde_json::json!({"userId": "u-1", "success": true}));

        let json = serde_json::to_value(NotificationOutcome::failed("u-2", "No chats found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"userId": "u-2", "success": false, "error": "No chats found"})
        );
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let err = ReEngagementPipeline::from_config(&RuntimeConfig::default()).err().unwrap();
        assert!(matches!(err, GlobalError::Config(_)));
    }
}
