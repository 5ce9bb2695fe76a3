//! 召回通知 - 找出不活跃用户，推送其最相关的聊天
//!
//! # 使用示例
//! ```ignore
//! use reengage_notifier::{RuntimeConfig, reengagement::invoke};
//!
//! let config = RuntimeConfig::load(None)?;
//! let response = invoke(&config, chrono::Utc::now()).await;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```

pub mod composer;
pub mod dispatcher;
pub mod eligibility;
pub mod pipeline;
pub mod relevance;
pub mod response;
pub mod state;

pub use composer::{FixedPicker, MessageComposer, RandomPicker, TemplatePicker, TEMPLATES};
pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use eligibility::{EligibilitySelector, EligibilityWindow};
pub use pipeline::{BatchResult, NotificationOutcome, PipelineSettings, ReEngagementPipeline, ResultAggregator};
pub use relevance::{select_chat, ChatRelevanceResolver};
pub use response::{BatchStats, InvocationResponse};
pub use state::StateUpdater;

use chrono::{DateTime, Utc};
use tracing::error;

use crate::config::RuntimeConfig;

/// 按配置执行一次调用，全局错误也转成响应
pub async fn invoke(config: &RuntimeConfig, now: DateTime<Utc>) -> InvocationResponse {
    match ReEngagementPipeline::from_config(config) {
        Ok(pipeline) => invoke_with(&pipeline, now).await,
        Err(e) => {
            error!(error = %e, "Re-engagement invocation failed");
            InvocationResponse::from_error(&e)
        }
    }
}

/// 用已构建的流水线执行一次调用
pub async fn invoke_with(pipeline: &ReEngagementPipeline, now: DateTime<Utc>) -> InvocationResponse {
    let result = pipeline.run(now).await;
    if let Err(e) = &result {
        error!(error = %e, "Re-engagement invocation failed");
    }
    InvocationResponse::from_result(result)
}
