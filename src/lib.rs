//! Re-engagement Notifier - 找出不活跃用户并推送召回通知

pub mod config;
pub mod error;
pub mod models;
pub mod push;
pub mod reengagement;
pub mod server;
pub mod store;

pub use config::RuntimeConfig;
pub use error::{ConfigError, DispatchError, GlobalError, StoreError, UserError};
pub use models::{Chat, SelectedChat, UserProfile};
pub use push::{DispatchAck, OneSignalClient, OneSignalConfig, PushData, PushNotification, PushSender};
pub use reengagement::{
    invoke, invoke_with, BatchResult, InvocationResponse, MessageComposer, NotificationDispatcher,
    NotificationOutcome, PipelineSettings, ReEngagementPipeline,
};
pub use store::{ChatOrder, MemoryStore, PostgrestStore, ReEngagementStore};
