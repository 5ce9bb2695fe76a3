//! 错误类型 - 区分全局错误与单用户错误
//!
//! - `GlobalError`：配置缺失、候选用户查询失败，整个调用直接返回 500
//! - `UserError`：某个用户的聊天查询、推送失败，只记录到该用户的结果里

use std::path::PathBuf;

use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing OneSignal configuration. Set ONESIGNAL_APP_ID and ONESIGNAL_REST_API_KEY.")]
    OneSignalMissing,

    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// 推送错误
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("OneSignal API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("OneSignal request failed: {0}")]
    Transport(String),
}

/// 单用户错误（不会中断批处理）
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Error fetching chats: {0}")]
    ChatQuery(#[source] StoreError),

    #[error("No chats found")]
    NoChats,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// 全局错误（整个调用失败）
#[derive(Debug, Error)]
pub enum GlobalError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Error fetching inactive users: {0}")]
    Eligibility(#[source] StoreError),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}
