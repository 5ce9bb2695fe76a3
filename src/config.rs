//! 运行配置 - 进程启动时构建一次，显式传入流水线
//!
//! 读取优先级（后者覆盖前者）：
//! 1. 内置默认值
//! 2. JSON 配置文件（`--config` 指定，或 `~/.config/reengage/config.json`）
//! 3. 环境变量 `ONESIGNAL_APP_ID` / `ONESIGNAL_REST_API_KEY` / `SUPABASE_URL` 等

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// OneSignal 通知接口
pub const ONESIGNAL_API_URL: &str = "https://onesignal.com/api/v1/notifications";

/// 默认不活跃天数
pub const DEFAULT_INACTIVITY_DAYS: i64 = 7;

/// 默认两次通知最小间隔天数
pub const DEFAULT_MIN_INTERVAL_DAYS: i64 = 7;

/// 默认通知标题
pub const DEFAULT_HEADING: &str = "We miss you!";

/// 默认 HTTP 超时（秒）
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// 天数上限（约 100 年）
pub const MAX_DAYS: i64 = 36_500;

/// 运行配置
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub onesignal_app_id: String,
    pub onesignal_api_key: String,
    pub onesignal_api_url: String,
    /// Supabase 项目 URL（如 https://xyz.supabase.co）
    pub supabase_url: String,
    /// service role key，绕过 RLS
    pub supabase_service_role_key: String,
    pub inactivity_days: i64,
    pub min_notification_interval_days: i64,
    pub heading: String,
    pub http_timeout_secs: u64,
    /// 只选人不发送
    pub dry_run: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            onesignal_app_id: String::new(),
            onesignal_api_key: String::new(),
            onesignal_api_url: ONESIGNAL_API_URL.to_string(),
            supabase_url: String::new(),
            supabase_service_role_key: String::new(),
            inactivity_days: DEFAULT_INACTIVITY_DAYS,
            min_notification_interval_days: DEFAULT_MIN_INTERVAL_DAYS,
            heading: DEFAULT_HEADING.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            dry_run: false,
        }
    }
}

/// 配置文件格式（所有字段可选）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    onesignal_app_id: Option<String>,
    onesignal_api_key: Option<String>,
    onesignal_api_url: Option<String>,
    supabase_url: Option<String>,
    supabase_service_role_key: Option<String>,
    inactivity_days: Option<i64>,
    min_notification_interval_days: Option<i64>,
    heading: Option<String>,
    http_timeout_secs: Option<u64>,
    dry_run: Option<bool>,
}

impl RuntimeConfig {
    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/reengage/config.json"))
    }

    /// 按优先级加载：默认值 → 配置文件 → 环境变量
    ///
    /// 显式指定的配置文件必须存在；默认路径不存在时直接跳过。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match path {
            Some(path) => config.merge_file(path)?,
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.exists()) {
                    config.merge_file(&path)?;
                }
            }
        }

        config.merge_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 合并 JSON 配置文件
    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "Loaded config file");

        if let Some(v) = file.onesignal_app_id {
            self.onesignal_app_id = v;
        }
        if let Some(v) = file.onesignal_api_key {
            self.onesignal_api_key = v;
        }
        if let Some(v) = file.onesignal_api_url {
            self.onesignal_api_url = v;
        }
        if let Some(v) = file.supabase_url {
            self.supabase_url = v;
        }
        if let Some(v) = file.supabase_service_role_key {
            self.supabase_service_role_key = v;
        }
        if let Some(v) = file.inactivity_days {
            self.inactivity_days = positive_days("inactivity_days", v)?;
        }
        if let Some(v) = file.min_notification_interval_days {
            self.min_notification_interval_days =
                positive_days("min_notification_interval_days", v)?;
        }
        if let Some(v) = file.heading {
            self.heading = v;
        }
        if let Some(v) = file.http_timeout_secs {
            self.http_timeout_secs = positive_timeout("http_timeout_secs", v)?;
        }
        if let Some(v) = file.dry_run {
            self.dry_run = v;
        }
        Ok(())
    }

    /// 合并环境变量（`lookup` 便于测试注入）
    pub fn merge_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("ONESIGNAL_APP_ID") {
            self.onesignal_app_id = v;
        }
        if let Some(v) = get("ONESIGNAL_REST_API_KEY") {
            self.onesignal_api_key = v;
        }
        if let Some(v) = get("ONESIGNAL_API_URL") {
            self.onesignal_api_url = v;
        }
        if let Some(v) = get("SUPABASE_URL") {
            self.supabase_url = v;
        }
        if let Some(v) = get("SUPABASE_SERVICE_ROLE_KEY") {
            self.supabase_service_role_key = v;
        }
        if let Some(v) = get("REENGAGE_INACTIVITY_DAYS") {
            self.inactivity_days = parse_days("REENGAGE_INACTIVITY_DAYS", &v)?;
        }
        if let Some(v) = get("REENGAGE_MIN_INTERVAL_DAYS") {
            self.min_notification_interval_days = parse_days("REENGAGE_MIN_INTERVAL_DAYS", &v)?;
        }
        if let Some(v) = get("REENGAGE_DRY_RUN") {
            self.dry_run = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// 检查必填项（OneSignal 凭证优先）和数值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.onesignal_app_id.is_empty() || self.onesignal_api_key.is_empty() {
            return Err(ConfigError::OneSignalMissing);
        }
        if self.supabase_url.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_URL"));
        }
        if self.supabase_service_role_key.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"));
        }
        // 直接构造的配置同样检查范围
        positive_days("inactivity_days", self.inactivity_days)?;
        positive_days(
            "min_notification_interval_days",
            self.min_notification_interval_days,
        )?;
        positive_timeout("http_timeout_secs", self.http_timeout_secs)?;
        Ok(())
    }

    /// 天数截断到 `1..=MAX_DAYS`
    pub fn inactivity_threshold(&self) -> Duration {
        Duration::days(self.inactivity_days.clamp(1, MAX_DAYS))
    }

    pub fn cooldown_threshold(&self) -> Duration {
        Duration::days(self.min_notification_interval_days.clamp(1, MAX_DAYS))
    }
}

fn parse_days(key: &'static str, raw: &str) -> Result<i64, ConfigError> {
    let days = raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    positive_days(key, days)
}

fn positive_days(key: &'static str, days: i64) -> Result<i64, ConfigError> {
    if days <= 0 || days > MAX_DAYS {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be between 1 and {} days, got {}", MAX_DAYS, days),
        });
    }
    Ok(days)
}

fn positive_timeout(key: &'static str, secs: u64) -> Result<u64, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "timeout must be at least 1 second".to_string(),
        });
    }
    Ok(secs)
}
